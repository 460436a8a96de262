use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::base::Provider;
use super::configs::ProviderType;
use super::factory::ProviderResolver;
use crate::errors::{ProviderError, ProviderResult};

/// A call observed by a [`MockProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub text: String,
    pub instruction: String,
}

/// A provider that echoes scripted replies after an optional delay, honouring
/// cancellation the same way the HTTP adapters do.
#[derive(Clone)]
pub struct MockProvider {
    reply: Result<String, ProviderError>,
    delay: Duration,
    ignores_cancel: bool,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    cancelled: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            delay: Duration::ZERO,
            ignores_cancel: false,
            calls: Arc::new(Mutex::new(Vec::new())),
            cancelled: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            reply: Err(error),
            ..Self::replying("")
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Run out the full delay even after cancellation, like a backend that
    /// is slow to notice the abort.
    pub fn ignoring_cancel(mut self) -> Self {
        self.ignores_cancel = true;
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Texts of the calls whose token was cancelled before they finished.
    pub fn cancelled(&self) -> Vec<String> {
        self.cancelled.lock().unwrap().clone()
    }

    fn record_cancel(&self, text: &str) -> ProviderResult<String> {
        self.cancelled.lock().unwrap().push(text.to_string());
        Err(ProviderError::Aborted)
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Gemini
    }

    async fn call_api(
        &self,
        text: &str,
        instruction: &str,
        cancel: &CancellationToken,
    ) -> ProviderResult<String> {
        self.calls.lock().unwrap().push(RecordedCall {
            text: text.to_string(),
            instruction: instruction.to_string(),
        });

        if self.ignores_cancel {
            tokio::time::sleep(self.delay).await;
            if cancel.is_cancelled() {
                return self.record_cancel(text);
            }
        } else {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return self.record_cancel(text),
                _ = tokio::time::sleep(self.delay) => {}
            }
        }

        match &self.reply {
            Ok(reply) => Ok(reply.clone()),
            Err(error) => Err(error.clone()),
        }
    }
}

/// Hands out clones of one [`MockProvider`], or fails resolution outright.
pub struct MockResolver {
    provider: Result<MockProvider, ProviderError>,
}

impl MockResolver {
    pub fn new(provider: MockProvider) -> Self {
        Self {
            provider: Ok(provider),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            provider: Err(error),
        }
    }
}

#[async_trait]
impl ProviderResolver for MockResolver {
    async fn resolve(&self) -> ProviderResult<Box<dyn Provider>> {
        match &self.provider {
            Ok(provider) => Ok(Box::new(provider.clone())),
            Err(error) => Err(error.clone()),
        }
    }
}
