use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::configs::ProviderType;
use crate::errors::ProviderResult;

/// Text and instruction sent by [`Provider::test_connectivity`].
pub const PROBE_TEXT: &str = "Test";
pub const PROBE_INSTRUCTION: &str = "Test";

/// Base trait for text generation backends (Gemini, OpenAI, Anthropic, DeepSeek)
///
/// Implementations own exactly one vendor wire format and normalise the reply to
/// the generated text. A call performs a single HTTP request and never retries.
#[async_trait]
pub trait Provider: Send + Sync {
    fn provider_type(&self) -> ProviderType;

    /// Apply `instruction` to `text`.
    ///
    /// Resolves to [`ProviderError::Aborted`](crate::errors::ProviderError::Aborted)
    /// as soon as `cancel` fires, whether or not the request was already sent.
    async fn call_api(
        &self,
        text: &str,
        instruction: &str,
        cancel: &CancellationToken,
    ) -> ProviderResult<String>;

    async fn test_connectivity(&self) -> ProviderResult<String> {
        self.call_api(PROBE_TEXT, PROBE_INSTRUCTION, &CancellationToken::new())
            .await
    }
}
