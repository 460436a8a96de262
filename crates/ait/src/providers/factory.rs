use async_trait::async_trait;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use super::{
    anthropic::AnthropicProvider,
    base::Provider,
    configs::{ProviderConfig, ProviderType},
    deepseek::DeepSeekProvider,
    gemini::GeminiProvider,
    openai::OpenAiProvider,
    utils::REQUEST_TIMEOUT,
};
use crate::errors::{ProviderError, ProviderResult};
use crate::store::{load_providers_config, ConfigStore};

pub fn parse_provider_type(name: &str) -> ProviderResult<ProviderType> {
    ProviderType::from_str(&name.trim().to_lowercase())
        .map_err(|_| ProviderError::Configuration(format!("Unknown provider type: {}", name)))
}

pub fn create_provider(config: ProviderConfig) -> ProviderResult<Box<dyn Provider>> {
    create_provider_with_timeout(config, REQUEST_TIMEOUT)
}

pub fn create_provider_with_timeout(
    config: ProviderConfig,
    timeout: Duration,
) -> ProviderResult<Box<dyn Provider>> {
    match config.provider_type {
        ProviderType::Gemini => Ok(Box::new(GeminiProvider::with_timeout(config, timeout)?)),
        ProviderType::OpenAi => Ok(Box::new(OpenAiProvider::with_timeout(config, timeout)?)),
        ProviderType::Anthropic => Ok(Box::new(AnthropicProvider::with_timeout(config, timeout)?)),
        ProviderType::DeepSeek => Ok(Box::new(DeepSeekProvider::with_timeout(config, timeout)?)),
    }
}

/// Produces the adapter a request should use at the moment it is dispatched.
#[async_trait]
pub trait ProviderResolver: Send + Sync {
    async fn resolve(&self) -> ProviderResult<Box<dyn Provider>>;
}

/// Re-reads the persisted configuration on every call so that a settings change
/// applies to the very next request.
pub struct StoreResolver {
    store: Arc<dyn ConfigStore>,
    timeout: Duration,
}

impl StoreResolver {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self::with_timeout(store, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(store: Arc<dyn ConfigStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }
}

#[async_trait]
impl ProviderResolver for StoreResolver {
    async fn resolve(&self) -> ProviderResult<Box<dyn Provider>> {
        let configs = load_providers_config(self.store.as_ref())
            .await
            .map_err(|e| ProviderError::Configuration(format!("Failed to read settings: {}", e)))?;
        let config = configs.active();
        tracing::debug!(provider = %config.provider_type, model = %config.model, "resolved active provider");
        create_provider_with_timeout(config, self.timeout)
    }
}
