use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::base::Provider;
use super::configs::{ProviderConfig, ProviderType};
use super::openai::chat_completion;
use super::utils::{build_client, ensure_configured, REQUEST_TIMEOUT};
use crate::errors::ProviderResult;

pub const DEEPSEEK_HOST: &str = "https://api.deepseek.com";
pub const DEEPSEEK_MODEL: &str = "deepseek-chat";

/// DeepSeek speaks the OpenAI chat-completions dialect on its own host.
pub struct DeepSeekProvider {
    client: Client,
    config: ProviderConfig,
}

impl DeepSeekProvider {
    pub fn new(config: ProviderConfig) -> ProviderResult<Self> {
        Self::with_timeout(config, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(config: ProviderConfig, timeout: Duration) -> ProviderResult<Self> {
        ensure_configured(&config)?;
        let client = build_client(timeout)?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Provider for DeepSeekProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::DeepSeek
    }

    async fn call_api(
        &self,
        text: &str,
        instruction: &str,
        cancel: &CancellationToken,
    ) -> ProviderResult<String> {
        chat_completion(&self.client, &self.config, text, instruction, cancel).await
    }
}
