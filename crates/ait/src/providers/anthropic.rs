use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::base::Provider;
use super::configs::{ProviderConfig, ProviderType};
use super::utils::{
    build_client, empty_response, endpoint, ensure_configured, send, REQUEST_TIMEOUT, TEMPERATURE,
};
use crate::errors::ProviderResult;

pub const ANTHROPIC_HOST: &str = "https://api.anthropic.com/v1";
pub const ANTHROPIC_MODEL: &str = "claude-3-5-haiku-latest";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// The messages API requires an explicit output budget.
const MAX_TOKENS: u32 = 4096;

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

pub struct AnthropicProvider {
    client: Client,
    config: ProviderConfig,
}

impl AnthropicProvider {
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
impl Provider for AnthropicProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Anthropic
    }

    async fn call_api(
        &self,
        text: &str,
        instruction: &str,
        cancel: &CancellationToken,
    ) -> ProviderResult<String> {
        let payload = json!({
            "model": self.config.model,
            "system": instruction,
            "messages": [{ "role": "user", "content": text }],
            "max_tokens": MAX_TOKENS,
            "temperature": TEMPERATURE
        });

        let request = self
            .client
            .post(endpoint(&self.config.base_url, "messages"))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&payload);

        let response: MessagesResponse = send(&self.config.name, request, cancel).await?;
        response
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .ok_or_else(|| empty_response(&self.config.name, "text content"))
    }
}
