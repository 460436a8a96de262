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

pub const OPENAI_HOST: &str = "https://api.openai.com/v1";
pub const OPENAI_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// POST an OpenAI-style `/chat/completions` request with bearer auth.
///
/// Shared with every vendor that speaks the same dialect.
pub(super) async fn chat_completion(
    client: &Client,
    config: &ProviderConfig,
    text: &str,
    instruction: &str,
    cancel: &CancellationToken,
) -> ProviderResult<String> {
    let payload = json!({
        "model": config.model,
        "messages": [
            { "role": "system", "content": instruction },
            { "role": "user", "content": text }
        ],
        "stream": false,
        "temperature": TEMPERATURE
    });

    let request = client
        .post(endpoint(&config.base_url, "chat/completions"))
        .bearer_auth(&config.api_key)
        .json(&payload);

    let response: ChatCompletionResponse = send(&config.name, request, cancel).await?;
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| empty_response(&config.name, "choices"))
}

pub struct OpenAiProvider {
    client: Client,
    config: ProviderConfig,
}

impl OpenAiProvider {
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
impl Provider for OpenAiProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::OpenAi
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
