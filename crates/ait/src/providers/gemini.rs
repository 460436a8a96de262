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

pub const GEMINI_HOST: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const GEMINI_MODEL: &str = "gemini-2.0-flash-lite";

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: String,
}

pub struct GeminiProvider {
    client: Client,
    config: ProviderConfig,
}

impl GeminiProvider {
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
impl Provider for GeminiProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Gemini
    }

    async fn call_api(
        &self,
        text: &str,
        instruction: &str,
        cancel: &CancellationToken,
    ) -> ProviderResult<String> {
        let url = endpoint(
            &self.config.base_url,
            &format!("models/{}:generateContent", self.config.model),
        );
        let payload = json!({
            "contents": [{ "role": "user", "parts": [{ "text": text }] }],
            "systemInstruction": { "parts": [{ "text": instruction }] },
            "generationConfig": {
                "temperature": TEMPERATURE,
                "responseMimeType": "text/plain"
            }
        });

        // Gemini authenticates with a query-string key rather than a header.
        let request = self
            .client
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&payload);

        let response: GenerateContentResponse = send(&self.config.name, request, cancel).await?;
        response
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or_else(|| empty_response(&self.config.name, "candidates"))
    }
}
