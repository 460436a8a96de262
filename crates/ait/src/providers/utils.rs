use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::configs::ProviderConfig;
use crate::errors::{ProviderError, ProviderResult};

/// Upper bound for a single backend call, including reading the body.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Sampling temperature sent to every vendor.
pub const TEMPERATURE: f32 = 0.7;

/// `{"error": {"message": "..."}}`, shared by all supported vendors.
#[derive(Debug, Deserialize)]
struct VendorErrorEnvelope {
    error: Option<VendorError>,
}

#[derive(Debug, Deserialize)]
struct VendorError {
    message: String,
}

pub fn build_client(timeout: Duration) -> ProviderResult<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ProviderError::Configuration(format!("Failed to build HTTP client: {}", e)))
}

/// Reject a config that is missing any field an adapter needs.
pub fn ensure_configured(config: &ProviderConfig) -> ProviderResult<()> {
    let missing = if config.api_key.trim().is_empty() {
        "API key"
    } else if config.model.trim().is_empty() {
        "Model"
    } else if config.base_url.trim().is_empty() {
        "Base URL"
    } else {
        return Ok(());
    };

    Err(ProviderError::Configuration(format!(
        "{} is required for {}",
        missing, config.name
    )))
}

pub fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Send `request` and decode a 2xx body as `T`.
///
/// Non-2xx responses become [`ProviderError::Api`] carrying the vendor's message,
/// falling back to the status text. Cancellation wins over every await point.
pub async fn send<T: DeserializeOwned>(
    provider: &str,
    request: RequestBuilder,
    cancel: &CancellationToken,
) -> ProviderResult<T> {
    let response = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(ProviderError::Aborted),
        response = request.send() => response?,
    };

    let status = response.status();
    let body = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(ProviderError::Aborted),
        body = response.bytes() => body?,
    };

    if !status.is_success() {
        tracing::debug!(provider, %status, "backend returned an error status");
        return Err(ProviderError::Api(error_message(status, &body)));
    }

    serde_json::from_slice(&body).map_err(|e| ProviderError::InvalidResponse {
        provider: provider.to_string(),
        reason: e.to_string(),
    })
}

fn error_message(status: StatusCode, body: &[u8]) -> String {
    serde_json::from_slice::<VendorErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .map(|error| error.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| status.as_str().to_string())
        })
}

pub fn empty_response(provider: &str, what: &str) -> ProviderError {
    ProviderError::InvalidResponse {
        provider: provider.to_string(),
        reason: format!("response contained no {}", what),
    }
}
