use thiserror::Error;

/// Failure of a single backend call.
///
/// Every variant except [`ProviderError::Aborted`] is user-facing: its `Display` is
/// the message shown in the error state of the presenter.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// A required adapter field is missing or the provider type is unknown.
    #[error("{0}")]
    Configuration(String),

    /// The vendor answered with a non-2xx status. Carries the vendor's message
    /// when its error envelope could be parsed, the HTTP status text otherwise.
    #[error("{0}")]
    Api(String),

    /// The request never produced an HTTP response (connect, TLS, timeout).
    #[error("Network error: {0}")]
    Transport(String),

    /// A 2xx response whose body did not match the vendor's success envelope.
    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    /// Superseded by a newer request for the same origin.
    #[error("Request aborted")]
    Aborted,
}

impl ProviderError {
    pub fn is_abort(&self) -> bool {
        matches!(self, ProviderError::Aborted)
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Transport("request timed out".to_string())
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
