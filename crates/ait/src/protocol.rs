//! Envelopes exchanged between a page context and the background context, and
//! on the page's internal bus between the bridge and the presenter.
//!
//! Producers validate before sending and consumers validate on receipt. A
//! payload that fails either check is logged and dropped; it never crosses the
//! boundary as an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

const UNKNOWN_ERROR: &str = "An unknown error occurred";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Malformed envelope: {0}")]
    Malformed(String),

    #[error("Invalid {action} envelope: {reason}")]
    Invalid {
        action: &'static str,
        reason: &'static str,
    },
}

/// Selected text plus the instruction to apply to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    pub text: String,
    pub instruction: String,
    /// Human readable label, the instruction's title.
    pub operation: String,
    pub instruction_id: String,
}

/// A backend reply for the request that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedText {
    pub operation: String,
    pub instruction_id: String,
    pub original_text: String,
    pub result: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
}

impl ErrorReport {
    pub fn new(message: impl Into<String>, operation: Option<String>) -> Self {
        Self {
            error: Some(message.into()),
            operation,
        }
    }

    pub fn message(&self) -> &str {
        self.error
            .as_deref()
            .filter(|message| !message.trim().is_empty())
            .unwrap_or(UNKNOWN_ERROR)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadingNotice {
    pub operation: String,
    pub instruction_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultNotice {
    pub operation: String,
    pub instruction_id: String,
    pub original_text: String,
    pub result: String,
    /// Decided by the selection bridge when the selection was captured.
    pub can_apply: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum Envelope {
    /// Trigger surface -> page: the user picked an instruction for a selection.
    #[serde(rename = "ait-processText")]
    ProcessText(ProcessRequest),

    /// Page -> background: run the request against the active backend.
    #[serde(rename = "ait-callAiApi")]
    CallBackend(ProcessRequest),

    /// Background -> page: the backend produced text.
    #[serde(rename = "ait-processedText")]
    Processed(ProcessedText),

    /// Background -> page, or page bus: something failed.
    #[serde(rename = "ait-showError")]
    Error(ErrorReport),

    /// Page bus: a request is pending.
    #[serde(rename = "ait-modal-showLoading")]
    ShowLoading(LoadingNotice),

    /// Page bus: a result is ready to view, and possibly to apply.
    #[serde(rename = "ait-modal-showResult")]
    ShowResult(ResultNotice),

    /// Page bus: the user dismissed the overlay.
    #[serde(rename = "ait-modal-close")]
    Close,

    /// Page -> background: open the settings surface.
    #[serde(rename = "ait-openSettingsPage")]
    OpenSettings,
}

fn valid_instruction_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric())
}

fn check(action: &'static str, ok: bool, reason: &'static str) -> Result<(), ProtocolError> {
    if ok {
        Ok(())
    } else {
        Err(ProtocolError::Invalid { action, reason })
    }
}

impl ProcessRequest {
    fn validate(&self, action: &'static str) -> Result<(), ProtocolError> {
        check(action, !self.instruction.trim().is_empty(), "instruction is empty")?;
        check(action, !self.operation.trim().is_empty(), "operation is empty")?;
        check(
            action,
            valid_instruction_id(&self.instruction_id),
            "instructionId must be alphanumeric",
        )
    }
}

impl Envelope {
    pub fn action(&self) -> &'static str {
        match self {
            Envelope::ProcessText(_) => "ait-processText",
            Envelope::CallBackend(_) => "ait-callAiApi",
            Envelope::Processed(_) => "ait-processedText",
            Envelope::Error(_) => "ait-showError",
            Envelope::ShowLoading(_) => "ait-modal-showLoading",
            Envelope::ShowResult(_) => "ait-modal-showResult",
            Envelope::Close => "ait-modal-close",
            Envelope::OpenSettings => "ait-openSettingsPage",
        }
    }

    /// Semantic checks serde cannot express.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        let action = self.action();
        match self {
            Envelope::ProcessText(request) => request.validate(action),
            Envelope::CallBackend(request) => {
                request.validate(action)?;
                check(action, !request.text.trim().is_empty(), "text is empty")
            }
            Envelope::Processed(processed) => {
                check(action, !processed.operation.trim().is_empty(), "operation is empty")?;
                check(
                    action,
                    valid_instruction_id(&processed.instruction_id),
                    "instructionId must be alphanumeric",
                )
            }
            Envelope::ShowLoading(notice) => {
                check(action, !notice.operation.trim().is_empty(), "operation is empty")
            }
            Envelope::ShowResult(notice) => {
                check(action, !notice.operation.trim().is_empty(), "operation is empty")
            }
            Envelope::Error(_) | Envelope::Close | Envelope::OpenSettings => Ok(()),
        }
    }

    pub fn decode(raw: &str) -> Result<Self, ProtocolError> {
        let envelope: Envelope =
            serde_json::from_str(raw).map_err(|e| ProtocolError::Malformed(e.to_string()))?;
        envelope.validate()?;
        Ok(envelope)
    }

    pub fn from_value(value: Value) -> Result<Self, ProtocolError> {
        let envelope: Envelope =
            serde_json::from_value(value).map_err(|e| ProtocolError::Malformed(e.to_string()))?;
        envelope.validate()?;
        Ok(envelope)
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        self.validate()?;
        serde_json::to_string(self).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }
}

/// Decode `raw`, logging and discarding anything that does not validate.
pub fn receive(context: &str, raw: &str) -> Option<Envelope> {
    match Envelope::decode(raw) {
        Ok(envelope) => Some(envelope),
        Err(e) => {
            tracing::warn!(context, error = %e, "dropping invalid envelope");
            None
        }
    }
}
