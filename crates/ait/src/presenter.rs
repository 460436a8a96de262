//! The overlay's state machine. It knows nothing about how it is drawn: the
//! host renders [`ViewModel`]s and feeds user dismissals back as envelopes.

use crate::instructions::{action_title, loading_title};
use crate::protocol::Envelope;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PresenterState {
    #[default]
    Closed,
    Loading {
        instruction_id: String,
        operation: String,
    },
    Result {
        instruction_id: String,
        operation: String,
        original_text: String,
        result_text: String,
        can_apply: bool,
    },
    Error {
        message: String,
    },
}

/// Ways a user can dismiss the overlay. All of them produce the same envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissReason {
    CloseButton,
    EscapeKey,
    Backdrop,
    Cancel,
}

pub fn dismiss(reason: DismissReason) -> Envelope {
    tracing::debug!(?reason, "overlay dismissed");
    Envelope::Close
}

/// Pure transition function.
pub fn update(state: PresenterState, envelope: &Envelope) -> PresenterState {
    match envelope {
        Envelope::ProcessText(request) if !request.text.trim().is_empty() => {
            PresenterState::Loading {
                instruction_id: request.instruction_id.clone(),
                operation: request.operation.clone(),
            }
        }
        Envelope::ShowLoading(notice) => PresenterState::Loading {
            instruction_id: notice.instruction_id.clone(),
            operation: notice.operation.clone(),
        },
        Envelope::ShowResult(notice) => PresenterState::Result {
            instruction_id: notice.instruction_id.clone(),
            operation: notice.operation.clone(),
            original_text: notice.original_text.clone(),
            result_text: notice.result.clone(),
            can_apply: notice.can_apply,
        },
        Envelope::Error(report) => PresenterState::Error {
            message: report.message().to_string(),
        },
        Envelope::Close => PresenterState::Closed,
        // Raw background results must go through the selection bridge first,
        // which decides whether they can be applied.
        Envelope::ProcessText(_)
        | Envelope::Processed(_)
        | Envelope::CallBackend(_)
        | Envelope::OpenSettings => state,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewAction {
    Close,
    CopyResult,
    Replace,
    CheckSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewBody {
    Loading { hint: &'static str },
    Result { original_text: String, result_text: String },
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewModel {
    pub title: String,
    pub body: ViewBody,
    pub actions: Vec<ViewAction>,
}

impl ViewModel {
    pub fn has_action(&self, action: ViewAction) -> bool {
        self.actions.contains(&action)
    }
}

#[derive(Debug, Default)]
pub struct Presenter {
    state: PresenterState,
}

impl Presenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PresenterState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != PresenterState::Closed
    }

    /// Apply an envelope; returns whether the state changed.
    pub fn handle(&mut self, envelope: &Envelope) -> bool {
        let next = update(self.state.clone(), envelope);
        let changed = next != self.state;
        if changed {
            tracing::debug!(action = envelope.action(), "presenter transition");
            self.state = next;
        }
        changed
    }

    /// What to draw, or `None` while closed.
    pub fn view(&self) -> Option<ViewModel> {
        match &self.state {
            PresenterState::Closed => None,
            PresenterState::Loading {
                instruction_id,
                operation,
            } => Some(ViewModel {
                title: loading_title(instruction_id, operation),
                body: ViewBody::Loading {
                    hint: "This might take a few seconds...",
                },
                actions: vec![ViewAction::Close],
            }),
            PresenterState::Result {
                instruction_id,
                operation,
                original_text,
                result_text,
                can_apply,
            } => {
                let mut actions = vec![ViewAction::Close, ViewAction::CopyResult];
                if *can_apply {
                    actions.push(ViewAction::Replace);
                }
                Some(ViewModel {
                    title: action_title(instruction_id, operation),
                    body: ViewBody::Result {
                        original_text: original_text.clone(),
                        result_text: result_text.clone(),
                    },
                    actions,
                })
            }
            PresenterState::Error { message } => Some(ViewModel {
                title: "Error".to_string(),
                body: ViewBody::Error {
                    message: message.clone(),
                },
                actions: vec![ViewAction::Close, ViewAction::CheckSettings],
            }),
        }
    }
}
