//! The page side of the exchange: owns the overlay presenter and the selection
//! bridge, forwards triggers to the background and turns its replies into
//! presenter transitions.

use tokio::sync::mpsc;

use crate::presenter::{dismiss, DismissReason, Presenter, PresenterState, ViewModel};
use crate::protocol::{self, Envelope, ErrorReport, ResultNotice};
use crate::selection::{ApplyOutcome, Document, SelectionBridge};

const BACKGROUND_UNAVAILABLE: &str = "The background service is not available";

pub struct PageContext<D: Document> {
    presenter: Presenter,
    bridge: SelectionBridge<D>,
    background: mpsc::UnboundedSender<Envelope>,
}

impl<D: Document> PageContext<D> {
    /// `background` carries envelopes to the privileged context.
    pub fn new(background: mpsc::UnboundedSender<Envelope>) -> Self {
        Self {
            presenter: Presenter::new(),
            bridge: SelectionBridge::new(),
            background,
        }
    }

    pub fn presenter(&self) -> &Presenter {
        &self.presenter
    }

    pub fn state(&self) -> &PresenterState {
        self.presenter.state()
    }

    pub fn view(&self) -> Option<ViewModel> {
        self.presenter.view()
    }

    /// Decode a raw payload; invalid ones are logged and dropped.
    pub fn receive(&mut self, document: &D, raw: &str) {
        if let Some(envelope) = protocol::receive("page", raw) {
            self.handle(document, envelope);
        }
    }

    pub fn handle(&mut self, document: &D, envelope: Envelope) {
        if let Err(e) = envelope.validate() {
            tracing::warn!(error = %e, "page dropping invalid envelope");
            return;
        }

        match envelope {
            Envelope::ProcessText(request) => {
                if request.text.trim().is_empty() {
                    tracing::debug!("ignoring trigger without text");
                    return;
                }
                self.bridge.capture(document);
                self.presenter.handle(&Envelope::ProcessText(request.clone()));
                self.send(Envelope::CallBackend(request));
            }
            Envelope::Processed(processed) => {
                // A dismissed overlay stays closed.
                if !self.presenter.is_open() {
                    tracing::debug!("result arrived after the overlay closed");
                    return;
                }
                self.presenter.handle(&Envelope::ShowResult(ResultNotice {
                    operation: processed.operation,
                    instruction_id: processed.instruction_id,
                    original_text: processed.original_text,
                    result: processed.result,
                    can_apply: self.bridge.can_apply(),
                }));
            }
            Envelope::Error(report) => {
                if self.presenter.is_open() {
                    self.presenter.handle(&Envelope::Error(report));
                }
            }
            Envelope::Close => self.dismiss(DismissReason::Cancel),
            Envelope::ShowLoading(_) | Envelope::ShowResult(_) => {
                self.presenter.handle(&envelope);
            }
            Envelope::CallBackend(_) | Envelope::OpenSettings => {
                tracing::debug!(action = envelope.action(), "ignoring background-only envelope");
            }
        }
    }

    /// Write the shown result over the captured selection, then close.
    pub fn accept(&mut self, document: &mut D) -> ApplyOutcome {
        let PresenterState::Result {
            result_text,
            can_apply,
            ..
        } = self.presenter.state()
        else {
            return ApplyOutcome::NothingCaptured;
        };
        if !*can_apply {
            return ApplyOutcome::NotEditable;
        }

        let result_text = result_text.clone();
        let outcome = self.bridge.apply(document, &result_text);
        self.dismiss(DismissReason::Cancel);
        outcome
    }

    pub fn dismiss(&mut self, reason: DismissReason) {
        self.presenter.handle(&dismiss(reason));
        self.bridge.release();
    }

    pub fn open_settings(&mut self) {
        self.send(Envelope::OpenSettings);
    }

    fn send(&mut self, envelope: Envelope) {
        if let Err(e) = envelope.validate() {
            tracing::warn!(error = %e, "refusing to send invalid envelope");
            return;
        }
        if self.background.send(envelope).is_err() {
            tracing::warn!("background context is gone");
            self.presenter
                .handle(&Envelope::Error(ErrorReport::new(BACKGROUND_UNAVAILABLE, None)));
        }
    }
}
