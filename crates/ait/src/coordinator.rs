//! Background-side request lifecycle.
//!
//! Each origin (a page or tab) gets a [`Session`]. Triggers are debounced per
//! origin, a firing timer cancels the origin's previous in-flight call, and a
//! settled call is only delivered if no newer trigger arrived in the meantime.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::errors::ProviderResult;
use crate::protocol::{self, Envelope, ErrorReport, ProcessRequest, ProcessedText};
use crate::providers::factory::ProviderResolver;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Identifies the page context a request came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OriginId(String);

impl OriginId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OriginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OriginId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// One connection of an origin. A reconnect of the same origin gets a new id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

/// Handles the open-settings side channel.
pub trait SettingsOpener: Send + Sync {
    fn open_settings(&self, origin: &OriginId);
}

/// Ignores open-settings requests.
pub struct NoopSettingsOpener;

impl SettingsOpener for NoopSettingsOpener {
    fn open_settings(&self, origin: &OriginId) {
        tracing::debug!(%origin, "open settings requested, no settings surface attached");
    }
}

struct InFlight {
    generation: u64,
    token: CancellationToken,
}

struct Session {
    id: SessionId,
    sink: mpsc::UnboundedSender<Envelope>,
    /// Replaced by every accepted trigger; a settlement is delivered only if it
    /// still matches. Drawn from a coordinator-wide sequence, so numbers are
    /// never shared between sessions.
    generation: u64,
    debounce: Option<JoinHandle<()>>,
    in_flight: Option<InFlight>,
}

impl Session {
    fn tear_down(self) {
        if let Some(timer) = self.debounce {
            timer.abort();
        }
        if let Some(in_flight) = self.in_flight {
            in_flight.token.cancel();
        }
    }
}

struct Inner {
    resolver: Arc<dyn ProviderResolver>,
    opener: Arc<dyn SettingsOpener>,
    debounce: Duration,
    sequence: AtomicU64,
    sessions: Mutex<HashMap<OriginId, Session>>,
}

#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<Inner>,
}

impl Coordinator {
    pub fn new(resolver: Arc<dyn ProviderResolver>, opener: Arc<dyn SettingsOpener>) -> Self {
        Self::with_debounce(resolver, opener, DEFAULT_DEBOUNCE)
    }

    pub fn with_debounce(
        resolver: Arc<dyn ProviderResolver>,
        opener: Arc<dyn SettingsOpener>,
        debounce: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                resolver,
                opener,
                debounce,
                sequence: AtomicU64::new(0),
                sessions: Mutex::new(HashMap::new()),
            }),
        }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<OriginId, Session>> {
        // Session state stays consistent across a panic in another holder.
        self.inner
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn next_sequence(&self) -> u64 {
        self.inner.sequence.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Open a session for `origin` and return the receiver of everything the
    /// background sends to it. Reconnecting replaces the previous session.
    pub fn connect(&self, origin: OriginId) -> mpsc::UnboundedReceiver<Envelope> {
        self.open(origin).1
    }

    /// Like [`Coordinator::connect`], also returning the id that
    /// [`Coordinator::disconnect_session`] needs.
    pub fn open(&self, origin: OriginId) -> (SessionId, mpsc::UnboundedReceiver<Envelope>) {
        let id = SessionId(self.next_sequence());
        let (sink, receiver) = mpsc::unbounded_channel();
        let session = Session {
            id,
            sink,
            generation: 0,
            debounce: None,
            in_flight: None,
        };
        if let Some(previous) = self.sessions().insert(origin.clone(), session) {
            tracing::debug!(%origin, "replacing existing session");
            previous.tear_down();
        }
        tracing::info!(%origin, "origin connected");
        (id, receiver)
    }

    /// Drop the session, aborting its timer and cancelling its in-flight call.
    pub fn disconnect(&self, origin: &OriginId) {
        if let Some(session) = self.sessions().remove(origin) {
            session.tear_down();
            tracing::info!(%origin, "origin disconnected");
        }
    }

    /// Drop the session of `origin` only if it is still the one identified by
    /// `id`. Returns whether a session was removed.
    pub fn disconnect_session(&self, origin: &OriginId, id: SessionId) -> bool {
        let mut sessions = self.sessions();
        if sessions.get(origin).map(|session| session.id) != Some(id) {
            return false;
        }
        let removed = sessions.remove(origin);
        drop(sessions);
        if let Some(session) = removed {
            session.tear_down();
            tracing::info!(%origin, "origin disconnected");
        }
        true
    }

    pub fn shutdown(&self) {
        let sessions: Vec<Session> = self.sessions().drain().map(|(_, s)| s).collect();
        for session in sessions {
            session.tear_down();
        }
    }

    pub fn is_connected(&self, origin: &OriginId) -> bool {
        self.sessions().contains_key(origin)
    }

    pub fn session_count(&self) -> usize {
        self.sessions().len()
    }

    /// Decode a raw payload from `origin`; invalid payloads are logged and dropped.
    pub fn receive(&self, origin: &OriginId, raw: &str) {
        if let Some(envelope) = protocol::receive(origin.as_str(), raw) {
            self.dispatch(origin, envelope);
        }
    }

    pub fn dispatch(&self, origin: &OriginId, envelope: Envelope) {
        if let Err(e) = envelope.validate() {
            tracing::warn!(%origin, error = %e, "dropping invalid envelope");
            return;
        }

        match envelope {
            Envelope::CallBackend(request) => self.schedule(origin, request),
            Envelope::OpenSettings => self.inner.opener.open_settings(origin),
            other => {
                tracing::debug!(%origin, action = other.action(), "ignoring page-only envelope");
            }
        }
    }

    fn schedule(&self, origin: &OriginId, request: ProcessRequest) {
        if request.text.trim().is_empty() {
            tracing::debug!(%origin, "ignoring trigger without text");
            return;
        }

        let mut sessions = self.sessions();
        let Some(session) = sessions.get_mut(origin) else {
            tracing::warn!(%origin, "trigger from an origin without a session");
            return;
        };

        let generation = self.next_sequence();
        session.generation = generation;
        if let Some(timer) = session.debounce.take() {
            timer.abort();
            tracing::debug!(%origin, generation, "debounce restarted");
        }

        let coordinator = self.clone();
        let origin = origin.clone();
        let delay = self.inner.debounce;
        session.debounce = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            coordinator.fire(origin, generation, request).await;
        }));
    }

    async fn fire(&self, origin: OriginId, generation: u64, request: ProcessRequest) {
        let token = {
            let mut sessions = self.sessions();
            let Some(session) = sessions.get_mut(&origin) else {
                return;
            };
            if session.generation != generation {
                return;
            }
            // Our own handle; the task keeps running once detached.
            session.debounce = None;
            if let Some(previous) = session.in_flight.take() {
                tracing::debug!(%origin, superseded = previous.generation, "cancelling in-flight request");
                previous.token.cancel();
            }
            let token = CancellationToken::new();
            session.in_flight = Some(InFlight {
                generation,
                token: token.clone(),
            });
            token
        };

        tracing::info!(
            %origin,
            generation,
            instruction = %request.instruction_id,
            "dispatching request"
        );
        let outcome = self.call(&request, &token).await;
        self.settle(&origin, generation, &token, request, outcome);
    }

    async fn call(&self, request: &ProcessRequest, token: &CancellationToken) -> ProviderResult<String> {
        // Resolved per request so settings changes apply immediately.
        let provider = self.inner.resolver.resolve().await?;
        provider
            .call_api(&request.text, &request.instruction, token)
            .await
    }

    fn settle(
        &self,
        origin: &OriginId,
        generation: u64,
        token: &CancellationToken,
        request: ProcessRequest,
        outcome: ProviderResult<String>,
    ) {
        let mut sessions = self.sessions();
        let Some(session) = sessions.get_mut(origin) else {
            tracing::debug!(%origin, "origin went away before the request settled");
            return;
        };

        if session
            .in_flight
            .as_ref()
            .is_some_and(|in_flight| in_flight.generation == generation)
        {
            session.in_flight = None;
        }

        if token.is_cancelled() || session.generation != generation {
            tracing::debug!(%origin, generation, "discarding superseded result");
            return;
        }

        let envelope = match outcome {
            Ok(result) => Envelope::Processed(ProcessedText {
                operation: request.operation,
                instruction_id: request.instruction_id,
                original_text: request.text,
                result,
            }),
            Err(e) if e.is_abort() => return,
            Err(e) => {
                tracing::info!(%origin, error = %e, "request failed");
                Envelope::Error(ErrorReport::new(e.to_string(), Some(request.operation)))
            }
        };

        if let Err(e) = envelope.validate() {
            tracing::warn!(%origin, error = %e, "refusing to send invalid envelope");
            return;
        }
        if session.sink.send(envelope).is_err() {
            tracing::debug!(%origin, "origin stopped listening");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ProviderError;
    use crate::providers::configs::{ProviderConfig, ProviderType, ProvidersConfig};
    use crate::providers::factory::StoreResolver;
    use crate::providers::mock::{MockProvider, MockResolver, RecordedCall};
    use crate::store::{save_providers_config, MemoryStore};
    use serde_json::{json, Value};
    use tokio::sync::mpsc::error::TryRecvError;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Default)]
    struct RecordingOpener {
        opened: Mutex<Vec<OriginId>>,
    }

    impl SettingsOpener for RecordingOpener {
        fn open_settings(&self, origin: &OriginId) {
            self.opened.lock().unwrap().push(origin.clone());
        }
    }

    fn request(text: &str) -> ProcessRequest {
        ProcessRequest {
            text: text.to_string(),
            instruction: "Fix the grammar".to_string(),
            operation: "Fix Grammar".to_string(),
            instruction_id: "fixGrammar".to_string(),
        }
    }

    fn coordinator(provider: &MockProvider) -> Coordinator {
        Coordinator::new(
            Arc::new(MockResolver::new(provider.clone())),
            Arc::new(NoopSettingsOpener),
        )
    }

    async fn drain_quietly(rx: &mut mpsc::UnboundedReceiver<Envelope>) {
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test(start_paused = true)]
    async fn test_result_is_delivered_to_origin() {
        let provider = MockProvider::replying("The cat sat.");
        let coordinator = coordinator(&provider);
        let origin = OriginId::from("tab-1");
        let mut rx = coordinator.connect(origin.clone());

        coordinator.dispatch(&origin, Envelope::CallBackend(request("teh cat sat")));

        let envelope = rx.recv().await.unwrap();
        assert_eq!(
            envelope,
            Envelope::Processed(ProcessedText {
                operation: "Fix Grammar".into(),
                instruction_id: "fixGrammar".into(),
                original_text: "teh cat sat".into(),
                result: "The cat sat.".into(),
            })
        );
        assert_eq!(
            provider.calls(),
            vec![RecordedCall {
                text: "teh cat sat".into(),
                instruction: "Fix the grammar".into(),
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_triggers_within_window_make_one_call_with_last_payload() {
        let provider = MockProvider::replying("ok");
        let coordinator = coordinator(&provider);
        let origin = OriginId::from("tab-1");
        let mut rx = coordinator.connect(origin.clone());

        for text in ["first", "second", "third"] {
            coordinator.dispatch(&origin, Envelope::CallBackend(request(text)));
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        let Envelope::Processed(processed) = rx.recv().await.unwrap() else {
            panic!("expected a result");
        };
        assert_eq!(processed.original_text, "third");
        assert_eq!(provider.calls().len(), 1);
        assert_eq!(provider.calls()[0].text, "third");
        drain_quietly(&mut rx).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_is_sent_before_the_window_expires() {
        let provider = MockProvider::replying("ok");
        let coordinator = coordinator(&provider);
        let origin = OriginId::from("tab-1");
        let _rx = coordinator.connect(origin.clone());

        coordinator.dispatch(&origin, Envelope::CallBackend(request("text")));
        tokio::time::sleep(Duration::from_millis(299)).await;
        assert!(provider.calls().is_empty());
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(provider.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_in_flight_request_is_silent() {
        let provider = MockProvider::replying("ok").with_delay(Duration::from_secs(1));
        let coordinator = coordinator(&provider);
        let origin = OriginId::from("tab-1");
        let mut rx = coordinator.connect(origin.clone());

        coordinator.dispatch(&origin, Envelope::CallBackend(request("old")));
        // "old" fires at 300ms and is still waiting on the backend.
        tokio::time::sleep(Duration::from_millis(400)).await;
        coordinator.dispatch(&origin, Envelope::CallBackend(request("new")));

        let Envelope::Processed(processed) = rx.recv().await.unwrap() else {
            panic!("expected a result");
        };
        assert_eq!(processed.original_text, "new");
        assert_eq!(provider.calls().len(), 2);
        drain_quietly(&mut rx).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_result_settling_during_newer_debounce_is_discarded() {
        let provider = MockProvider::replying("ok").with_delay(Duration::from_millis(200));
        let coordinator = coordinator(&provider);
        let origin = OriginId::from("tab-1");
        let mut rx = coordinator.connect(origin.clone());

        coordinator.dispatch(&origin, Envelope::CallBackend(request("old")));
        // "old" fires at 300ms and would settle at 500ms.
        tokio::time::sleep(Duration::from_millis(400)).await;
        coordinator.dispatch(&origin, Envelope::CallBackend(request("new")));

        let Envelope::Processed(processed) = rx.recv().await.unwrap() else {
            panic!("expected a result");
        };
        assert_eq!(processed.original_text, "new");
        drain_quietly(&mut rx).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_failure_is_silent() {
        let provider = MockProvider::failing(ProviderError::Api("quota exceeded".into()))
            .with_delay(Duration::from_millis(200));
        let coordinator = coordinator(&provider);
        let origin = OriginId::from("tab-1");
        let mut rx = coordinator.connect(origin.clone());

        coordinator.dispatch(&origin, Envelope::CallBackend(request("old")));
        // "old" fires at 300ms and fails at 500ms, while "new" is debouncing.
        tokio::time::sleep(Duration::from_millis(400)).await;
        coordinator.dispatch(&origin, Envelope::CallBackend(request("new")));

        assert_eq!(
            rx.recv().await,
            Some(Envelope::Error(ErrorReport::new(
                "quota exceeded",
                Some("Fix Grammar".into())
            )))
        );
        assert_eq!(provider.calls().len(), 2);
        drain_quietly(&mut rx).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnected_session_still_cancels_its_in_flight_call() {
        let provider = MockProvider::replying("ok")
            .with_delay(Duration::from_millis(1000))
            .ignoring_cancel();
        let coordinator = coordinator(&provider);
        let origin = OriginId::from("tab-1");
        let _old_rx = coordinator.connect(origin.clone());

        coordinator.dispatch(&origin, Envelope::CallBackend(request("old")));
        // "old" fires at 300ms and runs until 1300ms.
        tokio::time::sleep(Duration::from_millis(400)).await;
        let mut rx = coordinator.connect(origin.clone());
        coordinator.dispatch(&origin, Envelope::CallBackend(request("a")));
        // "a" fires at 700ms; "old" settles at 1300ms while "a" is in flight.
        tokio::time::sleep(Duration::from_millis(950)).await;
        coordinator.dispatch(&origin, Envelope::CallBackend(request("b")));

        let Envelope::Processed(processed) = rx.recv().await.unwrap() else {
            panic!("expected a result");
        };
        assert_eq!(processed.original_text, "b");
        assert_eq!(provider.cancelled(), vec!["old".to_string(), "a".to_string()]);
        drain_quietly(&mut rx).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_session_id_leaves_reconnected_origin_alone() {
        let provider = MockProvider::replying("ok");
        let coordinator = coordinator(&provider);
        let origin = OriginId::from("tab-1");
        let (old_id, _old_rx) = coordinator.open(origin.clone());
        let (new_id, mut rx) = coordinator.open(origin.clone());
        assert_ne!(old_id, new_id);

        assert!(!coordinator.disconnect_session(&origin, old_id));
        assert!(coordinator.is_connected(&origin));

        coordinator.dispatch(&origin, Envelope::CallBackend(request("text")));
        assert!(matches!(rx.recv().await, Some(Envelope::Processed(_))));

        assert!(coordinator.disconnect_session(&origin, new_id));
        assert!(!coordinator.is_connected(&origin));
    }

    fn chat_reply(content: &str) -> Value {
        json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] })
    }

    async fn mount_chat(server: &MockServer, text: &str, reply: &str, delay: Duration) {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({
                "messages": [
                    { "role": "system", "content": "Fix the grammar" },
                    { "role": "user", "content": text }
                ]
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(chat_reply(reply))
                    .set_delay(delay),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_superseded_http_call_is_abandoned_silently() {
        let server = MockServer::start().await;
        mount_chat(&server, "old", "old result", Duration::from_secs(2)).await;
        mount_chat(&server, "new", "new result", Duration::ZERO).await;

        let store = Arc::new(MemoryStore::new());
        let mut configs = ProvidersConfig {
            active_provider: ProviderType::OpenAi,
            ..Default::default()
        };
        configs.upsert(&ProviderConfig {
            api_key: "sk-test".to_string(),
            base_url: server.uri(),
            ..ProviderConfig::default_for(ProviderType::OpenAi)
        });
        save_providers_config(store.as_ref(), configs).await.unwrap();

        let coordinator = Coordinator::with_debounce(
            Arc::new(StoreResolver::new(store)),
            Arc::new(NoopSettingsOpener),
            Duration::from_millis(10),
        );
        let origin = OriginId::from("tab-1");
        let mut rx = coordinator.connect(origin.clone());

        coordinator.dispatch(&origin, Envelope::CallBackend(request("old")));
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
        coordinator.dispatch(&origin, Envelope::CallBackend(request("new")));

        let envelope = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("no result for the newer trigger")
            .unwrap();
        let Envelope::Processed(processed) = envelope else {
            panic!("expected a result, got {:?}", envelope);
        };
        assert_eq!(processed.original_text, "new");
        assert_eq!(processed.result, "new result");

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test(start_paused = true)]
    async fn test_origins_do_not_supersede_each_other() {
        let provider = MockProvider::replying("ok");
        let coordinator = coordinator(&provider);
        let a = OriginId::from("tab-a");
        let b = OriginId::from("tab-b");
        let mut rx_a = coordinator.connect(a.clone());
        let mut rx_b = coordinator.connect(b.clone());

        coordinator.dispatch(&a, Envelope::CallBackend(request("from a")));
        coordinator.dispatch(&b, Envelope::CallBackend(request("from b")));

        assert!(matches!(rx_a.recv().await, Some(Envelope::Processed(p)) if p.original_text == "from a"));
        assert!(matches!(rx_b.recv().await, Some(Envelope::Processed(p)) if p.original_text == "from b"));
        assert_eq!(provider.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_configuration_error_becomes_error_envelope_without_call() {
        let coordinator = Coordinator::new(
            Arc::new(MockResolver::failing(ProviderError::Configuration(
                "API key is required for Gemini".into(),
            ))),
            Arc::new(NoopSettingsOpener),
        );
        let origin = OriginId::from("tab-1");
        let mut rx = coordinator.connect(origin.clone());

        coordinator.dispatch(&origin, Envelope::CallBackend(request("teh cat sat")));

        let Envelope::Error(report) = rx.recv().await.unwrap() else {
            panic!("expected an error");
        };
        assert_eq!(report.message(), "API key is required for Gemini");
        assert_eq!(report.operation.as_deref(), Some("Fix Grammar"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backend_failure_becomes_error_envelope() {
        let provider = MockProvider::failing(ProviderError::Api("quota exceeded".into()));
        let coordinator = coordinator(&provider);
        let origin = OriginId::from("tab-1");
        let mut rx = coordinator.connect(origin.clone());

        coordinator.dispatch(&origin, Envelope::CallBackend(request("text")));

        assert_eq!(
            rx.recv().await,
            Some(Envelope::Error(ErrorReport::new(
                "quota exceeded",
                Some("Fix Grammar".into())
            )))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_cancels_pending_trigger() {
        let provider = MockProvider::replying("ok");
        let coordinator = coordinator(&provider);
        let origin = OriginId::from("tab-1");
        let _rx = coordinator.connect(origin.clone());

        coordinator.dispatch(&origin, Envelope::CallBackend(request("text")));
        coordinator.disconnect(&origin);
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(provider.calls().is_empty());
        assert!(!coordinator.is_connected(&origin));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_and_unconnected_payloads_are_dropped() {
        let provider = MockProvider::replying("ok");
        let coordinator = coordinator(&provider);
        let origin = OriginId::from("tab-1");
        let mut rx = coordinator.connect(origin.clone());

        coordinator.receive(&origin, r#"{"action": "ait-callAiApi"}"#);
        coordinator.receive(&origin, "garbage");
        coordinator.receive(
            &OriginId::from("stranger"),
            &Envelope::CallBackend(request("text")).encode().unwrap(),
        );

        drain_quietly(&mut rx).await;
        assert!(provider.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_settings_is_immediate() {
        let opener = Arc::new(RecordingOpener::default());
        let coordinator = Coordinator::new(
            Arc::new(MockResolver::new(MockProvider::replying("ok"))),
            opener.clone(),
        );
        let origin = OriginId::from("tab-1");
        let _rx = coordinator.connect(origin.clone());

        coordinator.receive(&origin, r#"{"action": "ait-openSettingsPage"}"#);
        assert_eq!(*opener.opened.lock().unwrap(), vec![origin]);
    }
}
