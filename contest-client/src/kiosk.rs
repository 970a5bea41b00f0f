//! The kiosk actor: single owner of the pairing session.
//!
//! [`Kiosk::spawn`] starts a task that owns a [`PairingSession`] and is the
//! only place it is ever mutated. Operator intents and network completions
//! all arrive as [`Event`]s on one channel and are applied in order. The
//! actions the session returns are executed as detached tasks that report
//! back through the same channel, tagged with the session token they were
//! issued under, so a completion that outlives its session is recognised
//! and dropped by the state machine.
//!
//! # Example
//!
//! ```ignore
//! let kiosk = Kiosk::spawn(KioskConfig::default(), transport);
//! let mut events = kiosk.subscribe();
//!
//! kiosk.scanned(Category::Climber, "12")?;
//! kiosk.scanned(Category::Bloc, "F3")?;
//!
//! while let Ok(event) = events.recv().await {
//!     println!("{:?}", event);
//! }
//! ```

use std::sync::Arc;

use climbcontest_core::{
    Action, Event, KioskEvent, PairingSession, PairingSlot, RetryPolicy, SessionConfig,
};
use climbcontest_types::{Category, Identifier};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info, warn};

use crate::api::ApiConfig;
use crate::error::ClientError;
use crate::registry::RegistryClient;
use crate::scanner::{CodeFormat, ScanOutcome, Scanner};
use crate::submission::SubmissionEngine;
use crate::transport::Transport;

/// Capacity of the operator event broadcast.
const EVENT_BUFFER: usize = 64;

/// Configuration for a kiosk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KioskConfig {
    /// Pairing session behaviour.
    pub session: SessionConfig,
    /// Server API revision and tagging.
    pub api: ApiConfig,
    /// Submission retry bounds.
    pub retry: RetryPolicy,
    /// Symbology requested from scanners.
    pub scan_format: CodeFormat,
}

impl KioskConfig {
    /// Set the session configuration.
    pub fn with_session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }

    /// Set the API configuration.
    pub fn with_api(mut self, api: ApiConfig) -> Self {
        self.api = api;
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the scan format.
    pub fn with_scan_format(mut self, format: CodeFormat) -> Self {
        self.scan_format = format;
        self
    }
}

/// What happened to a [`KioskHandle::scan`] request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanStatus {
    /// A code was read and handed to the session.
    Submitted(Identifier),
    /// The slot is confirmed or being looked up; the scanner was not started.
    SlotBusy,
    /// The operator backed out of the scan.
    Cancelled,
    /// The scanner reported an error.
    Failed(String),
}

/// The kiosk actor.
pub struct Kiosk<T: Transport> {
    session: PairingSession,
    registry: RegistryClient<T>,
    engine: SubmissionEngine<T>,
    events_in: mpsc::WeakUnboundedSender<Event>,
    state_out: watch::Sender<PairingSession>,
    events_out: broadcast::Sender<KioskEvent>,
}

impl<T: Transport + 'static> Kiosk<T> {
    /// Start a kiosk on the current tokio runtime.
    ///
    /// The actor stops once every [`KioskHandle`] has been dropped.
    pub fn spawn(config: KioskConfig, transport: T) -> KioskHandle {
        let transport = Arc::new(transport);
        let session = PairingSession::new(config.session);

        let (tx, rx) = mpsc::unbounded_channel();
        let (state_out, state) = watch::channel(session.clone());
        let (events_out, _) = broadcast::channel(EVENT_BUFFER);

        let kiosk = Kiosk {
            session,
            registry: RegistryClient::new(Arc::clone(&transport), config.api),
            engine: SubmissionEngine::new(transport, config.api, config.retry),
            events_in: tx.downgrade(),
            state_out,
            events_out: events_out.clone(),
        };
        tokio::spawn(kiosk.run(rx));

        KioskHandle {
            tx,
            state,
            events: events_out,
            scan_format: config.scan_format,
        }
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Event>) {
        debug!("kiosk started (token {})", self.session.token());
        while let Some(event) = rx.recv().await {
            self.apply(event);
        }
        debug!("kiosk stopped");
    }

    fn apply(&mut self, event: Event) {
        let (session, actions) = self.session.clone().on_event(event);
        self.session = session;
        self.state_out.send_replace(self.session.clone());

        for action in actions {
            self.execute(action);
        }
    }

    fn execute(&self, action: Action) {
        match action {
            Action::Resolve {
                category,
                id,
                token,
            } => {
                debug!("looking up {} {}", category, id);
                let registry = self.registry.clone();
                let reply = self.events_in.clone();
                tokio::spawn(async move {
                    let event = match registry.resolve(category, &id, token).await {
                        Ok(entry) => Event::ResolveSucceeded {
                            category,
                            token,
                            entry,
                        },
                        Err(failure) => Event::ResolveFailed {
                            category,
                            token,
                            id,
                            failure,
                        },
                    };
                    deliver(&reply, event);
                });
            }

            Action::Submit {
                climber,
                bloc,
                token,
            } => {
                let engine = self.engine.clone();
                let reply = self.events_in.clone();
                tokio::spawn(async move {
                    let result = engine.submit(&climber, &bloc, token).await;
                    deliver(&reply, Event::SubmitFinished { token, result });
                });
            }

            Action::ScheduleReset { token, delay } => {
                let reply = self.events_in.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    deliver(&reply, Event::ResetTimerFired { token });
                });
            }

            Action::EmitEvent(event) => {
                log_event(&event);
                // No subscribers is fine
                let _ = self.events_out.send(event);
            }
        }
    }
}

fn deliver(reply: &mpsc::WeakUnboundedSender<Event>, event: Event) {
    match reply.upgrade() {
        Some(tx) => {
            let _ = tx.send(event);
        }
        None => debug!("kiosk gone, dropping {:?}", event),
    }
}

fn log_event(event: &KioskEvent) {
    match event {
        KioskEvent::Confirmed { category, entry } => {
            info!("{} confirmed: {}", category, entry.label())
        }
        KioskEvent::NotConfirmed {
            category,
            id,
            failure,
        } => warn!("{} {} not confirmed: {}", category, id, failure),
        KioskEvent::SubmissionStarted => info!("submitting pair"),
        KioskEvent::Registered => info!("pair registered"),
        KioskEvent::SubmissionFailed { result } => warn!("submission failed: {}", result),
        KioskEvent::SessionReset { scope } => info!("session reset ({:?})", scope),
        KioskEvent::ScanIgnored { category, reason } => {
            debug!("{} scan ignored: {:?}", category, reason)
        }
        KioskEvent::StaleResponse { token } => debug!("dropped stale response for {}", token),
    }
}

/// Cloneable handle to a running kiosk.
#[derive(Debug, Clone)]
pub struct KioskHandle {
    tx: mpsc::UnboundedSender<Event>,
    state: watch::Receiver<PairingSession>,
    events: broadcast::Sender<KioskEvent>,
    scan_format: CodeFormat,
}

impl KioskHandle {
    fn send(&self, event: Event) -> Result<(), ClientError> {
        self.tx.send(event).map_err(|_| ClientError::KioskStopped)
    }

    /// Hand a decoded code to the session for `category`.
    ///
    /// Surrounding whitespace is trimmed; an empty code is refused.
    pub fn scanned(&self, category: Category, raw: &str) -> Result<Identifier, ClientError> {
        let id = Identifier::new(raw)?;
        self.send(Event::Scanned {
            category,
            id: id.clone(),
        })?;
        Ok(id)
    }

    /// Run `scanner` for `category` and hand the result to the session.
    ///
    /// The scanner is not started when the slot is already confirmed or
    /// being looked up.
    pub async fn scan(
        &self,
        category: Category,
        scanner: &dyn Scanner,
    ) -> Result<ScanStatus, ClientError> {
        let busy = !matches!(self.state.borrow().slot(category), PairingSlot::Empty);
        if busy {
            return Ok(ScanStatus::SlotBusy);
        }

        match scanner.scan(self.scan_format).await {
            ScanOutcome::Scanned(raw) => self.scanned(category, &raw).map(ScanStatus::Submitted),
            ScanOutcome::Cancelled => Ok(ScanStatus::Cancelled),
            ScanOutcome::Failed(reason) => Ok(ScanStatus::Failed(reason)),
        }
    }

    /// Ask for the confirmed pair to be submitted (manual trigger, or a retry
    /// after a failed submission).
    pub fn submit(&self) -> Result<(), ClientError> {
        self.send(Event::SubmitRequested)
    }

    /// Clear both slots and start a fresh session.
    pub fn reset(&self) -> Result<(), ClientError> {
        self.send(Event::ResetRequested)
    }

    /// Apply new session settings; this always starts a fresh session.
    pub fn update_settings(&self, config: SessionConfig) -> Result<(), ClientError> {
        self.send(Event::SettingsChanged(config))
    }

    /// Copy of the current session.
    pub fn snapshot(&self) -> PairingSession {
        self.state.borrow().clone()
    }

    /// Watch the session for changes.
    pub fn watch(&self) -> watch::Receiver<PairingSession> {
        self.state.clone()
    }

    /// Subscribe to operator events from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<KioskEvent> {
        self.events.subscribe()
    }

    /// Wait until the session satisfies `predicate` and return it.
    pub async fn wait_until(
        &self,
        predicate: impl FnMut(&PairingSession) -> bool,
    ) -> Result<PairingSession, ClientError> {
        let mut state = self.state.clone();
        let session = state
            .wait_for(predicate)
            .await
            .map_err(|_| ClientError::KioskStopped)?;
        Ok(session.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::ScriptedScanner;
    use crate::transport::{MockTransport, TransportError};
    use climbcontest_core::{
        AttemptOutcome, IgnoreReason, ResetScope, SessionStatus, SubmissionResult, SubmitTrigger,
        ValidationFailure,
    };
    use serde_json::json;
    use std::time::Duration;
    use tokio::time::Instant;

    fn climber_ok(transport: &MockTransport) {
        transport.queue_reply(json!({ "success": true, "id": "Alice" }));
    }

    fn bloc_ok(transport: &MockTransport) {
        transport.queue_reply(json!({ "success": true, "id": "Boulder F3" }));
    }

    async fn next_matching(
        events: &mut broadcast::Receiver<KioskEvent>,
        mut want: impl FnMut(&KioskEvent) -> bool,
    ) -> KioskEvent {
        loop {
            let event = events.recv().await.unwrap();
            if want(&event) {
                return event;
            }
        }
    }

    async fn confirm(kiosk: &KioskHandle, category: Category, raw: &str) {
        kiosk.scanned(category, raw).unwrap();
        kiosk
            .wait_until(|s| s.slot(category).is_confirmed())
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn pair_is_registered_then_reset() {
        let transport = MockTransport::new();
        climber_ok(&transport);
        bloc_ok(&transport);
        transport.queue_reply(json!({ "success": true }));

        let kiosk = Kiosk::spawn(KioskConfig::default(), transport.clone());
        let mut events = kiosk.subscribe();
        let first_token = kiosk.snapshot().token();

        confirm(&kiosk, Category::Climber, "12").await;
        assert_eq!(kiosk.snapshot().display_name(Category::Climber), Some("Alice"));
        kiosk.scanned(Category::Bloc, "F3").unwrap();

        next_matching(&mut events, |e| *e == KioskEvent::Registered).await;
        let registered_at = Instant::now();
        assert_eq!(kiosk.snapshot().status(), SessionStatus::Completed);

        let reset = next_matching(&mut events, |e| {
            matches!(e, KioskEvent::SessionReset { .. })
        })
        .await;
        assert_eq!(
            reset,
            KioskEvent::SessionReset {
                scope: ResetScope::Full
            }
        );
        assert!(registered_at.elapsed() >= Duration::from_millis(500));

        let session = kiosk
            .wait_until(|s| s.status() == SessionStatus::Incomplete)
            .await
            .unwrap();
        assert_eq!(session.slot(Category::Climber), &PairingSlot::Empty);
        assert_eq!(session.slot(Category::Bloc), &PairingSlot::Empty);
        assert_ne!(session.token(), first_token);

        let requests = transport.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].0, "/api/v2/contest/climber/name");
        assert_eq!(requests[1].0, "/api/v2/contest/bloc/name");
        assert_eq!(
            requests[2],
            (
                "/api/v2/contest/success".to_string(),
                json!({ "bib": "12", "bloc": "F3" })
            )
        );
    }

    #[tokio::test(start_paused = true)]
    async fn late_lookup_after_reset_is_dropped() {
        let transport = MockTransport::new();
        let gate = transport.queue_gated(json!({ "success": true, "id": "Alice" }));

        let kiosk = Kiosk::spawn(KioskConfig::default(), transport.clone());
        let mut events = kiosk.subscribe();

        kiosk.scanned(Category::Climber, "12").unwrap();
        let pending = kiosk
            .wait_until(|s| matches!(s.slot(Category::Climber), PairingSlot::Pending(_)))
            .await
            .unwrap();

        kiosk.reset().unwrap();
        kiosk
            .wait_until(|s| s.token() != pending.token())
            .await
            .unwrap();

        gate.open();
        let stale = next_matching(&mut events, |e| {
            matches!(e, KioskEvent::StaleResponse { .. })
        })
        .await;
        assert_eq!(
            stale,
            KioskEvent::StaleResponse {
                token: pending.token()
            }
        );
        assert_eq!(kiosk.snapshot().slot(Category::Climber), &PairingSlot::Empty);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_climber_leaves_slot_empty() {
        let transport = MockTransport::new();
        transport.queue_reply(json!({ "success": false }));

        let kiosk = Kiosk::spawn(KioskConfig::default(), transport.clone());
        let mut events = kiosk.subscribe();

        kiosk.scanned(Category::Climber, "999").unwrap();
        let event = next_matching(&mut events, |e| {
            matches!(e, KioskEvent::NotConfirmed { .. })
        })
        .await;

        assert_eq!(
            event,
            KioskEvent::NotConfirmed {
                category: Category::Climber,
                id: Identifier::new("999").unwrap(),
                failure: ValidationFailure::Rejected,
            }
        );
        assert_eq!(kiosk.snapshot().slot(Category::Climber), &PairingSlot::Empty);
    }

    #[tokio::test(start_paused = true)]
    async fn rescanning_a_confirmed_slot_is_ignored() {
        let transport = MockTransport::new();
        climber_ok(&transport);

        let kiosk = Kiosk::spawn(KioskConfig::default(), transport.clone());
        let mut events = kiosk.subscribe();
        confirm(&kiosk, Category::Climber, "12").await;

        kiosk.scanned(Category::Climber, "13").unwrap();
        let event = next_matching(&mut events, |e| {
            matches!(e, KioskEvent::ScanIgnored { .. })
        })
        .await;

        assert_eq!(
            event,
            KioskEvent::ScanIgnored {
                category: Category::Climber,
                reason: IgnoreReason::AlreadyConfirmed,
            }
        );
        assert_eq!(transport.request_count(), 1);
        assert_eq!(
            kiosk.snapshot().slot(Category::Climber).entry().map(|e| e.id.as_str()),
            Some("12")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failed_submission_keeps_pair_for_manual_retry() {
        let transport = MockTransport::new();
        climber_ok(&transport);
        bloc_ok(&transport);
        transport.queue_failure(TransportError::HttpStatus(502));
        transport.queue_failure(TransportError::HttpStatus(502));

        let config =
            KioskConfig::default().with_retry(RetryPolicy::new(2, Duration::from_millis(10)));
        let kiosk = Kiosk::spawn(config, transport.clone());
        let mut events = kiosk.subscribe();

        confirm(&kiosk, Category::Climber, "12").await;
        kiosk.scanned(Category::Bloc, "F3").unwrap();

        let failed = next_matching(&mut events, |e| {
            matches!(e, KioskEvent::SubmissionFailed { .. })
        })
        .await;
        assert_eq!(
            failed,
            KioskEvent::SubmissionFailed {
                result: SubmissionResult::GaveUp {
                    attempts: 2,
                    last: AttemptOutcome::TransportError(
                        TransportError::HttpStatus(502).to_string()
                    ),
                }
            }
        );
        let session = kiosk.snapshot();
        assert_eq!(session.status(), SessionStatus::Ready);
        assert!(session.slot(Category::Climber).is_confirmed());
        assert!(session.slot(Category::Bloc).is_confirmed());

        transport.queue_reply(json!({ "success": true }));
        kiosk.submit().unwrap();
        next_matching(&mut events, |e| *e == KioskEvent::Registered).await;
        assert_eq!(transport.request_count(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_during_submission_does_not_start_a_second_one() {
        const SUBMIT: &str = "/api/v2/contest/success";
        let transport = MockTransport::new();
        climber_ok(&transport);
        bloc_ok(&transport);
        let gate = transport.queue_gated(json!({ "success": true }));

        let kiosk = Kiosk::spawn(KioskConfig::default(), transport.clone());
        let mut events = kiosk.subscribe();

        confirm(&kiosk, Category::Climber, "12").await;
        kiosk.scanned(Category::Bloc, "F3").unwrap();
        next_matching(&mut events, |e| *e == KioskEvent::SubmissionStarted).await;
        while transport.count_for(SUBMIT) == 0 {
            tokio::task::yield_now().await;
        }

        // The first registration hangs; the operator starts over
        kiosk.reset().unwrap();
        transport.reset();
        climber_ok(&transport);
        bloc_ok(&transport);
        transport.queue_reply(json!({ "success": true }));

        confirm(&kiosk, Category::Climber, "13").await;
        confirm(&kiosk, Category::Bloc, "F4").await;
        assert_eq!(kiosk.snapshot().status(), SessionStatus::Submitting);
        assert_eq!(transport.count_for(SUBMIT), 0);

        gate.open();
        next_matching(&mut events, |e| matches!(e, KioskEvent::StaleResponse { .. })).await;
        next_matching(&mut events, |e| *e == KioskEvent::Registered).await;

        assert_eq!(transport.count_for(SUBMIT), 1);
        assert_eq!(
            transport.last_request(),
            Some((SUBMIT.to_string(), json!({ "bib": "13", "bloc": "F4" })))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn manual_trigger_waits_for_submit() {
        let transport = MockTransport::new();
        climber_ok(&transport);
        bloc_ok(&transport);
        transport.queue_reply(json!({ "success": true }));

        let session = SessionConfig::default().with_submit_trigger(SubmitTrigger::Manual);
        let kiosk = Kiosk::spawn(KioskConfig::default().with_session(session), transport.clone());
        let mut events = kiosk.subscribe();

        confirm(&kiosk, Category::Climber, "12").await;
        confirm(&kiosk, Category::Bloc, "F3").await;
        assert_eq!(kiosk.snapshot().status(), SessionStatus::Ready);
        assert_eq!(transport.request_count(), 2);

        kiosk.submit().unwrap();
        next_matching(&mut events, |e| *e == KioskEvent::Registered).await;
        assert_eq!(transport.request_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn auto_evaluate_keeps_climber() {
        let transport = MockTransport::new();
        climber_ok(&transport);
        bloc_ok(&transport);
        transport.queue_reply(json!({ "success": true }));

        let session = SessionConfig::default().with_auto_evaluate(true);
        let kiosk = Kiosk::spawn(KioskConfig::default().with_session(session), transport.clone());
        let mut events = kiosk.subscribe();

        confirm(&kiosk, Category::Climber, "12").await;
        kiosk.scanned(Category::Bloc, "F3").unwrap();

        let reset = next_matching(&mut events, |e| {
            matches!(e, KioskEvent::SessionReset { .. })
        })
        .await;
        assert_eq!(
            reset,
            KioskEvent::SessionReset {
                scope: ResetScope::BlocOnly
            }
        );

        let session = kiosk.snapshot();
        assert_eq!(session.display_name(Category::Climber), Some("Alice"));
        assert_eq!(session.slot(Category::Bloc), &PairingSlot::Empty);
    }

    #[tokio::test(start_paused = true)]
    async fn settings_change_starts_fresh_session() {
        let transport = MockTransport::new();
        climber_ok(&transport);

        let kiosk = Kiosk::spawn(KioskConfig::default(), transport.clone());
        confirm(&kiosk, Category::Climber, "12").await;
        let before = kiosk.snapshot().token();

        let config = SessionConfig::default().with_auto_evaluate(true);
        kiosk.update_settings(config).unwrap();
        let session = kiosk.wait_until(|s| s.token() != before).await.unwrap();

        assert_eq!(session.slot(Category::Climber), &PairingSlot::Empty);
        assert!(session.config().auto_evaluate);
    }

    #[tokio::test(start_paused = true)]
    async fn scan_uses_scanner_for_empty_slot() {
        let transport = MockTransport::new();
        climber_ok(&transport);

        let kiosk = Kiosk::spawn(KioskConfig::default(), transport.clone());
        let scanner = ScriptedScanner::default();
        scanner.push_code(" 12 ");

        let status = kiosk.scan(Category::Climber, &scanner).await.unwrap();
        assert_eq!(status, ScanStatus::Submitted(Identifier::new("12").unwrap()));
        assert_eq!(scanner.requested_formats(), vec![CodeFormat::QrCode]);

        kiosk
            .wait_until(|s| s.slot(Category::Climber).is_confirmed())
            .await
            .unwrap();

        // Confirmed slot: the scanner is not even started
        let status = kiosk.scan(Category::Climber, &scanner).await.unwrap();
        assert_eq!(status, ScanStatus::SlotBusy);
        assert_eq!(scanner.requested_formats().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn scan_reports_cancel_and_bad_codes() {
        let transport = MockTransport::new();
        let kiosk = Kiosk::spawn(KioskConfig::default(), transport.clone());
        let scanner = ScriptedScanner::new([
            ScanOutcome::Cancelled,
            ScanOutcome::Failed("camera busy".into()),
            ScanOutcome::Scanned("   ".into()),
        ]);

        assert_eq!(
            kiosk.scan(Category::Bloc, &scanner).await.unwrap(),
            ScanStatus::Cancelled
        );
        assert_eq!(
            kiosk.scan(Category::Bloc, &scanner).await.unwrap(),
            ScanStatus::Failed("camera busy".into())
        );
        assert!(matches!(
            kiosk.scan(Category::Bloc, &scanner).await,
            Err(ClientError::InvalidIdentifier(_))
        ));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn actor_stops_when_handles_dropped() {
        let kiosk = Kiosk::spawn(KioskConfig::default(), MockTransport::new());
        let mut state = kiosk.watch();
        drop(kiosk);

        assert!(state.changed().await.is_err());
    }
}
