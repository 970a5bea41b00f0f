//! Pairing state machine for the check-in kiosk.
//!
//! A [`PairingSession`] holds the climber and bloc slots for one kiosk run.
//! It takes events as input and produces a new session plus a list of
//! actions to execute. The actual I/O (registry lookups, registration
//! requests, the display delay before a reset) is performed by
//! contest-client, not by this module.
//!
//! Every action that leads to a network call carries the session token it
//! was issued under. Completions report that token back, and any completion
//! whose token no longer matches the session is dropped.

use std::time::Duration;

use climbcontest_types::{Category, Identifier, SessionToken};

use crate::outcome::{SubmissionResult, ValidationFailure};
use crate::settings::{SessionConfig, SubmitTrigger};

/// An identifier the registry has confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntry {
    /// The scanned identifier.
    pub id: Identifier,
    /// Display name returned by the registry, if any.
    pub display_name: Option<String>,
}

impl ResolvedEntry {
    /// Label for the operator: the display name, or the raw id.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(self.id.as_str())
    }
}

/// One of the two pairing slots.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PairingSlot {
    /// Nothing scanned yet.
    #[default]
    Empty,
    /// Scanned, registry lookup in flight.
    Pending(Identifier),
    /// Validated by the registry.
    Confirmed(ResolvedEntry),
}

impl PairingSlot {
    /// Check if the registry has confirmed this slot.
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed(_))
    }

    /// The confirmed entry, if any.
    pub fn entry(&self) -> Option<&ResolvedEntry> {
        match self {
            Self::Confirmed(entry) => Some(entry),
            _ => None,
        }
    }
}

/// Session-level status derived from the slots and the submission phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// At least one slot is not confirmed.
    Incomplete,
    /// Both slots confirmed, no submission in flight.
    Ready,
    /// Registration request in flight.
    Submitting,
    /// Registration accepted; waiting for the post-outcome reset.
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Submitting,
    Completed,
}

/// How much of the session a reset cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetScope {
    /// Both slots cleared.
    Full,
    /// Only the bloc slot cleared; the climber stays.
    BlocOnly,
}

/// Why a scan did not start a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The slot already holds a confirmed identifier.
    AlreadyConfirmed,
    /// A lookup for this slot is still in flight.
    ResolveInFlight,
}

/// Pairing session - NO I/O, just state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingSession {
    climber: PairingSlot,
    bloc: PairingSlot,
    token: SessionToken,
    config: SessionConfig,
    phase: Phase,
    /// Token of the registration still running, if any. Survives resets,
    /// so it may belong to an earlier session.
    in_flight: Option<SessionToken>,
}

impl PairingSession {
    /// Create an empty session with a fresh token.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            climber: PairingSlot::Empty,
            bloc: PairingSlot::Empty,
            token: SessionToken::new(),
            config,
            phase: Phase::Idle,
            in_flight: None,
        }
    }

    /// The slot for a category.
    pub fn slot(&self, category: Category) -> &PairingSlot {
        match category {
            Category::Climber => &self.climber,
            Category::Bloc => &self.bloc,
        }
    }

    fn slot_mut(&mut self, category: Category) -> &mut PairingSlot {
        match category {
            Category::Climber => &mut self.climber,
            Category::Bloc => &mut self.bloc,
        }
    }

    /// Resolved display name for a category, if confirmed with one.
    pub fn display_name(&self, category: Category) -> Option<&str> {
        self.slot(category)
            .entry()
            .and_then(|entry| entry.display_name.as_deref())
    }

    /// Current correlation token.
    pub fn token(&self) -> SessionToken {
        self.token
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Derived session status.
    pub fn status(&self) -> SessionStatus {
        match self.phase {
            Phase::Submitting => SessionStatus::Submitting,
            Phase::Completed => SessionStatus::Completed,
            // A registration from before the last reset is still running
            Phase::Idle if self.both_confirmed() && self.in_flight.is_some() => {
                SessionStatus::Submitting
            }
            Phase::Idle if self.both_confirmed() => SessionStatus::Ready,
            Phase::Idle => SessionStatus::Incomplete,
        }
    }

    fn both_confirmed(&self) -> bool {
        self.climber.is_confirmed() && self.bloc.is_confirmed()
    }

    /// Process an event and return the new session plus actions to execute.
    ///
    /// This is a pure function apart from token rotation. The caller
    /// (contest-client) is responsible for executing the returned actions.
    pub fn on_event(mut self, event: Event) -> (Self, Vec<Action>) {
        let mut actions = Vec::new();

        match event {
            Event::Scanned { category, id } => match self.slot(category) {
                PairingSlot::Confirmed(_) => actions.push(Action::EmitEvent(
                    KioskEvent::ScanIgnored {
                        category,
                        reason: IgnoreReason::AlreadyConfirmed,
                    },
                )),
                PairingSlot::Pending(_) => actions.push(Action::EmitEvent(
                    KioskEvent::ScanIgnored {
                        category,
                        reason: IgnoreReason::ResolveInFlight,
                    },
                )),
                PairingSlot::Empty => {
                    *self.slot_mut(category) = PairingSlot::Pending(id.clone());
                    actions.push(Action::Resolve {
                        category,
                        id,
                        token: self.token,
                    });
                }
            },

            Event::ResolveSucceeded {
                category,
                token,
                entry,
            } => {
                if !self.awaits(category, token, &entry.id) {
                    actions.push(Action::EmitEvent(KioskEvent::StaleResponse { token }));
                    return (self, actions);
                }
                *self.slot_mut(category) = PairingSlot::Confirmed(entry.clone());
                actions.push(Action::EmitEvent(KioskEvent::Confirmed { category, entry }));
                if self.config.submit_trigger == SubmitTrigger::Auto {
                    self.start_submission(&mut actions);
                }
            }

            Event::ResolveFailed {
                category,
                token,
                id,
                failure,
            } => {
                if !self.awaits(category, token, &id) {
                    actions.push(Action::EmitEvent(KioskEvent::StaleResponse { token }));
                    return (self, actions);
                }
                *self.slot_mut(category) = PairingSlot::Empty;
                actions.push(Action::EmitEvent(KioskEvent::NotConfirmed {
                    category,
                    id,
                    failure,
                }));
            }

            Event::SubmitRequested => self.start_submission(&mut actions),

            Event::SubmitFinished { token, result } => {
                // Only one registration runs at a time, so this one is done
                self.in_flight = None;
                if token != self.token || self.phase != Phase::Submitting {
                    actions.push(Action::EmitEvent(KioskEvent::StaleResponse { token }));
                    // A pair confirmed meanwhile was held back; send it now
                    if self.config.submit_trigger == SubmitTrigger::Auto {
                        self.start_submission(&mut actions);
                    }
                    return (self, actions);
                }
                if result.is_accepted() {
                    self.phase = Phase::Completed;
                    actions.push(Action::EmitEvent(KioskEvent::Registered));
                    actions.push(Action::ScheduleReset {
                        token,
                        delay: self.config.success_display,
                    });
                } else {
                    // Slots stay confirmed so the operator can retry without rescanning
                    self.phase = Phase::Idle;
                    actions.push(Action::EmitEvent(KioskEvent::SubmissionFailed { result }));
                }
            }

            Event::ResetTimerFired { token } => {
                if token == self.token && self.phase == Phase::Completed {
                    let scope = if self.config.auto_evaluate {
                        ResetScope::BlocOnly
                    } else {
                        ResetScope::Full
                    };
                    self.reset(scope);
                    actions.push(Action::EmitEvent(KioskEvent::SessionReset { scope }));
                }
            }

            Event::ResetRequested => {
                self.reset(ResetScope::Full);
                actions.push(Action::EmitEvent(KioskEvent::SessionReset {
                    scope: ResetScope::Full,
                }));
            }

            Event::SettingsChanged(config) => {
                self.config = config;
                self.reset(ResetScope::Full);
                actions.push(Action::EmitEvent(KioskEvent::SessionReset {
                    scope: ResetScope::Full,
                }));
            }
        }

        (self, actions)
    }

    /// Whether a resolve completion still belongs to this session.
    fn awaits(&self, category: Category, token: SessionToken, id: &Identifier) -> bool {
        token == self.token && matches!(self.slot(category), PairingSlot::Pending(p) if p == id)
    }

    fn start_submission(&mut self, actions: &mut Vec<Action>) {
        if self.phase != Phase::Idle || self.in_flight.is_some() {
            return;
        }
        let (Some(climber), Some(bloc)) = (self.climber.entry(), self.bloc.entry()) else {
            return;
        };
        actions.push(Action::Submit {
            climber: climber.id.clone(),
            bloc: bloc.id.clone(),
            token: self.token,
        });
        self.phase = Phase::Submitting;
        self.in_flight = Some(self.token);
        actions.push(Action::EmitEvent(KioskEvent::SubmissionStarted));
    }

    fn reset(&mut self, scope: ResetScope) {
        if scope == ResetScope::Full {
            self.climber = PairingSlot::Empty;
        }
        self.bloc = PairingSlot::Empty;
        self.phase = Phase::Idle;
        self.token = SessionToken::new();
    }
}

impl Default for PairingSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

/// Inputs to the pairing session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Operator scanned a code for a slot.
    Scanned {
        /// Slot the scan is meant for.
        category: Category,
        /// Scanned identifier.
        id: Identifier,
    },
    /// Registry confirmed an identifier.
    ResolveSucceeded {
        /// Slot the lookup was for.
        category: Category,
        /// Token the lookup was issued under.
        token: SessionToken,
        /// Confirmed entry.
        entry: ResolvedEntry,
    },
    /// Registry rejected an identifier or could not be reached.
    ResolveFailed {
        /// Slot the lookup was for.
        category: Category,
        /// Token the lookup was issued under.
        token: SessionToken,
        /// Identifier that failed.
        id: Identifier,
        /// Failure reason.
        failure: ValidationFailure,
    },
    /// Operator asked to submit the pair.
    SubmitRequested,
    /// The submission loop finished.
    SubmitFinished {
        /// Token the submission was issued under.
        token: SessionToken,
        /// Terminal result.
        result: SubmissionResult,
    },
    /// The post-acceptance display delay elapsed.
    ResetTimerFired {
        /// Token the timer was scheduled under.
        token: SessionToken,
    },
    /// Operator pressed reset.
    ResetRequested,
    /// Settings changed; starts a fresh session.
    SettingsChanged(SessionConfig),
}

/// Actions to be executed by contest-client.
///
/// These are instructions, not side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Validate an identifier against the registry.
    Resolve {
        /// Slot being filled.
        category: Category,
        /// Identifier to validate.
        id: Identifier,
        /// Token to report back with the result.
        token: SessionToken,
    },
    /// Run the submission loop for the confirmed pair.
    Submit {
        /// Confirmed climber.
        climber: Identifier,
        /// Confirmed bloc.
        bloc: Identifier,
        /// Token to report back with the result.
        token: SessionToken,
    },
    /// Fire [`Event::ResetTimerFired`] after a delay.
    ScheduleReset {
        /// Token to report back.
        token: SessionToken,
        /// How long to wait.
        delay: Duration,
    },
    /// Emit an event to the operator interface.
    EmitEvent(KioskEvent),
}

/// Events emitted to the operator interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KioskEvent {
    /// A scan was ignored.
    ScanIgnored {
        /// Slot the scan was meant for.
        category: Category,
        /// Why it was ignored.
        reason: IgnoreReason,
    },
    /// An identifier was confirmed.
    Confirmed {
        /// Slot now confirmed.
        category: Category,
        /// Confirmed entry.
        entry: ResolvedEntry,
    },
    /// An identifier was not confirmed; the operator should rescan.
    NotConfirmed {
        /// Slot left empty.
        category: Category,
        /// Identifier that failed.
        id: Identifier,
        /// Failure reason.
        failure: ValidationFailure,
    },
    /// A registration request went out.
    SubmissionStarted,
    /// The pair was registered.
    Registered,
    /// Registration failed; slots are kept.
    SubmissionFailed {
        /// Terminal result.
        result: SubmissionResult,
    },
    /// A response arrived for an outdated session and was dropped.
    StaleResponse {
        /// Token the response carried.
        token: SessionToken,
    },
    /// Slots were cleared.
    SessionReset {
        /// What was cleared.
        scope: ResetScope,
    },
}
