use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Screen-time state of the current login session
///
/// `Default` is the canonical inactive state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub session_active: bool,
    /// Start of the current accumulation window; `None` iff inactive
    pub screen_time_started: Option<DateTime<Utc>>,
    /// Cumulative active time for the session, as last reported by the ticker
    pub total_screen_time_ms: u64,
    /// Time accumulated before the current window began
    pub carried_screen_time_ms: u64,
    /// Most recent break, or session start if no break yet
    pub last_break_time: Option<DateTime<Utc>>,
    /// An alert has been raised and not yet acknowledged
    pub break_alert_shown: bool,
}

/// Alert sub-state while a session is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertState {
    NoAlert,
    AlertPending,
}

/// Every mutation of [`SessionState`] is one of these
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionCommand {
    Start,
    UpdateElapsed(u64),
    SetAlert(bool),
    TakeBreak,
    ResetWindow,
    End,
}

impl SessionState {
    fn started(now: DateTime<Utc>) -> Self {
        Self {
            session_active: true,
            screen_time_started: Some(now),
            total_screen_time_ms: 0,
            carried_screen_time_ms: 0,
            last_break_time: Some(now),
            break_alert_shown: false,
        }
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.session_active
    }

    /// `None` when no session is active
    #[must_use]
    pub const fn alert_state(&self) -> Option<AlertState> {
        if !self.session_active {
            None
        } else if self.break_alert_shown {
            Some(AlertState::AlertPending)
        } else {
            Some(AlertState::NoAlert)
        }
    }

    /// Active time as of `now`: carried time plus the length of the current window.
    ///
    /// Returns `None` when inactive. A clock that stepped backwards yields the
    /// carried time alone.
    #[must_use]
    pub fn elapsed_at(&self, now: DateTime<Utc>) -> Option<u64> {
        let started = self.screen_time_started.filter(|_| self.session_active)?;
        let window_ms = u64::try_from(now.signed_duration_since(started).num_milliseconds())
            .unwrap_or(0);
        Some(self.carried_screen_time_ms.saturating_add(window_ms))
    }

    /// Time since the last break, `None` when inactive
    #[must_use]
    pub fn since_last_break(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        let last = self.last_break_time.filter(|_| self.session_active)?;
        Some(now.signed_duration_since(last))
    }

    /// Structural invariants that hold after every transition
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        if self.session_active {
            self.screen_time_started.is_some()
                && self.last_break_time.is_some()
                && self.carried_screen_time_ms <= self.total_screen_time_ms
        } else {
            *self == Self::default()
        }
    }
}

/// Apply one command to a state, producing the next state.
///
/// Pure: the caller supplies `now`. Commands that require an active session
/// return the input unchanged when the session is inactive, which is what
/// makes a late ticker callback after `End` harmless.
#[must_use]
pub fn reduce(state: &SessionState, command: SessionCommand, now: DateTime<Utc>) -> SessionState {
    match command {
        SessionCommand::Start => {
            if state.session_active {
                state.clone()
            } else {
                SessionState::started(now)
            }
        }
        SessionCommand::UpdateElapsed(ms) => {
            // Regressions come from out-of-order or stale ticks
            if state.session_active && ms >= state.total_screen_time_ms {
                SessionState {
                    total_screen_time_ms: ms,
                    ..state.clone()
                }
            } else {
                state.clone()
            }
        }
        SessionCommand::SetAlert(flag) => {
            if state.session_active {
                SessionState {
                    break_alert_shown: flag,
                    ..state.clone()
                }
            } else {
                state.clone()
            }
        }
        SessionCommand::TakeBreak => {
            if state.session_active {
                SessionState {
                    screen_time_started: Some(now),
                    carried_screen_time_ms: state.total_screen_time_ms,
                    last_break_time: Some(now),
                    break_alert_shown: false,
                    ..state.clone()
                }
            } else {
                state.clone()
            }
        }
        SessionCommand::ResetWindow => {
            if state.session_active {
                SessionState {
                    screen_time_started: Some(now),
                    total_screen_time_ms: 0,
                    carried_screen_time_ms: 0,
                    last_break_time: Some(now),
                    break_alert_shown: false,
                    ..state.clone()
                }
            } else {
                state.clone()
            }
        }
        SessionCommand::End => SessionState::default(),
    }
}
