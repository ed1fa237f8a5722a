use crate::{
    clock::{Clock, SystemClock},
    policy::BreakPolicy,
    presenter::AlertView,
    state::{reduce, SessionCommand, SessionState},
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Store shared between the lifecycle binder, the ticker and IPC handlers
pub type SharedStore = Arc<Mutex<SessionStore>>;

/// Result of a single ticker step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No session; the tick was discarded
    Inactive,
    /// Elapsed time recorded, no new alert
    Updated { total_screen_time_ms: u64 },
    /// This tick raised the break alert
    AlertRaised(AlertView),
}

/// Sole owner and writer of the session state
///
/// Every mutation goes through [`SessionStore::dispatch`], which runs the
/// pure reducer with the store's clock.
pub struct SessionStore {
    state: SessionState,
    clock: Arc<dyn Clock>,
    session_id: Option<Uuid>,
}

impl SessionStore {
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: SessionState::default(),
            clock,
            session_id: None,
        }
    }

    #[must_use]
    pub fn with_system_clock() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    #[must_use]
    pub fn into_shared(self) -> SharedStore {
        Arc::new(Mutex::new(self))
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Apply a command; returns whether the state changed
    pub fn dispatch(&mut self, command: SessionCommand) -> bool {
        let next = reduce(&self.state, command, self.clock.now());
        debug_assert!(next.is_consistent(), "inconsistent state after {command:?}");
        let changed = next != self.state;
        if changed {
            log::debug!("Session transition {command:?}");
        }
        self.state = next;
        changed
    }

    /// Begin a session; returns false if one is already running
    pub fn start(&mut self) -> bool {
        if self.state.session_active {
            log::debug!("Start ignored, session already active");
            return false;
        }
        self.dispatch(SessionCommand::Start);
        let session_id = Uuid::new_v4();
        self.session_id = Some(session_id);
        log::info!("Started screen-time session: {session_id}");
        true
    }

    pub fn update_elapsed(&mut self, ms: u64) -> bool {
        if !self.state.session_active {
            log::debug!("Discarding elapsed update of {ms}ms, no active session");
            return false;
        }
        self.dispatch(SessionCommand::UpdateElapsed(ms))
    }

    pub fn set_alert(&mut self, flag: bool) -> bool {
        self.dispatch(SessionCommand::SetAlert(flag))
    }

    /// Acknowledge a break: clears the alert and restarts the break clock
    pub fn take_break(&mut self) -> bool {
        if !self.state.session_active {
            log::debug!("Take-break ignored, no active session");
            return false;
        }
        let total = self.state.total_screen_time_ms;
        let changed = self.dispatch(SessionCommand::TakeBreak);
        log::info!("Break taken after {}s of screen time", total / 1000);
        changed
    }

    pub fn reset_window(&mut self) -> bool {
        let changed = self.dispatch(SessionCommand::ResetWindow);
        if changed {
            log::info!("Screen-time window reset");
        }
        changed
    }

    /// Tear the session down; returns whether a session was running
    pub fn end(&mut self) -> bool {
        let was_active = self.state.session_active;
        let total = self.state.total_screen_time_ms;
        self.dispatch(SessionCommand::End);
        if let Some(session_id) = self.session_id.take() {
            log::info!(
                "Ended screen-time session: {session_id} (total: {}s)",
                total / 1000
            );
        }
        was_active
    }

    /// One ticker step: record elapsed time and evaluate the break policy
    pub fn on_tick(&mut self, policy: &BreakPolicy) -> TickOutcome {
        let now = self.clock.now();
        let Some(elapsed) = self.state.elapsed_at(now) else {
            log::debug!("Tick discarded, no active session");
            return TickOutcome::Inactive;
        };
        self.update_elapsed(elapsed);

        if policy.should_alert(&self.state, now) {
            self.set_alert(true);
            log::info!(
                "Break alert raised after {}s of screen time",
                self.state.total_screen_time_ms / 1000
            );
            return TickOutcome::AlertRaised(self.alert_view());
        }

        TickOutcome::Updated {
            total_screen_time_ms: self.state.total_screen_time_ms,
        }
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.state.clone()
    }

    #[must_use]
    pub fn alert_view(&self) -> AlertView {
        AlertView::from(&self.state)
    }

    #[must_use]
    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }
}
