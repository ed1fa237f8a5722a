use crate::{
    policy::BreakPolicy,
    presenter::{AlertPresenter, AlertView},
    state::SessionState,
    store::SharedStore,
    ticker::{Ticker, TickerHandle},
};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};
use uuid::Uuid;

/// Notification from the authentication layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthEvent {
    /// Login was acknowledged by the backend
    LoginSucceeded,
    /// User logged out explicitly
    LoggedOut,
    /// Backend rejected the user's credentials mid-session
    ForcedSignOut,
    /// Any other error that invalidates the session
    SessionInvalidated(String),
}

impl AuthEvent {
    /// Map a backend response status to the event it implies, if any
    #[must_use]
    pub const fn from_http_status(status: u16) -> Option<Self> {
        match status {
            401 | 403 => Some(Self::ForcedSignOut),
            _ => None,
        }
    }

    #[must_use]
    pub const fn ends_session(&self) -> bool {
        !matches!(self, Self::LoginSucceeded)
    }
}

/// Ties the session store to login and logout
///
/// Owns the ticker handle: a session started here is ended here exactly
/// once, however termination is triggered.
pub struct SessionLifecycleBinder {
    store: SharedStore,
    policy: BreakPolicy,
    presenter: Arc<dyn AlertPresenter>,
    tick_period: Duration,
    ticker: Option<TickerHandle>,
}

impl SessionLifecycleBinder {
    #[must_use]
    pub fn new(
        store: SharedStore,
        policy: BreakPolicy,
        presenter: Arc<dyn AlertPresenter>,
        tick_period: Duration,
    ) -> Self {
        Self {
            store,
            policy,
            presenter,
            tick_period,
            ticker: None,
        }
    }

    /// Route an auth notification; returns whether the session changed
    pub async fn handle(&mut self, event: AuthEvent) -> bool {
        match event {
            AuthEvent::LoginSucceeded => self.start().await,
            AuthEvent::LoggedOut => self.end("logout").await,
            AuthEvent::ForcedSignOut => self.end("forced sign-out").await,
            AuthEvent::SessionInvalidated(reason) => {
                log::warn!("Session invalidated: {reason}");
                self.end("session invalidated").await
            }
        }
    }

    /// Start tracking; a duplicate login while running is ignored
    pub async fn start(&mut self) -> bool {
        if self.ticker.is_some() {
            log::debug!("Login ignored, session already running");
            return false;
        }

        let started = self.store.lock().await.start();
        if !started {
            log::warn!("Store already active without a ticker, attaching one");
        }

        self.ticker = Some(Ticker::spawn(
            self.store.clone(),
            self.policy,
            self.presenter.clone(),
            self.tick_period,
        ));
        true
    }

    /// Stop tracking and reset the store; no-op when nothing is running
    pub async fn end(&mut self, reason: &str) -> bool {
        let Some(ticker) = self.ticker.take() else {
            log::debug!("Ignoring {reason}, no session running");
            return false;
        };

        // Stop the ticker first so no alert is presented for an ended session
        ticker.cancel().await;
        self.store.lock().await.end();
        log::info!("Session ended by {reason}");
        true
    }

    /// Alert acknowledged by the user
    pub async fn on_dismiss(&self) -> bool {
        self.store.lock().await.take_break()
    }

    pub async fn reset_window(&self) -> bool {
        self.store.lock().await.reset_window()
    }

    pub async fn alert_view(&self) -> AlertView {
        self.store.lock().await.alert_view()
    }

    pub async fn snapshot(&self) -> (SessionState, Option<Uuid>) {
        let store = self.store.lock().await;
        (store.snapshot(), store.session_id())
    }

    #[must_use]
    pub const fn policy(&self) -> BreakPolicy {
        self.policy
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.ticker.is_some()
    }
}
