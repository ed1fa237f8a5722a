use crate::{
    clock::Clock,
    presenter::{AlertPresenter, AlertView},
    store::SharedStore,
};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::{sync::Mutex, time::Duration};
use tokio::time::Instant;

/// Clock driven by tokio's (pausable) time
pub struct TokioClock {
    origin: DateTime<Utc>,
    start: Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            origin: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
            start: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = Instant::now().duration_since(self.start);
        self.origin + chrono::Duration::from_std(elapsed).unwrap()
    }
}

#[derive(Default)]
pub struct RecordingPresenter {
    alerts: Mutex<Vec<AlertView>>,
}

impl RecordingPresenter {
    pub fn alerts(&self) -> Vec<AlertView> {
        self.alerts.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertPresenter for RecordingPresenter {
    async fn present(&self, view: AlertView) {
        self.alerts.lock().unwrap().push(view);
    }
}

/// Presenter that takes `delay` to show an alert, then records whether the
/// session was still active at that point
pub struct SlowPresenter {
    store: SharedStore,
    delay: Duration,
    active_when_shown: Mutex<Vec<bool>>,
}

impl SlowPresenter {
    pub fn new(store: SharedStore, delay: Duration) -> Self {
        Self {
            store,
            delay,
            active_when_shown: Mutex::new(Vec::new()),
        }
    }

    pub fn active_when_shown(&self) -> Vec<bool> {
        self.active_when_shown.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertPresenter for SlowPresenter {
    async fn present(&self, _view: AlertView) {
        tokio::time::sleep(self.delay).await;
        let active = self.store.lock().await.state().session_active;
        self.active_when_shown.lock().unwrap().push(active);
    }
}
