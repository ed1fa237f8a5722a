use crate::{
    policy::BreakPolicy,
    presenter::AlertPresenter,
    store::{SharedStore, TickOutcome},
};
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::oneshot,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};

/// Shortest period a ticker will run at
pub const MIN_TICK_PERIOD: Duration = Duration::from_millis(100);

/// Recurring task that feeds elapsed screen time into the store
pub struct Ticker;

/// Cancellation handle returned by [`Ticker::spawn`]
///
/// `cancel` consumes the handle, so a ticker can only be cancelled once.
/// Dropping the handle also stops the task.
pub struct TickerHandle {
    cancel_tx: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

impl Ticker {
    /// Spawn a ticker on the current tokio runtime
    ///
    /// The first tick fires one `period` after spawning.
    #[must_use]
    pub fn spawn(
        store: SharedStore,
        policy: BreakPolicy,
        presenter: Arc<dyn AlertPresenter>,
        period: Duration,
    ) -> TickerHandle {
        let period = period.max(MIN_TICK_PERIOD);
        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();

        let join = tokio::spawn(async move {
            let mut ticks = interval(period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticks.tick().await;
            log::debug!(
                "Ticker running every {}ms (threshold: {}s)",
                period.as_millis(),
                policy.threshold().as_secs()
            );

            loop {
                tokio::select! {
                    biased;
                    _ = &mut cancel_rx => {
                        log::debug!("Ticker cancelled");
                        break;
                    }
                    _ = ticks.tick() => {
                        // Release the store before calling out to the presenter
                        let outcome = store.lock().await.on_tick(&policy);
                        if let TickOutcome::AlertRaised(view) = outcome {
                            // The session may have ended once the lock was released
                            let still_pending = store.lock().await.state().break_alert_shown;
                            if still_pending {
                                presenter.present(view).await;
                            } else {
                                log::debug!("Alert withdrawn before it was presented");
                            }
                        }
                    }
                }
            }
        });

        TickerHandle { cancel_tx, join }
    }
}

impl TickerHandle {
    /// Stop the ticker and wait for its task to finish
    pub async fn cancel(self) {
        // The receiver is gone only if the task already exited
        let _ = self.cancel_tx.send(());
        if let Err(e) = self.join.await {
            log::error!("Ticker task failed: {e}");
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        store::SessionStore,
        test_support::{RecordingPresenter, TokioClock},
    };

    fn setup() -> (SharedStore, Arc<RecordingPresenter>) {
        let store = SessionStore::new(Arc::new(TokioClock::new())).into_shared();
        (store, Arc::new(RecordingPresenter::default()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_accumulates_and_raises_alert_once() {
        let (store, presenter) = setup();
        store.lock().await.start();

        let policy = BreakPolicy::new(Some(Duration::from_secs(3)));
        let handle = Ticker::spawn(
            store.clone(),
            policy,
            presenter.clone(),
            Duration::from_secs(1),
        );

        tokio::time::sleep(Duration::from_millis(5_500)).await;

        {
            let store = store.lock().await;
            assert_eq!(store.state().total_screen_time_ms, 5_000);
            assert!(store.state().break_alert_shown);
        }
        let alerts = presenter.alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].total_screen_time_ms, 3_000);

        handle.cancel().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_ticker_stops_updating() {
        let (store, presenter) = setup();
        store.lock().await.start();

        let handle = Ticker::spawn(
            store.clone(),
            BreakPolicy::default(),
            presenter,
            Duration::from_secs(1),
        );
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        handle.cancel().await;

        let before = store.lock().await.state().total_screen_time_ms;
        assert_eq!(before, 2_000);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(store.lock().await.state().total_screen_time_ms, before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_after_end_are_discarded() {
        let (store, presenter) = setup();
        store.lock().await.start();

        let handle = Ticker::spawn(
            store.clone(),
            BreakPolicy::new(Some(Duration::from_secs(1))),
            presenter.clone(),
            Duration::from_secs(1),
        );
        tokio::time::sleep(Duration::from_millis(500)).await;

        // End without cancelling: the store guard must absorb later ticks
        store.lock().await.end();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert!(!store.lock().await.state().session_active);
        assert_eq!(store.lock().await.state().total_screen_time_ms, 0);
        assert!(presenter.alerts().is_empty());

        handle.cancel().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_stops_task() {
        let (store, presenter) = setup();
        store.lock().await.start();

        let handle = Ticker::spawn(
            store.clone(),
            BreakPolicy::default(),
            presenter,
            Duration::from_secs(1),
        );
        drop(handle);
        tokio::time::sleep(Duration::from_secs(3)).await;

        assert_eq!(store.lock().await.state().total_screen_time_ms, 0);
    }
}
