use crate::state::SessionState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// What a UI surface needs to render the break reminder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertView {
    pub break_alert_shown: bool,
    pub total_screen_time_ms: u64,
}

impl From<&SessionState> for AlertView {
    fn from(state: &SessionState) -> Self {
        Self {
            break_alert_shown: state.break_alert_shown,
            total_screen_time_ms: state.total_screen_time_ms,
        }
    }
}

impl AlertView {
    /// Screen time formatted as `HH:MM:SS`
    #[must_use]
    pub fn formatted_screen_time(&self) -> String {
        format_duration_ms(self.total_screen_time_ms)
    }
}

/// Format milliseconds as `HH:MM:SS`
#[must_use]
pub fn format_duration_ms(ms: u64) -> String {
    let secs = ms / 1000;
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// UI surface notified when a break alert is raised
///
/// Dismissal flows back through
/// [`SessionLifecycleBinder::on_dismiss`](crate::binder::SessionLifecycleBinder::on_dismiss).
#[async_trait]
pub trait AlertPresenter: Send + Sync {
    /// Show the break reminder
    async fn present(&self, view: AlertView);
}

/// Presenter that writes reminders to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPresenter;

#[async_trait]
impl AlertPresenter for LogPresenter {
    async fn present(&self, view: AlertView) {
        log::warn!(
            "Time for a break! You have been active for {}",
            view.formatted_screen_time()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration_ms() {
        assert_eq!(format_duration_ms(0), "00:00:00");
        assert_eq!(format_duration_ms(999), "00:00:00");
        assert_eq!(format_duration_ms(300_000), "00:05:00");
        assert_eq!(format_duration_ms(1_210_000), "00:20:10");
        assert_eq!(format_duration_ms(3_725_000), "01:02:05");
    }

    #[test]
    fn test_alert_view_from_state() {
        let state = SessionState {
            break_alert_shown: true,
            total_screen_time_ms: 1_200_000,
            ..SessionState::default()
        };
        let view = AlertView::from(&state);
        assert!(view.break_alert_shown);
        assert_eq!(view.formatted_screen_time(), "00:20:00");
    }
}
