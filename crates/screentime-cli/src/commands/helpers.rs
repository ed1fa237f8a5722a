//! Helper utilities shared by CLI commands

use screentime_core::{ipc::IpcResponse, presenter::format_duration_ms};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::Tabled;

pub fn pid_path(data_dir: &Path) -> PathBuf {
    data_dir.join("screentime.pid")
}

pub fn sock_path(data_dir: &Path) -> PathBuf {
    data_dir.join("screentime.sock")
}

/// Log file written by the detached daemon
pub fn log_path(data_dir: &Path) -> PathBuf {
    data_dir.join("screentime.log")
}

/// Session status as printed by `screentime status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub session_active: bool,
    pub session_id: Option<String>,
    pub screen_time: String,
    pub total_screen_time_ms: u64,
    pub break_alert_shown: bool,
    pub threshold_mins: u64,
}

#[derive(Tabled)]
pub struct StatusRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

impl StatusReport {
    pub fn from_response(response: &IpcResponse) -> Option<Self> {
        match response {
            IpcResponse::Status {
                session_active,
                session_id,
                total_screen_time_ms,
                break_alert_shown,
                threshold_ms,
            } => Some(Self {
                session_active: *session_active,
                session_id: session_id.clone(),
                screen_time: format_duration_ms(*total_screen_time_ms),
                total_screen_time_ms: *total_screen_time_ms,
                break_alert_shown: *break_alert_shown,
                threshold_mins: threshold_ms / 60_000,
            }),
            _ => None,
        }
    }

    pub fn rows(&self) -> Vec<StatusRow> {
        let yes_no = |b: bool| String::from(if b { "yes" } else { "no" });
        vec![
            StatusRow {
                field: "Session",
                value: if self.session_active {
                    "active".to_string()
                } else {
                    "inactive".to_string()
                },
            },
            StatusRow {
                field: "Session ID",
                value: self.session_id.clone().unwrap_or_else(|| "-".to_string()),
            },
            StatusRow {
                field: "Screen time",
                value: self.screen_time.clone(),
            },
            StatusRow {
                field: "Break due",
                value: yes_no(self.break_alert_shown),
            },
            StatusRow {
                field: "Break every",
                value: format!("{}m", self.threshold_mins),
            },
        ]
    }
}

/// Message for an `Ack` response
pub const fn ack_message(
    changed: bool,
    applied: &'static str,
    redundant: &'static str,
) -> &'static str {
    if changed {
        applied
    } else {
        redundant
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(active: bool) -> IpcResponse {
        IpcResponse::Status {
            session_active: active,
            session_id: active.then(|| "abc".to_string()),
            total_screen_time_ms: 1_210_000,
            break_alert_shown: active,
            threshold_ms: 20 * 60_000,
        }
    }

    #[test]
    fn test_paths_live_in_data_dir() {
        let dir = Path::new("/tmp/screentime");
        assert_eq!(pid_path(dir), dir.join("screentime.pid"));
        assert_eq!(sock_path(dir), dir.join("screentime.sock"));
        assert_eq!(log_path(dir), dir.join("screentime.log"));
    }

    #[test]
    fn test_status_report_from_response() {
        let report = StatusReport::from_response(&status(true)).unwrap();
        assert!(report.session_active);
        assert_eq!(report.screen_time, "00:20:10");
        assert_eq!(report.threshold_mins, 20);
        assert_eq!(report.rows().len(), 5);
    }

    #[test]
    fn test_status_report_rejects_other_responses() {
        assert!(StatusReport::from_response(&IpcResponse::Shutdown).is_none());
        assert!(StatusReport::from_response(&IpcResponse::Ack { changed: true }).is_none());
    }

    #[test]
    fn test_status_report_json_fields() {
        let report = StatusReport::from_response(&status(false)).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["session_active"], false);
        assert_eq!(json["session_id"], serde_json::Value::Null);
        assert_eq!(json["total_screen_time_ms"], 1_210_000);
    }

    #[test]
    fn test_ack_message() {
        assert_eq!(ack_message(true, "started", "already running"), "started");
        assert_eq!(
            ack_message(false, "started", "already running"),
            "already running"
        );
    }
}
