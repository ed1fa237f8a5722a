use crate::{
    binder::SessionLifecycleBinder,
    config::{get_data_dir, Config},
    ipc::{listen, DaemonIpcHandler},
    presenter::{AlertPresenter, LogPresenter},
    store::SessionStore,
};
use anyhow::Result;
use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{sync::Mutex, time::interval};

/// How often the main loop checks for a shutdown request
const SHUTDOWN_POLL: Duration = Duration::from_millis(250);

/// Long-running engine process: one binder, one IPC socket
pub struct Daemon {
    binder: Arc<Mutex<SessionLifecycleBinder>>,
    ipc_handler: Arc<DaemonIpcHandler>,
    shutdown_signal: Arc<AtomicBool>,
    sock_path: PathBuf,
}

impl Daemon {
    /// Build a daemon from configuration, logging alerts via [`LogPresenter`]
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be determined
    pub fn new(config: &Config) -> Result<Self> {
        let sock_path = get_data_dir()?.join("screentime.sock");
        Ok(Self::with_presenter(config, Arc::new(LogPresenter), sock_path))
    }

    #[must_use]
    pub fn with_presenter(
        config: &Config,
        presenter: Arc<dyn AlertPresenter>,
        sock_path: PathBuf,
    ) -> Self {
        let today = chrono::Local::now().date_naive();
        let policy = config.break_policy(today);
        if let Some(bracket) = config.age_bracket(today) {
            log::info!("Age profile: {}", bracket.description());
        }
        log::info!(
            "Break threshold: {}m, tick every {}s",
            policy.threshold().as_secs() / 60,
            config.tick_period().as_secs()
        );

        let store = SessionStore::with_system_clock().into_shared();
        let binder = Arc::new(Mutex::new(SessionLifecycleBinder::new(
            store,
            policy,
            presenter,
            config.tick_period(),
        )));
        let shutdown_signal = Arc::new(AtomicBool::new(false));

        Self {
            ipc_handler: Arc::new(DaemonIpcHandler::new(
                binder.clone(),
                shutdown_signal.clone(),
            )),
            binder,
            shutdown_signal,
            sock_path,
        }
    }

    /// Serve IPC until Ctrl-C or a `Shutdown` request, then end any running session
    ///
    /// # Errors
    ///
    /// Returns an error only from final cleanup
    pub async fn run_with_signals(&mut self) -> Result<()> {
        let ipc_handler = self.ipc_handler.clone();
        let sock_path = self.sock_path.clone();

        let listener = tokio::spawn(async move {
            if let Err(e) = listen(ipc_handler, &sock_path).await {
                log::error!("IPC listener failed: {e}");
            }
        });

        let mut poll = interval(SHUTDOWN_POLL);
        log::info!("Daemon started with signal handling and IPC");

        loop {
            tokio::select! {
                _ = poll.tick() => {}
                _ = tokio::signal::ctrl_c() => {
                    log::info!("Received Ctrl-C, shutting down...");
                    self.shutdown_signal.store(true, Ordering::SeqCst);
                }
            }

            if self.shutdown_signal.load(Ordering::SeqCst) {
                break;
            }
        }

        listener.abort();
        self.binder.lock().await.end("daemon shutdown").await;
        if self.sock_path.exists() {
            std::fs::remove_file(&self.sock_path)?;
        }
        log::info!("Daemon shut down gracefully.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ipc::{IpcClient, IpcRequest, IpcResponse},
        test_support::RecordingPresenter,
    };
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_shutdown_request_ends_session_and_cleans_socket() {
        let dir = TempDir::new().unwrap();
        let sock_path = dir.path().join("screentime.sock");
        let mut daemon = Daemon::with_presenter(
            &Config::default(),
            Arc::new(RecordingPresenter::default()),
            sock_path.clone(),
        );
        let binder = daemon.binder.clone();

        let run = tokio::spawn(async move { daemon.run_with_signals().await });
        while !sock_path.exists() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let client = IpcClient::new(&sock_path);
        assert_eq!(
            client.send_command(IpcRequest::Login).await.unwrap(),
            IpcResponse::Ack { changed: true }
        );
        assert_eq!(
            client.send_command(IpcRequest::Shutdown).await.unwrap(),
            IpcResponse::Shutdown
        );

        run.await.unwrap().unwrap();
        assert!(!binder.lock().await.is_running());
        assert!(!sock_path.exists());
    }
}
