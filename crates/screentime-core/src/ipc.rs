use crate::binder::{AuthEvent, SessionLifecycleBinder};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{atomic::Ordering, Arc},
    time::Duration,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{UnixListener, UnixStream},
    sync::Mutex,
    time::timeout,
};

/// IPC request from a client (auth layer, UI, CLI) to the daemon
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum IpcRequest {
    Status,
    Login,
    Logout,
    ForcedSignOut,
    Dismiss,
    ResetWindow,
    Shutdown,
}

/// IPC response from daemon to client
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum IpcResponse {
    Status {
        session_active: bool,
        session_id: Option<String>,
        total_screen_time_ms: u64,
        break_alert_shown: bool,
        threshold_ms: u64,
    },
    /// Command applied; `changed` is false for redundant commands
    Ack { changed: bool },
    Shutdown,
}

#[derive(Debug)]
pub struct IpcClient {
    sock_path: PathBuf,
}

impl IpcClient {
    #[must_use]
    pub fn new(sock_path: &Path) -> Self {
        Self {
            sock_path: sock_path.to_path_buf(),
        }
    }

    /// Send one request and wait for the response
    ///
    /// # Errors
    ///
    /// Returns an error if the daemon is unreachable or replies with garbage
    pub async fn send_command(&self, request: IpcRequest) -> Result<IpcResponse> {
        let mut stream = UnixStream::connect(&self.sock_path).await?;

        let encoded = bincode::serialize(&request)?;
        stream.write_all(&encoded).await?;
        stream.shutdown().await?;

        let mut buffer = Vec::new();
        stream.read_to_end(&mut buffer).await?;
        let response: IpcResponse = bincode::deserialize(&buffer)?;

        Ok(response)
    }
}

pub struct DaemonIpcHandler {
    binder: Arc<Mutex<SessionLifecycleBinder>>,
    shutdown_signal: Arc<std::sync::atomic::AtomicBool>,
}

impl DaemonIpcHandler {
    pub fn new(
        binder: Arc<Mutex<SessionLifecycleBinder>>,
        shutdown_signal: Arc<std::sync::atomic::AtomicBool>,
    ) -> Self {
        Self {
            binder,
            shutdown_signal,
        }
    }

    /// Apply a request to the binder and build the response
    pub async fn respond(&self, request: IpcRequest) -> IpcResponse {
        log::debug!("IPC request: {request:?}");
        match request {
            IpcRequest::Status => {
                let binder = self.binder.lock().await;
                let (state, session_id) = binder.snapshot().await;
                IpcResponse::Status {
                    session_active: state.session_active,
                    session_id: session_id.map(|id| id.to_string()),
                    total_screen_time_ms: state.total_screen_time_ms,
                    break_alert_shown: state.break_alert_shown,
                    threshold_ms: u64::try_from(binder.policy().threshold().as_millis())
                        .unwrap_or(u64::MAX),
                }
            }
            IpcRequest::Login => self.auth(AuthEvent::LoginSucceeded).await,
            IpcRequest::Logout => self.auth(AuthEvent::LoggedOut).await,
            IpcRequest::ForcedSignOut => self.auth(AuthEvent::ForcedSignOut).await,
            IpcRequest::Dismiss => IpcResponse::Ack {
                changed: self.binder.lock().await.on_dismiss().await,
            },
            IpcRequest::ResetWindow => IpcResponse::Ack {
                changed: self.binder.lock().await.reset_window().await,
            },
            IpcRequest::Shutdown => {
                self.shutdown_signal.store(true, Ordering::SeqCst);
                IpcResponse::Shutdown
            }
        }
    }

    async fn auth(&self, event: AuthEvent) -> IpcResponse {
        IpcResponse::Ack {
            changed: self.binder.lock().await.handle(event).await,
        }
    }

    pub async fn handle(
        &self,
        stream: &mut UnixStream,
        request: IpcRequest,
    ) -> Result<(), anyhow::Error> {
        let response = self.respond(request).await;
        let encoded = bincode::serialize(&response)?;
        stream.write_all(&encoded).await?;
        Ok(())
    }
}

/// Largest request a client may send
const MAX_REQUEST_BYTES: u64 = 4 * 1024;
/// Time a client gets to send its request before the connection is dropped
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Accept connections on `sock_path` until the task is aborted
///
/// # Errors
///
/// Returns an error if the socket cannot be bound
pub async fn listen(handler: Arc<DaemonIpcHandler>, sock_path: &Path) -> io::Result<()> {
    let listener = bind(sock_path)?;
    log::info!("IPC listening on {}", sock_path.display());

    loop {
        let stream = match listener.accept().await {
            Ok((stream, _)) => stream,
            Err(e) => {
                log::error!("IPC accept error: {e}");
                continue;
            }
        };
        let handler = handler.clone();
        tokio::spawn(async move {
            if let Err(e) = serve_connection(&handler, stream).await {
                log::warn!("IPC connection dropped: {e:#}");
            }
        });
    }
}

fn bind(sock_path: &Path) -> io::Result<UnixListener> {
    match fs::remove_file(sock_path) {
        Ok(()) => log::debug!("Removed stale socket {}", sock_path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    if let Some(parent) = sock_path.parent() {
        fs::create_dir_all(parent)?;
    }
    UnixListener::bind(sock_path)
}

/// One request in, one response out
///
/// The client half-closes after writing, so the request is everything up to EOF.
async fn serve_connection(handler: &DaemonIpcHandler, mut stream: UnixStream) -> Result<()> {
    let mut buffer = Vec::new();
    timeout(
        REQUEST_TIMEOUT,
        (&mut stream).take(MAX_REQUEST_BYTES).read_to_end(&mut buffer),
    )
    .await
    .context("timed out waiting for request")??;

    if buffer.is_empty() {
        log::debug!("IPC client closed without a request");
        return Ok(());
    }
    let request: IpcRequest = bincode::deserialize(&buffer).context("malformed request")?;
    handler.handle(&mut stream, request).await
}
