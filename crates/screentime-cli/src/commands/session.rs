//! Session event commands
//!
//! Stand-ins for the authentication layer (login, logout, sign-out) and the
//! reminder UI (dismiss, reset). Each sends one request to the daemon.

use super::helpers::{ack_message, sock_path};
use anyhow::{Context, Result};
use screentime_core::{
    ipc::{IpcClient, IpcRequest, IpcResponse},
    AuthEvent,
};
use std::path::Path;

async fn send(data_dir: &Path, request: IpcRequest) -> Result<bool> {
    let client = IpcClient::new(&sock_path(data_dir));
    let response = client
        .send_command(request.clone())
        .await
        .context("Daemon is not running (start it with: screentime start)")?;
    match response {
        IpcResponse::Ack { changed } => Ok(changed),
        other => anyhow::bail!("Unexpected response to {request:?}: {other:?}"),
    }
}

/// Forward a login or logout notification
pub async fn send_auth_command(data_dir: &Path, request: IpcRequest) -> Result<()> {
    let changed = send(data_dir, request.clone()).await?;
    let message = match request {
        IpcRequest::Login => ack_message(changed, "Session started", "Session already running"),
        _ => ack_message(changed, "Session ended", "No session running"),
    };
    println!("{message}");
    Ok(())
}

/// Forward a forced sign-out, optionally derived from a backend status code
pub async fn send_sign_out(data_dir: &Path, status: Option<u16>) -> Result<()> {
    if let Some(code) = status {
        if AuthEvent::from_http_status(code).is_none() {
            println!("Status {code} does not end the session");
            return Ok(());
        }
    }
    send_auth_command(data_dir, IpcRequest::ForcedSignOut).await
}

/// Forward a reminder acknowledgement or window reset
pub async fn send_ui_command(data_dir: &Path, request: IpcRequest) -> Result<()> {
    let changed = send(data_dir, request.clone()).await?;
    let message = match request {
        IpcRequest::Dismiss => ack_message(changed, "Break recorded", "No session running"),
        _ => ack_message(changed, "Screen time reset", "No session running"),
    };
    println!("{message}");
    Ok(())
}
