//! Daemon lifecycle management commands

use super::helpers::{log_path, pid_path, sock_path, StatusReport};
use anyhow::Result;
use env_logger::Env;
use screentime_core::{
    config::Config,
    ipc::{IpcClient, IpcRequest, IpcResponse},
    Daemon,
};
use std::{
    env,
    fs::{self, OpenOptions},
    io,
    path::Path,
    process::Command,
    time::Duration,
};
use sysinfo::{Pid, System};
use tabled::{settings::Style, Table};
use tokio::time::{sleep, Instant};

/// How long `stop` waits for the daemon to end its session and exit
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);
const EXIT_POLL: Duration = Duration::from_millis(100);

pub fn start_daemon(data_dir: &Path) -> Result<()> {
    let pid_file = pid_path(data_dir);
    fs::create_dir_all(data_dir)?;

    match read_pid(&pid_file) {
        Ok(Some(pid)) if is_running(pid) => {
            log::info!("Daemon is already running (PID: {pid}).");
            return Ok(());
        }
        Ok(None) => {}
        Ok(Some(_)) | Err(_) => {
            log::warn!("Removing stale PID file.");
            remove_if_exists(&pid_file)?;
        }
    }
    if remove_if_exists(&sock_path(data_dir))? {
        log::warn!("Removed stale socket file.");
    }

    log::info!("Starting screentime daemon...");
    let child = Command::new(env::current_exe()?)
        .arg("daemon-internal-start")
        .current_dir(env::current_dir()?)
        .spawn()?;

    log::info!("Daemon process started with PID: {}", child.id());
    fs::write(&pid_file, child.id().to_string())?;
    Ok(())
}

pub async fn run_daemon_process(data_dir: &Path) -> Result<()> {
    // Detached process: nothing to log to until this succeeds
    if let Err(e) = setup_daemon_logging(data_dir) {
        eprintln!("Failed to set up daemon logging: {e}");
        return Err(e);
    }
    log::info!("Daemon process started internally.");

    if let Err(e) = daemon_main_logic().await {
        log::error!("Daemon main logic exited with a fatal error: {e:#}");
        return Err(e);
    }

    Ok(())
}

/// Run the engine attached to the terminal until Ctrl-C
pub async fn run_foreground() -> Result<()> {
    log::info!("Running in the foreground, press Ctrl-C to stop");
    daemon_main_logic().await
}

async fn daemon_main_logic() -> Result<()> {
    let config = load_config_or_default();
    let mut daemon = Daemon::new(&config)?;
    daemon.run_with_signals().await
}

/// A broken config degrades to defaults rather than keeping the engine down
fn load_config_or_default() -> Config {
    match Config::load() {
        Ok(config) => config,
        Err(e) => {
            log::warn!("{e}; falling back to default configuration");
            Config::default()
        }
    }
}

pub async fn stop_daemon(data_dir: &Path) -> Result<()> {
    let pid_file = pid_path(data_dir);
    let sock_path = sock_path(data_dir);

    let Some(pid) = read_pid(&pid_file)? else {
        log::info!("Daemon is not running (no PID file).");
        remove_if_exists(&sock_path)?;
        return Ok(());
    };

    log::info!("Stopping screentime daemon (PID: {pid})...");
    match IpcClient::new(&sock_path)
        .send_command(IpcRequest::Shutdown)
        .await
    {
        Ok(IpcResponse::Shutdown) => {
            log::info!("Shutdown requested, waiting for the daemon to end its session...");
            if wait_for_exit(pid, SHUTDOWN_GRACE).await {
                log::info!("Daemon stopped successfully.");
            } else {
                log::warn!("Daemon did not stop gracefully. Force killing...");
                kill(pid);
            }
        }
        Ok(resp) => log::error!("Received unexpected response from daemon: {resp:?}"),
        Err(e) => {
            log::error!("Failed to send shutdown command: {e}. Forcing cleanup.");
            if kill(pid) {
                log::info!("Process killed.");
            }
        }
    }

    remove_if_exists(&pid_file)?;
    remove_if_exists(&sock_path)?;
    Ok(())
}

pub async fn show_status(data_dir: &Path, json: bool) -> Result<()> {
    let sock_path = sock_path(data_dir);

    if !sock_path.exists() {
        println!("Daemon Status: Not running");
        return Ok(());
    }

    let client = IpcClient::new(&sock_path);
    match client.send_command(IpcRequest::Status).await {
        Ok(response @ IpcResponse::Status { .. }) => {
            let Some(report) = StatusReport::from_response(&response) else {
                anyhow::bail!("Unexpected response from daemon");
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Daemon Status: Running\n");
                let mut table = Table::new(report.rows());
                table.with(Style::rounded());
                println!("{table}");
            }
        }
        Ok(_) => anyhow::bail!("Unexpected response from daemon"),
        Err(e) => {
            log::error!("Failed to get status: {e}");
            println!("Daemon Status: Not running (or not responding)");
        }
    }
    Ok(())
}

fn setup_daemon_logging(data_dir: &Path) -> Result<()> {
    fs::create_dir_all(data_dir)?;
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path(data_dir))?;

    env_logger::Builder::from_env(Env::default().default_filter_or("debug"))
        .format_timestamp_secs()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .try_init()?;
    Ok(())
}

/// Pid recorded in `pid_file`; `None` when there is no file
fn read_pid(pid_file: &Path) -> io::Result<Option<usize>> {
    match fs::read_to_string(pid_file) {
        Ok(contents) => parse_pid(&contents)
            .map(Some)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "malformed PID file")),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

fn parse_pid(contents: &str) -> Option<usize> {
    contents.trim().parse().ok().filter(|pid| *pid > 0)
}

fn is_running(pid: usize) -> bool {
    System::new().refresh_process(Pid::from(pid))
}

/// Returns whether a kill signal was delivered
fn kill(pid: usize) -> bool {
    let mut sys = System::new();
    sys.refresh_process(Pid::from(pid))
        && sys.process(Pid::from(pid)).is_some_and(sysinfo::Process::kill)
}

/// Poll until `pid` is gone; false if it outlives `grace`
async fn wait_for_exit(pid: usize, grace: Duration) -> bool {
    let deadline = Instant::now() + grace;
    while is_running(pid) {
        if Instant::now() >= deadline {
            return false;
        }
        sleep(EXIT_POLL).await;
    }
    true
}

/// Returns whether there was a file to remove
fn remove_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
