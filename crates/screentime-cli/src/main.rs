mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{
    config::{handle_config_init, handle_config_path, handle_config_show},
    daemon::{run_daemon_process, run_foreground, show_status, start_daemon, stop_daemon},
    session::{send_auth_command, send_sign_out, send_ui_command},
};
use screentime_core::{config::get_data_dir, ipc::IpcRequest};

#[derive(Parser)]
#[command(name = "screentime")]
#[command(about = "Screen-time tracking and break reminders", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the engine daemon in the background
    Start,
    /// (Internal) Run the daemon process
    #[command(hide = true)]
    DaemonInternalStart,
    /// Run the engine in the foreground, logging to the terminal
    Run,
    /// Stop the engine daemon
    Stop,
    /// Show the current session
    Status {
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// Report a successful login (starts a session)
    Login,
    /// Report an explicit logout (ends the session)
    Logout,
    /// Report a forced sign-out (ends the session)
    SignOut {
        /// HTTP status returned by the backend; only 401/403 end the session
        #[arg(long)]
        status: Option<u16>,
    },
    /// Acknowledge the break reminder
    Dismiss,
    /// Reset accumulated screen time for the running session
    Reset,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
    /// Print the config file location
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if !matches!(cli.command, Commands::DaemonInternalStart) {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .format_timestamp_secs()
            .init();
    }

    let data_dir = get_data_dir()?;

    match cli.command {
        Commands::Start => start_daemon(&data_dir),
        Commands::DaemonInternalStart => run_daemon_process(&data_dir).await,
        Commands::Run => run_foreground().await,
        Commands::Stop => stop_daemon(&data_dir).await,
        Commands::Status { json } => show_status(&data_dir, json).await,
        Commands::Login => send_auth_command(&data_dir, IpcRequest::Login).await,
        Commands::Logout => send_auth_command(&data_dir, IpcRequest::Logout).await,
        Commands::SignOut { status } => send_sign_out(&data_dir, status).await,
        Commands::Dismiss => send_ui_command(&data_dir, IpcRequest::Dismiss).await,
        Commands::Reset => send_ui_command(&data_dir, IpcRequest::ResetWindow).await,
        Commands::Config { action } => match action {
            ConfigAction::Show => handle_config_show(),
            ConfigAction::Init { force } => handle_config_init(force),
            ConfigAction::Path => handle_config_path(),
        },
    }
}
