pub mod api;
pub mod app;
pub mod auth;
pub mod cli;
pub mod command;
pub mod config;
pub mod event;
pub mod i18n;
pub mod message;
pub mod search;
pub mod ui;

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use app::App;
use clap::Parser;
use cli::{Cli, CliCommand};
use config::{AppConfig, load_config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    // .env may carry RC_ROOM, which clap reads during parsing.
    auth::credentials::load_env_files();
    let cli = Cli::parse();
    let (config, config_error) = match load_config() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    let log_file = cli.log_file.as_deref().or(config.log_file.as_deref());
    init_tracing(log_file)?;
    if let Some(e) = config_error {
        tracing::warn!(context = "config.load", error = %e, "invalid config, using defaults");
    }

    match cli.command {
        // No subcommand or explicit `tui` → launch the interactive TUI.
        None | Some(CliCommand::Tui) => run_tui(config, cli.room.as_deref()).await,
        // All other subcommands → non-interactive JSONL output.
        Some(cmd) => cli::run_command(cmd, cli.room.as_deref(), &config).await,
    }
}

/// Logs go to stderr when `RUST_LOG` is set, or to `log_file` when given.
fn init_tracing(log_file: Option<&Path>) -> color_eyre::Result<()> {
    let filter = EnvFilter::from_default_env();
    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

/// Launch the interactive TUI.
async fn run_tui(config: AppConfig, room: Option<&str>) -> color_eyre::Result<()> {
    let room = cli::room_arg(room)?;
    let mut room_label = cli::room_label(&room);

    // Tolerate missing credentials; the screen still opens and reports failures.
    let api_client = match cli::build_api_client(&config).await {
        Ok(client) => Some(client),
        Err(e) => {
            tracing::warn!("no credentials / auth setup failed: {e}");
            eprintln!("Warning: {e}. Running without API access.");
            None
        }
    };

    let room_id = match &api_client {
        Some(client) => client.resolve_room(&room).await?,
        None => match room {
            api::rooms::RoomRef::Id(id) => id,
            api::rooms::RoomRef::Name(name) => {
                room_label = format!("#{name} (unresolved)");
                name
            }
        },
    };

    let terminal = ratatui::init();
    let result = App::new(config, api_client, room_id, room_label)
        .run(terminal)
        .await;
    ratatui::restore();
    result
}
