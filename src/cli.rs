use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{self, eyre};

use crate::api::RocketChatClient;
use crate::api::rooms::RoomRef;
use crate::auth::AuthProvider;
use crate::auth::credentials::load_credentials;
use crate::command::normalize_emoji;
use crate::config::AppConfig;
use crate::message::{Message, build_message};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "rcsearch", about = "Search Rocket.Chat room messages from the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<CliCommand>,

    /// Room to search: a room id or `#name`
    #[arg(long, global = true, env = "RC_ROOM")]
    pub room: Option<String>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum CliCommand {
    /// Launch the interactive TUI (default)
    Tui,
    /// Search a room once and print results (JSONL)
    Search {
        /// Search text (plain or `/regexp/flags`)
        text: String,
        /// Result offset for pagination
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Toggle a reaction on a message
    React {
        /// Message id
        message_id: String,
        /// Emoji shortcode, with or without colons
        emoji: String,
    },
}

// ---------------------------------------------------------------------------
// Client construction (shared with main.rs TUI path)
// ---------------------------------------------------------------------------

/// Build an authenticated `RocketChatClient` from env credentials + config.
/// Returns an error if no credentials are found or login fails.
pub async fn build_api_client(config: &AppConfig) -> eyre::Result<RocketChatClient> {
    let creds = load_credentials()?;
    url::Url::parse(&creds.server_url)
        .map_err(|e| eyre!("invalid RC_SERVER_URL {}: {e}", creds.server_url))?;

    let auth = AuthProvider::new(creds)?;
    tracing::info!(method = ?auth.method, "auth initialized");

    let client = RocketChatClient::connect(auth, config.request_timeout()).await?;
    tracing::info!(
        server = client.server_url(),
        user = client.username().unwrap_or("?"),
        "connected"
    );
    Ok(client)
}

/// Parse the `--room` argument, failing with a usage hint when it is absent.
pub fn room_arg(room: Option<&str>) -> eyre::Result<RoomRef> {
    room.and_then(RoomRef::parse)
        .ok_or_else(|| eyre!("no room given; pass --room <id|#name> or set RC_ROOM"))
}

/// Display label for a room argument.
pub fn room_label(room: &RoomRef) -> String {
    match room {
        RoomRef::Id(id) => id.clone(),
        RoomRef::Name(name) => format!("#{name}"),
    }
}

// ---------------------------------------------------------------------------
// Output helpers
// ---------------------------------------------------------------------------

/// Print messages as JSONL to stdout.
fn print_messages(messages: &[Message]) -> eyre::Result<()> {
    for message in messages {
        let line = serde_json::to_string(message)?;
        println!("{line}");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Command execution
// ---------------------------------------------------------------------------

pub async fn run_command(cmd: CliCommand, room: Option<&str>, config: &AppConfig) -> eyre::Result<()> {
    let client = build_api_client(config).await?;

    match cmd {
        CliCommand::Tui => unreachable!("tui is handled in main"),

        CliCommand::Search { text, offset } => {
            let room = room_arg(room)?;
            let room_id = client.resolve_room(&room).await?;
            let resp = client
                .message_search(&text, &room_id, offset, config.page_size)
                .await?;
            let messages: Vec<Message> = resp.into_docs().into_iter().map(build_message).collect();
            print_messages(&messages)?;
        }

        CliCommand::React { message_id, emoji } => {
            let emoji = normalize_emoji(&emoji).ok_or_else(|| eyre!("invalid emoji: {emoji}"))?;
            client.set_reaction(&emoji, &message_id).await?;
            let line = serde_json::to_string(&serde_json::json!({
                "message_id": message_id,
                "emoji": emoji,
                "success": true,
            }))?;
            println!("{line}");
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
