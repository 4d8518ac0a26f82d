use std::{num::NonZeroU32, path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use client_core::{FileTokenStore, HttpTrackerClient, Session};
use shared::domain::{BulkAction, StatusKey};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod prompt;
mod render;

#[derive(Parser, Debug)]
#[command(name = "nomtrack", about = "Track contract nominations from the terminal")]
struct Cli {
    /// Flat key/value settings file.
    #[arg(long, global = true, default_value = config::CONFIG_FILE)]
    config: PathBuf,
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[arg(long, global = true)]
    token_path: Option<PathBuf>,
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    /// Answer yes to every confirmation.
    #[arg(long, short = 'y', global = true)]
    yes: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone)]
struct ListArgs {
    /// Only nominations assigned to this user id.
    #[arg(long)]
    user: Option<String>,
    #[arg(long, value_parser = parse_status)]
    status: Option<StatusKey>,
    #[arg(long, default_value = "1")]
    page: NonZeroU32,
    #[arg(long)]
    page_size: Option<NonZeroU32>,
}

#[derive(Args, Debug, Clone, Default)]
struct NominationFields {
    #[arg(long)]
    contract: Option<String>,
    #[arg(long)]
    buyer: Option<String>,
    #[arg(long)]
    seller: Option<String>,
    /// Arrival period, YYYY-MM-DD.
    #[arg(long)]
    arrival: Option<String>,
    /// Nomination date, YYYY-MM-DD.
    #[arg(long)]
    date: Option<String>,
    #[arg(long = "type")]
    nomination_type: Option<String>,
    #[arg(long)]
    keyword: Option<String>,
    /// seller or buyer.
    #[arg(long = "for")]
    party: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        name: String,
        #[arg(long, env = "NOMTRACK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    Logout,
    Whoami,
    List {
        #[command(flatten)]
        filter: ListArgs,
        #[arg(long)]
        json: bool,
    },
    Stats,
    Show {
        id: String,
    },
    Create {
        #[command(flatten)]
        fields: NominationFields,
    },
    Edit {
        id: String,
        #[command(flatten)]
        fields: NominationFields,
    },
    Delete {
        id: String,
    },
    Assign {
        id: String,
        #[arg(long, required_unless_present = "unassign", conflicts_with = "unassign")]
        user: Option<String>,
        #[arg(long)]
        unassign: bool,
    },
    /// Mark rows of one page as sent or received, or delete them.
    Bulk {
        #[arg(value_parser = parse_bulk_action)]
        action: BulkAction,
        ids: Vec<String>,
        /// Select every row on the page.
        #[arg(long, conflicts_with = "ids")]
        all: bool,
        #[command(flatten)]
        filter: ListArgs,
    },
    Send {
        id: String,
    },
    SendAll {
        id: String,
    },
    Scan,
    Settings,
    Users {
        #[command(subcommand)]
        command: UsersCommand,
    },
}

#[derive(Subcommand, Debug)]
enum UsersCommand {
    List,
    Create {
        name: String,
        #[arg(long)]
        password: Option<String>,
    },
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        /// Leave out to keep the current password.
        #[arg(long)]
        password: Option<String>,
    },
    Delete {
        id: String,
    },
}

fn parse_status(raw: &str) -> Result<StatusKey, String> {
    StatusKey::parse(raw).ok_or_else(|| {
        let known: Vec<&str> = StatusKey::ALL.iter().map(|key| key.as_str()).collect();
        format!("unknown status '{raw}' (expected one of: {})", known.join(", "))
    })
}

fn parse_bulk_action(raw: &str) -> Result<BulkAction, String> {
    BulkAction::parse(raw)
        .ok_or_else(|| format!("unknown action '{raw}' (expected sent, received or delete)"))
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut settings = config::load_settings(&cli.config)?;
    if let Some(api_url) = cli.api_url {
        settings.api_url = api_url;
    }
    if let Some(token_path) = cli.token_path {
        settings.token_path = Some(token_path);
    }
    if let Some(timeout_secs) = cli.timeout_secs.filter(|secs| *secs > 0) {
        settings.timeout_secs = timeout_secs;
    }

    let api_url = settings.api_url()?;
    let token_path = settings.resolve_token_path()?;
    tracing::debug!(api_url = %api_url, token_path = %token_path.display(), "settings resolved");

    let session = Session::new(Arc::new(FileTokenStore::new(token_path)));
    let client = HttpTrackerClient::with_timeout(
        api_url.as_str(),
        Arc::clone(&session),
        settings.timeout(),
    )
    .context("failed to build HTTP client")?;

    let app = commands::App::new(Arc::new(client), session, settings, cli.yes);
    Ok(app.run(cli.command).await)
}
