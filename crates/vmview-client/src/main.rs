//! vmview: command-line viewer for shared VMs.
//!
//! # Usage
//!
//! ```text
//! vmview [--config <PATH>] list
//! vmview [--config <PATH>] view <URL> [--username <NAME>] [--take-turn] [--snapshot <PATH>]
//! ```
//!
//! `list` asks every server in the config file for its name and description.
//! `view` joins one VM, logs turn changes and frame traffic until Ctrl+C, and
//! optionally saves the last screen update as a JPEG.
//!
//! # Environment variable overrides
//!
//! | Variable          | Description                    |
//! |-------------------|--------------------------------|
//! | `VMVIEW_CONFIG`   | Config file path               |
//! | `VMVIEW_USERNAME` | Username for `view`            |
//! | `RUST_LOG`        | Log filter (overrides config)  |

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use vmview_client::domain::ClientConfig;
use vmview_client::infrastructure::storage::{load_config, load_config_from};
use vmview_client::{discover, EventKind, HeadlessDisplay, SessionEvent, SessionState, VmClient};
use vmview_core::TurnUpdate;

// ── CLI argument definitions ──────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "vmview", about = "Viewer for shared virtual machines", version)]
struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true, env = "VMVIEW_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Query every configured server and print what it hosts.
    List,

    /// Connect to one VM and watch it.
    View {
        /// WebSocket endpoint, e.g. `ws://vm.example.net:6004`.
        url: String,

        /// Name sent in the handshake.  Defaults to the config's `username`.
        #[arg(long, env = "VMVIEW_USERNAME")]
        username: Option<String>,

        /// Join the turn queue right after logging in.
        #[arg(long)]
        take_turn: bool,

        /// Save the last screen update here on exit.
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<ClientConfig> {
        match &self.config {
            Some(path) => load_config_from(path)
                .with_context(|| format!("failed to load config from {}", path.display())),
            None => load_config().context("failed to load config"),
        }
    }
}

/// Status line for a turn update, in the wording of the web viewer.
fn describe_turn(update: &TurnUpdate) -> String {
    let queue = update.queue_size.unwrap_or(0);
    match (update.our_turn, update.seconds_remaining) {
        (true, Some(secs)) => format!("it's your turn! {secs} seconds remaining..."),
        (true, None) => "it's your turn!".to_string(),
        (false, None) => {
            format!("hey! click the VM screen to take a turn. ({queue} people in the queue)")
        }
        (false, Some(secs)) => {
            format!("there are {secs} seconds remaining with {queue} people in the queue...")
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;

    // RUST_LOG wins over the config file's level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    match cli.command {
        Command::List => run_list(&config).await,
        Command::View {
            url,
            username,
            take_turn,
            snapshot,
        } => {
            let username = username.unwrap_or_else(|| config.username.clone());
            run_view(url, username, take_turn, snapshot).await
        }
    }
}

async fn run_list(config: &ClientConfig) -> anyhow::Result<()> {
    if config.servers.is_empty() {
        warn!("no servers configured; add a `servers` list to the config file");
        return Ok(());
    }

    let vms = discover(&config.servers).await;
    for vm in &vms {
        match vm.description() {
            Some(desc) => println!("{}\n  {}\n  {}", vm.name, desc, vm.url),
            None => println!("{}\n  {}", vm.name, vm.url),
        }
    }
    info!("{} of {} servers answered", vms.len(), config.servers.len());
    Ok(())
}

async fn run_view(
    url: String,
    username: String,
    take_turn: bool,
    snapshot: Option<PathBuf>,
) -> anyhow::Result<()> {
    let display = HeadlessDisplay::new();
    let client = VmClient::connect(url.clone(), Box::new(display.clone()));

    client
        .wait_until_connection_open()
        .await
        .with_context(|| format!("failed to open connection to {url}"))?;
    let rank = client
        .login(&username)
        .await
        .with_context(|| format!("login to {url} failed"))?;
    info!("logged in as {username} ({rank} user)");

    client
        .on(EventKind::TurnUpdate, |event| {
            if let SessionEvent::TurnUpdate(update) = event {
                info!("{}", describe_turn(update));
            }
        })
        .await?;

    if take_turn {
        client.click();
    }

    // ── Graceful shutdown flag ────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, closing session");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => tracing::error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    while running.load(Ordering::Relaxed) && client.status().state != SessionState::Closed {
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    client.close().await;

    let seen = display.snapshot();
    info!("{} frames received", seen.frames_painted);

    if let Some(path) = snapshot {
        let saved = display
            .save_last_frame(&path)
            .with_context(|| format!("failed to write snapshot to {}", path.display()))?;
        if saved {
            info!("last frame saved to {}", path.display());
        } else {
            warn!("no frame received; snapshot not written");
        }
    }

    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
