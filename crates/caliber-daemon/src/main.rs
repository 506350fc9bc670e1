//! Caliber Daemon - Main entry point
//!
//! Drives the movement model at a fixed frame rate and serves its state
//! to renderers over HTTP and WebSocket.

mod api;
mod config;
mod server;
mod state;
mod ws;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "caliber")]
#[command(about = "Spring Drive movement model daemon")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "caliber.toml")]
    config: PathBuf,

    /// Bind address for web server
    #[arg(short, long)]
    bind: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// IANA timezone for the dial, e.g. Europe/Paris
    #[arg(short, long)]
    timezone: Option<String>,

    /// Tick this many frames, print each snapshot as JSON and exit
    #[arg(long)]
    frames: Option<u32>,

    /// Write a default configuration file and exit
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs on stderr; stdout carries headless snapshots
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Caliber v{}", env!("CARGO_PKG_VERSION"));

    if args.init_config {
        config::save_default_config(&args.config)?;
        return Ok(());
    }

    let mut config = config::load_config(&args.config)?;

    if let Some(bind) = args.bind {
        config.daemon.bind = bind;
    }
    if let Some(timezone) = args.timezone {
        config.clock.timezone = timezone;
    }

    info!(
        timezone = %config.clock.timezone,
        frame_rate = config.daemon.frame_rate,
        "Configuration loaded"
    );

    let state = state::AppState::new(config.clone()).await?;

    if let Some(frames) = args.frames {
        // Headless mode: fixed frame steps, one JSON line per frame
        info!(frames, "Running headless");
        let period = config.daemon.frame_interval();
        let start = Instant::now();
        for i in 0..frames {
            let snapshot = state.advance_frame(start + period * i).await;
            println!("{}", serde_json::to_string(&snapshot)?);
        }
    } else {
        server::run(state, &config.daemon.bind).await?;
    }

    Ok(())
}
