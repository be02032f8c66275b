//! Command-line front end for a GoPro camera session.
//!
//! Usage:
//!   gopro-session status
//!   gopro-session -c camera.conf download-all --filter videos
//!   gopro-session --ip 10.5.5.9 photo --timer 3

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info};
use serde::Serialize;

use gopro_session::config::{self, SessionConfig};
use gopro_session::{ConnectMode, DeleteTarget, MediaFilter, Session};

/// Interval of the preview keep-alive datagrams.
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_millis(2500);

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "gopro-session", about = "Control a GoPro camera over its WiFi access point")]
struct Cli {
    /// Path to a `key = value` configuration file.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Camera address (overrides the configuration file).
    #[arg(long)]
    ip: Option<String>,

    /// Camera MAC address, for wake-on-LAN.
    #[arg(long)]
    mac: Option<String>,

    /// Directory downloads are written to.
    #[arg(short = 'd', long = "dir")]
    working_dir: Option<PathBuf>,

    /// How to establish the command dialect.
    #[arg(long, value_enum, default_value_t = Mode::Detect)]
    mode: Mode,

    /// Debug logging.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    Detect,
    Legacy,
    Wake,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Filter {
    All,
    Videos,
    Photos,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the capability descriptor.
    Info,
    /// Print the named status and settings.
    Status,
    /// List media on the card.
    List,
    /// Take a photo and print its URL.
    Photo {
        /// Seconds to wait before the shutter.
        #[arg(long, default_value_t = 0)]
        timer: u64,
    },
    /// Record a video of the given length.
    Video {
        #[arg(long)]
        seconds: u64,
    },
    /// Download every matching file.
    DownloadAll {
        #[arg(long, value_enum, default_value_t = Filter::All)]
        filter: Filter,
    },
    /// Download the most recent capture.
    DownloadLast {
        /// Local file name.
        #[arg(long)]
        name: Option<String>,
    },
    /// Delete the last file, or everything.
    Delete {
        #[arg(long)]
        all: bool,
    },
    /// Set a setting by catalog id.
    Set { param: String, value: String },
    /// Run a raw gpcontrol command.
    Command { command: String },
    /// Send the wake-on-LAN packet.
    PowerOn,
    PowerOff,
    /// Set the camera clock to local time.
    SyncTime,
    /// Beep and blink the camera.
    Locate {
        #[arg(long)]
        off: bool,
    },
    /// Run the preview stream for a while.
    Preview {
        #[arg(long, default_value_t = 30)]
        seconds: u64,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let cfg = match build_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("gopro-session: config error: {e:#}");
            process::exit(1);
        }
    };

    if let Err(e) = run(cli, cfg).await {
        error!("{e:#}");
        eprintln!("gopro-session: {e:#}");
        process::exit(1);
    }
}

fn build_config(cli: &Cli) -> anyhow::Result<SessionConfig> {
    let mut cfg = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => SessionConfig::default(),
    };
    if let Some(ip) = &cli.ip {
        cfg.ip_addr = ip.clone();
    }
    if let Some(mac) = &cli.mac {
        cfg.mac_addr = mac.clone();
    }
    if let Some(dir) = &cli.working_dir {
        cfg.working_dir = dir.clone();
    }
    config::validate_config(&cfg)?;
    Ok(cfg)
}

async fn run(cli: Cli, cfg: SessionConfig) -> anyhow::Result<()> {
    let session = Session::new(cfg).context("cannot create HTTP client")?;

    // Power-on works without a dialect.
    if matches!(cli.command, Command::PowerOn) {
        return session.power_on().await.context("wake-on-LAN failed");
    }

    let mode = match cli.mode {
        Mode::Detect => ConnectMode::Detect,
        Mode::Legacy => ConnectMode::Legacy,
        Mode::Wake   => ConnectMode::WakeAndDetect,
    };
    let camera = session.connect(mode).await.context("cannot connect to camera")?;
    info!("connected: {camera}");

    match cli.command {
        Command::Info => print_json(camera)?,
        Command::Status => print_json(&session.status().await?)?,
        Command::List => {
            for record in session.list_media().await? {
                println!("{}/{}\t{}", record.folder, record.name, record.size_readable());
            }
        }
        Command::Photo { timer } => {
            for url in session.take_photo(Duration::from_secs(timer)).await? {
                println!("{url}");
            }
        }
        Command::Video { seconds } => match session.shoot_video(Duration::from_secs(seconds)).await? {
            Some(urls) => urls.iter().for_each(|u| println!("{u}")),
            None => println!("recording"),
        },
        Command::DownloadAll { filter } => {
            let filter = match filter {
                Filter::All    => MediaFilter::All,
                Filter::Videos => MediaFilter::Videos,
                Filter::Photos => MediaFilter::Photos,
            };
            let done = session.download_all(filter).await.context("download failed")?;
            println!("downloaded {} files", done.len());
        }
        Command::DownloadLast { name } => {
            for path in session.download_last(name.as_deref()).await? {
                println!("{}", path.display());
            }
        }
        Command::Delete { all } => {
            let target = if all { DeleteTarget::All } else { DeleteTarget::Last };
            session.delete(target).await?;
        }
        Command::Set { param, value } => match session.set_parameter(&param, &value).await? {
            Some(body) => println!("{body}"),
            None => println!("setting {param} is not supported by {}", camera.model_name),
        },
        Command::Command { command } => print_json(&session.run_command(&command).await?)?,
        Command::PowerOn => session.power_on().await?,
        Command::PowerOff => session.power_off().await?,
        Command::SyncTime => session.sync_time().await?,
        Command::Locate { off } => session.locate(!off).await?,
        Command::Preview { seconds } => preview(&session, Duration::from_secs(seconds)).await?,
    }

    session.close();
    Ok(())
}

/// Start the preview stream and keep it alive for `length`.
async fn preview(session: &Session, length: Duration) -> anyhow::Result<()> {
    session.livestream(true).await?;
    info!("preview on udp://{}:8554", session.config().ip_addr);
    let deadline = tokio::time::Instant::now() + length;
    let mut tick = tokio::time::interval(KEEP_ALIVE_INTERVAL);
    while tokio::time::Instant::now() < deadline {
        tick.tick().await;
        session.keep_alive().await?;
    }
    session.livestream(false).await?;
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ── Logging setup ─────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}
