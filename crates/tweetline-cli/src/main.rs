//! tweetline - capture keyword-filtered tweet streams into Parquet batches

use std::path::PathBuf;
use std::sync::atomic::Ordering;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tweetline_capture::{CaptureConfig, EventStream, FileSource, HttpSource};
use tweetline_core::{ProgressContext, init_logging, shutdown_flag};

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "tweetline")]
#[command(about = "Capture keyword-filtered tweet streams into Parquet batches")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./tweetline.toml or ~/.config/tweetline/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Listen for tweets matching keywords and save them in batches
    Capture(CaptureArgs),
    /// Show current configuration
    Config,
}

#[derive(Args)]
struct CaptureArgs {
    /// Keywords to track on the stream
    words: Vec<String>,

    /// Destination directory for batch files
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Stop after this many tweets (default: capture until the stream ends)
    #[arg(long)]
    max_tweets: Option<u64>,

    /// Records per batch file before rotating
    #[arg(long)]
    max_records_per_file: Option<usize>,

    /// Replay events from an NDJSON capture file instead of the live stream
    #[arg(long, value_name = "FILE")]
    replay: Option<PathBuf>,

    /// Bearer token for the stream endpoint (default: $TWITTER_BEARER_TOKEN
    /// or the config file)
    #[arg(long)]
    token: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Progress context (TTY auto-detect)
    let progress = ProgressContext::new();

    // Logging:
    //   TTY:     quiet (warn) unless --debug  — the progress bar shows activity
    //   non-TTY: info unless --debug          — logs are the only progress indicator
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = if is_tty { !cli.debug } else { false };
    init_logging(quiet, cli.debug, multi);

    let config = if let Some(path) = cli.config {
        Config::from_file(&path)?
    } else {
        Config::load()?
    };

    match cli.command {
        Command::Capture(args) => capture(args, &config, &progress),
        Command::Config => {
            use comfy_table::{
                Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
            };

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_header(vec![
                    Cell::new("Setting").fg(Color::Cyan),
                    Cell::new("Value").fg(Color::Cyan),
                ]);

            table.add_row(vec![
                "Save directory",
                &config.output.save_dir.display().to_string(),
            ]);
            table.add_row(vec![
                "Records per file",
                &config.output.max_records_per_file.to_string(),
            ]);
            table.add_row(vec![
                "Compression level",
                &config.output.compression_level.to_string(),
            ]);
            table.add_row(vec!["Stream endpoint", &config.stream.endpoint]);
            table.add_row(vec![
                "Bearer token",
                if config.stream.bearer_token.is_some() {
                    "configured"
                } else {
                    "not set"
                },
            ]);

            eprintln!("\n{table}");
            Ok(())
        }
    }
}

fn capture(args: CaptureArgs, config: &Config, progress: &ProgressContext) -> Result<()> {
    if args.replay.is_none() && args.words.is_empty() {
        anyhow::bail!("at least one keyword is required for live capture");
    }

    setup_signal_handler();

    let capture_config = CaptureConfig {
        save_dir: args.save_dir.unwrap_or_else(|| config.output.save_dir.clone()),
        words: args.words,
        max_tweets: args.max_tweets,
        max_records_per_file: args
            .max_records_per_file
            .unwrap_or(config.output.max_records_per_file),
        zstd_level: config.output.compression_level,
    };

    let token = args.token.or_else(|| config.stream.bearer_token.clone());
    let mut source: Box<dyn EventStream> = match args.replay {
        Some(path) => Box::new(FileSource::new(path)),
        None => Box::new(HttpSource::new(
            &config.stream.endpoint,
            token.as_deref(),
            &capture_config.words,
        )),
    };

    let summary = tweetline_capture::run(&capture_config, source.as_mut(), progress)?;

    // Batch file paths on stdout, one per line, for downstream loading
    for file in &summary.files {
        println!("{}", file.display());
    }
    Ok(())
}

fn setup_signal_handler() {
    // First signal: set graceful shutdown flag (tail batch still flushes)
    // Second signal: force exit
    // SAFETY: AtomicBool::swap and process::exit are async-signal-safe
    unsafe {
        signal_hook::low_level::register(signal_hook::consts::SIGTERM, || {
            if shutdown_flag().swap(true, Ordering::Relaxed) {
                std::process::exit(130);
            }
        })
        .expect("Failed to register SIGTERM handler");
        signal_hook::low_level::register(signal_hook::consts::SIGINT, || {
            if shutdown_flag().swap(true, Ordering::Relaxed) {
                std::process::exit(130);
            }
        })
        .expect("Failed to register SIGINT handler");
    }
}
