/// `evs` command-line tool for decoding and inspecting server-sent
/// event streams.
///
/// # Command overview
///
/// ```text
/// evs <COMMAND> [OPTIONS]
///
/// Commands:
///   decode     Print each event of a stream (text or JSON lines)
///   validate   Check that a stream decodes cleanly to the end
///   stats      Print event counts and per-type data sizes
///   help       Print help information
///
/// Global options:
///   -v, --verbose        Enable debug logging on stderr
///   --log-level <FILTER> Explicit tracing filter (overrides RUST_LOG)
///   -h, --help           Print help
///   -V, --version        Print version
/// ```
///
/// Every command takes a path, or `-` for stdin, so a live stream can be
/// piped straight in:
///
/// ```text
/// curl -sN https://example.com/events | evs decode - --json
/// ```
///
/// # Exit codes
///
/// | Code | Meaning                                      |
/// |------|----------------------------------------------|
/// | 0    | Success                                      |
/// | 1    | Error (I/O failure, malformed stream, etc.)  |
///
/// Errors and logs go to stderr so stdout can be piped cleanly.
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use evs_decoder::DecoderConfig;
use tracing_subscriber::EnvFilter;

mod cmd_decode;
mod cmd_stats;
mod cmd_validate;
mod input;

// ── CLI root ──────────────────────────────────────────────────────────────────

/// Decode and inspect server-sent event streams.
#[derive(Parser)]
#[command(name = "evs", version, about = "Server-sent events stream tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging on stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Tracing filter directive, e.g. `evs_decoder=trace`.
    #[arg(long, global = true)]
    log_level: Option<String>,
}

// ── Sub-commands ──────────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum Commands {
    /// Print each event of a stream.
    Decode(DecodeArgs),
    /// Check that a stream decodes cleanly to the end.
    Validate(ValidateArgs),
    /// Print event counts and per-type data sizes.
    Stats(StatsArgs),
}

// ── Argument structs ──────────────────────────────────────────────────────────

/// Decoder limits shared by every command.
#[derive(clap::Args)]
pub struct LimitArgs {
    /// Longest accepted line, in bytes.
    #[arg(long)]
    pub max_line_bytes: Option<usize>,

    /// Largest accepted event data, in bytes.
    #[arg(long)]
    pub max_event_bytes: Option<usize>,
}

impl LimitArgs {
    pub fn decoder_config(&self) -> DecoderConfig {
        let mut config = DecoderConfig::default();
        if let Some(limit) = self.max_line_bytes {
            config = config.with_max_line_bytes(limit);
        }
        if let Some(limit) = self.max_event_bytes {
            config = config.with_max_event_bytes(limit);
        }
        config
    }
}

/// Arguments for `evs decode`.
///
/// ```text
/// ┌────────────────┬──────────────────────────────────────────────────┐
/// │ Flag           │ Effect                                           │
/// ├────────────────┼──────────────────────────────────────────────────┤
/// │ --json         │ One JSON object per event instead of text blocks │
/// │ --max-events N │ Close the stream after N events                  │
/// │ --timeout-ms N │ Close the stream after N milliseconds            │
/// └────────────────┴──────────────────────────────────────────────────┘
/// ```
#[derive(clap::Args)]
pub struct DecodeArgs {
    /// Stream to decode, or `-` for stdin.
    pub file: PathBuf,

    /// Emit JSON lines.
    #[arg(long)]
    pub json: bool,

    /// Stop after this many events.
    #[arg(long)]
    pub max_events: Option<usize>,

    /// Stop after this many milliseconds, even mid-read.
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    #[command(flatten)]
    pub limits: LimitArgs,
}

/// Arguments for `evs validate`.
#[derive(clap::Args)]
pub struct ValidateArgs {
    /// Stream to validate, or `-` for stdin.
    pub file: PathBuf,

    #[command(flatten)]
    pub limits: LimitArgs,
}

/// Arguments for `evs stats`.
#[derive(clap::Args)]
pub struct StatsArgs {
    /// Stream to analyse, or `-` for stdin.
    pub file: PathBuf,

    #[command(flatten)]
    pub limits: LimitArgs,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn init_logging(cli: &Cli) {
    let filter = match (&cli.log_level, cli.verbose) {
        (Some(directive), _) => EnvFilter::new(directive),
        (None, true) => EnvFilter::new("debug"),
        (None, false) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Decode(args) => cmd_decode::run(&args).await,
        Commands::Validate(args) => cmd_validate::run(&args).await,
        Commands::Stats(args) => cmd_stats::run(&args).await,
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("error: failed to start async runtime: {e}");
            process::exit(1);
        }
    };

    let result = runtime.block_on(run(cli.command));

    // A stdin read parked on the blocking pool cannot be cancelled, so
    // shutdown must not wait for it once the decoder is closed.
    runtime.shutdown_background();

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}
