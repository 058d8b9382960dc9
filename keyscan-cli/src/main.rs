use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use keyscan::{
    pool::{serve_worker, WorkerCommand},
    search::{build_pool, search_since},
    ConfigOverrides, EncodingMode, ReportFormat, Reporter, ScanMode, SearchConfig,
};
use std::io::{self, BufRead, IsTerminal, Write};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser)]
struct CliSearchConfig {
    /// Directory holding the text files [default: texts]
    #[arg(short = 'd', long)]
    root: Option<PathBuf>,

    /// Keyword to search for (can be specified multiple times)
    #[arg(short = 'k', long = "keyword")]
    keywords: Vec<String>,

    /// Only scan entries whose name ends with this suffix [default: .txt]
    #[arg(short = 'e', long)]
    suffix: Option<String>,

    /// Execution mode: threads (1) or processes (2); asks when omitted
    #[arg(short = 'm', long)]
    mode: Option<String>,

    /// Number of workers [default: 4]
    #[arg(short = 'j', long)]
    workers: Option<NonZeroUsize>,

    /// Report format (text|json)
    #[arg(short = 'f', long, default_value = "text")]
    format: String,

    /// How to handle invalid UTF-8 sequences (failfast|lossy)
    #[arg(long)]
    encoding: Option<String>,

    /// Keep directory listing order instead of sorting file names
    #[arg(long)]
    no_sort: bool,

    /// Configuration file layered over the default locations
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a directory for keywords
    Search(Box<CliSearchConfig>),

    /// Scan one slice for a parent process (reads a request on stdin)
    #[command(hide = true)]
    Worker {
        #[arg(long, default_value = "warn")]
        log_level: String,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Search(args) => run_search(*args),
        Commands::Worker { log_level } => {
            init_logging(&log_level);
            serve_worker(io::stdin().lock(), io::stdout().lock())
                .context("worker failed")?;
            Ok(())
        }
    }
}

fn run_search(args: CliSearchConfig) -> Result<()> {
    let overrides = ConfigOverrides {
        root_path: args.root,
        keywords: args.keywords,
        file_suffix: args.suffix,
        worker_count: args.workers,
        mode: args.mode.as_deref().map(str::parse).transpose()?,
        sort_files: args.no_sort.then_some(false),
        encoding_mode: args
            .encoding
            .as_deref()
            .map(str::parse::<EncodingMode>)
            .transpose()?,
        log_level: args.log_level,
    };
    let format: ReportFormat = args.format.parse()?;

    let config = SearchConfig::load_from(args.config.as_deref())?.merge_with_cli(overrides);
    init_logging(&config.log_level);
    debug!("Effective configuration: {:?}", config);

    let mode = match config.mode {
        Some(mode) => mode,
        None => prompt_mode(&mut io::stdin().lock())?,
    };

    let start = Instant::now();
    let worker_command = WorkerCommand::current_exe()?
        .arg("--log-level")
        .arg(&config.log_level);
    let pool = build_pool(&config, mode, Some(worker_command))?;
    let report = search_since(&config, pool.as_ref(), start)?;

    let stdout = io::stdout();
    let reporter = Reporter::new(format, stdout.is_terminal());
    let mut out = stdout.lock();
    reporter.write(&report, &mut out)?;
    out.flush()?;
    Ok(())
}

/// Asks for the execution mode on stderr and reads one line of input
fn prompt_mode<R: BufRead>(input: &mut R) -> Result<ScanMode> {
    let mut stderr = io::stderr();
    writeln!(stderr, "Select mode:")?;
    writeln!(stderr, "1. Threads")?;
    writeln!(stderr, "2. Processes")?;
    write!(stderr, "Your choice (1 or 2): ")?;
    stderr.flush()?;

    let mut choice = String::new();
    input.read_line(&mut choice)?;
    Ok(choice.parse()?)
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .init();
}
