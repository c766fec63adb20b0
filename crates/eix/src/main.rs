//! eix: pulls the cover image out of every EPUB and PDF in a directory.
//!
//! `eix ~/Books` writes `<name>.jpg` beside each `<name>.epub` / `<name>.pdf`
//! that does not have one yet.

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};

use eix_core::batch::{BatchBuilder, BatchSummary, ExtractionOutcome};
use eix_core::book::discover_sources;
use eix_core::error::CoverError;
use eix_core::options::ExtractOptions;
use eix_core::plugin::ToolRunner;
use eix_input_epub::EpubCoverSource;
use eix_input_pdf::PdfCoverSource;
use eix_output_jpeg::JpegMaterializer;
use eix_utils::process::SystemRunner;

#[derive(Parser)]
#[command(
    name = "eix",
    version,
    about = "Extract cover images from EPUB and PDF files"
)]
struct Cli {
    /// Directory containing the e-books
    directory: Option<PathBuf>,

    /// Verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Number of files processed concurrently
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Stop after the first file that fails
    #[arg(long)]
    fail_fast: bool,

    /// Image converter used for non-JPEG covers (default: convert)
    #[arg(long)]
    convert_command: Option<String>,

    /// Ghostscript executable used for PDFs (default: gs)
    #[arg(long)]
    gs_command: Option<String>,

    /// PDF rendering resolution in DPI (default: 250)
    #[arg(long)]
    pdf_resolution: Option<u16>,

    /// Seconds an external tool may run before it is killed; 0 disables (default: 120)
    #[arg(long)]
    timeout: Option<u64>,

    /// Directory in which the scratch directory is created
    #[arg(long)]
    scratch_dir: Option<PathBuf>,

    /// Dump effective merged config as TOML and exit
    #[arg(long)]
    dump_config: bool,
}

/// Load config from global and project-local TOML files.
///
/// The project-local file fully overrides the global one. Missing files are
/// ignored; files that fail to parse are reported in the returned warnings.
fn load_config() -> (ExtractOptions, Vec<String>) {
    let mut opts = ExtractOptions::default();
    let mut warnings = Vec::new();

    let mut paths = Vec::new();
    // 1. Global config: ~/.config/eix/config.toml
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("eix").join("config.toml"));
    }
    // 2. Project-local config: ./.eix.toml
    paths.push(PathBuf::from(".eix.toml"));

    for path in paths {
        let Ok(contents) = std::fs::read_to_string(&path) else {
            continue;
        };
        match toml::from_str::<ExtractOptions>(&contents) {
            Ok(parsed) => opts = parsed,
            Err(e) => warnings.push(format!("Failed to parse {}: {}", path.display(), e)),
        }
    }

    (opts, warnings)
}

/// Apply CLI flags on top of config-loaded options.
/// Only overrides when the flag was given.
fn apply_cli_overrides(opts: &mut ExtractOptions, cli: &Cli) {
    if cli.verbose > 0 {
        opts.verbose = cli.verbose;
    }
    if let Some(jobs) = cli.jobs {
        opts.jobs = jobs.max(1);
    }
    if cli.fail_fast {
        opts.fail_fast = true;
    }
    if let Some(ref command) = cli.convert_command {
        opts.convert_command = command.clone();
    }
    if let Some(ref command) = cli.gs_command {
        opts.gs_command = command.clone();
    }
    if let Some(resolution) = cli.pdf_resolution {
        opts.pdf_resolution = resolution;
    }
    if let Some(secs) = cli.timeout {
        opts.tool_timeout_secs = secs;
    }
    if cli.scratch_dir.is_some() {
        opts.scratch_dir = cli.scratch_dir.clone();
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn usage_error(message: &str) -> ! {
    eprintln!("error: {}", message);
    eprintln!();
    eprintln!("{}", Cli::command().render_usage());
    process::exit(1);
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = e.print();
            process::exit(code);
        }
    };

    let (mut opts, warnings) = load_config();
    apply_cli_overrides(&mut opts, &cli);
    init_logging(opts.verbose);
    for warning in warnings {
        log::warn!("{}", warning);
    }

    if cli.dump_config {
        match toml::to_string_pretty(&opts) {
            Ok(s) => {
                println!("{}", s);
                process::exit(0);
            }
            Err(e) => {
                eprintln!("Error serializing config: {}", e);
                process::exit(1);
            }
        }
    }

    let Some(directory) = cli.directory.as_deref() else {
        usage_error("a directory of e-books is required");
    };

    match run(directory, &opts) {
        Ok(summary) => print_summary(&summary),
        Err(e) => match e.downcast_ref::<CoverError>() {
            Some(CoverError::Usage(message)) => usage_error(message),
            _ => {
                eprintln!("Error: {:#}", e);
                process::exit(1);
            }
        },
    }
}

fn run(directory: &Path, opts: &ExtractOptions) -> Result<BatchSummary> {
    let sources = discover_sources(directory)?;
    log::info!(
        "Found {} e-book(s) in {}",
        sources.len(),
        directory.display()
    );

    let runner: Arc<dyn ToolRunner> = Arc::new(SystemRunner::new(opts.tool_timeout()));
    let materializer = JpegMaterializer::from_options(opts, Arc::clone(&runner));

    let driver = BatchBuilder::new()
        .source(Box::new(EpubCoverSource::new(materializer)))
        .source(Box::new(PdfCoverSource::from_options(opts, runner)))
        .jobs(opts.jobs)
        .fail_fast(opts.fail_fast)
        .scratch_root(opts.scratch_dir.clone())
        .build()?;

    driver
        .run(&sources)
        .with_context(|| format!("Failed to process {}", directory.display()))
}

fn print_summary(summary: &BatchSummary) {
    for report in &summary.reports {
        if let ExtractionOutcome::Failed(ref e) = report.outcome {
            eprintln!("{}: {} ({})", report.source.path().display(), e, e.kind());
        }
    }
    println!("success: {}", summary.created);
    println!("failures: {}", summary.failed);
    println!("skipped: {}", summary.skipped);
    println!("elapsed: {:.2}s", summary.elapsed.as_secs_f64());
}
