//! Scoutbatch - batch driver for an external static analyzer
//!
//! Runs the analyzer once per file in a corpus directory and collects the
//! JSON object each run prints into a newline-delimited results log.
//!
//! Exit codes:
//!   0 - The batch loop completed (individual artifacts may have failed)
//!   1 - Runtime error (config, unreadable corpus, unwritable output log)

mod batch;
mod cli;
mod config;
mod driver;
mod models;
mod output;
mod scanner;

use anyhow::{Context, Result};
use batch::{BatchConfig, BatchRunner};
use cli::Args;
use config::{Config, CONFIG_FILE_NAME};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("Scoutbatch v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Batch failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .scoutbatch.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE_NAME);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to point at your corpus and analyzer.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// `RUST_LOG`, when set, takes precedence over `--verbose`/`--quiet`.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let builder = FmtSubscriber::builder()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact();

    let result = match EnvFilter::try_from_default_env() {
        Ok(filter) => tracing::subscriber::set_global_default(builder.with_env_filter(filter).finish()),
        Err(_) => tracing::subscriber::set_global_default(builder.with_max_level(level).finish()),
    };

    if let Err(e) = result {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load configuration and run the batch (or the dry run).
async fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    if args.dry_run {
        return handle_dry_run(&config);
    }

    let mut batch_config = BatchConfig::from(&config);
    batch_config.show_progress = !args.quiet;

    info!("Corpus: {}", batch_config.corpus_dir.display());
    info!(
        "Analyzer: `{}` in {}",
        batch_config.driver.command.join(" "),
        batch_config.driver.working_dir.display()
    );
    match batch_config.driver.timeout_seconds {
        Some(secs) => info!("Timeout: {}s per artifact", secs),
        None => debug!("No per-artifact timeout"),
    }

    let summary = BatchRunner::new(batch_config).run().await?;

    if !args.quiet {
        println!("\n📊 Batch Summary:");
        println!(
            "   Started: {}",
            summary.started_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        println!("   Artifacts: {} ({} analyzed)", summary.total, summary.processed());
        println!(
            "   Recorded: {} | No output: {} | Failed: {}",
            summary.recorded, summary.no_output, summary.failed
        );
        if summary.skipped > 0 {
            println!("   Skipped (vanished mid-run): {}", summary.skipped);
        }
        println!("   Duration: {:.1}s", summary.duration_seconds);
        println!("   Output: {}", summary.output.display());
    }

    Ok(())
}

/// Handle --dry-run: enumerate the corpus, print what would be analyzed, exit.
fn handle_dry_run(config: &Config) -> Result<()> {
    println!("🔍 Dry run: listing artifacts (analyzer not started)...\n");

    let scanner = scanner::ArtifactScanner::new(config.corpus.dir.clone());
    let artifacts = batch::exclude_output_log(scanner.scan()?, &config.output_path());

    println!("Found {} files.", artifacts.len());
    for artifact in &artifacts {
        println!("     📄 {} ({} bytes)", artifact.filename, artifact.size);
    }

    println!(
        "\n✅ Dry run complete. Results would be saved to {}",
        config.output_path().display()
    );
    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}
