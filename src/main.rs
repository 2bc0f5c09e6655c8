//! Linkscout main entry point
//!
//! This is the command-line interface for the Linkscout broken link collector.

use anyhow::{bail, Context};
use clap::Parser;
use linkscout::config::{load_config_with_hash, validation::validate, Config};
use linkscout::crawler::{Collaborators, IdGenerator};
use linkscout::output::{log_event, print_summary, to_json_line, CrawlSummary};
use linkscout::{Bot, BotState};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

/// Linkscout: a broken link collector
///
/// Linkscout crawls every page reachable from a start URL on the same host,
/// verifies every resource those pages link to and reports the broken ones.
#[derive(Parser, Debug)]
#[command(name = "linkscout")]
#[command(version)]
#[command(about = "A broken link collector", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG", required_unless_present = "start_url")]
    config: Option<PathBuf>,

    /// Start URL, overriding the one from the configuration file
    #[arg(long, value_name = "URL")]
    start_url: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Print every event to stdout as a JSON line
    #[arg(long)]
    json: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load_configuration(&cli)?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    let final_state = handle_crawl(config, cli.json).await?;
    if final_state != BotState::RanToCompletion {
        bail!("Crawl ended as {}", final_state);
    }
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("linkscout=info,warn"),
            1 => EnvFilter::new("linkscout=debug,info"),
            2 => EnvFilter::new("linkscout=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration file, or builds one from `--start-url`
fn load_configuration(cli: &Cli) -> anyhow::Result<Config> {
    let Some(path) = &cli.config else {
        let start_url = cli.start_url.as_deref().unwrap_or_default();
        return Config::for_start_url(start_url)
            .with_context(|| format!("Invalid start URL '{}'", start_url));
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (mut config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if let Some(start_url) = &cli.start_url {
        config.crawl.start_uri = start_url.clone();
        validate(&config).with_context(|| format!("Invalid start URL '{}'", start_url))?;
    }
    Ok(config)
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Linkscout Dry Run ===\n");

    println!("Crawl:");
    println!("  Start URI: {}", config.crawl.start_uri);
    match &config.crawl.remote_host {
        Some(host) => println!("  Remote host: {}", host),
        None => println!("  Remote host: (none)"),
    }

    println!("\nPipeline:");
    println!("  Queue capacity: {}", config.pipeline.queue_capacity);
    println!("  Verifiers: {}", config.pipeline.max_verifier_count);
    println!("  Renderers: {}", config.pipeline.max_renderer_count);
    println!("  Extractors: {}", config.pipeline.max_extractor_count);
    println!(
        "  HTTP request timeout: {}s",
        config.pipeline.http_request_timeout_secs
    );

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);

    println!("\n✓ Configuration is valid");
}

/// Runs the crawl until it completes or Ctrl-C is pressed
async fn handle_crawl(config: Config, json: bool) -> anyhow::Result<BotState> {
    let id_generator = Arc::new(IdGenerator::new());
    let collaborators = Collaborators::http(&config, Arc::clone(&id_generator))
        .context("Failed to build HTTP client")?;
    let bot = Arc::new(Bot::new(collaborators, id_generator));

    let summary = Arc::new(Mutex::new(CrawlSummary::default()));
    {
        let summary = Arc::clone(&summary);
        bot.on_event(move |event| {
            if let Ok(mut summary) = summary.lock() {
                summary.record(event);
            }

            if !json {
                log_event(event);
                return;
            }
            match to_json_line(event) {
                Ok(line) => println!("{}", line),
                Err(e) => tracing::error!("Failed to serialize event: {}", e),
            }
        });
    }

    if !bot.try_start(&config).await {
        bail!("Failed to start crawl at {}", config.crawl.start_uri);
    }

    let final_state = tokio::select! {
        state = bot.wait_for_completion() => state,
        interrupted = tokio::signal::ctrl_c() => {
            match interrupted {
                Ok(()) => {
                    tracing::info!("Stopping crawl ...");
                    bot.stop().await;
                }
                Err(e) => tracing::error!("Failed to listen for Ctrl-C: {}", e),
            }
            bot.wait_for_completion().await
        }
    };

    if !json {
        if let Ok(summary) = summary.lock() {
            print_summary(&summary);
        }
    }
    Ok(final_state)
}
