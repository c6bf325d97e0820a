//! site-mirror main entry point
//!
//! This is the command-line interface for the site-mirror crawler.

use anyhow::Context;
use clap::Parser;
use site_mirror::config::{load_config_with_hash, resolve_user_agent, Config};
use site_mirror::crawler::crawl;
use site_mirror::export::OfflineExporter;
use site_mirror::output::{print_slowest, slowest_urls, ConsoleOutput, CrawlObserver};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit status of a run interrupted with Ctrl-C
const INTERRUPTED_EXIT_CODE: u8 = 130;

/// site-mirror: crawl a website and build an offline copy
///
/// Crawls every page reachable from the configured URL with a bounded pool
/// of workers, prints one row per URL and optionally writes a browsable
/// offline mirror with all links rewritten to relative paths.
#[derive(Parser, Debug)]
#[command(name = "site-mirror")]
#[command(version)]
#[command(about = "Website crawler with offline mirror export", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only print the final statistics
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration '{}'", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&config)?;
        return Ok(ExitCode::SUCCESS);
    }

    handle_crawl(&config, cli.quiet).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_mirror=info,warn"),
            1 => EnvFilter::new("site_mirror=debug,info"),
            2 => EnvFilter::new("site_mirror=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    let crawler = &config.crawler;
    let user_agent = resolve_user_agent(crawler)?;

    println!("=== site-mirror Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  URL: {}", crawler.url);
    println!("  Max workers: {}", crawler.max_workers);
    println!("  Timeout: {}s", crawler.timeout);
    println!("  User agent: {}", user_agent);
    println!("  Accept-Encoding: {}", crawler.accept_encoding);
    println!("  Crawled assets: {:?}", crawler.crawl_assets);
    println!("  Remove query params: {}", crawler.remove_query_params);

    println!("\nLimits:");
    println!("  Max queue length: {}", config.limits.max_queue_length);
    println!("  Max visited URLs: {}", config.limits.max_visited_urls);
    println!("  Max URL length: {}", config.limits.max_url_length);

    println!("\nAllowed Domains:");
    println!("  Crawling: {:?}", config.domains.allowed_for_crawling);
    println!("  Static files: {:?}", config.domains.allowed_for_static_files);

    match &config.export {
        Some(export) => {
            println!("\nOffline Export:");
            println!("  Directory: {}", export.directory.display());
            println!("  Filename sanitization: {:?}", export.filename_sanitization);
            println!("  File path length limit: {}", export.file_path_length_limit);
        }
        None => println!("\nOffline Export: disabled"),
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the main crawl operation followed by the optional export
async fn handle_crawl(config: &Config, quiet: bool) -> anyhow::Result<ExitCode> {
    let console = if quiet {
        ConsoleOutput::quiet()
    } else {
        ConsoleOutput::new()
    };
    let observers: Vec<Box<dyn CrawlObserver>> = vec![Box::new(console)];

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let report = crawl(config, observers, shutdown)
        .await
        .context("Crawl failed")?;

    let slowest = slowest_urls(
        &report.records,
        config.report.slowest_top_limit,
        config.report.slowest_min_time,
    );
    print_slowest(
        &slowest,
        config.report.slowest_top_limit,
        config.report.slowest_min_time,
    );

    if report.interrupted {
        tracing::warn!(
            incomplete = report.incomplete.len(),
            "Crawl interrupted, statistics are partial"
        );
        for url in &report.incomplete {
            tracing::debug!(url = %url, "Not completed");
        }
        return Ok(ExitCode::from(INTERRUPTED_EXIT_CODE));
    }

    if let Some(export) = &config.export {
        let exporter = OfflineExporter::from_config(config, export)
            .context("Failed to prepare offline export")?;
        let summary = exporter
            .export(&report)
            .await
            .context("Offline export failed")?;
        println!(
            "Offline website generated to '{}' ({} files stored, {} skipped)",
            exporter.directory().display(),
            summary.stored,
            summary.skipped
        );
        for notice in &summary.notices {
            println!("  notice: {}", notice);
        }
    }

    Ok(ExitCode::SUCCESS)
}
