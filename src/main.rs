//! Markdown Spider main entry point
//!
//! This is the command-line interface for the Markdown Spider crawler.

use anyhow::{bail, Context};
use clap::Parser;
use markdown_spider::config::{load_config_with_hash, validate, write_sample_config, Config, OutputFormat};
use markdown_spider::crawler::Crawler;
use markdown_spider::output::print_summary;
use markdown_spider::rules::CrawlScope;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Markdown Spider: a rule-driven documentation crawler
///
/// Crawls the pages reachable from a seed URL, extracts the content chosen
/// by path-specific rules and writes it as Markdown or HTML into a directory
/// tree mirroring the site.
#[derive(Parser, Debug)]
#[command(name = "markdown-spider")]
#[command(version)]
#[command(about = "A rule-driven documentation crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Seed URL (required without a configuration file)
    #[arg(long)]
    url: Option<String>,

    /// Output directory
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Maximum link depth from the seed
    #[arg(short = 'd', long)]
    max_depth: Option<u32>,

    /// Number of concurrent workers
    #[arg(short = 't', long)]
    threads: Option<usize>,

    /// Seconds each worker waits between requests
    #[arg(short = 'r', long)]
    throttle: Option<f64>,

    /// Only follow links on the seed's domain
    #[arg(long)]
    domain_only: bool,

    /// Output format (md or html)
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// User-Agent header sent with every request
    #[arg(long)]
    user_agent: Option<String>,

    /// Maximum number of links followed per page
    #[arg(long)]
    max_children: Option<usize>,

    /// Stop after this many pages
    #[arg(long)]
    max_pages: Option<usize>,

    /// Overwrite files that already exist
    #[arg(long)]
    force_overwrite: bool,

    /// Write an annotated sample configuration to FILE and exit
    #[arg(long, value_name = "FILE", conflicts_with = "dry_run")]
    generate_config: Option<PathBuf>,

    /// Validate the configuration and show the rules without crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    if let Some(path) = &cli.generate_config {
        write_sample_config(path)
            .with_context(|| format!("Failed to write sample configuration to {}", path.display()))?;
        println!("Wrote sample configuration to {}", path.display());
        return Ok(());
    }

    let config = build_config(&cli)?;
    validate(&config).context("Invalid configuration")?;

    if cli.dry_run {
        handle_dry_run(&config)?;
    } else {
        handle_crawl(config, cli.quiet).await?;
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
            0 => EnvFilter::new("markdown_spider=info,warn"),
            1 => EnvFilter::new("markdown_spider=debug,info"),
            2 => EnvFilter::new("markdown_spider=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration file (if any) and applies command-line overrides
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => match &cli.url {
            Some(url) => Config::new(url.clone()),
            None => bail!("Either --config or --url is required"),
        },
    };

    if let Some(url) = &cli.url {
        config.url = url.clone();
    }
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(depth) = cli.max_depth {
        config.max_depth = depth;
    }
    if let Some(threads) = cli.threads {
        config.num_threads = threads;
    }
    if let Some(throttle) = cli.throttle {
        config.throttle = throttle;
    }
    if cli.domain_only {
        config.same_domain_only = true;
    }
    if let Some(format) = cli.format {
        config.format = format;
    }
    if let Some(agent) = &cli.user_agent {
        config
            .headers
            .retain(|name, _| !name.eq_ignore_ascii_case("user-agent"));
        config.headers.insert("User-Agent".to_string(), agent.clone());
    }
    if let Some(max) = cli.max_children {
        config.max_children_per_page = Some(max);
    }
    if let Some(max) = cli.max_pages {
        config.max_pages = Some(max);
    }
    if cli.force_overwrite {
        config.force_overwrite = true;
    }

    Ok(config)
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    let scope = CrawlScope::from_config(config)?;

    println!("=== Markdown Spider Dry Run ===\n");

    println!("Crawl:");
    println!("  Seed: {}", scope.seed());
    println!("  Max depth: {}", config.max_depth);
    println!("  Workers: {}", config.num_threads);
    println!("  Throttle: {}s", config.throttle);
    println!("  Same domain only: {}", config.same_domain_only);
    if let Some(max) = config.max_pages {
        println!("  Max pages: {}", max);
    }

    println!("\nOutput:");
    println!("  Directory: {}", config.output_dir.display());
    println!("  Format: {}", config.format.extension());
    println!("  Seed document: {}", scope.output_path(scope.seed()));

    println!("\nPath Configs ({}):", scope.rules().len());
    for rule in scope.rules().iter() {
        println!("  - {} ({})", rule.prefix.as_str(), rule.description);
        println!(
            "    {} target selector(s), {} ignore selector(s), {} exclude / {} include pattern(s)",
            rule.target_content.len(),
            rule.ignore_selectors.len(),
            rule.exclude_patterns.len(),
            rule.include_patterns.len()
        );
    }

    println!(
        "\nSeed uses: {}",
        scope.rule_for(scope.seed()).description
    );
    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the crawl mode
async fn handle_crawl(config: Config, quiet: bool) -> anyhow::Result<()> {
    let output_dir = config.output_dir.clone();
    let crawler = Crawler::new(config).context("Failed to start crawl")?;

    let handle = crawler.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.stop();
        }
    });

    let summary = crawler.run().await?;

    if !quiet {
        println!();
        print_summary(&summary);
        println!("\nOutput written to {}", output_dir.display());
    }

    Ok(())
}
