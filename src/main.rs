//! # pagesift CLI Application
//!
//! Command-line front end for the pagesift extraction pipeline.
//!
//! ## Key Components
//!
//! - CLI argument parsing with clap
//! - Subcommands:
//!   - `scrape`: fetch URLs, extract records and write them as JSON
//!   - `extract`: run the offline pipeline on a saved HTML file
//!   - `classify`: print the site type of each URL
//!
//! Logs go to stderr through `tracing`, or to a file with `--log-file`.
//! A scrape run exits with an error only when no record was produced.

mod telemetry;

use std::path::PathBuf;

use anyhow::{Context, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use pagesift::{Fetcher, FetcherConfig, ScrapeConfig, ScrapeRecord, Scraper, sink};
use tracing::{info, instrument, warn};

#[derive(Parser)]
#[command(author, version, about = "Extract clean, chunked records from web pages", long_about = None)]
struct Cli {
    /// Log filter, e.g. `debug` or `pagesift=trace` (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch pages and extract records
    Scrape(ScrapeArgs),

    /// Extract a record from a saved HTML file
    Extract(ExtractArgs),

    /// Print the site type for URLs
    Classify(ClassifyArgs),
}

#[derive(Args, Debug)]
struct ScrapeArgs {
    /// URL to scrape (repeatable)
    #[arg(short, long = "url", required_unless_present = "urls_file")]
    urls: Vec<String>,

    /// File with one URL per line
    #[arg(short = 'f', long)]
    urls_file: Option<PathBuf>,

    /// Write all records to this JSON file
    #[arg(short, long, conflicts_with = "output_dir")]
    output: Option<PathBuf>,

    /// Write one `<id>.json` file per record into this directory
    #[arg(short = 'd', long)]
    output_dir: Option<PathBuf>,

    /// Base retry backoff in milliseconds
    #[arg(long, default_value = "1000")]
    delay_ms: u64,

    /// Requests per second across all fetches
    #[arg(long, default_value = "1")]
    rate: u32,

    /// Retries for transient fetch failures
    #[arg(short, long, default_value = "3")]
    retries: u32,

    /// Maximum concurrent requests
    #[arg(short, long, default_value = "4")]
    concurrency: usize,

    /// Chunk size in characters (overrides the config file)
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Chunk overlap in characters (overrides the config file)
    #[arg(long)]
    overlap: Option<usize>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit compact JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// URL the page was fetched from
    #[arg(required = true)]
    url: String,

    /// Saved HTML of the page
    #[arg(long)]
    html: PathBuf,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit compact JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,
}

#[derive(Args, Debug)]
struct ClassifyArgs {
    /// URLs to classify
    #[arg(required = true)]
    urls: Vec<String>,

    /// JSON configuration file with custom site rules
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _guard =
        telemetry::init_tracing_subscriber(cli.log_level.as_deref(), cli.log_file.as_deref())?;

    match cli.command {
        Some(Commands::Scrape(args)) => scrape_command(args).await?,
        Some(Commands::Extract(args)) => extract_command(args).await?,
        Some(Commands::Classify(args)) => classify_command(args).await?,
        None => {
            // If no command is provided, show help
            let _ = Cli::parse_from(["pagesift", "--help"]);
        }
    }

    Ok(())
}

async fn load_config(path: Option<&PathBuf>) -> anyhow::Result<ScrapeConfig> {
    match path {
        Some(path) => ScrapeConfig::read_config(path)
            .await
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(ScrapeConfig::default()),
    }
}

#[instrument]
async fn scrape_command(args: ScrapeArgs) -> anyhow::Result<()> {
    let mut urls = args.urls.clone();
    if let Some(file) = &args.urls_file {
        urls.extend(sink::load_urls(file).await?);
    }
    if urls.is_empty() {
        bail!("no URLs to scrape");
    }

    let mut config = load_config(args.config.as_ref()).await?;
    if let Some(chunk_size) = args.chunk_size {
        config.chunk_size = chunk_size;
    }
    if let Some(overlap) = args.overlap {
        config.overlap = overlap;
    }
    let scraper = Scraper::new(config)?;

    let fetcher = Fetcher::new(
        FetcherConfig::builder()
            .retries(args.retries)
            .retry_delay_ms(args.delay_ms)
            .requests_per_second(args.rate)
            .concurrency(args.concurrency)
            .build(),
    )?;

    let progress_bar = ProgressBar::new(urls.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({eta}) {msg}")?
            .progress_chars("##-"),
    );
    progress_bar.set_message("Scraping pages...");

    let mut fetches = std::pin::pin!(fetcher.fetch_all(&urls));

    let mut records: Vec<(usize, ScrapeRecord)> = Vec::with_capacity(urls.len());
    let mut failures = 0usize;
    while let Some((index, fetched)) = fetches.next().await {
        let url = &urls[index];
        let outcome = fetched.and_then(|page| scraper.scrape_page(&page));
        match outcome {
            Ok(record) => records.push((index, record)),
            Err(e) => {
                failures += 1;
                warn!("Skipping {}: {}", url, e);
            }
        }
        progress_bar.inc(1);
        progress_bar.set_message(format!("Processed {url}"));
    }
    progress_bar.finish_with_message(format!(
        "Scraped {} of {} pages",
        records.len(),
        urls.len()
    ));

    // Keep records in input order
    records.sort_by_key(|(index, _)| *index);
    let records: Vec<ScrapeRecord> = records.into_iter().map(|(_, record)| record).collect();

    info!(
        "Extracted {} records, {} failures",
        records.len(),
        failures
    );
    if records.is_empty() {
        return Err(anyhow!("no records were produced from {} URLs", urls.len()));
    }

    let pretty = !args.compact;
    if let Some(dir) = &args.output_dir {
        let paths = sink::write_each(&records, dir, pretty).await?;
        println!("Saved {} records to {}", paths.len(), dir.display());
    } else if let Some(output) = &args.output {
        sink::write_json(&records, output, pretty).await?;
        println!("Saved {} records to {}", records.len(), output.display());
    } else {
        sink::to_stdout(&records, pretty).await?;
    }

    Ok(())
}

#[instrument]
async fn extract_command(args: ExtractArgs) -> anyhow::Result<()> {
    let scraper = Scraper::new(load_config(args.config.as_ref()).await?)?;
    let html = tokio::fs::read_to_string(&args.html)
        .await
        .with_context(|| format!("reading {}", args.html.display()))?;

    let record = scraper.scrape(&args.url, &html)?;
    sink::to_stdout(std::slice::from_ref(&record), !args.compact).await?;
    Ok(())
}

#[instrument]
async fn classify_command(args: ClassifyArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_ref()).await?;
    let scraper = Scraper::new(config)?;

    for url in &args.urls {
        match scraper.classifier().classify(url) {
            Ok(site_type) => println!("{url}\t{site_type}"),
            Err(e) => warn!("Cannot classify {}: {}", url, e),
        }
    }
    Ok(())
}
