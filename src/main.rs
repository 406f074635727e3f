mod aggregate;
mod ats;
mod config;
mod dates;
mod discovery;
mod error;
mod filter;
mod http;
mod matching;
mod models;
mod orchestrator;
mod report;
#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use aggregate::RunResults;
use config::FileConfig;
use discovery::Discoverer;
use filter::{DateWindow, PostingFilter, TitleFilter};
use http::{AtsClient, IntervalGate, ReqwestTransport, RetryPolicy};
use matching::TermVectorScorer;
use orchestrator::Orchestrator;
use report::truncate;

#[derive(Parser)]
#[command(name = "internhunt")]
#[command(about = "Internship search across ATS job boards - discover, scrape, filter and rank")]
struct Cli {
    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape every configured company and write a report
    Run {
        /// Path to config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the lookback window in days
        #[arg(short, long)]
        days: Option<u32>,

        /// Skip resume similarity scoring
        #[arg(long)]
        no_similarity: bool,

        /// Override the report output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Find the ATS endpoint for one or more company names
    Discover {
        /// Path to config file (network settings only)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Company names
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Write a commented sample config
    Init {
        /// Where to write it
        #[arg(short, long)]
        path: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), level))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn build_client(timeout: Duration, min_interval: Duration, max_retries: u32) -> Result<AtsClient> {
    let transport = ReqwestTransport::new(timeout)?;
    Ok(AtsClient::new(
        Arc::new(transport),
        Arc::new(IntervalGate::new(min_interval)),
        RetryPolicy {
            max_retries,
            request_timeout: timeout,
            ..RetryPolicy::default()
        },
    ))
}

fn client_for(config: &FileConfig) -> Result<AtsClient> {
    build_client(config.request_timeout(), config.min_request_interval(), config.max_retries)
}

/// Raise the cancel flag on Ctrl-C. Companies already scraped are still reported.
fn watch_for_cancel() -> Arc<AtomicBool> {
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing current company then writing report");
            flag.store(true, Ordering::SeqCst);
        }
    });
    cancel
}

async fn run(
    config_path: Option<PathBuf>,
    days: Option<u32>,
    no_similarity: bool,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let config_path = config_path.unwrap_or_else(config::default_config_path);
    let config = config::load_config(&config_path)?;
    let mut roster = config.roster();

    let days = days.unwrap_or(config.days_lookback);
    let window = DateWindow::ending_at(chrono::Utc::now(), days);
    let filter = PostingFilter::new(
        TitleFilter::new(&config.title_keywords, &config.specialty_keywords, &config.relevant_terms),
        window,
    );

    println!("Searching {} companies for postings from {} to {}", roster.len(), window.earliest, window.latest);

    let client = client_for(&config)?;
    let mut orchestrator = Orchestrator::new(client, filter, watch_for_cancel());
    let reports = orchestrator.run(&mut roster).await;
    let mut results = RunResults::merge(reports);

    if no_similarity {
        tracing::info!("Similarity scoring disabled");
    } else {
        let resumes = matching::load_resumes(&config.resumes);
        if resumes.is_empty() {
            tracing::warn!("No resumes loaded, skipping similarity scoring");
        } else {
            matching::recommend(&mut results.postings, &resumes, &TermVectorScorer);
        }
    }

    let output_dir = output_dir.unwrap_or_else(|| config.output.directory.clone());
    let written = report::write_report(
        &output_dir,
        &config.output.filename_prefix,
        &results,
        &window,
        chrono::Local::now().naive_local(),
    );
    report::print_summary(&results, written.as_ref().ok().map(|p| p.as_path()));
    written.context("Failed to write report")?;
    Ok(())
}

async fn discover(config_path: Option<PathBuf>, names: Vec<String>) -> Result<()> {
    let client = match config_path {
        Some(path) => client_for(&config::load_config(&path)?)?,
        None => {
            let path = config::default_config_path();
            if path.exists() {
                client_for(&config::load_config(&path)?)?
            } else {
                let defaults = RetryPolicy::default();
                build_client(defaults.request_timeout, Duration::from_millis(500), defaults.max_retries)?
            }
        }
    };

    let mut discoverer = Discoverer::new(client, chrono::Utc::now().date_naive());
    println!("{:<30} {:<16} {}", "COMPANY", "PLATFORM", "ENDPOINT");
    println!("{}", "-".repeat(100));
    for name in &names {
        match discoverer.discover(name).await {
            Some(endpoint) => {
                println!("{:<30} {:<16} {}", truncate(name, 30), endpoint.platform, endpoint.api_url);
            }
            None => {
                let tried = discoverer.candidates_tried(name);
                println!(
                    "{:<30} {:<16} not found ({} candidates tried)",
                    truncate(name, 30),
                    "-",
                    tried
                );
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            config,
            days,
            no_similarity,
            output_dir,
        } => run(config, days, no_similarity, output_dir).await?,

        Commands::Discover { config, names } => discover(config, names).await?,

        Commands::Init { path } => {
            let path = path.unwrap_or_else(|| PathBuf::from(config::CONFIG_FILE_NAME));
            config::write_sample(&path)?;
            println!("Sample config written to {}", path.display());
        }
    }

    Ok(())
}
