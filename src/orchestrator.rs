use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::ats;
use crate::discovery::Discoverer;
use crate::error::ScrapeError;
use crate::filter::PostingFilter;
use crate::http::AtsClient;
use crate::models::{CompanyEntry, JobPosting, ScrapeOutcome, ScrapeStatus};

pub const CANCELLED_DETAIL: &str = "skipped: run cancelled";
pub const UNRECOGNIZED_DETAIL: &str = "unrecognized ATS endpoint";

/// Where a company is in its scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Pending,
    Discovering,
    Fetching,
    Done(ScrapeStatus),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Pending => f.write_str("pending"),
            Stage::Discovering => f.write_str("discovering"),
            Stage::Fetching => f.write_str("fetching"),
            Stage::Done(status) => write!(f, "done({})", status),
        }
    }
}

/// Output for one roster entry.
#[derive(Debug, Clone)]
pub struct CompanyReport {
    pub postings: Vec<JobPosting>,
    pub outcome: ScrapeOutcome,
}

impl CompanyReport {
    fn failed(outcome: ScrapeOutcome) -> Self {
        Self {
            postings: Vec::new(),
            outcome,
        }
    }
}

pub struct Orchestrator {
    client: AtsClient,
    discoverer: Discoverer,
    filter: PostingFilter,
    cancel: Arc<AtomicBool>,
}

impl Orchestrator {
    pub fn new(client: AtsClient, filter: PostingFilter, cancel: Arc<AtomicBool>) -> Self {
        let discoverer = Discoverer::new(client.clone(), filter.window.today());
        Self {
            client,
            discoverer,
            filter,
            cancel,
        }
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Scrape the roster in order. Always yields one report per entry.
    pub async fn run(&mut self, roster: &mut [CompanyEntry]) -> Vec<CompanyReport> {
        let total = roster.len();
        let mut reports = Vec::with_capacity(total);

        for (i, entry) in roster.iter_mut().enumerate() {
            if self.cancelled() {
                tracing::warn!(company = %entry.name, "Run cancelled, skipping");
                reports.push(CompanyReport::failed(
                    ScrapeOutcome::new(&entry.name, ScrapeStatus::ApiError)
                        .with_detail(CANCELLED_DETAIL)
                        .mark_skipped(),
                ));
                continue;
            }

            tracing::info!(company = %entry.name, stage = %Stage::Pending, "[{}/{}]", i + 1, total);
            let report = self.scrape_company(entry).await;
            tracing::info!(
                company = %entry.name,
                stage = %Stage::Done(report.outcome.status),
                kept = report.postings.len(),
                fetched = report.outcome.fetched,
                detail = report.outcome.detail.as_deref().unwrap_or(""),
                "Company finished"
            );
            reports.push(report);
        }
        reports
    }

    async fn scrape_company(&mut self, entry: &mut CompanyEntry) -> CompanyReport {
        if entry.api_url.is_none() {
            tracing::info!(company = %entry.name, stage = %Stage::Discovering);
            match self.discoverer.discover(&entry.name).await {
                Some(endpoint) => {
                    entry.bind(endpoint);
                }
                None => {
                    let tried = self.discoverer.candidates_tried(&entry.name);
                    entry.mark_scraped();
                    return CompanyReport::failed(
                        ScrapeOutcome::new(&entry.name, ScrapeStatus::NoApiFound)
                            .with_detail(ScrapeError::DiscoveryExhausted { tried }.to_string()),
                    );
                }
            }
        }

        let Some(endpoint) = entry.endpoint() else {
            entry.mark_scraped();
            let mut outcome = ScrapeOutcome::new(&entry.name, ScrapeStatus::ApiError).with_detail(UNRECOGNIZED_DETAIL);
            outcome.endpoint = entry.api_url.clone();
            return CompanyReport::failed(outcome);
        };

        tracing::info!(company = %entry.name, stage = %Stage::Fetching, platform = %endpoint.platform);
        let (postings, outcome) = ats::fetch_jobs(&self.client, &entry.name, &endpoint, &self.filter).await;
        entry.mark_scraped();
        CompanyReport { postings, outcome }
    }
}
