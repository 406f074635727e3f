use crate::models::{JobPosting, ScrapeOutcome, ScrapeStatus};
use crate::orchestrator::CompanyReport;

/// Everything a run produced, in roster order.
#[derive(Debug, Clone, Default)]
pub struct RunResults {
    pub postings: Vec<JobPosting>,
    pub outcomes: Vec<ScrapeOutcome>,
}

impl RunResults {
    pub fn merge(reports: Vec<CompanyReport>) -> Self {
        let mut results = RunResults::default();
        for report in reports {
            results.postings.extend(report.postings);
            results.outcomes.push(report.outcome);
        }
        results
    }

    /// Companies never attempted because the run was cancelled.
    pub fn skipped(&self) -> Vec<&ScrapeOutcome> {
        self.outcomes.iter().filter(|o| o.skipped).collect()
    }

    pub fn breakdown(&self) -> StatusBreakdown<'_> {
        StatusBreakdown::from_outcomes(&self.outcomes)
    }
}

/// Outcomes split four ways by status.
#[derive(Debug, Default)]
pub struct StatusBreakdown<'a> {
    pub success: Vec<&'a ScrapeOutcome>,
    pub no_matching_jobs: Vec<&'a ScrapeOutcome>,
    pub api_error: Vec<&'a ScrapeOutcome>,
    pub no_api_found: Vec<&'a ScrapeOutcome>,
}

impl<'a> StatusBreakdown<'a> {
    pub fn from_outcomes(outcomes: &'a [ScrapeOutcome]) -> Self {
        let mut breakdown = StatusBreakdown::default();
        for outcome in outcomes {
            match outcome.status {
                ScrapeStatus::Success => breakdown.success.push(outcome),
                ScrapeStatus::NoMatchingJobs => breakdown.no_matching_jobs.push(outcome),
                ScrapeStatus::ApiError => breakdown.api_error.push(outcome),
                ScrapeStatus::NoApiFound => breakdown.no_api_found.push(outcome),
            }
        }
        breakdown
    }

    pub fn of(&self, status: ScrapeStatus) -> &[&'a ScrapeOutcome] {
        match status {
            ScrapeStatus::Success => &self.success,
            ScrapeStatus::NoMatchingJobs => &self.no_matching_jobs,
            ScrapeStatus::ApiError => &self.api_error,
            ScrapeStatus::NoApiFound => &self.no_api_found,
        }
    }

    pub fn total(&self) -> usize {
        self.success.len() + self.no_matching_jobs.len() + self.api_error.len() + self.no_api_found.len()
    }
}
