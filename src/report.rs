//! Run report: CSV sheets plus `summary.json` on disk, and the terminal
//! summary printed after a run.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::aggregate::RunResults;
use crate::filter::DateWindow;
use crate::models::{JobPosting, ScrapeOutcome, ScrapeStatus};

pub const JOB_MATCHES_FILE: &str = "job_matches.csv";
pub const SUMMARY_FILE: &str = "summary.json";

/// Names listed per category in the terminal summary.
const MAX_LISTED: usize = 20;

const JOB_HEADERS: [&str; 8] = [
    "Company",
    "Job Title",
    "Location",
    "Posted Date",
    "Job URL",
    "Job ID",
    "Recommended Resume",
    "Match Score",
];

const OUTCOME_HEADERS: [&str; 4] = ["Company", "Status", "Endpoint", "Detail"];

pub fn category_file(status: ScrapeStatus) -> &'static str {
    match status {
        ScrapeStatus::Success => "success.csv",
        ScrapeStatus::NoMatchingJobs => "no_matching_jobs.csv",
        ScrapeStatus::ApiError => "api_errors.csv",
        ScrapeStatus::NoApiFound => "no_api_found.csv",
    }
}

#[derive(Debug, Serialize)]
struct Summary {
    generated_at: String,
    window_start: String,
    window_end: String,
    total_companies: usize,
    total_jobs: usize,
    status_counts: BTreeMap<String, usize>,
    /// Set when Ctrl-C cut the run short. Skipped companies are counted
    /// under `api_error` but were never contacted.
    cancelled: bool,
    skipped_companies: Vec<String>,
    jobs_per_company: BTreeMap<String, usize>,
    jobs_per_resume: BTreeMap<String, usize>,
}

/// Best match first, then most recent. Unscored and undated sort last.
pub fn sort_postings(postings: &mut [JobPosting]) {
    postings.sort_by(|a, b| {
        let by_score = match (a.similarity_score, b.similarity_score) {
            (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_score.then_with(|| match (a.posted_date, b.posted_date) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
    });
}

fn jobs_per_company(postings: &[JobPosting]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for p in postings {
        *counts.entry(p.company.clone()).or_insert(0) += 1;
    }
    counts
}

fn jobs_per_resume(postings: &[JobPosting]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for p in postings {
        if let Some(resume) = &p.recommended_resume {
            *counts.entry(resume.clone()).or_insert(0) += 1;
        }
    }
    counts
}

/// Write every sheet into `{output_dir}/{prefix}_{YYYYmmdd_HHMMSS}/` and
/// return that directory.
pub fn write_report(
    output_dir: &Path,
    prefix: &str,
    results: &RunResults,
    window: &DateWindow,
    generated_at: NaiveDateTime,
) -> Result<PathBuf> {
    let dir = output_dir.join(format!("{}_{}", prefix, generated_at.format("%Y%m%d_%H%M%S")));
    std::fs::create_dir_all(&dir).with_context(|| format!("Failed to create report directory: {}", dir.display()))?;

    let mut postings = results.postings.clone();
    sort_postings(&mut postings);
    write_jobs(&dir.join(JOB_MATCHES_FILE), &postings)?;

    let breakdown = results.breakdown();
    for status in ScrapeStatus::ALL {
        write_outcomes(&dir.join(category_file(status)), breakdown.of(status))?;
    }

    let skipped = results.skipped();
    let summary = Summary {
        generated_at: generated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        window_start: window.earliest.to_string(),
        window_end: window.latest.to_string(),
        total_companies: results.outcomes.len(),
        total_jobs: postings.len(),
        status_counts: ScrapeStatus::ALL
            .iter()
            .map(|s| (s.as_str().to_string(), breakdown.of(*s).len()))
            .collect(),
        cancelled: !skipped.is_empty(),
        skipped_companies: skipped.iter().map(|o| o.company.clone()).collect(),
        jobs_per_company: jobs_per_company(&postings),
        jobs_per_resume: jobs_per_resume(&postings),
    };
    let summary_path = dir.join(SUMMARY_FILE);
    let json = serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?;
    std::fs::write(&summary_path, json).with_context(|| format!("Failed to write {}", summary_path.display()))?;

    tracing::info!(dir = %dir.display(), jobs = postings.len(), "Report written");
    Ok(dir)
}

fn write_jobs(path: &Path, postings: &[JobPosting]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("Failed to create {}", path.display()))?;
    writer.write_record(JOB_HEADERS)?;
    for p in postings {
        let posted = p.posted_date.map(|d| d.to_string()).unwrap_or_else(|| "Unknown".to_string());
        let score = p
            .similarity_score
            .map(|s| format!("{:.1}%", s * 100.0))
            .unwrap_or_else(|| "N/A".to_string());
        writer.write_record([
            p.company.as_str(),
            p.title.as_str(),
            p.location.as_str(),
            posted.as_str(),
            p.url.as_str(),
            p.job_id.as_str(),
            p.recommended_resume.as_deref().unwrap_or("N/A"),
            score.as_str(),
        ])?;
    }
    writer.flush().with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn write_outcomes(path: &Path, outcomes: &[&ScrapeOutcome]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("Failed to create {}", path.display()))?;
    writer.write_record(OUTCOME_HEADERS)?;
    for o in outcomes {
        writer.write_record([
            o.company.as_str(),
            o.status.as_str(),
            o.endpoint.as_deref().unwrap_or(""),
            o.detail.as_deref().unwrap_or(""),
        ])?;
    }
    writer.flush().with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Fixed-width terminal summary of a finished run.
pub fn print_summary(results: &RunResults, report_dir: Option<&Path>) {
    println!();
    println!("{}", "=".repeat(60));
    println!("RUN COMPLETE");
    println!("{}", "=".repeat(60));
    if let Some(dir) = report_dir {
        println!("Report: {}", dir.display());
    }
    println!("Total jobs: {}", results.postings.len());
    let skipped = results.skipped().len();
    if skipped > 0 {
        println!("Run cancelled: {} companies skipped (listed under API_ERROR)", skipped);
    }

    let by_company = jobs_per_company(&results.postings);
    if !by_company.is_empty() {
        println!("\n{:<40} {:>6}", "COMPANY", "JOBS");
        println!("{}", "-".repeat(47));
        for (company, count) in &by_company {
            println!("{:<40} {:>6}", truncate(company, 40), count);
        }
    }

    let by_resume = jobs_per_resume(&results.postings);
    if !by_resume.is_empty() {
        println!("\n{:<40} {:>6}", "RECOMMENDED RESUME", "JOBS");
        println!("{}", "-".repeat(47));
        for (resume, count) in &by_resume {
            println!("{:<40} {:>6}", truncate(resume, 40), count);
        }
    }

    let breakdown = results.breakdown();
    println!("\n{}", "=".repeat(60));
    println!("COMPANY RESULTS");
    println!("{}", "=".repeat(60));
    for status in ScrapeStatus::ALL {
        let outcomes = breakdown.of(status);
        println!("\n[{}] {}: {}", status.as_str().to_uppercase(), status.describe(), outcomes.len());
        if outcomes.is_empty() {
            continue;
        }
        let names: Vec<&str> = outcomes.iter().take(MAX_LISTED).map(|o| o.company.as_str()).collect();
        let mut listed = names.join(", ");
        if outcomes.len() > MAX_LISTED {
            listed.push_str(&format!(" ... and {} more", outcomes.len() - MAX_LISTED));
        }
        for line in textwrap::fill(&listed, 70).lines() {
            println!("  {}", line);
        }
    }
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn posting(id: &str, score: Option<f32>, posted: Option<NaiveDate>) -> JobPosting {
        let mut p = JobPosting::new("Acme", "ML Intern", "Remote", &format!("https://a/{}", id), id).with_posted_date(posted);
        p.similarity_score = score;
        if score.is_some() {
            p.recommended_resume = Some("ML".into());
        }
        p
    }

    fn results() -> RunResults {
        RunResults {
            postings: vec![
                posting("low", Some(0.2), Some(day(9))),
                posting("undated", Some(0.8), None),
                posting("recent", Some(0.8), Some(day(9))),
                posting("unscored", None, Some(day(10))),
            ],
            outcomes: vec![
                ScrapeOutcome::new("Acme", ScrapeStatus::Success).with_endpoint("https://a"),
                ScrapeOutcome::new("Quiet", ScrapeStatus::NoMatchingJobs),
                ScrapeOutcome::new("Broken", ScrapeStatus::ApiError).with_detail("HTTP 500 from https://b"),
                ScrapeOutcome::new("Ghost", ScrapeStatus::NoApiFound),
            ],
        }
    }

    #[test]
    fn test_sort_by_score_then_date() {
        let mut postings = results().postings;
        sort_postings(&mut postings);
        let ids: Vec<&str> = postings.iter().map(|p| p.job_id.as_str()).collect();
        assert_eq!(ids, vec!["recent", "undated", "low", "unscored"]);
    }

    #[test]
    fn test_write_report_creates_every_sheet() {
        let tmp = tempfile::tempdir().unwrap();
        let at = day(10).and_hms_opt(14, 30, 5).unwrap();
        let window = DateWindow::ending_on(day(10), 7);

        let dir = write_report(tmp.path(), "job_matches", &results(), &window, at).unwrap();
        assert_eq!(dir, tmp.path().join("job_matches_20240510_143005"));

        for status in ScrapeStatus::ALL {
            assert!(dir.join(category_file(status)).exists());
        }

        let jobs = std::fs::read_to_string(dir.join(JOB_MATCHES_FILE)).unwrap();
        let mut lines = jobs.lines();
        assert_eq!(lines.next().unwrap(), JOB_HEADERS.join(","));
        assert!(lines.next().unwrap().starts_with("Acme,ML Intern,Remote,2024-05-09,https://a/recent,recent,ML,80.0%"));
        assert!(jobs.contains("Unknown"));
        assert!(jobs.contains("N/A"));

        let errors = std::fs::read_to_string(dir.join("api_errors.csv")).unwrap();
        assert!(errors.contains("Broken,api_error,,HTTP 500 from https://b"));

        let summary: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.join(SUMMARY_FILE)).unwrap()).unwrap();
        assert_eq!(summary["total_jobs"], 4);
        assert_eq!(summary["status_counts"]["no_api_found"], 1);
        assert_eq!(summary["window_start"], "2024-05-03");
        assert_eq!(summary["jobs_per_resume"]["ML"], 3);
        assert_eq!(summary["cancelled"], false);
        assert!(summary["skipped_companies"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_summary_flags_cancelled_run() {
        let tmp = tempfile::tempdir().unwrap();
        let results = RunResults {
            postings: Vec::new(),
            outcomes: vec![
                ScrapeOutcome::new("Broken", ScrapeStatus::ApiError).with_detail("HTTP 500 from https://b"),
                ScrapeOutcome::new("Later", ScrapeStatus::ApiError)
                    .with_detail("skipped: run cancelled")
                    .mark_skipped(),
            ],
        };
        let dir = write_report(
            tmp.path(),
            "run",
            &results,
            &DateWindow::ending_on(day(10), 7),
            day(10).and_hms_opt(0, 0, 0).unwrap(),
        )
        .unwrap();

        let summary: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.join(SUMMARY_FILE)).unwrap()).unwrap();
        assert_eq!(summary["cancelled"], true);
        assert_eq!(summary["skipped_companies"], serde_json::json!(["Later"]));
        assert_eq!(summary["status_counts"]["api_error"], 2);
    }

    #[test]
    fn test_write_report_with_no_jobs() {
        let tmp = tempfile::tempdir().unwrap();
        let results = RunResults {
            postings: Vec::new(),
            outcomes: vec![ScrapeOutcome::new("Broken", ScrapeStatus::ApiError)],
        };
        let dir = write_report(
            tmp.path(),
            "run",
            &results,
            &DateWindow::ending_on(day(10), 7),
            day(10).and_hms_opt(0, 0, 0).unwrap(),
        )
        .unwrap();

        let jobs = std::fs::read_to_string(dir.join(JOB_MATCHES_FILE)).unwrap();
        assert_eq!(jobs.lines().count(), 1);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long company name", 10), "a very ...");
    }
}
