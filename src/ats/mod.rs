//! ATS adapters. Each platform is a set of pure functions (normalize the
//! endpoint, build the request for a page, parse a page body) chosen by a
//! match on `Platform`; the network loop here is shared.

pub mod eightfold;
pub mod greenhouse;
pub mod lever;
pub mod smartrecruiters;
pub mod workday;

use chrono::NaiveDate;
use serde_json::Value;
use std::collections::HashSet;

use crate::error::ScrapeError;
use crate::filter::PostingFilter;
use crate::http::{AtsClient, AtsRequest};
use crate::models::{Endpoint, JobPosting, Platform, ScrapeOutcome, ScrapeStatus};

pub const LOCATION_PLACEHOLDER: &str = "Unspecified";

/// Upper bound on pages fetched from a paginated platform.
pub const MAX_PAGES: usize = 10;

/// What a parser needs besides the body.
pub struct ParseContext<'a> {
    pub company: &'a str,
    pub api_url: &'a str,
    pub today: NaiveDate,
}

#[derive(Debug, Default)]
pub struct ParsedPage {
    pub postings: Vec<JobPosting>,
    /// Job objects present in the body, including skipped ones.
    pub raw_count: usize,
    /// Total reported by the platform, when it paginates.
    pub total: Option<usize>,
}

pub struct PlatformSpec {
    pub normalize: fn(&str) -> String,
    pub request: fn(&str, usize) -> AtsRequest,
    pub parse: fn(&str, &ParseContext) -> Result<ParsedPage, ScrapeError>,
    pub paginated: bool,
}

pub fn spec_for(platform: Platform) -> Option<PlatformSpec> {
    match platform {
        Platform::Workday => Some(PlatformSpec {
            normalize: workday::normalize,
            request: workday::request,
            parse: workday::parse,
            paginated: true,
        }),
        Platform::Greenhouse => Some(PlatformSpec {
            normalize: greenhouse::normalize,
            request: greenhouse::request,
            parse: greenhouse::parse,
            paginated: false,
        }),
        Platform::Lever => Some(PlatformSpec {
            normalize: lever::normalize,
            request: lever::request,
            parse: lever::parse,
            paginated: false,
        }),
        Platform::SmartRecruiters => Some(PlatformSpec {
            normalize: smartrecruiters::normalize,
            request: smartrecruiters::request,
            parse: smartrecruiters::parse,
            paginated: false,
        }),
        Platform::Eightfold => Some(PlatformSpec {
            normalize: eightfold::normalize,
            request: eightfold::request,
            parse: eightfold::parse,
            paginated: false,
        }),
        Platform::Unknown => None,
    }
}

/// Rewrite a configured public-site or API URL into the API URL the
/// adapter calls. Unknown platforms pass through untouched.
pub fn normalize_endpoint(endpoint: &Endpoint) -> Endpoint {
    match spec_for(endpoint.platform) {
        Some(spec) => Endpoint::new((spec.normalize)(&endpoint.api_url), endpoint.platform),
        None => endpoint.clone(),
    }
}

/// Fetch, parse, deduplicate and filter one company's postings. Never
/// fails: every error becomes an `ApiError` outcome with empty postings.
pub async fn fetch_jobs(
    client: &AtsClient,
    company: &str,
    endpoint: &Endpoint,
    filter: &PostingFilter,
) -> (Vec<JobPosting>, ScrapeOutcome) {
    let endpoint = normalize_endpoint(endpoint);
    let outcome = ScrapeOutcome::new(company, ScrapeStatus::ApiError).with_endpoint(endpoint.api_url.clone());

    let Some(spec) = spec_for(endpoint.platform) else {
        return (Vec::new(), outcome.with_detail("unrecognized ATS endpoint"));
    };

    let ctx = ParseContext {
        company,
        api_url: &endpoint.api_url,
        today: filter.window.today(),
    };

    let (postings, fetched) = match fetch_all_pages(client, &spec, &ctx).await {
        Ok(result) => result,
        Err(e) => {
            tracing::debug!(company, error = %e, "ATS fetch failed");
            return (Vec::new(), outcome.with_detail(e.to_string()));
        }
    };

    let kept: Vec<JobPosting> = dedup(postings).into_iter().filter(|p| filter.admits(p)).collect();

    let mut outcome = outcome.with_fetched(fetched);
    if kept.is_empty() {
        outcome.status = ScrapeStatus::NoMatchingJobs;
        outcome.detail = Some(format!("0 of {} postings matched", fetched));
    } else {
        outcome.status = ScrapeStatus::Success;
        outcome.detail = Some(format!("{} of {} postings matched", kept.len(), fetched));
    }
    (kept, outcome)
}

async fn fetch_all_pages(
    client: &AtsClient,
    spec: &PlatformSpec,
    ctx: &ParseContext<'_>,
) -> Result<(Vec<JobPosting>, usize), ScrapeError> {
    let mut postings = Vec::new();
    let mut fetched = 0;
    let mut offset = 0;
    // Workday reports the total on the first page only; later pages say 0.
    let mut expected: Option<usize> = None;

    for _ in 0..MAX_PAGES {
        let request = (spec.request)(ctx.api_url, offset);
        let reply = client.send(&request).await?;
        let page = (spec.parse)(&reply.body, ctx)?;

        fetched += page.raw_count;
        postings.extend(page.postings);

        if !spec.paginated || page.raw_count == 0 {
            break;
        }
        offset += page.raw_count;
        if expected.is_none() {
            expected = page.total.filter(|t| *t > 0);
        }
        match expected {
            Some(total) if offset >= total => break,
            _ => {}
        }
    }
    Ok((postings, fetched))
}

fn dedup(postings: Vec<JobPosting>) -> Vec<JobPosting> {
    let mut seen = HashSet::new();
    postings.into_iter().filter(|p| seen.insert(p.dedup_key())).collect()
}

/// One page, one attempt, no filters. Success means HTTP 2xx and a body
/// that parses as the platform's envelope; the job count is returned.
pub async fn probe(client: &AtsClient, endpoint: &Endpoint, today: NaiveDate) -> Result<usize, ScrapeError> {
    let spec = spec_for(endpoint.platform).ok_or_else(|| ScrapeError::Parse("no adapter for platform".into()))?;
    let ctx = ParseContext {
        company: "",
        api_url: &endpoint.api_url,
        today,
    };
    let reply = client.send_once(&(spec.request)(&endpoint.api_url, 0)).await?;
    let page = (spec.parse)(&reply.body, &ctx)?;
    Ok(page.raw_count)
}

// --- Shared field helpers for the platform parsers ---

/// Ids arrive as strings on some platforms and numbers on others.
pub(crate) fn id_string(value: &Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

pub(crate) fn location_or_placeholder(location: Option<String>) -> String {
    location
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| LOCATION_PLACEHOLDER.to_string())
}

/// Title, if present and non-blank.
pub(crate) fn usable_title(title: Option<String>) -> Option<String> {
    title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

/// The path segment after `marker` in a URL, e.g. the board slug after
/// `greenhouse.io/`.
pub(crate) fn segment_after<'a>(url: &'a str, marker: &str) -> Option<&'a str> {
    let idx = url.find(marker)?;
    let rest = &url[idx + marker.len()..];
    let seg = rest.split(['/', '?', '#']).next()?;
    if seg.is_empty() { None } else { Some(seg) }
}
