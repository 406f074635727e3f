use serde::Deserialize;
use serde_json::{json, Value};

use super::{id_string, location_or_placeholder, usable_title, ParseContext, ParsedPage};
use crate::dates;
use crate::error::ScrapeError;
use crate::http::AtsRequest;
use crate::models::JobPosting;

const API_PATH: &str = "/api/apply/v2/jobs";
const PAGE_LIMIT: usize = 100;
const SEARCH_TEXT: &str = "intern";

/// Career sites list postings under `positions`; some older tenants use `jobs`.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(alias = "jobs")]
    positions: Vec<EightfoldJob>,
}

#[derive(Debug, Deserialize)]
struct EightfoldJob {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(rename = "canonicalPositionUrl", default)]
    canonical_url: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    apply_url: Option<String>,
    /// Creation time in epoch seconds.
    #[serde(default)]
    t_create: Option<i64>,
    #[serde(default)]
    job_description: Option<String>,
}

/// `https://{tenant}.eightfold.ai/careers` becomes
/// `https://{tenant}.eightfold.ai/api/apply/v2/jobs`. URLs that already
/// point at an API path, including custom career domains, are kept.
pub fn normalize(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    if url.contains("/api/") {
        return url.to_string();
    }
    match origin(url) {
        Some(origin) if origin.contains("eightfold.ai") => format!("{}{}", origin, API_PATH),
        _ => url.to_string(),
    }
}

/// Scheme and host of `url`.
fn origin(url: &str) -> Option<&str> {
    let scheme_end = url.find("://")? + 3;
    let host_end = url[scheme_end..]
        .find(['/', '?', '#'])
        .map(|i| scheme_end + i)
        .unwrap_or(url.len());
    Some(&url[..host_end])
}

pub fn request(api_url: &str, offset: usize) -> AtsRequest {
    AtsRequest::post(
        api_url,
        json!({
            "query": SEARCH_TEXT,
            "limit": PAGE_LIMIT,
            "offset": offset,
        }),
    )
}

pub fn parse(body: &str, ctx: &ParseContext) -> Result<ParsedPage, ScrapeError> {
    let envelope: Envelope = serde_json::from_str(body)?;
    let raw_count = envelope.positions.len();

    let postings = envelope
        .positions
        .into_iter()
        .filter_map(|job| {
            let title = usable_title(job.name.or(job.title))?;
            let id = id_string(&job.id);
            let url = job
                .canonical_url
                .or(job.url)
                .or(job.apply_url)
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| fallback_link(ctx.api_url, &id));
            Some(
                JobPosting::new(ctx.company, &title, &location_or_placeholder(job.location), &url, &id)
                    .with_posted_date(job.t_create.and_then(dates::from_epoch_secs))
                    .with_description(job.job_description.unwrap_or_default()),
            )
        })
        .collect();

    Ok(ParsedPage {
        postings,
        raw_count,
        total: None,
    })
}

fn fallback_link(api_url: &str, id: &str) -> String {
    let origin = origin(api_url).unwrap_or(api_url);
    if id.is_empty() {
        format!("{}/careers", origin)
    } else {
        format!("{}/careers?pid={}", origin, id)
    }
}
