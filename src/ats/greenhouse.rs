use serde::Deserialize;
use serde_json::Value;

use super::{id_string, location_or_placeholder, segment_after, usable_title, ParseContext, ParsedPage};
use crate::dates;
use crate::error::ScrapeError;
use crate::http::AtsRequest;
use crate::models::JobPosting;

const API_BASE: &str = "https://boards-api.greenhouse.io/v1/boards";

#[derive(Debug, Deserialize)]
struct Envelope {
    jobs: Vec<GreenhouseJob>,
}

#[derive(Debug, Deserialize)]
struct GreenhouseJob {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    absolute_url: Option<String>,
    #[serde(default)]
    location: Option<GreenhouseLocation>,
    #[serde(default)]
    first_published: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GreenhouseLocation {
    #[serde(default)]
    name: Option<String>,
}

pub fn board_slug(url: &str) -> String {
    let url = url.trim();
    segment_after(url, "/boards/")
        .or_else(|| segment_after(url, "greenhouse.io/"))
        .unwrap_or(url.trim_matches('/'))
        .to_string()
}

/// Board URL or bare slug to the board's jobs API.
pub fn normalize(url: &str) -> String {
    format!("{}/{}/jobs", API_BASE, board_slug(url))
}

pub fn request(api_url: &str, _offset: usize) -> AtsRequest {
    AtsRequest::get(api_url)
}

pub fn parse(body: &str, ctx: &ParseContext) -> Result<ParsedPage, ScrapeError> {
    let envelope: Envelope = serde_json::from_str(body)?;
    let raw_count = envelope.jobs.len();
    let slug = board_slug(ctx.api_url);

    let postings = envelope
        .jobs
        .into_iter()
        .filter_map(|job| {
            let title = usable_title(job.title)?;
            let id = id_string(&job.id);
            let url = job
                .absolute_url
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| format!("https://boards.greenhouse.io/{}/jobs/{}", slug, id));
            let posted = job
                .first_published
                .or(job.updated_at)
                .as_deref()
                .and_then(dates::parse_timestamp);
            let location = location_or_placeholder(job.location.and_then(|l| l.name));
            Some(JobPosting::new(ctx.company, &title, &location, &url, &id).with_posted_date(posted))
        })
        .collect();

    Ok(ParsedPage {
        postings,
        raw_count,
        total: None,
    })
}
