use serde::Deserialize;

use super::{location_or_placeholder, segment_after, usable_title, ParseContext, ParsedPage};
use crate::dates;
use crate::error::ScrapeError;
use crate::http::AtsRequest;
use crate::models::JobPosting;

const API_BASE: &str = "https://api.smartrecruiters.com/v1/companies";
const PAGE_LIMIT: &str = "100";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    content: Vec<SrJob>,
    #[serde(default)]
    total_found: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SrJob {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    released_date: Option<String>,
    #[serde(default)]
    location: Option<SrLocation>,
}

#[derive(Debug, Deserialize)]
struct SrLocation {
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    country: Option<String>,
}

impl SrLocation {
    fn joined(self) -> Option<String> {
        let parts: Vec<String> = [self.city, self.region, self.country]
            .into_iter()
            .flatten()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() { None } else { Some(parts.join(", ")) }
    }
}

pub fn company_slug(url: &str) -> String {
    let url = url.trim();
    segment_after(url, "/companies/")
        .or_else(|| segment_after(url, "smartrecruiters.com/"))
        .unwrap_or(url.trim_matches('/'))
        .to_string()
}

pub fn normalize(url: &str) -> String {
    format!("{}/{}/postings", API_BASE, company_slug(url))
}

pub fn request(api_url: &str, _offset: usize) -> AtsRequest {
    AtsRequest::get(api_url).with_query("limit", PAGE_LIMIT)
}

pub fn parse(body: &str, ctx: &ParseContext) -> Result<ParsedPage, ScrapeError> {
    let envelope: Envelope = serde_json::from_str(body)?;
    let raw_count = envelope.content.len();
    let slug = company_slug(ctx.api_url);

    let postings = envelope
        .content
        .into_iter()
        .filter_map(|job| {
            let title = usable_title(job.name)?;
            let id = job.id.unwrap_or_default();
            let url = format!("https://jobs.smartrecruiters.com/{}/{}", slug, id);
            let location = location_or_placeholder(job.location.and_then(SrLocation::joined));
            let posted = job.released_date.as_deref().and_then(dates::parse_timestamp);
            Some(JobPosting::new(ctx.company, &title, &location, &url, &id).with_posted_date(posted))
        })
        .collect();

    Ok(ParsedPage {
        postings,
        raw_count,
        total: envelope.total_found,
    })
}
