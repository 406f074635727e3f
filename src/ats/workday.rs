use serde::Deserialize;
use serde_json::json;

use super::{location_or_placeholder, usable_title, ParseContext, ParsedPage};
use crate::dates;
use crate::error::ScrapeError;
use crate::http::AtsRequest;
use crate::models::JobPosting;

pub const PAGE_SIZE: usize = 20;
const SEARCH_TEXT: &str = "intern";
const CXS_MARKER: &str = "/wday/cxs/";

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    total: Option<usize>,
    #[serde(rename = "jobPostings")]
    job_postings: Vec<WorkdayJob>,
}

#[derive(Debug, Deserialize)]
struct WorkdayJob {
    #[serde(default)]
    title: Option<String>,
    #[serde(rename = "externalPath", default)]
    external_path: Option<String>,
    #[serde(rename = "locationsText", default)]
    locations_text: Option<String>,
    #[serde(rename = "postedOn", default)]
    posted_on: Option<String>,
}

/// `https://{tenant}.wdN.myworkdayjobs.com/{site}` becomes
/// `https://{tenant}.wdN.myworkdayjobs.com/wday/cxs/{tenant}/{site}/jobs`.
pub fn normalize(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');

    if url.contains(CXS_MARKER) {
        return if url.ends_with("/jobs") {
            url.to_string()
        } else {
            format!("{}/jobs", url)
        };
    }

    if let Some(api) = site_to_api(url) {
        return api;
    }

    let base = url.strip_suffix("/jobs").unwrap_or(url);
    format!("{}/jobs", base)
}

fn site_to_api(url: &str) -> Option<String> {
    let re = regex::Regex::new(
        r"^https?://([^./]+)\.(wd\d+)\.(myworkdayjobs\.com|myworkdaysite\.com)/(?:[a-z]{2}-[A-Z]{2}/)?([^/?#]+)",
    )
    .ok()?;
    let caps = re.captures(url)?;
    let tenant = caps.get(1)?.as_str();
    let shard = caps.get(2)?.as_str();
    let host = caps.get(3)?.as_str();
    let site = caps.get(4)?.as_str();
    Some(format!(
        "https://{tenant}.{shard}.{host}/wday/cxs/{tenant}/{site}/jobs"
    ))
}

/// Public link for a posting: `{origin}/{site}{externalPath}`.
pub fn public_link(api_url: &str, external_path: &str) -> String {
    let Some(idx) = api_url.find(CXS_MARKER) else {
        return format!("{}{}", api_url.trim_end_matches("/jobs"), external_path);
    };
    let origin = &api_url[..idx];
    let site = api_url[idx + CXS_MARKER.len()..].split('/').nth(1).unwrap_or("");
    format!("{}/{}{}", origin, site, external_path)
}

pub fn request(api_url: &str, offset: usize) -> AtsRequest {
    AtsRequest::post(
        api_url,
        json!({
            "appliedFacets": {},
            "limit": PAGE_SIZE,
            "offset": offset,
            "searchText": SEARCH_TEXT,
        }),
    )
}

pub fn parse(body: &str, ctx: &ParseContext) -> Result<ParsedPage, ScrapeError> {
    let envelope: Envelope = serde_json::from_str(body)?;
    let raw_count = envelope.job_postings.len();

    let postings = envelope
        .job_postings
        .into_iter()
        .filter_map(|job| {
            let title = usable_title(job.title)?;
            let path = job.external_path.unwrap_or_default();
            let posted = job
                .posted_on
                .as_deref()
                .and_then(|text| dates::parse_relative(text, ctx.today));
            Some(
                JobPosting::new(
                    ctx.company,
                    &title,
                    &location_or_placeholder(job.locations_text),
                    &public_link(ctx.api_url, &path),
                    &path,
                )
                .with_posted_date(posted),
            )
        })
        .collect();

    Ok(ParsedPage {
        postings,
        raw_count,
        total: envelope.total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const API: &str = "https://nvidia.wd5.myworkdayjobs.com/wday/cxs/nvidia/NVIDIAExternalCareerSite/jobs";

    fn ctx() -> ParseContext<'static> {
        ParseContext {
            company: "Nvidia",
            api_url: API,
            today: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
        }
    }

    #[test]
    fn test_normalize_public_site() {
        assert_eq!(normalize("https://nvidia.wd5.myworkdayjobs.com/NVIDIAExternalCareerSite"), API);
        assert_eq!(normalize("https://nvidia.wd5.myworkdayjobs.com/en-US/NVIDIAExternalCareerSite/"), API);
    }

    #[test]
    fn test_normalize_api_forms() {
        assert_eq!(normalize(API), API);
        assert_eq!(normalize("https://nvidia.wd5.myworkdayjobs.com/wday/cxs/nvidia/NVIDIAExternalCareerSite"), API);
    }

    #[test]
    fn test_public_link() {
        assert_eq!(
            public_link(API, "/job/US-CA-Santa-Clara/Intern_JR1"),
            "https://nvidia.wd5.myworkdayjobs.com/NVIDIAExternalCareerSite/job/US-CA-Santa-Clara/Intern_JR1"
        );
    }

    #[test]
    fn test_request_body() {
        let req = request(API, 40);
        let body = req.body.unwrap();
        assert_eq!(body["limit"], 20);
        assert_eq!(body["offset"], 40);
        assert_eq!(body["searchText"], "intern");
        assert!(body["appliedFacets"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_parse_maps_fields_and_relative_dates() {
        let body = r#"{"total": 3, "jobPostings": [
            {"title": "ML Intern", "externalPath": "/job/A_1", "locationsText": "Santa Clara, CA", "postedOn": "Posted Yesterday"},
            {"externalPath": "/job/B_2", "postedOn": "Posted Today"},
            {"title": "Research Intern", "externalPath": "/job/C_3"}
        ]}"#;
        let page = parse(body, &ctx()).unwrap();

        assert_eq!(page.raw_count, 3);
        assert_eq!(page.total, Some(3));
        assert_eq!(page.postings.len(), 2);

        let first = &page.postings[0];
        assert_eq!(first.job_id, "/job/A_1");
        assert_eq!(first.location, "Santa Clara, CA");
        assert_eq!(first.posted_date, NaiveDate::from_ymd_opt(2024, 5, 9));

        let second = &page.postings[1];
        assert_eq!(second.location, crate::ats::LOCATION_PLACEHOLDER);
        assert_eq!(second.posted_date, None);
    }

    #[test]
    fn test_parse_requires_job_postings_field() {
        assert!(matches!(parse(r#"{"total": 0}"#, &ctx()), Err(ScrapeError::Parse(_))));
        assert!(matches!(parse(r#"{"jobPostings": {}}"#, &ctx()), Err(ScrapeError::Parse(_))));
        assert!(parse(r#"{"total": 0, "jobPostings": []}"#, &ctx()).unwrap().postings.is_empty());
    }
}
