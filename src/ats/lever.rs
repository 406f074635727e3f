use serde::Deserialize;

use super::{location_or_placeholder, segment_after, usable_title, ParseContext, ParsedPage};
use crate::dates;
use crate::error::ScrapeError;
use crate::http::AtsRequest;
use crate::models::JobPosting;

const API_BASE: &str = "https://api.lever.co/v0/postings";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeverJob {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    hosted_url: Option<String>,
    #[serde(default)]
    created_at: Option<i64>,
    #[serde(default)]
    categories: Option<LeverCategories>,
    #[serde(default)]
    description_plain: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LeverCategories {
    #[serde(default)]
    location: Option<String>,
}

pub fn normalize(url: &str) -> String {
    let url = url.trim();
    let slug = segment_after(url, "/postings/")
        .or_else(|| segment_after(url, "lever.co/"))
        .unwrap_or(url.trim_matches('/'));
    format!("{}/{}", API_BASE, slug)
}

pub fn request(api_url: &str, _offset: usize) -> AtsRequest {
    AtsRequest::get(api_url).with_query("mode", "json")
}

/// The body is a bare array of postings.
pub fn parse(body: &str, ctx: &ParseContext) -> Result<ParsedPage, ScrapeError> {
    let jobs: Vec<LeverJob> = serde_json::from_str(body)?;
    let raw_count = jobs.len();

    let postings = jobs
        .into_iter()
        .filter_map(|job| {
            let title = usable_title(job.text)?;
            let id = job.id.unwrap_or_default();
            let url = job.hosted_url.unwrap_or_default();
            let location = location_or_placeholder(job.categories.and_then(|c| c.location));
            let posted = job.created_at.and_then(dates::from_epoch_millis);
            Some(
                JobPosting::new(ctx.company, &title, &location, &url, &id)
                    .with_posted_date(posted)
                    .with_description(job.description_plain.unwrap_or_default()),
            )
        })
        .collect();

    Ok(ParsedPage {
        postings,
        raw_count,
        total: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const API: &str = "https://api.lever.co/v0/postings/palantir";

    fn ctx() -> ParseContext<'static> {
        ParseContext {
            company: "Palantir",
            api_url: API,
            today: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("https://jobs.lever.co/palantir"), API);
        assert_eq!(normalize("https://jobs.lever.co/palantir/abc-123"), API);
        assert_eq!(normalize(API), API);
        assert_eq!(normalize("palantir"), API);
    }

    #[test]
    fn test_request_asks_for_json() {
        let req = request(API, 0);
        assert_eq!(req.query, vec![("mode".to_string(), "json".to_string())]);
    }

    #[test]
    fn test_parse_epoch_millis_and_description() {
        let body = r#"[
            {"id": "a1", "text": "Forward Deployed Engineer Intern",
             "hostedUrl": "https://jobs.lever.co/palantir/a1",
             "createdAt": 1714521600000,
             "categories": {"location": "New York, NY"},
             "descriptionPlain": "Work on deployed systems."},
            {"id": "b2", "hostedUrl": "https://jobs.lever.co/palantir/b2"}
        ]"#;
        let page = parse(body, &ctx()).unwrap();
        assert_eq!(page.raw_count, 2);
        assert_eq!(page.postings.len(), 1);

        let job = &page.postings[0];
        assert_eq!(job.posted_date, NaiveDate::from_ymd_opt(2024, 5, 1));
        assert_eq!(job.location, "New York, NY");
        assert_eq!(job.description, "Work on deployed systems.");
    }

    #[test]
    fn test_parse_rejects_envelope() {
        assert!(matches!(parse(r#"{"ok": false}"#, &ctx()), Err(ScrapeError::Parse(_))));
    }
}
