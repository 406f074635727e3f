use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Workday,
    Greenhouse,
    Lever,
    SmartRecruiters,
    Eightfold,
    #[default]
    Unknown,
}

impl Platform {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "workday" => Platform::Workday,
            "greenhouse" => Platform::Greenhouse,
            "lever" => Platform::Lever,
            "smartrecruiters" | "smart_recruiters" | "smart-recruiters" => Platform::SmartRecruiters,
            "eightfold" | "eightfold.ai" => Platform::Eightfold,
            _ => Platform::Unknown,
        }
    }

    /// Guess the platform from the host of a configured URL.
    pub fn infer_from_url(url: &str) -> Self {
        let url = url.to_lowercase();
        if url.contains("myworkdayjobs.com") || url.contains("myworkdaysite.com") {
            Platform::Workday
        } else if url.contains("greenhouse.io") {
            Platform::Greenhouse
        } else if url.contains("lever.co") {
            Platform::Lever
        } else if url.contains("smartrecruiters.com") {
            Platform::SmartRecruiters
        } else if url.contains("eightfold.ai") {
            Platform::Eightfold
        } else {
            Platform::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Workday => "workday",
            Platform::Greenhouse => "greenhouse",
            Platform::Lever => "lever",
            Platform::SmartRecruiters => "smartrecruiters",
            Platform::Eightfold => "eightfold",
            Platform::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A resolved ATS binding: the API URL to call and the schema it speaks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub api_url: String,
    pub platform: Platform,
}

impl Endpoint {
    pub fn new(api_url: impl Into<String>, platform: Platform) -> Self {
        Self {
            api_url: api_url.into(),
            platform,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyEntry {
    pub name: String,
    pub api_url: Option<String>,
    pub platform: Platform,
    #[serde(skip)]
    scraped: bool,
}

impl CompanyEntry {
    pub fn new(name: impl Into<String>, api_url: Option<String>, platform: Platform) -> Self {
        let api_url = api_url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty());
        let platform = match (&api_url, platform) {
            (Some(url), Platform::Unknown) => Platform::infer_from_url(url),
            (_, p) => p,
        };
        Self {
            name: name.into().trim().to_string(),
            api_url,
            platform,
            scraped: false,
        }
    }

    /// The endpoint to scrape, if the entry carries a URL of a known platform.
    pub fn endpoint(&self) -> Option<Endpoint> {
        match (&self.api_url, self.platform) {
            (Some(_), Platform::Unknown) | (None, _) => None,
            (Some(url), platform) => Some(Endpoint::new(url.clone(), platform)),
        }
    }

    /// Promote the entry to a discovered endpoint. Refused once the company
    /// has been scraped.
    pub fn bind(&mut self, endpoint: Endpoint) -> bool {
        if self.scraped {
            return false;
        }
        self.api_url = Some(endpoint.api_url);
        self.platform = endpoint.platform;
        true
    }

    pub fn mark_scraped(&mut self) {
        self.scraped = true;
    }

    pub fn is_scraped(&self) -> bool {
        self.scraped
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub company: String,
    pub title: String,
    pub location: String,
    pub url: String,
    pub job_id: String,
    pub description: String,
    pub posted_date: Option<NaiveDate>,
    pub similarity_score: Option<f32>,
    pub recommended_resume: Option<String>,
}

impl JobPosting {
    pub fn new(company: &str, title: &str, location: &str, url: &str, job_id: &str) -> Self {
        Self {
            company: company.to_string(),
            title: title.trim().to_string(),
            location: location.to_string(),
            url: url.to_string(),
            job_id: job_id.to_string(),
            description: String::new(),
            posted_date: None,
            similarity_score: None,
            recommended_resume: None,
        }
    }

    pub fn with_posted_date(mut self, posted_date: Option<NaiveDate>) -> Self {
        self.posted_date = posted_date;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Identity used to drop repeated postings within one company. Without
    /// a job id the link alone is not enough: id-less Workday postings all
    /// share the site URL.
    pub fn dedup_key(&self) -> (String, String) {
        let id = if self.job_id.is_empty() {
            format!("{}|{}|{}", self.url, self.title.to_lowercase(), self.location.to_lowercase())
        } else {
            self.job_id.clone()
        };
        (self.company.to_lowercase(), id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrapeStatus {
    Success,
    NoMatchingJobs,
    ApiError,
    NoApiFound,
}

impl ScrapeStatus {
    pub const ALL: [ScrapeStatus; 4] = [
        ScrapeStatus::Success,
        ScrapeStatus::NoMatchingJobs,
        ScrapeStatus::ApiError,
        ScrapeStatus::NoApiFound,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScrapeStatus::Success => "success",
            ScrapeStatus::NoMatchingJobs => "no_matching_jobs",
            ScrapeStatus::ApiError => "api_error",
            ScrapeStatus::NoApiFound => "no_api_found",
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            ScrapeStatus::Success => "Matching intern/co-op positions found",
            ScrapeStatus::NoMatchingJobs => "API works but no matching intern/co-op positions found",
            ScrapeStatus::ApiError => "API returned error or connection failed",
            ScrapeStatus::NoApiFound => "No career API discoverable - requires manual search",
        }
    }
}

impl fmt::Display for ScrapeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeOutcome {
    pub company: String,
    pub status: ScrapeStatus,
    pub detail: Option<String>,
    pub endpoint: Option<String>,
    pub fetched: usize,
    /// Never attempted because the run was cancelled first.
    #[serde(default)]
    pub skipped: bool,
}

impl ScrapeOutcome {
    pub fn new(company: impl Into<String>, status: ScrapeStatus) -> Self {
        Self {
            company: company.into(),
            status,
            detail: None,
            endpoint: None,
            fetched: 0,
            skipped: false,
        }
    }

    pub fn mark_skipped(mut self) -> Self {
        self.skipped = true;
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_fetched(mut self, fetched: usize) -> Self {
        self.fetched = fetched;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_parse_is_case_insensitive() {
        assert_eq!(Platform::parse("Workday"), Platform::Workday);
        assert_eq!(Platform::parse(" GREENHOUSE "), Platform::Greenhouse);
        assert_eq!(Platform::parse("SmartRecruiters"), Platform::SmartRecruiters);
        assert_eq!(Platform::parse("Eightfold"), Platform::Eightfold);
        assert_eq!(Platform::parse("icims"), Platform::Unknown);
    }

    #[test]
    fn test_platform_infer_from_url() {
        assert_eq!(
            Platform::infer_from_url("https://nvidia.wd5.myworkdayjobs.com/NVIDIAExternalCareerSite"),
            Platform::Workday
        );
        assert_eq!(Platform::infer_from_url("https://boards.greenhouse.io/stripe"), Platform::Greenhouse);
        assert_eq!(Platform::infer_from_url("https://jobs.lever.co/palantir"), Platform::Lever);
        assert_eq!(
            Platform::infer_from_url("https://api.smartrecruiters.com/v1/companies/biogen/postings"),
            Platform::SmartRecruiters
        );
        assert_eq!(Platform::infer_from_url("https://acme.eightfold.ai/careers"), Platform::Eightfold);
        assert_eq!(Platform::infer_from_url("https://careers.example.com"), Platform::Unknown);
    }

    #[test]
    fn test_company_entry_infers_platform_when_unset() {
        let entry = CompanyEntry::new(
            "Stripe",
            Some("https://boards.greenhouse.io/stripe".to_string()),
            Platform::Unknown,
        );
        assert_eq!(entry.platform, Platform::Greenhouse);
        assert!(entry.endpoint().is_some());
    }

    #[test]
    fn test_company_entry_blank_url_means_discovery() {
        let entry = CompanyEntry::new("Acme", Some("   ".to_string()), Platform::Unknown);
        assert!(entry.api_url.is_none());
        assert!(entry.endpoint().is_none());
    }

    #[test]
    fn test_company_entry_unknown_platform_has_no_endpoint() {
        let entry = CompanyEntry::new(
            "Custom",
            Some("https://careers.custom.example/api".to_string()),
            Platform::Unknown,
        );
        assert!(entry.api_url.is_some());
        assert!(entry.endpoint().is_none());
    }

    #[test]
    fn test_bind_refused_after_scrape() {
        let mut entry = CompanyEntry::new("Acme", None, Platform::Unknown);
        let endpoint = Endpoint::new("https://api.lever.co/v0/postings/acme", Platform::Lever);
        assert!(entry.bind(endpoint.clone()));
        assert_eq!(entry.endpoint(), Some(endpoint));

        entry.mark_scraped();
        let other = Endpoint::new("https://boards-api.greenhouse.io/v1/boards/acme/jobs", Platform::Greenhouse);
        assert!(!entry.bind(other));
        assert_eq!(entry.platform, Platform::Lever);
    }

    #[test]
    fn test_dedup_key_prefers_job_id() {
        let with_id = JobPosting::new("Acme", "ML Intern", "Remote", "https://a/1", "R-1");
        assert_eq!(with_id.dedup_key(), ("acme".to_string(), "R-1".to_string()));

        let without_id = JobPosting::new("Acme", "ML Intern", "Remote", "https://a/1", "");
        assert_eq!(without_id.dedup_key(), ("acme".to_string(), "https://a/1|ml intern|remote".to_string()));
    }

    #[test]
    fn test_dedup_key_without_id_tells_titles_apart() {
        let a = JobPosting::new("Acme", "ML Intern", "Remote", "https://acme/site", "");
        let b = JobPosting::new("Acme", "Data Intern", "Remote", "https://acme/site", "");
        let c = JobPosting::new("Acme", "ML Intern", "Austin, TX", "https://acme/site", "");
        assert_ne!(a.dedup_key(), b.dedup_key());
        assert_ne!(a.dedup_key(), c.dedup_key());
        assert_eq!(a.dedup_key(), a.clone().dedup_key());
    }
}
