//! Endpoint discovery: guess a company's ATS API from its name alone.

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::ats;
use crate::http::AtsClient;
use crate::models::{Endpoint, Platform};

const CORPORATE_SUFFIXES: &[&str] = &[
    "inc", "corp", "corporation", "company", "co", "llc", "ltd", "plc", "group", "holding", "holdings",
];

const FUZZY_THRESHOLD: f64 = 0.9;

pub struct KnownBoard {
    pub name: &'static str,
    pub url: &'static str,
    pub platform: Platform,
}

const fn board(name: &'static str, url: &'static str, platform: Platform) -> KnownBoard {
    KnownBoard { name, url, platform }
}

/// Boards whose location does not follow any template.
pub const KNOWN_BOARDS: &[KnownBoard] = &[
    board("3m", "https://3m.wd1.myworkdayjobs.com/wday/cxs/3m/3M/jobs", Platform::Workday),
    board("adobe", "https://adobe.wd5.myworkdayjobs.com/wday/cxs/adobe/external_experienced/jobs", Platform::Workday),
    board("amd", "https://amd.wd1.myworkdayjobs.com/wday/cxs/amd/AMD/jobs", Platform::Workday),
    board("american express", "https://aexp.wd5.myworkdayjobs.com/wday/cxs/aexp/American_Express_Careers/jobs", Platform::Workday),
    board("applied materials", "https://amat.wd1.myworkdayjobs.com/wday/cxs/amat/External/jobs", Platform::Workday),
    board("bank of america", "https://ghr.wd1.myworkdayjobs.com/wday/cxs/ghr/BAC_Careers/jobs", Platform::Workday),
    board("boeing", "https://boeing.wd1.myworkdayjobs.com/wday/cxs/boeing/EXTERNAL_CAREERS/jobs", Platform::Workday),
    board("capital one", "https://capitalone.wd1.myworkdayjobs.com/wday/cxs/capitalone/Capital_One/jobs", Platform::Workday),
    board("cisco", "https://cisco.wd1.myworkdayjobs.com/wday/cxs/cisco/External_Careers/jobs", Platform::Workday),
    board("citi", "https://citi.wd5.myworkdayjobs.com/wday/cxs/citi/2/jobs", Platform::Workday),
    board("dell", "https://dell.wd1.myworkdayjobs.com/wday/cxs/dell/External/jobs", Platform::Workday),
    board("fidelity", "https://fmr.wd1.myworkdayjobs.com/wday/cxs/fmr/FidelityCareers/jobs", Platform::Workday),
    board("general motors", "https://generalmotors.wd5.myworkdayjobs.com/wday/cxs/generalmotors/Careers_GM/jobs", Platform::Workday),
    board("hp", "https://hp.wd5.myworkdayjobs.com/wday/cxs/hp/ExternalCareerSite/jobs", Platform::Workday),
    board("intel", "https://intel.wd1.myworkdayjobs.com/wday/cxs/intel/External/jobs", Platform::Workday),
    board("nvidia", "https://nvidia.wd5.myworkdayjobs.com/wday/cxs/nvidia/NVIDIAExternalCareerSite/jobs", Platform::Workday),
    board("qualcomm", "https://qualcomm.wd5.myworkdayjobs.com/wday/cxs/qualcomm/External/jobs", Platform::Workday),
    board("salesforce", "https://salesforce.wd12.myworkdayjobs.com/wday/cxs/salesforce/External_Career_Site/jobs", Platform::Workday),
    board("target", "https://target.wd5.myworkdayjobs.com/wday/cxs/target/targetcareers/jobs", Platform::Workday),
    board("visa", "https://visa.wd5.myworkdayjobs.com/wday/cxs/visa/VisaCareers/jobs", Platform::Workday),
    board("walmart", "https://walmart.wd5.myworkdayjobs.com/wday/cxs/walmart/WalmartExternal/jobs", Platform::Workday),
    board("activision blizzard", "https://boards.greenhouse.io/activisionblizzard", Platform::Greenhouse),
    board("airbnb", "https://boards.greenhouse.io/airbnb", Platform::Greenhouse),
    board("c3 ai", "https://boards.greenhouse.io/c3iot", Platform::Greenhouse),
    board("cloudflare", "https://boards.greenhouse.io/cloudflare", Platform::Greenhouse),
    board("databricks", "https://boards.greenhouse.io/databricks", Platform::Greenhouse),
    board("epic games", "https://boards.greenhouse.io/epicgames", Platform::Greenhouse),
    board("openai", "https://boards.greenhouse.io/openai", Platform::Greenhouse),
    board("pinterest", "https://boards.greenhouse.io/pinterest", Platform::Greenhouse),
    board("robinhood", "https://boards.greenhouse.io/robinhood", Platform::Greenhouse),
    board("scale ai", "https://boards.greenhouse.io/scaleai", Platform::Greenhouse),
    board("snowflake", "https://boards.greenhouse.io/snowflake", Platform::Greenhouse),
    board("stripe", "https://boards.greenhouse.io/stripe", Platform::Greenhouse),
    board("uber", "https://boards.greenhouse.io/uber", Platform::Greenhouse),
    board("cohere", "https://jobs.lever.co/cohere", Platform::Lever),
    board("palantir", "https://jobs.lever.co/palantir", Platform::Lever),
    board("stability ai", "https://jobs.lever.co/stability.ai", Platform::Lever),
    board("biogen", "https://api.smartrecruiters.com/v1/companies/biogen/postings", Platform::SmartRecruiters),
];

/// Heuristic endpoint shapes, tried in order. `{slug}` expands to each
/// slug variant of the company name.
pub const TEMPLATES: &[(Platform, &str)] = &[
    (Platform::Workday, "https://{slug}.wd1.myworkdayjobs.com/wday/cxs/{slug}/External/jobs"),
    (Platform::Workday, "https://{slug}.wd1.myworkdayjobs.com/wday/cxs/{slug}/{slug}/jobs"),
    (Platform::Workday, "https://{slug}.wd1.myworkdayjobs.com/wday/cxs/{slug}/Careers/jobs"),
    (Platform::Workday, "https://{slug}.wd5.myworkdayjobs.com/wday/cxs/{slug}/External/jobs"),
    (Platform::Workday, "https://{slug}.wd5.myworkdayjobs.com/wday/cxs/{slug}/{slug}/jobs"),
    (Platform::Workday, "https://{slug}.wd5.myworkdayjobs.com/wday/cxs/{slug}/Careers/jobs"),
    (Platform::Workday, "https://{slug}.wd3.myworkdayjobs.com/wday/cxs/{slug}/External/jobs"),
    (Platform::Workday, "https://{slug}.wd3.myworkdayjobs.com/wday/cxs/{slug}/{slug}/jobs"),
    (Platform::Workday, "https://{slug}.wd3.myworkdayjobs.com/wday/cxs/{slug}/Careers/jobs"),
    (Platform::Workday, "https://{slug}.wd12.myworkdayjobs.com/wday/cxs/{slug}/External/jobs"),
    (Platform::Workday, "https://{slug}.wd12.myworkdayjobs.com/wday/cxs/{slug}/{slug}/jobs"),
    (Platform::Workday, "https://{slug}.wd12.myworkdayjobs.com/wday/cxs/{slug}/Careers/jobs"),
    (Platform::Greenhouse, "https://boards-api.greenhouse.io/v1/boards/{slug}/jobs"),
    (Platform::Lever, "https://api.lever.co/v0/postings/{slug}"),
    (Platform::SmartRecruiters, "https://api.smartrecruiters.com/v1/companies/{slug}/postings"),
];

/// Lowercase, drop parentheticals and corporate suffixes, keep
/// alphanumeric words separated by single spaces.
pub fn normalize_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    let without_parens = match regex::Regex::new(r"\([^)]*\)") {
        Ok(re) => re.replace_all(&lowered, " ").into_owned(),
        Err(_) => lowered,
    };
    let cleaned: String = without_parens
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect();

    let mut words: Vec<&str> = cleaned.split_whitespace().collect();
    while words.len() > 1 && words.last().is_some_and(|w| CORPORATE_SUFFIXES.contains(w)) {
        words.pop();
    }
    words.join(" ")
}

/// Joined slug first, then the hyphenated one when it differs.
pub fn slug_variants(normalized: &str) -> Vec<String> {
    let words: Vec<&str> = normalized.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }
    let joined = words.concat();
    let hyphenated = words.join("-");
    if joined == hyphenated {
        vec![joined]
    } else {
        vec![joined, hyphenated]
    }
}

/// Exact directory hit, else the closest name above the fuzzy threshold.
pub fn lookup_known(normalized: &str) -> Option<&'static KnownBoard> {
    if normalized.is_empty() {
        return None;
    }
    if let Some(hit) = KNOWN_BOARDS.iter().find(|b| b.name == normalized) {
        return Some(hit);
    }
    KNOWN_BOARDS
        .iter()
        .map(|b| (b, strsim::normalized_levenshtein(normalized, b.name)))
        .filter(|(_, score)| *score >= FUZZY_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(b, _)| b)
}

/// Every candidate for a name, directory hit first, without duplicates.
pub fn candidates(name: &str) -> Vec<Endpoint> {
    let normalized = normalize_name(name);
    let mut out: Vec<Endpoint> = Vec::new();

    if let Some(known) = lookup_known(&normalized) {
        out.push(ats::normalize_endpoint(&Endpoint::new(known.url, known.platform)));
    }

    let slugs = slug_variants(&normalized);
    for (platform, template) in TEMPLATES {
        for slug in &slugs {
            let candidate = Endpoint::new(template.replace("{slug}", slug), *platform);
            if !out.contains(&candidate) {
                out.push(candidate);
            }
        }
    }
    out
}

#[derive(Debug, Clone)]
struct Resolution {
    endpoint: Option<Endpoint>,
    tried: usize,
}

/// Probes candidates and remembers the answer, match or exhaustion, for
/// the life of the run.
pub struct Discoverer {
    client: AtsClient,
    today: NaiveDate,
    cache: HashMap<String, Resolution>,
}

impl Discoverer {
    pub fn new(client: AtsClient, today: NaiveDate) -> Self {
        Self {
            client,
            today,
            cache: HashMap::new(),
        }
    }

    pub async fn discover(&mut self, name: &str) -> Option<Endpoint> {
        let key = normalize_name(name);
        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(company = name, "Discovery cache hit");
            return hit.endpoint.clone();
        }

        let resolution = self.probe_candidates(name).await;
        let endpoint = resolution.endpoint.clone();
        self.cache.insert(key, resolution);
        endpoint
    }

    /// Candidates probed for a name on its first discovery.
    pub fn candidates_tried(&self, name: &str) -> usize {
        self.cache.get(&normalize_name(name)).map(|r| r.tried).unwrap_or(0)
    }

    async fn probe_candidates(&self, name: &str) -> Resolution {
        let mut tried = 0;
        for candidate in candidates(name) {
            tried += 1;
            match ats::probe(&self.client, &candidate, self.today).await {
                Ok(count) => {
                    tracing::info!(
                        company = name,
                        platform = %candidate.platform,
                        url = %candidate.api_url,
                        jobs = count,
                        "Discovered ATS endpoint"
                    );
                    return Resolution {
                        endpoint: Some(candidate),
                        tried,
                    };
                }
                Err(e) => {
                    tracing::debug!(company = name, url = %candidate.api_url, error = %e, "Candidate rejected");
                }
            }
        }
        tracing::info!(company = name, tried, "No ATS endpoint found");
        Resolution { endpoint: None, tried }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{NoopGate, RetryPolicy};
    use crate::testing::{MockReply, MockTransport};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn discoverer(transport: Arc<MockTransport>) -> Discoverer {
        let client = AtsClient::new(
            transport,
            Arc::new(NoopGate),
            RetryPolicy {
                max_retries: 2,
                base_delay: Duration::ZERO,
                request_timeout: Duration::from_secs(5),
            },
        );
        Discoverer::new(client, NaiveDate::from_ymd_opt(2024, 5, 10).unwrap())
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("NVIDIA Corporation"), "nvidia");
        assert_eq!(normalize_name("Scale AI, Inc."), "scale ai");
        assert_eq!(normalize_name("Alphabet (Google)"), "alphabet");
        assert_eq!(normalize_name("Coca-Cola Company"), "coca cola");
        assert_eq!(normalize_name("Group"), "group");
    }

    #[test]
    fn test_slug_variants() {
        assert_eq!(slug_variants("scale ai"), vec!["scaleai", "scale-ai"]);
        assert_eq!(slug_variants("stripe"), vec!["stripe"]);
        assert!(slug_variants("").is_empty());
    }

    #[test]
    fn test_lookup_known_exact_and_fuzzy() {
        assert_eq!(lookup_known("nvidia").map(|b| b.platform), Some(Platform::Workday));
        assert_eq!(lookup_known("activision blizard").map(|b| b.name), Some("activision blizzard"));
        assert!(lookup_known("nvidea labs").is_none());
    }

    #[test]
    fn test_candidates_order() {
        let list = candidates("Scale AI");
        assert_eq!(list[0].api_url, "https://boards-api.greenhouse.io/v1/boards/scaleai/jobs");
        assert_eq!(list[1].api_url, "https://scaleai.wd1.myworkdayjobs.com/wday/cxs/scaleai/External/jobs");
        assert_eq!(list[2].api_url, "https://scale-ai.wd1.myworkdayjobs.com/wday/cxs/scale-ai/External/jobs");
        assert_eq!(list.last().map(|e| e.platform), Some(Platform::SmartRecruiters));
        // the directory hit is not repeated by the greenhouse template
        let gh: Vec<_> = list.iter().filter(|e| e.api_url.contains("/boards/scaleai/")).collect();
        assert_eq!(gh.len(), 1);
    }

    #[tokio::test]
    async fn test_discover_known_board_first() {
        let url = "https://boards-api.greenhouse.io/v1/boards/stripe/jobs";
        let transport = Arc::new(MockTransport::new().route(url, MockReply::ok(json!({"jobs": []}))));
        let mut d = discoverer(transport.clone());

        let endpoint = d.discover("Stripe").await.unwrap();
        assert_eq!(endpoint, Endpoint::new(url, Platform::Greenhouse));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_discover_falls_through_templates() {
        let url = "https://api.lever.co/v0/postings/acme";
        let transport = Arc::new(MockTransport::new().route(url, MockReply::ok(json!([]))));
        let mut d = discoverer(transport.clone());

        let endpoint = d.discover("Acme").await.unwrap();
        assert_eq!(endpoint.platform, Platform::Lever);
        // 12 workday shapes and greenhouse before lever, one probe each
        assert_eq!(transport.call_count(), 14);
        assert_eq!(d.candidates_tried("Acme"), 14);
    }

    #[tokio::test]
    async fn test_discover_rejects_structurally_invalid_success() {
        let bad = "https://acme.wd1.myworkdayjobs.com/wday/cxs/acme/External/jobs";
        let good = "https://boards-api.greenhouse.io/v1/boards/acme/jobs";
        let transport = Arc::new(
            MockTransport::new()
                .route(bad, MockReply::ok(json!({"errorCode": "HTTP_404"})))
                .route(good, MockReply::ok(json!({"jobs": []}))),
        );
        let mut d = discoverer(transport);

        let endpoint = d.discover("Acme").await.unwrap();
        assert_eq!(endpoint.api_url, good);
    }

    #[tokio::test]
    async fn test_discover_caches_match() {
        let url = "https://boards-api.greenhouse.io/v1/boards/acme/jobs";
        let transport = Arc::new(MockTransport::new().route(url, MockReply::ok(json!({"jobs": []}))));
        let mut d = discoverer(transport.clone());

        let first = d.discover("Acme").await;
        let calls = transport.call_count();
        let second = d.discover("ACME Inc.").await;

        assert_eq!(first, second);
        assert_eq!(transport.call_count(), calls);
    }

    #[tokio::test]
    async fn test_discover_exhaustion_is_cached() {
        let transport = Arc::new(MockTransport::new());
        let mut d = discoverer(transport.clone());

        assert!(d.discover("Nowhere Widgets").await.is_none());
        let calls = transport.call_count();
        assert_eq!(calls, TEMPLATES.len() * 2);
        assert_eq!(d.candidates_tried("Nowhere Widgets"), calls);

        assert!(d.discover("Nowhere Widgets").await.is_none());
        assert_eq!(transport.call_count(), calls);
    }

    #[tokio::test]
    async fn test_probes_do_not_retry() {
        let url = "https://acme.wd1.myworkdayjobs.com/wday/cxs/acme/External/jobs";
        let transport = Arc::new(MockTransport::new().route(url, MockReply::json(503, "")));
        let mut d = discoverer(transport.clone());

        d.discover("Acme").await;
        assert_eq!(transport.calls_to(url), 1);
    }
}
