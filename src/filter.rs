use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::models::JobPosting;

/// Technical terms that qualify an intern title when no specialty keyword hits.
pub const DEFAULT_RELEVANT_TERMS: &[&str] = &[
    "research",
    "scientist",
    "engineer",
    "developer",
    "analyst",
    "software",
    "hardware",
    "systems",
    "platform",
];

/// Inclusive recency window `[earliest, latest]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub earliest: NaiveDate,
    pub latest: NaiveDate,
}

impl DateWindow {
    /// Window ending on the UTC date of `now`. Posting timestamps are
    /// reduced to UTC dates, so the window must use the same calendar.
    pub fn ending_at(now: DateTime<Utc>, days: u32) -> Self {
        Self::ending_on(now.date_naive(), days)
    }

    pub fn ending_on(today: NaiveDate, days: u32) -> Self {
        let earliest = today
            .checked_sub_signed(Duration::days(days as i64))
            .unwrap_or(NaiveDate::MIN);
        Self {
            earliest,
            latest: today,
        }
    }

    /// Undated postings pass; dated ones must fall inside the window.
    pub fn admits(&self, posted: Option<NaiveDate>) -> bool {
        match posted {
            None => true,
            Some(date) => date >= self.earliest && date <= self.latest,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.latest
    }
}

#[derive(Debug, Clone, Default)]
pub struct TitleFilter {
    title_keywords: Vec<String>,
    specialty_keywords: Vec<String>,
    relevant_terms: Vec<String>,
}

impl TitleFilter {
    pub fn new(title_keywords: &[String], specialty_keywords: &[String], relevant_terms: &[String]) -> Self {
        Self {
            title_keywords: lowercase_all(title_keywords),
            specialty_keywords: lowercase_all(specialty_keywords),
            relevant_terms: lowercase_all(relevant_terms),
        }
    }

    /// A title must carry an intern keyword, and then either a specialty
    /// keyword or a relevant technical term.
    pub fn admits(&self, title: &str) -> bool {
        let title = title.to_lowercase();

        let is_intern = self.title_keywords.is_empty()
            || self.title_keywords.iter().any(|kw| title.contains(kw.as_str()));
        if !is_intern {
            return false;
        }

        if self.specialty_keywords.is_empty() && self.relevant_terms.is_empty() {
            return true;
        }

        self.specialty_keywords.iter().any(|kw| title.contains(kw.as_str()))
            || self.relevant_terms.iter().any(|t| title.contains(t.as_str()))
    }
}

fn lowercase_all(words: &[String]) -> Vec<String> {
    words
        .iter()
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Both gates a posting must pass before it is kept.
#[derive(Debug, Clone)]
pub struct PostingFilter {
    pub title: TitleFilter,
    pub window: DateWindow,
}

impl PostingFilter {
    pub fn new(title: TitleFilter, window: DateWindow) -> Self {
        Self { title, window }
    }

    pub fn admits(&self, posting: &JobPosting) -> bool {
        self.window.admits(posting.posted_date) && self.title.admits(&posting.title)
    }
}
