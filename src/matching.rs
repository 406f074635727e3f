//! Resume-to-posting similarity. A `Scorer` compares two texts; the
//! ranking pass picks the best resume for each posting.

use std::collections::HashMap;

use crate::config::ResumeSpec;
use crate::models::JobPosting;

/// Job text is capped at this many words before scoring.
pub const MAX_JOB_WORDS: usize = 512;

const STOP_WORDS: &[&str] = &[
    "a", "about", "an", "and", "are", "as", "at", "be", "by", "can", "for", "from", "have", "in", "is", "it", "of",
    "on", "or", "our", "that", "the", "their", "this", "to", "we", "will", "with", "you", "your",
];

pub trait Scorer: Send + Sync {
    /// Similarity in `[0, 1]`.
    fn score(&self, job_text: &str, resume_text: &str) -> f32;

    fn name(&self) -> &'static str;
}

/// Cosine similarity over term-frequency vectors.
pub struct TermVectorScorer;

impl TermVectorScorer {
    fn vector(text: &str) -> HashMap<String, f32> {
        let mut tf = HashMap::new();
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .map(|t| t.to_lowercase())
            .filter(|t| t.len() > 1 && !STOP_WORDS.contains(&t.as_str()))
        {
            *tf.entry(token).or_insert(0.0) += 1.0;
        }
        tf
    }
}

impl Scorer for TermVectorScorer {
    fn score(&self, job_text: &str, resume_text: &str) -> f32 {
        let a = Self::vector(job_text);
        let b = Self::vector(resume_text);
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }

        let dot: f32 = a.iter().filter_map(|(term, x)| b.get(term).map(|y| x * y)).sum();
        let norm_a: f32 = a.values().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.values().map(|x| x * x).sum::<f32>().sqrt();
        (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
    }

    fn name(&self) -> &'static str {
        "term-vector"
    }
}

#[derive(Debug, Clone)]
pub struct Resume {
    pub name: String,
    pub text: String,
}

/// Read every configured resume. Unreadable or empty files are skipped.
pub fn load_resumes(specs: &[ResumeSpec]) -> Vec<Resume> {
    specs
        .iter()
        .filter_map(|spec| match std::fs::read_to_string(&spec.path) {
            Ok(text) if !text.trim().is_empty() => Some(Resume {
                name: spec.name.clone(),
                text,
            }),
            Ok(_) => {
                tracing::warn!(resume = %spec.name, path = %spec.path.display(), "Resume is empty, skipping");
                None
            }
            Err(e) => {
                tracing::warn!(resume = %spec.name, path = %spec.path.display(), error = %e, "Could not read resume, skipping");
                None
            }
        })
        .collect()
}

pub fn job_text(posting: &JobPosting) -> String {
    let full = format!("{}. {}", posting.title, posting.description);
    full.split_whitespace().take(MAX_JOB_WORDS).collect::<Vec<_>>().join(" ")
}

/// Score every posting against every resume and record the best one.
/// Ties go to the resume listed first.
pub fn recommend(postings: &mut [JobPosting], resumes: &[Resume], scorer: &dyn Scorer) {
    if resumes.is_empty() {
        return;
    }
    for posting in postings.iter_mut() {
        let text = job_text(posting);
        let mut best: Option<(&Resume, f32)> = None;
        for resume in resumes {
            let score = scorer.score(&text, &resume.text);
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((resume, score));
            }
        }
        if let Some((resume, score)) = best {
            posting.recommended_resume = Some(resume.name.clone());
            posting.similarity_score = Some(score);
        }
    }
    tracing::info!(postings = postings.len(), resumes = resumes.len(), scorer = scorer.name(), "Scored postings");
}
