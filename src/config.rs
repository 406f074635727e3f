use anyhow::{bail, Context, Result};
use calamine::Reader;
use directories::ProjectDirs;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::filter::DEFAULT_RELEVANT_TERMS;
use crate::models::{CompanyEntry, Platform};

pub const CONFIG_FILE_NAME: &str = "config.toml";

/// TOML-backed run configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default = "default_days_lookback")]
    pub days_lookback: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_min_request_interval_ms")]
    pub min_request_interval_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_title_keywords")]
    pub title_keywords: Vec<String>,
    #[serde(default)]
    pub specialty_keywords: Vec<String>,
    #[serde(default = "default_relevant_terms")]
    pub relevant_terms: Vec<String>,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub resumes: Vec<ResumeSpec>,
    #[serde(default)]
    pub companies: Vec<CompanySpec>,
    /// CSV or Excel files of extra company names, resolved by discovery.
    #[serde(default)]
    pub company_lists: Vec<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_filename_prefix")]
    pub filename_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            filename_prefix: default_filename_prefix(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResumeSpec {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompanySpec {
    pub name: String,
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
}

fn default_days_lookback() -> u32 {
    7
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_min_request_interval_ms() -> u64 {
    500
}

fn default_max_retries() -> u32 {
    2
}

fn default_title_keywords() -> Vec<String> {
    ["intern", "internship", "co-op", "coop"].iter().map(|s| s.to_string()).collect()
}

fn default_relevant_terms() -> Vec<String> {
    DEFAULT_RELEVANT_TERMS.iter().map(|s| s.to_string()).collect()
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("output")
}

fn default_filename_prefix() -> String {
    "job_matches".to_string()
}

impl FileConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }

    /// Company entries in configuration order.
    pub fn roster(&self) -> Vec<CompanyEntry> {
        self.companies
            .iter()
            .map(|c| {
                let platform = c.platform.as_deref().map(Platform::parse).unwrap_or_default();
                CompanyEntry::new(&c.name, c.api_url.clone(), platform)
            })
            .collect()
    }

    fn validate(&self) -> Result<()> {
        if self.companies.is_empty() {
            bail!("No companies configured; add at least one [[companies]] entry or a company_lists file");
        }

        let mut seen = HashSet::new();
        for company in &self.companies {
            let key = name_key(&company.name);
            if key.is_empty() {
                bail!("Company entry with an empty name");
            }
            if !seen.insert(key) {
                bail!("Duplicate company name: {}", company.name.trim());
            }
        }
        Ok(())
    }

    /// Resume and company list paths are relative to the config file.
    fn resolve_paths(&mut self, base: &Path) {
        for resume in &mut self.resumes {
            if resume.path.is_relative() {
                resume.path = base.join(&resume.path);
            }
        }
        for list in &mut self.company_lists {
            if list.is_relative() {
                *list = base.join(&*list);
            }
        }
    }

    /// Append discovery-only entries from every company list. Names already
    /// on the roster are skipped; missing files are skipped with a warning.
    fn merge_company_lists(&mut self) -> Result<()> {
        let mut seen: HashSet<String> = self.companies.iter().map(|c| name_key(&c.name)).collect();

        for path in &self.company_lists {
            if !path.exists() {
                tracing::warn!(path = %path.display(), "Company list not found, skipping");
                continue;
            }
            let names = read_company_list(path)?;
            let listed = names.len();
            let mut added = 0;
            for name in names {
                if seen.insert(name_key(&name)) {
                    self.companies.push(CompanySpec {
                        name,
                        api_url: None,
                        platform: None,
                    });
                    added += 1;
                }
            }
            tracing::info!(path = %path.display(), listed, added, "Merged company list");
        }
        Ok(())
    }
}

fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Company names from a CSV or Excel list. The column is the first header
/// containing "company" or equal to "name"; with no such header the file is
/// read as a bare one-column list and its first row is a name too.
pub fn read_company_list(path: &Path) -> Result<Vec<String>> {
    let is_excel = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx") || ext.eq_ignore_ascii_case("xls"));
    let rows = if is_excel { excel_rows(path)? } else { csv_rows(path)? };
    Ok(names_from_rows(rows))
}

fn csv_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open company list: {}", path.display()))?;
    reader
        .records()
        .map(|record| {
            record
                .map(|r| r.iter().map(str::to_string).collect())
                .with_context(|| format!("Failed to read company list: {}", path.display()))
        })
        .collect()
}

/// Rows of the first worksheet.
fn excel_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut workbook = calamine::open_workbook_auto(path)
        .with_context(|| format!("Failed to open company list: {}", path.display()))?;
    let Some((_, range)) = workbook.worksheets().into_iter().next() else {
        return Ok(Vec::new());
    };
    Ok(range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string().trim().to_string()).collect())
        .collect())
}

fn names_from_rows(rows: Vec<Vec<String>>) -> Vec<String> {
    let mut rows = rows.into_iter();
    let Some(header) = rows.next() else {
        return Vec::new();
    };
    let named_column = header.iter().position(|h| {
        let h = h.to_lowercase();
        h.contains("company") || h == "name"
    });
    let column = named_column.unwrap_or(0);
    let first = if named_column.is_none() { Some(header) } else { None };

    first
        .into_iter()
        .chain(rows)
        .filter_map(|row| row.into_iter().nth(column))
        .filter(|name| !name.is_empty())
        .collect()
}

/// Load, validate and resolve a TOML config file.
pub fn load_config(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let mut config: FileConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    if let Some(base) = path.parent() {
        config.resolve_paths(base);
    }
    config.merge_company_lists()?;
    config
        .validate()
        .with_context(|| format!("Invalid config file: {}", path.display()))?;
    Ok(config)
}

/// `./config.toml` if present, else the platform config directory.
pub fn default_config_path() -> PathBuf {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return local;
    }
    ProjectDirs::from("", "", "internhunt")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
        .unwrap_or(local)
}

pub const SAMPLE_CONFIG: &str = r#"# internhunt configuration

# Postings older than this many days are dropped. Undated postings are kept.
days_lookback = 7

# Network behaviour
request_timeout_secs = 30
min_request_interval_ms = 500
max_retries = 2

# A title must contain one of these...
title_keywords = ["intern", "internship", "co-op", "coop"]
# ...and one of these, or one of relevant_terms.
specialty_keywords = ["machine learning", "data science", "ml", "ai"]
relevant_terms = ["research", "scientist", "engineer", "developer", "analyst", "software", "hardware", "systems", "platform"]

# CSV or Excel files of extra company names (a "Company" column, or one
# name per line). Their endpoints are discovered; names already listed below win.
# company_lists = ["companies.csv"]

[output]
directory = "output"
filename_prefix = "job_matches"

# Plain-text or markdown resumes, paths relative to this file.
# [[resumes]]
# name = "ML"
# path = "resumes/ml.md"

[[companies]]
name = "Nvidia"
api_url = "https://nvidia.wd5.myworkdayjobs.com/NVIDIAExternalCareerSite"
platform = "workday"

[[companies]]
name = "Stripe"
api_url = "https://boards.greenhouse.io/stripe"

# No api_url: the endpoint is discovered from the name.
[[companies]]
name = "Palantir"
"#;

/// Write the sample config, refusing to overwrite an existing file.
pub fn write_sample(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("{} already exists", path.display());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, SAMPLE_CONFIG).with_context(|| format!("Failed to write config file: {}", path.display()))?;
    Ok(())
}
