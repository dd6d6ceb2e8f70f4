//! Harvest settings.
//!
//! Defaults reproduce the behaviour of a plain run against the listing site;
//! a JSON settings file may override any subset of fields.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::error::{HarvestError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestSettings {
    pub query: String,
    pub location: String,
    pub pages: u32,
    pub cookie_file: PathBuf,
    pub cache_file: PathBuf,
    pub output_file: PathBuf,
    /// Number of detail fetches allowed to run at once within a page
    pub fetch_concurrency: usize,
    /// Use the browser-emulating HTTP client
    pub emulate_browser: bool,
    pub site: SiteProfile,
    pub retry: RetryPolicy,
    pub scorer: ScorerSettings,
    pub qualification: QualificationSettings,
    pub page_delay: PolitenessDelay,
    pub card_delay: PolitenessDelay,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            query: "marketing manager".to_string(),
            location: "remote".to_string(),
            pages: 3,
            cookie_file: PathBuf::from("indeed_cookies.txt"),
            cache_file: PathBuf::from("desc_cache.json"),
            output_file: PathBuf::from("qualified_leads.csv"),
            fetch_concurrency: 1,
            emulate_browser: true,
            site: SiteProfile::default(),
            retry: RetryPolicy::default(),
            scorer: ScorerSettings::default(),
            qualification: QualificationSettings::default(),
            page_delay: PolitenessDelay::new(1000, 2000),
            card_delay: PolitenessDelay::new(1500, 2500),
        }
    }
}

impl HarvestSettings {
    /// Reads settings from a JSON file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| HarvestError::config(format!("{}: {}", path.display(), e)))?;
        let settings: Self = serde_json::from_str(&raw)
            .map_err(|e| HarvestError::config(format!("{}: {}", path.display(), e)))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.site.base()?;
        if self.retry.max_attempts == 0 {
            return Err(HarvestError::config("retry.max_attempts must be at least 1"));
        }
        if self.fetch_concurrency == 0 {
            return Err(HarvestError::config("fetch_concurrency must be at least 1"));
        }
        if self.site.page_size == 0 {
            return Err(HarvestError::config("site.page_size must be at least 1"));
        }
        Ok(())
    }
}

/// Shape of the listing site: where results and detail pages live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteProfile {
    pub base_url: String,
    pub search_path: String,
    pub detail_path: String,
    /// Query parameter carrying the site's internal job identifier
    pub id_param: String,
    pub page_size: u32,
    pub source_name: String,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            base_url: "https://www.indeed.com/".to_string(),
            search_path: "/jobs".to_string(),
            detail_path: "/viewjob".to_string(),
            id_param: "jk".to_string(),
            page_size: 10,
            source_name: "Indeed".to_string(),
        }
    }
}

impl SiteProfile {
    /// Profile for the same site layout served from another origin.
    pub fn with_base(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn base(&self) -> Result<Url> {
        Url::parse(&self.base_url)
            .map_err(|e| HarvestError::InvalidUrl(format!("{}: {}", self.base_url, e)))
    }
}

/// Bounded retry schedule for detail fetches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub timeout_secs: u64,
    /// Multiplied by the attempt number after a bad status or transport fault
    pub backoff_step_ms: u64,
    /// Flat pause after a page that lacks the description container
    pub missing_content_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout_secs: 10,
            backoff_step_ms: 2000,
            missing_content_delay_ms: 1000,
        }
    }
}

impl RetryPolicy {
    /// Policy with the default attempt count but no pauses.
    pub fn immediate() -> Self {
        Self {
            backoff_step_ms: 0,
            missing_content_delay_ms: 0,
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_step_ms.saturating_mul(u64::from(attempt)))
    }

    pub fn missing_content_delay(&self) -> Duration {
        Duration::from_millis(self.missing_content_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerSettings {
    /// llama.cpp-style completion endpoint
    pub endpoint: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for ScorerSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8080/completion".to_string(),
            max_tokens: 60,
            temperature: 0.3,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QualificationSettings {
    pub keywords: Vec<String>,
    pub threshold: f64,
}

impl Default for QualificationSettings {
    fn default() -> Self {
        Self {
            keywords: ["B2B", "SaaS", "startup", "AI", "LLM", "software", "tech"]
                .iter()
                .map(|k| k.to_string())
                .collect(),
            threshold: 6.0,
        }
    }
}

/// Jittered pause between requests. `0..0` disables it.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PolitenessDelay {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl PolitenessDelay {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn sample(&self) -> Duration {
        use rand::Rng;

        if self.max_ms == 0 {
            return Duration::ZERO;
        }
        let (lo, hi) = if self.min_ms <= self.max_ms {
            (self.min_ms, self.max_ms)
        } else {
            (self.max_ms, self.min_ms)
        };
        Duration::from_millis(rand::thread_rng().gen_range(lo..=hi))
    }

    pub async fn pause(&self) {
        let delay = self.sample();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
