//! Detail-page fetching with caching, bounded retries and cancellation.

use dashmap::DashMap;
use reqwest::header::{ACCEPT_LANGUAGE, COOKIE, REFERER};
use reqwest::Client;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::config::RetryPolicy;
use crate::extractor::extract_description;
use crate::service::auth::AuthContext;
use crate::service::cache::DescriptionCache;
use crate::service::normalizer::UrlNormalizer;

/// How a fetch request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Served from the cache without touching the network
    Cached(String),
    /// Fetched, extracted and written to the cache
    Fetched(String),
    /// Every attempt failed; the cache was not touched
    Exhausted { attempts: u32 },
    /// Cancellation fired before a description was obtained
    Cancelled,
    /// The card had no link to follow
    NoLink,
}

impl FetchOutcome {
    /// Description text, empty for every non-success outcome.
    pub fn into_text(self) -> String {
        match self {
            Self::Cached(text) | Self::Fetched(text) => text,
            _ => String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Cached(_) | Self::Fetched(_))
    }
}

/// Why a single attempt did not yield a description.
#[derive(Debug, Error)]
enum AttemptError {
    #[error("status {0}")]
    BadStatus(u16),
    #[error("description container missing")]
    MissingContent,
    #[error("transport error: {0}")]
    Transport(String),
}

/// Counters for a fetcher's lifetime.
#[derive(Debug, Default)]
pub struct FetchStats {
    cache_hits: AtomicUsize,
    network_attempts: AtomicUsize,
    fetched: AtomicUsize,
    failures: AtomicUsize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStatsSnapshot {
    pub cache_hits: usize,
    pub network_attempts: usize,
    pub fetched: usize,
    pub failures: usize,
}

impl FetchStats {
    pub fn snapshot(&self) -> FetchStatsSnapshot {
        FetchStatsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            network_attempts: self.network_attempts.load(Ordering::Relaxed),
            fetched: self.fetched.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

pub struct DetailFetcher {
    client: Client,
    normalizer: UrlNormalizer,
    policy: RetryPolicy,
    referer: String,
    /// One lock per canonical URL so concurrent callers never fetch the same page twice
    in_flight: DashMap<String, Arc<Mutex<()>>>,
    stats: FetchStats,
}

impl DetailFetcher {
    pub fn new(
        client: Client,
        normalizer: UrlNormalizer,
        policy: RetryPolicy,
        referer: impl Into<String>,
    ) -> Self {
        Self {
            client,
            normalizer,
            policy,
            referer: referer.into(),
            in_flight: DashMap::new(),
            stats: FetchStats::default(),
        }
    }

    pub fn normalizer(&self) -> &UrlNormalizer {
        &self.normalizer
    }

    pub fn stats(&self) -> FetchStatsSnapshot {
        self.stats.snapshot()
    }

    /// Returns the description for `raw_url`, or an empty string when it
    /// could not be obtained.
    pub async fn fetch(
        &self,
        raw_url: &str,
        auth: &AuthContext,
        cache: &DescriptionCache,
        cancel: &CancellationToken,
    ) -> String {
        self.fetch_outcome(raw_url, auth, cache, cancel)
            .await
            .into_text()
    }

    pub async fn fetch_outcome(
        &self,
        raw_url: &str,
        auth: &AuthContext,
        cache: &DescriptionCache,
        cancel: &CancellationToken,
    ) -> FetchOutcome {
        if raw_url.trim().is_empty() {
            return FetchOutcome::NoLink;
        }
        let canonical = self.normalizer.normalize(raw_url).into_value();
        self.fetch_canonical(&canonical, auth, cache, cancel).await
    }

    /// Fetch for an already-canonical URL.
    pub async fn fetch_canonical(
        &self,
        canonical: &str,
        auth: &AuthContext,
        cache: &DescriptionCache,
        cancel: &CancellationToken,
    ) -> FetchOutcome {
        if let Some(text) = self.cache_hit(canonical, cache) {
            return FetchOutcome::Cached(text);
        }

        let key_lock = self
            .in_flight
            .entry(canonical.to_string())
            .or_default()
            .clone();
        let outcome = self
            .fetch_exclusive(&key_lock, canonical, auth, cache, cancel)
            .await;

        // Only the map and this caller still hold the lock: nobody is waiting on it
        self.in_flight
            .remove_if(canonical, |_, lock| Arc::strong_count(lock) == 2);
        outcome
    }

    async fn fetch_exclusive(
        &self,
        key_lock: &Mutex<()>,
        canonical: &str,
        auth: &AuthContext,
        cache: &DescriptionCache,
        cancel: &CancellationToken,
    ) -> FetchOutcome {
        let _guard = tokio::select! {
            guard = key_lock.lock() => guard,
            _ = cancel.cancelled() => return FetchOutcome::Cancelled,
        };

        // Another caller may have filled the cache while we waited
        if let Some(text) = self.cache_hit(canonical, cache) {
            return FetchOutcome::Cached(text);
        }

        self.fetch_with_retries(canonical, auth, cache, cancel).await
    }

    fn cache_hit(&self, canonical: &str, cache: &DescriptionCache) -> Option<String> {
        let text = cache.get(canonical)?;
        tracing::debug!("[FETCH] Using cached description for {}", canonical);
        self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
        Some(text)
    }

    async fn fetch_with_retries(
        &self,
        canonical: &str,
        auth: &AuthContext,
        cache: &DescriptionCache,
        cancel: &CancellationToken,
    ) -> FetchOutcome {
        let max_attempts = self.policy.max_attempts;

        for attempt in 1..=max_attempts {
            if cancel.is_cancelled() {
                tracing::warn!("[FETCH] Cancelled before attempt {} for {}", attempt, canonical);
                return FetchOutcome::Cancelled;
            }

            tracing::info!(
                "[FETCH] Fetching job detail (attempt {}/{}): {}",
                attempt,
                max_attempts,
                canonical
            );
            self.stats.network_attempts.fetch_add(1, Ordering::Relaxed);

            let result = tokio::select! {
                result = self.attempt(canonical, auth) => result,
                _ = cancel.cancelled() => {
                    tracing::warn!("[FETCH] Cancelled during attempt {} for {}", attempt, canonical);
                    return FetchOutcome::Cancelled;
                }
            };

            let error = match result {
                Ok(text) => {
                    tracing::info!("[FETCH] Description fetched ({} chars)", text.len());
                    cache.put(canonical, text.clone());
                    self.stats.fetched.fetch_add(1, Ordering::Relaxed);
                    return FetchOutcome::Fetched(text);
                }
                Err(e) => e,
            };
            match &error {
                AttemptError::MissingContent => tracing::warn!(
                    "[FETCH] No description container on page (attempt {})",
                    attempt
                ),
                e => tracing::warn!("[FETCH] Attempt {} failed for {}: {}", attempt, canonical, e),
            }

            if let Some(delay) = self.delay_after(&error, attempt) {
                if !self.pause(delay, cancel).await {
                    tracing::warn!("[FETCH] Cancelled during backoff for {}", canonical);
                    return FetchOutcome::Cancelled;
                }
            }
        }

        tracing::error!("[FETCH] All {} attempts failed for {}", max_attempts, canonical);
        self.stats.failures.fetch_add(1, Ordering::Relaxed);
        FetchOutcome::Exhausted {
            attempts: max_attempts,
        }
    }

    async fn attempt(
        &self,
        canonical: &str,
        auth: &AuthContext,
    ) -> std::result::Result<String, AttemptError> {
        let mut request = self
            .client
            .get(canonical)
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .header(REFERER, self.referer.as_str());
        if let Some(cookies) = auth.cookie_header() {
            request = request.header(COOKIE, cookies);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AttemptError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AttemptError::BadStatus(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AttemptError::Transport(e.to_string()))?;

        extract_description(&body).ok_or(AttemptError::MissingContent)
    }

    /// Pause before the next attempt, or `None` after the last one.
    fn delay_after(&self, error: &AttemptError, attempt: u32) -> Option<Duration> {
        if attempt >= self.policy.max_attempts {
            return None;
        }
        Some(match error {
            AttemptError::MissingContent => self.policy.missing_content_delay(),
            AttemptError::BadStatus(_) | AttemptError::Transport(_) => self.policy.backoff(attempt),
        })
    }

    /// Sleeps for `delay`; returns `false` if cancellation fired first.
    async fn pause(&self, delay: Duration, cancel: &CancellationToken) -> bool {
        if delay.is_zero() {
            return !cancel.is_cancelled();
        }
        tokio::select! {
            _ = tokio::time::sleep(delay) => true,
            _ = cancel.cancelled() => false,
        }
    }
}
