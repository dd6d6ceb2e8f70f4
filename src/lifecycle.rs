//! Run lifecycle management.
//!
//! Handles logging setup, wiring the collaborators from settings, the scoped
//! cache session around a run, and Ctrl-C cancellation.

use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use tracing_subscriber::EnvFilter;

use crate::config::HarvestSettings;
use crate::error::Result;
use crate::service::export;
use crate::service::http::{create_client, ClientType};
use crate::service::{
    AuthContext, CacheSession, DetailFetcher, HarvestPipeline, HarvestReport, HttpPageSource,
    ListingOrchestrator, LlamaServerScorer, OrchestratorSettings, PageSource, Qualifier,
    RelevanceScorer, UrlNormalizer,
};

/// Initialize logging with tracing_subscriber.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,jobscout=debug"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .with_target(false)
        .with_ansi(true)
        .try_init();
}

/// Cancels `cancel` when the process receives Ctrl-C.
pub fn cancel_on_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("[RUN] Interrupt received, stopping after in-flight work");
            cancel.cancel();
        }
    });
}

/// Builds the HTTP-backed pipeline described by `settings` and runs it.
///
/// Fails only when the cookie jar, HTTP clients or output files cannot be
/// set up or written.
pub async fn run_harvest(
    settings: &HarvestSettings,
    cancel: CancellationToken,
) -> Result<HarvestReport> {
    settings.validate()?;

    let auth = AuthContext::load(&settings.cookie_file)?;
    let client = create_client(
        ClientType::from_emulation_flag(settings.emulate_browser),
        settings.retry.timeout(),
    )?;
    let scorer_client = create_client(
        ClientType::Standard,
        Duration::from_secs(settings.scorer.timeout_secs),
    )?;

    let fetcher = DetailFetcher::new(
        client.clone(),
        UrlNormalizer::new(&settings.site)?,
        settings.retry.clone(),
        settings.site.base_url.clone(),
    );
    let source = HttpPageSource::new(client, &settings.site, &auth)?;
    let orchestrator = ListingOrchestrator::new(source, fetcher, OrchestratorSettings::from(settings));
    let qualifier = Qualifier::new(
        LlamaServerScorer::new(scorer_client, settings.scorer.clone()),
        &settings.qualification,
    );

    execute(&HarvestPipeline::new(orchestrator, qualifier), settings, &auth, cancel).await
}

/// Runs `pipeline` inside a cache session and exports the qualified records.
///
/// The cache is flushed whether the run completes or is cancelled. A failed
/// flush does not stop the export; the first error is returned after both
/// steps have been attempted. Release builds abort on panic, so a panicking
/// run leaves the previous cache file in place.
pub async fn execute<P: PageSource, S: RelevanceScorer>(
    pipeline: &HarvestPipeline<P, S>,
    settings: &HarvestSettings,
    auth: &AuthContext,
    cancel: CancellationToken,
) -> Result<HarvestReport> {
    let run_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("harvest", %run_id);

    async move {
        let started = std::time::Instant::now();
        let session = CacheSession::open(&settings.cache_file);

        let report = pipeline
            .run(
                &settings.query,
                &settings.location,
                settings.pages,
                auth,
                session.cache(),
                &cancel,
            )
            .await;

        let flushed = session.close();
        if let Err(e) = &flushed {
            tracing::error!("[RUN] Failed to flush description cache: {}", e);
        }
        let exported = export::write_csv(&settings.output_file, &report.qualified);
        if let Err(e) = &exported {
            tracing::error!("[RUN] Failed to export qualified jobs: {}", e);
        }
        flushed?;
        exported?;

        tracing::info!(
            "[RUN] {} jobs, {} qualified, {} cache hits, {} network attempts, {} failed fetches in {}ms{}",
            report.jobs_found,
            report.qualified.len(),
            report.fetch.cache_hits,
            report.fetch.network_attempts,
            report.fetch.failures,
            started.elapsed().as_millis(),
            if report.cancelled { " (cancelled)" } else { "" }
        );
        Ok(report)
    }
    .instrument(span)
    .await
}
