use tokio_util::sync::CancellationToken;

use crate::domain::JobRecord;
use crate::service::auth::AuthContext;
use crate::service::cache::DescriptionCache;
use crate::service::fetcher::FetchStatsSnapshot;
use crate::service::orchestrator::{ListingOrchestrator, ListingStatsSnapshot};
use crate::service::page_source::PageSource;
use crate::service::qualifier::Qualifier;
use crate::service::scorer::RelevanceScorer;

/// What one harvest produced.
#[derive(Debug, Clone)]
pub struct HarvestReport {
    pub jobs_found: usize,
    pub qualified: Vec<JobRecord>,
    pub listing: ListingStatsSnapshot,
    pub fetch: FetchStatsSnapshot,
    pub cancelled: bool,
}

/// Listing traversal followed by qualification of every completed record.
pub struct HarvestPipeline<P, S> {
    orchestrator: ListingOrchestrator<P>,
    qualifier: Qualifier<S>,
}

impl<P: PageSource, S: RelevanceScorer> HarvestPipeline<P, S> {
    pub fn new(orchestrator: ListingOrchestrator<P>, qualifier: Qualifier<S>) -> Self {
        Self {
            orchestrator,
            qualifier,
        }
    }

    pub fn orchestrator(&self) -> &ListingOrchestrator<P> {
        &self.orchestrator
    }

    pub fn qualifier(&self) -> &Qualifier<S> {
        &self.qualifier
    }

    pub async fn run(
        &self,
        query: &str,
        location: &str,
        page_count: u32,
        auth: &AuthContext,
        cache: &DescriptionCache,
        cancel: &CancellationToken,
    ) -> HarvestReport {
        let jobs = self
            .orchestrator
            .run(query, location, page_count, auth, cache, cancel)
            .await;
        let jobs_found = jobs.len();

        tracing::info!("[QUALIFY] Evaluating {} jobs", jobs_found);
        let qualified = self.qualifier.qualify_all(jobs).await;
        tracing::info!("[QUALIFY] {} of {} jobs qualified", qualified.len(), jobs_found);

        HarvestReport {
            jobs_found,
            qualified,
            listing: self.orchestrator.stats(),
            fetch: self.orchestrator.fetcher().stats(),
            cancelled: cancel.is_cancelled(),
        }
    }
}
