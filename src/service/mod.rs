pub mod auth;
pub mod cache;
pub mod export;
pub mod fetcher;
pub mod http;
pub mod normalizer;
pub mod orchestrator;
pub mod page_source;
pub mod pipeline;
pub mod qualifier;
pub mod scorer;

pub use auth::AuthContext;
pub use cache::{CacheSession, DescriptionCache};
pub use fetcher::{DetailFetcher, FetchOutcome, FetchStatsSnapshot};
pub use normalizer::UrlNormalizer;
pub use orchestrator::{ListingOrchestrator, OrchestratorSettings};
pub use page_source::{HttpPageSource, PageSource};
pub use pipeline::{HarvestPipeline, HarvestReport};
pub use qualifier::{Qualification, Qualifier, Rejection};
pub use scorer::{parse_verdict, LlamaServerScorer, RelevanceScorer};
