// src/main.rs

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use jobscout::config::HarvestSettings;
use jobscout::lifecycle;

/// Harvest job listings, enrich them with full descriptions and keep the relevant ones.
#[derive(Debug, Parser)]
#[command(name = "jobscout", version)]
struct Cli {
    /// JSON settings file; flags below override it
    #[arg(long, env = "JOBSCOUT_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long)]
    query: Option<String>,

    #[arg(long)]
    location: Option<String>,

    /// Number of result pages to walk
    #[arg(long)]
    pages: Option<u32>,

    #[arg(long, env = "JOBSCOUT_COOKIES")]
    cookies: Option<PathBuf>,

    #[arg(long, env = "JOBSCOUT_CACHE")]
    cache: Option<PathBuf>,

    /// CSV file for qualified results
    #[arg(long)]
    output: Option<PathBuf>,

    /// Completion endpoint of the scoring model
    #[arg(long, env = "JOBSCOUT_SCORER_URL")]
    scorer_url: Option<String>,

    /// Detail fetches allowed in flight at once
    #[arg(long)]
    concurrency: Option<usize>,
}

impl Cli {
    fn into_settings(self) -> Result<HarvestSettings> {
        let mut settings = match &self.config {
            Some(path) => HarvestSettings::from_file(path)?,
            None => HarvestSettings::default(),
        };

        if let Some(query) = self.query {
            settings.query = query;
        }
        if let Some(location) = self.location {
            settings.location = location;
        }
        if let Some(pages) = self.pages {
            settings.pages = pages;
        }
        if let Some(cookies) = self.cookies {
            settings.cookie_file = cookies;
        }
        if let Some(cache) = self.cache {
            settings.cache_file = cache;
        }
        if let Some(output) = self.output {
            settings.output_file = output;
        }
        if let Some(scorer_url) = self.scorer_url {
            settings.scorer.endpoint = scorer_url;
        }
        if let Some(concurrency) = self.concurrency {
            settings.fetch_concurrency = concurrency;
        }

        settings.validate()?;
        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    lifecycle::init_logging();

    let settings = Cli::parse().into_settings()?;

    let cancel = CancellationToken::new();
    lifecycle::cancel_on_ctrl_c(cancel.clone());

    let report = lifecycle::run_harvest(&settings, cancel).await?;
    for job in &report.qualified {
        println!(
            "{} | {} | {}/10 | {}",
            job.title,
            job.company,
            job.score.unwrap_or_default(),
            job.reason.as_deref().unwrap_or_default()
        );
    }

    Ok(())
}
