use crate::config::QualificationSettings;
use crate::domain::JobRecord;
use crate::service::scorer::RelevanceScorer;

/// Why a record was not qualified.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// None of the keywords occur in the title or description; the scorer was not asked
    NoKeywordMatch,
    /// The scorer returned nothing usable
    NoVerdict,
    BelowThreshold { score: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Qualification {
    Qualified(JobRecord),
    Rejected { job: JobRecord, rejection: Rejection },
}

/// Keyword prefilter followed by the relevance scorer.
pub struct Qualifier<S> {
    scorer: S,
    keywords: Vec<String>,
    threshold: f64,
}

impl<S: RelevanceScorer> Qualifier<S> {
    pub fn new(scorer: S, settings: &QualificationSettings) -> Self {
        Self {
            scorer,
            keywords: settings.keywords.iter().map(|k| k.to_lowercase()).collect(),
            threshold: settings.threshold,
        }
    }

    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    /// Case-insensitive substring match over title and full description.
    pub fn passes_prefilter(&self, job: &JobRecord) -> bool {
        let text = format!("{} {}", job.title, job.full_description).to_lowercase();
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }

    pub async fn qualify(&self, mut job: JobRecord) -> Qualification {
        if !self.passes_prefilter(&job) {
            return Qualification::Rejected {
                job,
                rejection: Rejection::NoKeywordMatch,
            };
        }

        let verdict = self
            .scorer
            .score(&job.title, &job.company, &job.full_description)
            .await;

        match verdict {
            None => Qualification::Rejected {
                job,
                rejection: Rejection::NoVerdict,
            },
            Some(v) if v.score >= self.threshold => {
                job.score = Some(v.score);
                job.reason = Some(v.reason);
                Qualification::Qualified(job)
            }
            Some(v) => Qualification::Rejected {
                job,
                rejection: Rejection::BelowThreshold { score: v.score },
            },
        }
    }

    /// Qualifies records one by one, logging each decision, and keeps the qualified ones.
    pub async fn qualify_all(&self, jobs: Vec<JobRecord>) -> Vec<JobRecord> {
        let mut qualified = Vec::new();

        for job in jobs {
            match self.qualify(job).await {
                Qualification::Qualified(job) => {
                    tracing::info!(
                        "[QUALIFY] ✅ {} ({}/10) - {}",
                        job.title,
                        job.score.unwrap_or_default(),
                        job.reason.as_deref().unwrap_or_default()
                    );
                    qualified.push(job);
                }
                Qualification::Rejected { job, rejection } => {
                    tracing::info!("[QUALIFY] ❌ {} ({:?})", job.title, rejection);
                }
            }
        }

        qualified
    }
}
