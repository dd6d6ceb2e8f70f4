//! Relevance scoring of job postings.

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::config::ScorerSettings;
use crate::domain::Verdict;

/// Judges how relevant a posting is. `None` means no usable judgment.
#[async_trait]
pub trait RelevanceScorer: Send + Sync {
    async fn score(&self, title: &str, company: &str, description: &str) -> Option<Verdict>;
}

/// Parses model output into a verdict.
///
/// Takes everything from the first `{`, restores the closing brace when the
/// stop sequence cut it off, and requires both `score` (number) and `reason`.
pub fn parse_verdict(raw: &str) -> Option<Verdict> {
    static OBJECT: OnceLock<Regex> = OnceLock::new();
    let object = OBJECT.get_or_init(|| Regex::new(r"(?s)\{.*").unwrap());

    let found = object.find(raw)?.as_str().trim_end();
    let candidate = if found.ends_with('}') {
        found.to_string()
    } else {
        format!("{}}}", found)
    };

    match serde_json::from_str::<Verdict>(&candidate) {
        Ok(verdict) if verdict.score.is_finite() => Some(verdict),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!("[SCORE] Unparsable scorer output {:?}: {}", candidate, e);
            None
        }
    }
}

pub fn build_prompt(title: &str, company: &str, description: &str) -> String {
    format!(
        "You are a marketing lead qualifier for a digital marketing agency focused on B2B, SaaS, and tech startups.\n\
         Rate this job posting from 0-10 based on how likely the company is in your target space (tech, AI, LLM, SaaS, B2B, startup).\n\
         Also provide one short reason.\n\n\
         Return JSON: {{\"score\": <number>, \"reason\": \"<short reason>\"}}\n\n\
         Title: {}\nCompany: {}\nDescription: {}\n",
        title, company, description
    )
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    prompt: &'a str,
    n_predict: u32,
    temperature: f32,
    stop: [&'a str; 1],
}

#[derive(Deserialize)]
struct CompletionResponse {
    content: String,
}

/// Scorer backed by a llama.cpp-style `/completion` HTTP endpoint.
pub struct LlamaServerScorer {
    client: Client,
    settings: ScorerSettings,
}

impl LlamaServerScorer {
    pub fn new(client: Client, settings: ScorerSettings) -> Self {
        Self { client, settings }
    }

    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        let body = CompletionRequest {
            prompt,
            n_predict: self.settings.max_tokens,
            temperature: self.settings.temperature,
            stop: ["}"],
        };

        let response = self
            .client
            .post(self.settings.endpoint.as_str())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Scorer error {}: {}", status, error_text);
        }

        let completion: CompletionResponse = response.json().await?;
        Ok(completion.content)
    }
}

#[async_trait]
impl RelevanceScorer for LlamaServerScorer {
    async fn score(&self, title: &str, company: &str, description: &str) -> Option<Verdict> {
        let prompt = build_prompt(title, company, description);
        match self.complete(&prompt).await {
            Ok(content) => parse_verdict(&content),
            Err(e) => {
                tracing::warn!("[SCORE] Scorer request failed: {:#}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::http::{create_client, ClientType};
    use mockito::Matcher;
    use std::time::Duration;

    #[test]
    fn test_parses_complete_object() {
        let verdict = parse_verdict(r#"Sure! {"score": 8, "reason": "SaaS startup"}"#).unwrap();
        assert_eq!(verdict, Verdict::new(8.0, "SaaS startup"));
    }

    #[test]
    fn test_restores_brace_cut_by_stop_sequence() {
        let verdict = parse_verdict("\n {\"score\": 6.5, \"reason\": \"AI tooling\"").unwrap();
        assert_eq!(verdict.score, 6.5);
        assert_eq!(verdict.reason, "AI tooling");
    }

    #[test]
    fn test_malformed_output_is_absent() {
        assert_eq!(parse_verdict("I cannot rate this posting."), None);
        assert_eq!(parse_verdict(r#"{"score": "high", "reason": "x"}"#), None);
        assert_eq!(parse_verdict(r#"{"score": 7}"#), None);
        assert_eq!(parse_verdict(r#"{"score": 7, "reason": "x", "#), None);
        assert_eq!(parse_verdict(""), None);
    }

    #[test]
    fn test_prompt_carries_posting_fields() {
        let prompt = build_prompt("Growth Lead", "Acme", "We build LLM tools");
        assert!(prompt.contains("Title: Growth Lead"));
        assert!(prompt.contains("Company: Acme"));
        assert!(prompt.contains("Description: We build LLM tools"));
        assert!(prompt.contains(r#"{"score": <number>, "reason": "<short reason>"}"#));
    }

    #[tokio::test]
    async fn test_llama_server_round_trip() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/completion")
            .match_body(Matcher::PartialJsonString(
                r#"{"n_predict": 60, "stop": ["}"]}"#.to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"content": " {\"score\": 9, \"reason\": \"B2B SaaS\""}"#)
            .create_async()
            .await;

        let client = create_client(ClientType::Standard, Duration::from_secs(5)).unwrap();
        let scorer = LlamaServerScorer::new(
            client,
            ScorerSettings {
                endpoint: format!("{}/completion", server.url()),
                ..ScorerSettings::default()
            },
        );

        let verdict = scorer.score("Growth Lead", "Acme", "B2B SaaS").await;
        assert_eq!(verdict, Some(Verdict::new(9.0, "B2B SaaS")));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_scorer_failure_is_absent() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/completion")
            .with_status(500)
            .create_async()
            .await;

        let client = create_client(ClientType::Standard, Duration::from_secs(5)).unwrap();
        let scorer = LlamaServerScorer::new(
            client,
            ScorerSettings {
                endpoint: format!("{}/completion", server.url()),
                ..ScorerSettings::default()
            },
        );

        assert_eq!(scorer.score("t", "c", "d").await, None);
    }
}
