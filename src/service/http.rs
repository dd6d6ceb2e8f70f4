use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, UPGRADE_INSECURE_REQUESTS};
use reqwest::Client;
use std::time::Duration;

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:136.0) Gecko/20100101 Firefox/136.0";

#[derive(Debug, Clone, Copy)]
pub enum ClientType {
    Standard,
    HeavyEmulation,
}

impl ClientType {
    pub fn from_emulation_flag(emulate_browser: bool) -> Self {
        if emulate_browser {
            Self::HeavyEmulation
        } else {
            Self::Standard
        }
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers
}

/// Factory for creating an HTTP client with a per-request timeout.
pub fn create_client(client_type: ClientType, timeout: Duration) -> Result<Client> {
    let builder = Client::builder().timeout(timeout);

    match client_type {
        ClientType::HeavyEmulation => builder
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(browser_headers())
            .build()
            .context("Failed to build browser-like reqwest client"),
        ClientType::Standard => builder
            .build()
            .context("Failed to build standard reqwest client"),
    }
}
