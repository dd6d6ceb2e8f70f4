//! Search result pages: where listing markup comes from.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT_LANGUAGE, COOKIE, REFERER};
use reqwest::Client;
use url::Url;

use crate::config::SiteProfile;
use crate::domain::RawCard;
use crate::extractor::ListingExtractor;
use crate::service::auth::AuthContext;

/// Provider of listing pages and the cards on them.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Raw markup of the results page starting at `offset`.
    async fn get_page(&self, query: &str, location: &str, offset: u32) -> Result<String>;

    /// Cards in page order. Missing fields are empty strings.
    fn parse_cards(&self, markup: &str) -> Vec<RawCard>;
}

/// Fetches result pages over HTTP with the run's cookies.
pub struct HttpPageSource {
    client: Client,
    base: Url,
    search_path: String,
    cookie_header: Option<String>,
}

impl HttpPageSource {
    pub fn new(client: Client, site: &SiteProfile, auth: &AuthContext) -> crate::error::Result<Self> {
        Ok(Self {
            client,
            base: site.base()?,
            search_path: site.search_path.clone(),
            cookie_header: auth.cookie_header(),
        })
    }

    pub fn search_url(&self, query: &str, location: &str, offset: u32) -> Url {
        let mut url = self.base.clone();
        url.set_path(&self.search_path);
        url.query_pairs_mut()
            .clear()
            .append_pair("q", query)
            .append_pair("l", location)
            .append_pair("start", &offset.to_string())
            .append_pair("sort", "date");
        url
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn get_page(&self, query: &str, location: &str, offset: u32) -> Result<String> {
        let url = self.search_url(query, location, offset);
        tracing::debug!("[LISTING] Requesting {}", url);

        let mut request = self
            .client
            .get(url.as_str())
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .header(REFERER, self.base.as_str());
        if let Some(cookies) = &self.cookie_header {
            request = request.header(COOKIE, cookies.as_str());
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to request results page {}", url))?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Results page {} returned {}", url, status);
        }

        response
            .text()
            .await
            .context("Failed to read results page body")
    }

    fn parse_cards(&self, markup: &str) -> Vec<RawCard> {
        ListingExtractor::extract_cards(markup, &self.base)
            .into_iter()
            .map(|card| {
                if let Some(reason) = card.reason() {
                    tracing::debug!("[LISTING] Partial card ({})", reason);
                }
                card.into_value()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::http::{create_client, ClientType};
    use mockito::Matcher;
    use std::time::Duration;

    fn source_for(base: &str) -> HttpPageSource {
        let client = create_client(ClientType::Standard, Duration::from_secs(5)).unwrap();
        HttpPageSource::new(client, &SiteProfile::with_base(base), &AuthContext::anonymous()).unwrap()
    }

    #[test]
    fn test_search_url_layout() {
        let source = source_for("https://www.site.test/");
        assert_eq!(
            source.search_url("marketing manager", "remote", 20).as_str(),
            "https://www.site.test/jobs?q=marketing+manager&l=remote&start=20&sort=date"
        );
    }

    #[tokio::test]
    async fn test_get_page_and_parse_cards() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/jobs")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "growth".into()),
                Matcher::UrlEncoded("start".into(), "10".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"<div class="job_seen_beacon">
                    <h2 class="jobTitle"><a href="/rc/clk?jk=1"><span>Growth Lead</span></a></h2>
                </div>"#,
            )
            .create_async()
            .await;

        let source = source_for(&server.url());
        let markup = source.get_page("growth", "remote", 10).await.unwrap();
        let cards = source.parse_cards(&markup);

        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].title, "Growth Lead");
        assert_eq!(cards[0].link, format!("{}/rc/clk?jk=1", server.url()));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_bad_status_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/jobs")
            .match_query(Matcher::Any)
            .with_status(403)
            .create_async()
            .await;

        let source = source_for(&server.url());
        assert!(source.get_page("growth", "remote", 0).await.is_err());
    }
}
