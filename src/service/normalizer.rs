//! Canonicalization of job detail links.
//!
//! Listing pages wrap detail links in tracking redirects that differ between
//! cards and runs. The canonical form keeps only the site's job identifier so
//! that every wrapping of the same posting maps to one cache key.

use url::Url;

use crate::config::SiteProfile;
use crate::domain::Extraction;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct UrlNormalizer {
    detail_base: Url,
    detail_path: String,
    id_param: String,
}

impl UrlNormalizer {
    pub fn new(site: &SiteProfile) -> Result<Self> {
        Ok(Self {
            detail_base: site.base()?,
            detail_path: site.detail_path.clone(),
            id_param: site.id_param.clone(),
        })
    }

    /// Maps a raw link to its canonical detail URL.
    ///
    /// Never fails: links without an identifier come back unchanged. Only the
    /// no-identifier, unrecognized-shape case (and unparseable input) is
    /// reported as degraded.
    pub fn normalize(&self, raw_url: &str) -> Extraction<String> {
        let parsed = match Url::parse(raw_url.trim()) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("[NORMALIZE] Unparseable link {:?}: {}", raw_url, e);
                return Extraction::degraded(raw_url.to_string(), format!("unparseable URL: {}", e));
            }
        };

        let job_id = parsed
            .query_pairs()
            .find(|(key, value)| key == self.id_param.as_str() && !value.is_empty())
            .map(|(_, value)| value.into_owned());

        if let Some(job_id) = job_id {
            let canonical = self.detail_url(&job_id);
            tracing::debug!("[NORMALIZE] {} -> {}", raw_url, canonical);
            return Extraction::Ok(canonical);
        }

        if parsed.path().contains(self.detail_path.as_str()) {
            tracing::debug!("[NORMALIZE] Already a detail link: {}", raw_url);
            return Extraction::Ok(raw_url.to_string());
        }

        tracing::warn!("[NORMALIZE] No {} parameter in {}", self.id_param, raw_url);
        Extraction::degraded(
            raw_url.to_string(),
            format!("no {} parameter and not a detail path", self.id_param),
        )
    }

    /// Fixed-template detail URL for a job identifier.
    pub fn detail_url(&self, job_id: &str) -> String {
        let mut url = self.detail_base.clone();
        url.set_path(&self.detail_path);
        url.set_fragment(None);
        url.query_pairs_mut().clear().append_pair(&self.id_param, job_id);
        url.to_string()
    }
}
