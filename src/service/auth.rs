//! Authentication context loaded from a Netscape-format cookie jar.

use std::path::Path;

use crate::domain::Cookie;
use crate::error::{HarvestError, Result};

const HTTP_ONLY_PREFIX: &str = "#HttpOnly_";

/// Read-only set of cookies sent with every detail fetch.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    cookies: Vec<Cookie>,
}

impl AuthContext {
    /// Context with no cookies; fetches go out unauthenticated.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            HarvestError::cookie_jar(0, format!("cannot read {}: {}", path.display(), e))
        })?;
        let context = Self::parse(&raw)?;
        tracing::info!(
            "[AUTH] Loaded {} cookies from {}",
            context.cookies.len(),
            path.display()
        );
        Ok(context)
    }

    /// Parses cookie-jar text: seven tab-separated fields per line
    /// (domain, subdomains flag, path, secure flag, expiry, name, value).
    pub fn parse(raw: &str) -> Result<Self> {
        let mut cookies = Vec::new();

        for (idx, line) in raw.lines().enumerate() {
            let line = line.trim_end_matches(['\r', '\n']);
            let line = match line.strip_prefix(HTTP_ONLY_PREFIX) {
                Some(rest) => rest,
                None if line.trim().is_empty() || line.starts_with('#') => continue,
                None => line,
            };

            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != 7 {
                return Err(HarvestError::cookie_jar(
                    idx + 1,
                    format!("expected 7 tab-separated fields, found {}", fields.len()),
                ));
            }

            let path = match fields[2] {
                "" => "/",
                path => path,
            };
            cookies.push(Cookie {
                domain: fields[0].to_string(),
                path: path.to_string(),
                name: fields[5].to_string(),
                value: fields[6].to_string(),
            });
        }

        Ok(Self { cookies })
    }

    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// `Cookie` header value, or `None` when there is nothing to send.
    /// Later cookies with the same name replace earlier ones.
    pub fn cookie_header(&self) -> Option<String> {
        let mut pairs: Vec<(&str, &str)> = Vec::with_capacity(self.cookies.len());
        for cookie in &self.cookies {
            match pairs.iter_mut().find(|(name, _)| *name == cookie.name) {
                Some(pair) => pair.1 = cookie.value.as_str(),
                None => pairs.push((cookie.name.as_str(), cookie.value.as_str())),
            }
        }

        if pairs.is_empty() {
            return None;
        }
        Some(
            pairs
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}
