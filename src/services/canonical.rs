//! URL canonicalization.
//!
//! Reduces a raw URL to the comparison key used by the link ledger. Two URLs
//! that differ only in scheme (http vs https), letter case of host or path,
//! or — for a fixed set of domains — query parameters, canonicalize
//! identically.
//!
//! The query policy is deliberately asymmetric: most domains' parameters are
//! content-identifying (pagination, IDs) and are kept verbatim, lower-cased,
//! in the order given. A small allowlist of high-traffic domains is known to
//! append meaningless per-view tokens, and their queries are dropped
//! entirely.

use crate::models::CanonicalUrl;
use std::collections::HashSet;
use tracing::debug;
use url::Url;

/// Normalizes raw URLs into canonical comparison keys.
///
/// `canonicalize` is a total function: input that does not parse as an
/// absolute URL degrades to the lower-cased raw string instead of failing.
#[derive(Debug, Clone)]
pub struct UrlCanonicalizer {
    /// Domains whose query strings are dropped (matched with any `www.`
    /// prefix removed).
    ignore_params_domains: HashSet<String>,
}

impl UrlCanonicalizer {
    /// Creates a canonicalizer with the given ignore-params domain set.
    #[must_use]
    pub fn new<I, S>(ignore_params_domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            ignore_params_domains: ignore_params_domains
                .into_iter()
                .map(|d| d.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Canonicalizes a raw URL.
    ///
    /// Forces the scheme to `http`, lower-cases host and path, keeps the
    /// port, drops the fragment, and applies the per-domain query policy.
    #[must_use]
    pub fn canonicalize(&self, raw: &str) -> CanonicalUrl {
        let Ok(parsed) = Url::parse(raw.trim()) else {
            // No scheme/host parse: degrade to the lower-cased raw string.
            debug!(url = raw, "unparseable URL, using degraded canonical form");
            return CanonicalUrl::new(raw.trim().to_lowercase());
        };

        let Some(host) = parsed.host_str() else {
            debug!(url = raw, "URL without host, using degraded canonical form");
            return CanonicalUrl::new(raw.trim().to_lowercase());
        };

        let host = host.to_lowercase();
        let path = parsed.path().to_lowercase();

        let mut canonical = String::from("http://");
        canonical.push_str(&host);
        if let Some(port) = parsed.port() {
            canonical.push(':');
            canonical.push_str(&port.to_string());
        }
        canonical.push_str(&path);

        if !self.strips_query(&host) {
            if let Some(query) = parsed.query() {
                if !query.is_empty() {
                    canonical.push('?');
                    canonical.push_str(&query.to_lowercase());
                }
            }
        }

        CanonicalUrl::new(canonical)
    }

    /// Whether the query string is dropped for this host.
    fn strips_query(&self, host: &str) -> bool {
        let base = host.strip_prefix("www.").unwrap_or(host);
        self.ignore_params_domains.contains(base)
    }
}
