//! Site identity resolution
//!
//! Panes are created generically and only acquire an identity once they
//! navigate somewhere; this maps a pane's current hostname onto a
//! configured site key. Matching is consistent with the same-site test:
//! the pane hostname must equal the configured site's hostname or be a
//! subdomain of it. The first configured match wins; callers keep the
//! resolved key for the pane's lifetime.

use crate::matcher::host_matches;
use paddock_core::types::SiteConfig;
use url::Url;

/// Resolve the site key for a pane currently showing `hostname`.
pub fn resolve_site_key(sites: &[SiteConfig], hostname: &str) -> Option<String> {
    for site in sites {
        let configured_host = match Url::parse(&site.url) {
            Ok(parsed) => match parsed.host_str() {
                Some(host) => host.to_string(),
                None => continue,
            },
            Err(err) => {
                log::warn!("Configured site {} has invalid URL {}: {}", site.key, site.url, err);
                continue;
            }
        };

        if host_matches(hostname, &configured_host) {
            return Some(site.key.clone());
        }
    }

    None
}
