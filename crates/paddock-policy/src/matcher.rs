//! URL matching rules shared by the host governor and the injected
//! guest scripts.
//!
//! "Same-site" here means hostname equality or a subdomain
//! relationship, not strict origin equality; the whitelist is matched
//! by exact (origin, path) equality with query and fragment ignored.

use url::Url;

/// True when `host` equals `parent` or is a subdomain of it.
pub fn host_matches(host: &str, parent: &str) -> bool {
    host == parent || host.ends_with(&format!(".{}", parent))
}

/// Strict origin comparison, used for the host-level cross-document
/// check.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}

/// True when the target's hostname equals or is a subdomain of
/// `current_host`.
pub fn same_site(target: &Url, current_host: &str) -> bool {
    match target.host_str() {
        Some(host) => host_matches(host, current_host),
        None => false,
    }
}

/// Exact (origin, path) whitelist test. Entries that fail to parse are
/// skipped rather than treated as wildcards.
pub fn whitelist_matches(target: &Url, whitelist: &[String]) -> bool {
    whitelist.iter().any(|entry| match Url::parse(entry) {
        Ok(entry_url) => {
            entry_url.origin() == target.origin() && entry_url.path() == target.path()
        }
        Err(err) => {
            log::debug!("Skipping unparsable whitelist entry {}: {}", entry, err);
            false
        }
    })
}
