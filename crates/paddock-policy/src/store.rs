//! Policy store
//!
//! Reads the site configuration document and owns the per-site
//! whitelist documents. Only the host mutates the store; guest panes
//! receive an immutable snapshot at injection time.

use paddock_core::types::{PolicySnapshot, SiteConfig};
use paddock_core::{AppConfig, PaddockError, PaddockResult};
use std::path::PathBuf;

pub struct PolicyStore {
    sites: Vec<SiteConfig>,
    sites_path: PathBuf,
    whitelist_dir: PathBuf,
}

impl PolicyStore {
    /// Load the store from the configured data directory. A missing or
    /// corrupt site document yields an empty site list, not an error:
    /// policy unavailability must not stop the app from rendering.
    pub fn load(config: &AppConfig) -> Self {
        let sites_path = config.sites_path();
        let whitelist_dir = config.whitelist_dir();
        let sites = Self::read_sites(&sites_path);
        log::info!("Loaded {} configured sites", sites.len());

        Self {
            sites,
            sites_path,
            whitelist_dir,
        }
    }

    fn read_sites(path: &PathBuf) -> Vec<SiteConfig> {
        if !path.exists() {
            return Vec::new();
        }
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(sites) => sites,
                Err(err) => {
                    log::warn!("Invalid site configuration: {}", err);
                    Vec::new()
                }
            },
            Err(err) => {
                log::warn!("Failed to read site configuration: {}", err);
                Vec::new()
            }
        }
    }

    /// Re-read the site document from disk (UI-driven edits).
    pub fn reload(&mut self) {
        self.sites = Self::read_sites(&self.sites_path);
        log::info!("Reloaded {} configured sites", self.sites.len());
    }

    pub fn sites(&self) -> &[SiteConfig] {
        &self.sites
    }

    pub fn site(&self, key: &str) -> Option<&SiteConfig> {
        self.sites.iter().find(|site| site.key == key)
    }

    /// Compose the injection-time policy snapshot for a site key.
    /// Unknown keys get the default (unrestricted) policy.
    pub fn snapshot(&self, key: &str) -> PolicySnapshot {
        match self.site(key) {
            Some(site) => PolicySnapshot {
                allow_internal_navigation: site.allow_internal_navigation,
                allow_external_navigation: site.allow_external_navigation,
                url_logging: site.url_logging,
                whitelist: self.whitelist(key),
            },
            None => PolicySnapshot::default(),
        }
    }

    fn whitelist_path(&self, key: &str) -> PathBuf {
        self.whitelist_dir.join(format!("{}.json", key))
    }

    /// The ordered whitelist for a site key; empty when absent or
    /// unparsable.
    pub fn whitelist(&self, key: &str) -> Vec<String> {
        let path = self.whitelist_path(key);
        if !path.exists() {
            return Vec::new();
        }
        match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(entries) => entries,
                Err(err) => {
                    log::warn!("Invalid whitelist for {}: {}", key, err);
                    Vec::new()
                }
            },
            Err(err) => {
                log::warn!("Failed to read whitelist for {}: {}", key, err);
                Vec::new()
            }
        }
    }

    fn save_whitelist(&self, key: &str, entries: &[String]) -> PaddockResult<()> {
        std::fs::create_dir_all(&self.whitelist_dir)?;
        let data = serde_json::to_string_pretty(entries).map_err(|err| {
            PaddockError::Policy(format!("Failed to serialize whitelist for {}: {}", key, err))
        })?;
        std::fs::write(self.whitelist_path(key), data)?;
        Ok(())
    }

    /// Append a whitelist entry, preserving order and skipping
    /// duplicates. Returns whether the entry was added.
    pub fn add_whitelist_entry(&self, key: &str, url: &str) -> PaddockResult<bool> {
        let mut entries = self.whitelist(key);
        if entries.iter().any(|entry| entry == url) {
            return Ok(false);
        }
        entries.push(url.to_string());
        self.save_whitelist(key, &entries)?;
        log::info!("Whitelisted {} for {}", url, key);
        Ok(true)
    }

    /// Remove a whitelist entry. Returns whether anything was removed.
    pub fn remove_whitelist_entry(&self, key: &str, url: &str) -> PaddockResult<bool> {
        let mut entries = self.whitelist(key);
        let before = entries.len();
        entries.retain(|entry| entry != url);
        if entries.len() == before {
            return Ok(false);
        }
        self.save_whitelist(key, &entries)?;
        log::info!("Removed {} from whitelist for {}", url, key);
        Ok(true)
    }
}
