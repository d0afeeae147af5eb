//! Application state management
//!
//! Central state for Paddock: configuration, the policy store, the
//! history store, and the bindings from live panes to site identities.
//!
//! Note: pane teardown methods are unused while the shell keeps one
//! pane per configured site for the whole session; they are wired up
//! once panes can be closed individually.

#![allow(dead_code)]

use paddock_core::types::{PaneId, PolicySnapshot};
use paddock_core::{AppConfig, PaddockResult};
use paddock_history::HistoryStore;
use paddock_policy::PolicyStore;
use std::collections::HashMap;
use url::Url;

/// Binding from a live pane to its (lazily resolved) site identity.
#[derive(Debug, Clone)]
pub struct PaneBinding {
    pub pane_id: PaneId,

    /// Resolved on first successful load whose origin matches a
    /// configured site; sticky for the pane's lifetime after that.
    pub site_key: Option<String>,

    /// Last known URL the pane committed to
    pub current_url: Option<String>,

    /// Last known document title (asynchronous, best-effort)
    pub last_title: Option<String>,
}

pub struct AppState {
    pub config: AppConfig,
    pub policy: PolicyStore,
    pub history: HistoryStore,
    pub panes: HashMap<PaneId, PaneBinding>,
}

impl AppState {
    /// Create state from the default settings location.
    pub fn with_defaults() -> PaddockResult<Self> {
        let defaults = AppConfig::default();
        let config = AppConfig::load(&defaults.settings_path());
        Self::new(config)
    }

    /// Create a new application state
    pub fn new(config: AppConfig) -> PaddockResult<Self> {
        std::fs::create_dir_all(&config.data_dir).ok();

        let policy = PolicyStore::load(&config);
        let history = HistoryStore::new(config.history_dir());

        Ok(Self {
            config,
            policy,
            history,
            panes: HashMap::new(),
        })
    }

    /// Register a freshly created pane with no identity yet.
    pub fn register_pane(&mut self) -> PaneId {
        let pane_id = PaneId::new();
        self.panes.insert(
            pane_id,
            PaneBinding {
                pane_id,
                site_key: None,
                current_url: None,
                last_title: None,
            },
        );
        tracing::info!("Registered pane {:?}", pane_id);
        pane_id
    }

    /// Drop the binding for a destroyed pane.
    pub fn unregister_pane(&mut self, pane_id: PaneId) {
        if let Some(binding) = self.panes.remove(&pane_id) {
            tracing::info!("Unregistered pane {:?}", binding.pane_id);
        }
    }

    pub fn binding(&self, pane_id: PaneId) -> Option<&PaneBinding> {
        self.panes.get(&pane_id)
    }

    pub fn binding_mut(&mut self, pane_id: PaneId) -> Option<&mut PaneBinding> {
        self.panes.get_mut(&pane_id)
    }

    /// Resolve (or reaffirm) the pane's site key against the current
    /// URL's hostname. The mapping is sticky: once resolved it is never
    /// re-derived, even after cross-origin navigation — the policy that
    /// governs a pane is the policy of the site that created it.
    pub fn resolve_identity(&mut self, pane_id: PaneId, url: &str) -> Option<String> {
        if let Some(existing) = self
            .panes
            .get(&pane_id)
            .and_then(|binding| binding.site_key.clone())
        {
            return Some(existing);
        }

        let hostname = Url::parse(url).ok()?.host_str()?.to_string();
        let resolved = paddock_policy::resolve_site_key(self.policy.sites(), &hostname)?;
        tracing::info!("Pane {:?} resolved to site {}", pane_id, resolved);

        if let Some(binding) = self.panes.get_mut(&pane_id) {
            binding.site_key = Some(resolved.clone());
        }
        Some(resolved)
    }

    /// The policy snapshot governing a pane, if it has an identity.
    pub fn policy_for_pane(&self, pane_id: PaneId) -> Option<PolicySnapshot> {
        let key = self.binding(pane_id)?.site_key.as_deref()?;
        Some(self.policy.snapshot(key))
    }

    /// Optional site-specific custom script, read per injection.
    pub fn custom_script_for(&self, key: &str) -> Option<String> {
        let path = self.config.scripts_dir().join(format!("{}.js", key));
        if !path.exists() {
            return None;
        }
        match std::fs::read_to_string(&path) {
            Ok(source) => Some(source),
            Err(err) => {
                tracing::warn!("Failed to read custom script for {}: {}", key, err);
                None
            }
        }
    }
}
