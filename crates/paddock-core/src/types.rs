//! Common types used throughout Paddock

use serde::{Deserialize, Serialize};

/// Unique identifier for a guest pane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaneId(pub u64);

impl PaneId {
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for PaneId {
    fn default() -> Self {
        Self::new()
    }
}

/// A configured external site, as stored in `sites.json`.
///
/// The policy flags are tri-state: a missing flag means "use the
/// default for that flag", which differs per flag (see `PolicySnapshot`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    /// Stable identifier used for policy, whitelist and history lookups
    pub key: String,

    /// Display title
    pub title: String,

    /// Home URL the pane starts at
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_logging: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_external_navigation: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_internal_navigation: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_address_bar: Option<bool>,
}

/// Injection-time policy snapshot for one site key.
///
/// Guests never see the live store; they receive these values inlined
/// into the injected payload and keep them for the document's lifetime.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicySnapshot {
    pub allow_internal_navigation: Option<bool>,
    pub allow_external_navigation: Option<bool>,
    pub url_logging: Option<bool>,
    /// Full whitelist URLs, matched by exact (origin, path) equality
    pub whitelist: Vec<String>,
}

impl PolicySnapshot {
    /// Internal (same-site) navigation is restricted only when the flag
    /// is explicitly `false`.
    pub fn internal_restricted(&self) -> bool {
        self.allow_internal_navigation == Some(false)
    }

    /// External (cross-origin) navigation defaults to allowed when the
    /// flag is unset.
    pub fn external_allowed(&self) -> bool {
        self.allow_external_navigation != Some(false)
    }

    /// URL logging is opt-in: only an explicit `true` enables it.
    pub fn logging_enabled(&self) -> bool {
        self.url_logging == Some(true)
    }
}

/// The kind of navigation attempt under evaluation. Ephemeral, never
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKind {
    Link,
    Form,
    PushState,
    ReplaceState,
    PopState,
    HashChange,
    WindowOpen,
    FullNavigation,
}

/// Notice emitted to the UI whenever either enforcement layer vetoes a
/// navigation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedNavigation {
    pub blocked_url: String,
    pub current_domain: String,
    pub target_domain: String,
}

/// A guest-reported URL change (same-document navigation the host
/// cannot observe directly).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlChange {
    pub url: String,
    #[serde(default)]
    pub previous_url: String,
    pub current_domain: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_config_optional_flags() {
        let json = r#"{"key":"mail","title":"Mail","url":"https://mail.example.com"}"#;
        let site: SiteConfig = serde_json::from_str(json).unwrap();
        assert_eq!(site.key, "mail");
        assert_eq!(site.url_logging, None);
        assert_eq!(site.allow_external_navigation, None);
        assert_eq!(site.allow_internal_navigation, None);
    }

    #[test]
    fn test_site_config_camel_case_flags() {
        let json = r#"{"key":"k1","title":"T","url":"https://a.com","allowInternalNavigation":false,"urlLogging":true}"#;
        let site: SiteConfig = serde_json::from_str(json).unwrap();
        assert_eq!(site.allow_internal_navigation, Some(false));
        assert_eq!(site.url_logging, Some(true));
    }

    #[test]
    fn test_policy_snapshot_defaults() {
        let policy = PolicySnapshot::default();
        assert!(!policy.internal_restricted());
        assert!(policy.external_allowed());
        assert!(!policy.logging_enabled());
    }

    #[test]
    fn test_blocked_navigation_wire_shape() {
        let notice = BlockedNavigation {
            blocked_url: "https://a.com/other".to_string(),
            current_domain: "a.com".to_string(),
            target_domain: "a.com".to_string(),
        };
        let json = serde_json::to_string(&notice).unwrap();
        assert!(json.contains("\"blockedUrl\""));
        assert!(json.contains("\"currentDomain\""));
        assert!(json.contains("\"targetDomain\""));
    }

    #[test]
    fn test_url_change_missing_previous_url() {
        let json = r#"{"url":"https://a.com/x","currentDomain":"a.com"}"#;
        let change: UrlChange = serde_json::from_str(json).unwrap();
        assert_eq!(change.previous_url, "");
    }
}
