//! Host-side navigation governor
//!
//! Authoritative allow/block decision for navigations that cross
//! documents or escape the DOM event model, plus orchestration of
//! guest-script (re)injection and the single funnel into the history
//! log. The guest-side interceptor owns same-document enforcement; the
//! two layers share the policy data model but no code.

use crate::channel::{self, ChannelMessage};
use crate::state::AppState;
use paddock_core::types::{BlockedNavigation, NavigationKind, PaneId, PolicySnapshot};
use paddock_inject::{compose_payload, InjectionContext, ScriptModule};
use paddock_policy::same_origin;
use url::Url;

/// Outcome of a host-level navigation check.
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationDecision {
    Allow,
    Block(BlockedNavigation),
}

impl NavigationDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, NavigationDecision::Allow)
    }
}

/// Decide a cross-document navigation attempt (full navigations and
/// OS-level `window.open`).
///
/// Same-origin navigation is always allowed here: the whitelist model
/// targets cross-boundary risk, and same-document policy belongs to
/// the guest layer. Cross-origin navigation consults the pane's policy
/// (unset defaults to allowed for a mapped pane) or, for unmapped
/// panes, the app-level default (unset means blocked).
pub fn decide_navigation(
    state: &AppState,
    pane_id: PaneId,
    target: &str,
    kind: NavigationKind,
) -> NavigationDecision {
    let target_url = match Url::parse(target) {
        Ok(parsed) => parsed,
        Err(err) => {
            // Not a web navigation the policy model covers
            tracing::debug!(
                "Allowing unparsable {:?} target {}: {}",
                kind,
                target,
                err
            );
            return NavigationDecision::Allow;
        }
    };

    let binding = state.binding(pane_id);
    let current_url = binding
        .and_then(|b| b.current_url.as_deref())
        .and_then(|raw| Url::parse(raw).ok());

    // Bootstrap load: nothing to compare against yet
    let Some(current_url) = current_url else {
        return NavigationDecision::Allow;
    };

    if same_origin(&current_url, &target_url) {
        return NavigationDecision::Allow;
    }

    let allowed = match state.policy_for_pane(pane_id) {
        Some(policy) => policy.external_allowed(),
        // Unmapped panes fall back to the global default; unset is
        // fail-closed for the cross-boundary case.
        None => state.config.allow_external_navigation == Some(true),
    };

    if allowed {
        NavigationDecision::Allow
    } else {
        tracing::info!(
            "Vetoed {:?} navigation for pane {:?}: {}",
            kind,
            pane_id,
            target
        );
        NavigationDecision::Block(BlockedNavigation {
            blocked_url: target.to_string(),
            current_domain: current_url.host_str().unwrap_or_default().to_string(),
            target_domain: target_url.host_str().unwrap_or_default().to_string(),
        })
    }
}

/// React to a finished load: resolve/reaffirm the pane's identity,
/// commit the URL, feed the history gate, and return the guest modules
/// to inject. The caller evaluates each module independently so one
/// failing module cannot disable the rest.
pub fn on_load_finished(state: &mut AppState, pane_id: PaneId, url: &str) -> Vec<ScriptModule> {
    state.resolve_identity(pane_id, url);

    if let Some(binding) = state.binding_mut(pane_id) {
        binding.current_url = Some(url.to_string());
    }

    record_committed(state, pane_id, url);
    compose_payload_for(state, pane_id)
}

/// The single place where navigation completion (not attempt) is
/// recorded. No-op unless the pane is mapped and its policy opted into
/// logging; a logging failure never rolls back the navigation.
pub fn record_committed(state: &mut AppState, pane_id: PaneId, url: &str) {
    if !url.starts_with("http") {
        return;
    }
    let Some(binding) = state.binding(pane_id) else {
        return;
    };
    let Some(key) = binding.site_key.clone() else {
        return;
    };
    if !state.policy.snapshot(&key).logging_enabled() {
        return;
    }

    let title = binding.last_title.clone();
    if let Err(err) = state.history.log_visit(&key, url, title.as_deref()) {
        tracing::warn!("Failed to record visit for {}: {}", key, err);
    }
}

/// Compose the injection payload for a pane from its current identity
/// and policy snapshot. Unmapped panes get the default policy and no
/// site-specific scripts.
pub fn compose_payload_for(state: &AppState, pane_id: PaneId) -> Vec<ScriptModule> {
    let binding = state.binding(pane_id);
    let hostname = binding
        .and_then(|b| b.current_url.as_deref())
        .and_then(|raw| Url::parse(raw).ok())
        .and_then(|parsed| parsed.host_str().map(|h| h.to_string()))
        .unwrap_or_default();

    let (policy, custom_script) = match binding.and_then(|b| b.site_key.as_deref()) {
        Some(key) => (state.policy.snapshot(key), state.custom_script_for(key)),
        None => (PolicySnapshot::default(), None),
    };

    compose_payload(&InjectionContext {
        hostname: &hostname,
        policy: &policy,
        custom_script: custom_script.as_deref(),
    })
}

/// Handle one side-channel line from a pane. URL changes update the
/// pane's committed URL and feed the history gate; guest vetoes are
/// returned so the caller can notify the UI.
pub fn handle_channel_message(
    state: &mut AppState,
    pane_id: PaneId,
    line: &str,
) -> Option<BlockedNavigation> {
    match channel::parse_line(line)? {
        ChannelMessage::UrlChange(change) => {
            tracing::debug!("Pane {:?} moved to {}", pane_id, change.url);
            if let Some(binding) = state.binding_mut(pane_id) {
                binding.current_url = Some(change.url.clone());
            }
            record_committed(state, pane_id, &change.url);
            None
        }
        ChannelMessage::NavigationBlocked(notice) => Some(notice),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paddock_core::AppConfig;

    fn state_with(
        sites_json: &str,
        global_external: Option<bool>,
    ) -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            data_dir: dir.path().to_path_buf(),
            allow_external_navigation: global_external,
            ..AppConfig::default()
        };
        std::fs::create_dir_all(&config.data_dir).unwrap();
        std::fs::write(config.sites_path(), sites_json).unwrap();
        let state = AppState::new(config).unwrap();
        (dir, state)
    }

    fn mapped_pane(state: &mut AppState, url: &str) -> PaneId {
        let pane = state.register_pane();
        state.resolve_identity(pane, url);
        if let Some(binding) = state.binding_mut(pane) {
            binding.current_url = Some(url.to_string());
        }
        pane
    }

    #[test]
    fn test_same_origin_always_allowed() {
        let (_dir, mut state) = state_with(
            r#"[{"key":"k1","title":"S","url":"https://a.com","allowExternalNavigation":false}]"#,
            None,
        );
        let pane = mapped_pane(&mut state, "https://a.com/home");
        assert!(decide_navigation(&state, pane, "https://a.com/other", NavigationKind::FullNavigation).is_allowed());
    }

    #[test]
    fn test_cross_origin_default_allowed_for_mapped_pane() {
        let (_dir, mut state) =
            state_with(r#"[{"key":"k1","title":"S","url":"https://a.com"}]"#, None);
        let pane = mapped_pane(&mut state, "https://a.com/home");
        assert!(decide_navigation(&state, pane, "https://b.com/", NavigationKind::FullNavigation).is_allowed());
    }

    #[test]
    fn test_cross_origin_blocked_when_disallowed() {
        let (_dir, mut state) = state_with(
            r#"[{"key":"k1","title":"S","url":"https://a.com","allowExternalNavigation":false}]"#,
            None,
        );
        let pane = mapped_pane(&mut state, "https://a.com/home");
        match decide_navigation(&state, pane, "https://b.com/page", NavigationKind::FullNavigation) {
            NavigationDecision::Block(notice) => {
                assert_eq!(notice.blocked_url, "https://b.com/page");
                assert_eq!(notice.current_domain, "a.com");
                assert_eq!(notice.target_domain, "b.com");
            }
            NavigationDecision::Allow => panic!("expected block"),
        }
    }

    #[test]
    fn test_unmapped_pane_defaults_fail_closed() {
        let (_dir, mut state) = state_with("[]", None);
        let pane = state.register_pane();
        if let Some(binding) = state.binding_mut(pane) {
            binding.current_url = Some("https://unknown.org/".to_string());
        }
        match decide_navigation(&state, pane, "https://b.com/page", NavigationKind::FullNavigation) {
            NavigationDecision::Block(notice) => {
                assert_eq!(notice.target_domain, "b.com");
            }
            NavigationDecision::Allow => panic!("expected fail-closed block"),
        }
    }

    #[test]
    fn test_unmapped_pane_with_global_allow() {
        let (_dir, mut state) = state_with("[]", Some(true));
        let pane = state.register_pane();
        if let Some(binding) = state.binding_mut(pane) {
            binding.current_url = Some("https://unknown.org/".to_string());
        }
        assert!(decide_navigation(&state, pane, "https://b.com/", NavigationKind::FullNavigation).is_allowed());
    }

    #[test]
    fn test_bootstrap_load_allowed() {
        let (_dir, mut state) = state_with("[]", None);
        let pane = state.register_pane();
        assert!(decide_navigation(&state, pane, "https://a.com/", NavigationKind::FullNavigation).is_allowed());
    }

    #[test]
    fn test_unparsable_target_allowed() {
        let (_dir, mut state) = state_with("[]", None);
        let pane = state.register_pane();
        if let Some(binding) = state.binding_mut(pane) {
            binding.current_url = Some("https://a.com/".to_string());
        }
        assert!(decide_navigation(&state, pane, "not a url", NavigationKind::Link).is_allowed());
    }

    #[test]
    fn test_load_finished_resolves_identity_and_logs() {
        let (_dir, mut state) = state_with(
            r#"[{"key":"k2","title":"S","url":"https://b.com","urlLogging":true}]"#,
            None,
        );
        let pane = state.register_pane();
        let modules = on_load_finished(&mut state, pane, "https://b.com/page1");
        assert!(!modules.is_empty());
        assert_eq!(
            state.binding(pane).unwrap().site_key.as_deref(),
            Some("k2")
        );
        assert_eq!(state.history.entries("k2").len(), 1);

        // A reload of the same URL never duplicates the entry
        on_load_finished(&mut state, pane, "https://b.com/page1");
        assert_eq!(state.history.entries("k2").len(), 1);
    }

    #[test]
    fn test_logging_disabled_skips_history() {
        let (_dir, mut state) =
            state_with(r#"[{"key":"k2","title":"S","url":"https://b.com"}]"#, None);
        let pane = state.register_pane();
        on_load_finished(&mut state, pane, "https://b.com/page1");
        assert!(state.history.entries("k2").is_empty());
    }

    #[test]
    fn test_channel_url_change_commits_and_logs() {
        let (_dir, mut state) = state_with(
            r#"[{"key":"k2","title":"S","url":"https://b.com","urlLogging":true}]"#,
            None,
        );
        let pane = state.register_pane();
        on_load_finished(&mut state, pane, "https://b.com/");

        let line = r#"URL_CHANGE:{"url":"https://b.com/spa","previousUrl":"https://b.com/","currentDomain":"b.com"}"#;
        assert!(handle_channel_message(&mut state, pane, line).is_none());
        assert_eq!(
            state.binding(pane).unwrap().current_url.as_deref(),
            Some("https://b.com/spa")
        );
        let entries = state.history.entries("k2");
        assert!(entries.iter().any(|e| e.url == "https://b.com/spa"));
    }

    #[test]
    fn test_channel_blocked_notice_is_forwarded() {
        let (_dir, mut state) = state_with("[]", None);
        let pane = state.register_pane();
        let line = r#"internal-navigation-blocked: {"blockedUrl":"https://a.com/x","currentDomain":"a.com","targetDomain":"a.com"}"#;
        let notice = handle_channel_message(&mut state, pane, line).expect("notice");
        assert_eq!(notice.blocked_url, "https://a.com/x");
    }

    #[test]
    fn test_channel_noise_is_dropped() {
        let (_dir, mut state) = state_with("[]", None);
        let pane = state.register_pane();
        assert!(handle_channel_message(&mut state, pane, "random console output").is_none());
    }

    #[test]
    fn test_payload_for_restricted_site_includes_location_guard() {
        let (_dir, mut state) = state_with(
            r#"[{"key":"k1","title":"S","url":"https://a.com","allowInternalNavigation":false}]"#,
            None,
        );
        let pane = state.register_pane();
        let modules = on_load_finished(&mut state, pane, "https://a.com/home");
        let names: Vec<&str> = modules.iter().map(|m| m.name).collect();
        assert!(names.contains(&"location-guard"));
        assert!(names.contains(&"navigation-guard"));
    }
}
