//! Guest-side interceptor scripts and their payload composer
//!
//! The modules under `js/` run inside the guest's JavaScript realm.
//! The composer inlines an immutable policy snapshot as injected
//! globals, substitutes the current hostname into each module, and
//! returns the modules in install order. Each module self-guards with
//! a document-lifetime marker, so injecting a module twice into one
//! document is a no-op.

use paddock_core::types::PolicySnapshot;

/// Same-document enforcement: click/submit capture and `window.open`
const NAVIGATION_GUARD_JS: &str = include_str!("../js/navigation_guard.js");
/// `pushState`/`replaceState` wrappers plus `popstate`/`hashchange`
const HISTORY_GUARD_JS: &str = include_str!("../js/history_guard.js");
/// Strict-mode `location.href` setter guard
const LOCATION_GUARD_JS: &str = include_str!("../js/location_guard.js");
/// Background/foreground media pause and resume
const MEDIA_CONTROL_JS: &str = include_str!("../js/media_control.js");
/// Pane focus state tracking
const PANE_STATE_JS: &str = include_str!("../js/pane_state.js");

/// Token replaced with the pane's real hostname before injection
pub const CURRENT_DOMAIN_PLACEHOLDER: &str = "CURRENT_DOMAIN_PLACEHOLDER";

/// One independently-injected script. A module that throws during
/// install must not prevent the modules after it from running, so the
/// host evaluates each one separately.
#[derive(Debug, Clone)]
pub struct ScriptModule {
    pub name: &'static str,
    pub source: String,
}

/// Everything the composer needs to build a payload for one pane load.
#[derive(Debug, Clone)]
pub struct InjectionContext<'a> {
    /// Hostname of the document the payload is injected into
    pub hostname: &'a str,
    /// Injection-time policy snapshot for the pane's site key
    pub policy: &'a PolicySnapshot,
    /// Optional site-specific custom script, appended last
    pub custom_script: Option<&'a str>,
}

/// Injected globals the guest modules read: the internal-navigation
/// flag and the whitelist snapshot.
fn policy_globals(policy: &PolicySnapshot) -> String {
    let whitelist_json =
        serde_json::to_string(&policy.whitelist).unwrap_or_else(|_| "[]".to_string());
    format!(
        "window.allowInternalNavigation = {}; window.whitelistedUrls = {};",
        policy.allow_internal_navigation.unwrap_or(true),
        whitelist_json
    )
}

fn substitute_domain(source: &str, hostname: &str) -> String {
    source.replace(CURRENT_DOMAIN_PLACEHOLDER, hostname)
}

/// Compose the full payload for one load-finish, in install order:
/// policy globals, navigation guard, history guard, location guard
/// (restricted mode only), media controller, pane state, then any
/// site-specific custom script.
pub fn compose_payload(ctx: &InjectionContext<'_>) -> Vec<ScriptModule> {
    let mut modules = vec![
        ScriptModule {
            name: "policy-globals",
            source: policy_globals(ctx.policy),
        },
        ScriptModule {
            name: "navigation-guard",
            source: substitute_domain(NAVIGATION_GUARD_JS, ctx.hostname),
        },
        ScriptModule {
            name: "history-guard",
            source: substitute_domain(HISTORY_GUARD_JS, ctx.hostname),
        },
    ];

    // The location override is footprint-heavy; only install it when
    // internal navigation is actually restricted.
    if ctx.policy.internal_restricted() {
        modules.push(ScriptModule {
            name: "location-guard",
            source: substitute_domain(LOCATION_GUARD_JS, ctx.hostname),
        });
    }

    modules.push(ScriptModule {
        name: "media-control",
        source: MEDIA_CONTROL_JS.to_string(),
    });
    modules.push(ScriptModule {
        name: "pane-state",
        source: PANE_STATE_JS.to_string(),
    });

    if let Some(custom) = ctx.custom_script {
        modules.push(ScriptModule {
            name: "site-custom",
            source: substitute_domain(custom, ctx.hostname),
        });
    }

    log::debug!(
        "Composed {} guest modules for {}",
        modules.len(),
        ctx.hostname
    );
    modules
}

#[cfg(test)]
mod tests {
    use super::*;

    fn restricted_policy() -> PolicySnapshot {
        PolicySnapshot {
            allow_internal_navigation: Some(false),
            allow_external_navigation: None,
            url_logging: None,
            whitelist: vec!["https://a.com/ok".to_string()],
        }
    }

    #[test]
    fn test_module_order_restricted() {
        let policy = restricted_policy();
        let ctx = InjectionContext {
            hostname: "a.com",
            policy: &policy,
            custom_script: Some("console.log('site');"),
        };
        let names: Vec<&str> = compose_payload(&ctx).iter().map(|m| m.name).collect();
        assert_eq!(
            names,
            vec![
                "policy-globals",
                "navigation-guard",
                "history-guard",
                "location-guard",
                "media-control",
                "pane-state",
                "site-custom"
            ]
        );
    }

    #[test]
    fn test_location_guard_omitted_when_unrestricted() {
        let policy = PolicySnapshot::default();
        let ctx = InjectionContext {
            hostname: "a.com",
            policy: &policy,
            custom_script: None,
        };
        let names: Vec<&str> = compose_payload(&ctx).iter().map(|m| m.name).collect();
        assert!(!names.contains(&"location-guard"));
    }

    #[test]
    fn test_policy_globals_inline_snapshot() {
        let policy = restricted_policy();
        let globals = policy_globals(&policy);
        assert!(globals.contains("window.allowInternalNavigation = false;"));
        assert!(globals.contains("window.whitelistedUrls = [\"https://a.com/ok\"];"));
    }

    #[test]
    fn test_policy_globals_default_to_allowed() {
        let globals = policy_globals(&PolicySnapshot::default());
        assert!(globals.contains("window.allowInternalNavigation = true;"));
        assert!(globals.contains("window.whitelistedUrls = [];"));
    }

    #[test]
    fn test_domain_placeholder_substituted() {
        let policy = restricted_policy();
        let ctx = InjectionContext {
            hostname: "mail.example.com",
            policy: &policy,
            custom_script: None,
        };
        for module in compose_payload(&ctx) {
            assert!(
                !module.source.contains(CURRENT_DOMAIN_PLACEHOLDER),
                "module {} still carries the placeholder",
                module.name
            );
        }
    }

    #[test]
    fn test_every_guard_module_is_install_once() {
        // Each guest module no-ops when its marker is already set, so a
        // second injection pass within one document cannot double-install.
        for (name, source) in [
            ("navigation-guard", NAVIGATION_GUARD_JS),
            ("history-guard", HISTORY_GUARD_JS),
            ("location-guard", LOCATION_GUARD_JS),
            ("media-control", MEDIA_CONTROL_JS),
            ("pane-state", PANE_STATE_JS),
        ] {
            assert!(
                source.contains("Installed) { return; }"),
                "module {} is missing its idempotency marker",
                name
            );
        }
    }

    #[test]
    fn test_wire_prefixes_present_in_navigation_guard() {
        assert!(NAVIGATION_GUARD_JS.contains("'URL_CHANGE:'"));
        assert!(NAVIGATION_GUARD_JS.contains("'internal-navigation-blocked: '"));
    }
}
