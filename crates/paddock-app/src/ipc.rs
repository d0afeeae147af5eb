//! IPC with the chrome webview
//!
//! The chrome UI sends commands over the webview IPC channel; the host
//! answers by evaluating small scripts against the chrome document.

use paddock_core::types::BlockedNavigation;
use serde::{Deserialize, Serialize};

/// IPC message from the chrome UI to the host
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum IpcMessage {
    /// Bring a site's pane to the foreground
    ActivatePane {
        key: String,
    },

    /// Whitelist editing (settings surface)
    AddWhitelistEntry {
        key: String,
        url: String,
    },
    RemoveWhitelistEntry {
        key: String,
        url: String,
    },

    Log {
        level: String,
        message: String,
    },
}

/// Pane descriptor for the chrome pane strip
#[derive(Debug, Clone, Serialize)]
pub struct PaneInfo {
    pub key: String,
    pub title: String,
    pub is_active: bool,
}

/// Script delivering a blocked-navigation notice to the chrome UI as a
/// `navigation-blocked` CustomEvent.
pub fn blocked_notice_script(notice: &BlockedNavigation) -> String {
    let payload = serde_json::to_string(notice).unwrap_or_else(|_| "{}".to_string());
    format!(
        "window.dispatchEvent(new CustomEvent('navigation-blocked', {{ detail: {} }}));",
        payload
    )
}

/// Script refreshing the chrome pane strip.
pub fn sync_panes_script(panes: &[PaneInfo]) -> String {
    let payload = serde_json::to_string(panes).unwrap_or_else(|_| "[]".to_string());
    format!(
        "if (window.paddockChrome) {{ paddockChrome.setPanes({}); }}",
        payload
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_activate_pane() {
        let msg: IpcMessage = serde_json::from_str(r#"{"cmd":"activate_pane","key":"mail"}"#).unwrap();
        match msg {
            IpcMessage::ActivatePane { key } => assert_eq!(key, "mail"),
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_parse_whitelist_edit() {
        let msg: IpcMessage = serde_json::from_str(
            r#"{"cmd":"add_whitelist_entry","key":"k1","url":"https://a.com/ok"}"#,
        )
        .unwrap();
        match msg {
            IpcMessage::AddWhitelistEntry { key, url } => {
                assert_eq!(key, "k1");
                assert_eq!(url, "https://a.com/ok");
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_blocked_notice_script_is_single_event() {
        let notice = BlockedNavigation {
            blocked_url: "https://a.com/other".to_string(),
            current_domain: "a.com".to_string(),
            target_domain: "a.com".to_string(),
        };
        let script = blocked_notice_script(&notice);
        assert!(script.contains("navigation-blocked"));
        assert!(script.contains("\"blockedUrl\":\"https://a.com/other\""));
    }

    #[test]
    fn test_sync_panes_script_embeds_json() {
        let panes = vec![PaneInfo {
            key: "mail".to_string(),
            title: "Mail".to_string(),
            is_active: true,
        }];
        let script = sync_panes_script(&panes);
        assert!(script.contains("paddockChrome.setPanes"));
        assert!(script.contains("\"is_active\":true"));
    }
}
