//! Guest → host side channel
//!
//! Guest modules report through single-line, tag-prefixed messages.
//! The framing is the compatibility surface; the transport is the
//! webview IPC channel. Malformed payloads are dropped here and logged
//! for diagnostics only, never surfaced as errors.

use paddock_core::types::{BlockedNavigation, UrlChange};

/// Prefix for guest-reported URL changes
pub const URL_CHANGE_PREFIX: &str = "URL_CHANGE:";

/// Prefix for guest-side navigation vetoes
pub const BLOCKED_PREFIX: &str = "internal-navigation-blocked: ";

/// A parsed side-channel message.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelMessage {
    UrlChange(UrlChange),
    NavigationBlocked(BlockedNavigation),
}

/// Parse one side-channel line. Lines without a known tag, and tagged
/// lines with malformed JSON, yield `None`.
pub fn parse_line(line: &str) -> Option<ChannelMessage> {
    if let Some(json) = line.strip_prefix(URL_CHANGE_PREFIX) {
        match serde_json::from_str(json) {
            Ok(change) => Some(ChannelMessage::UrlChange(change)),
            Err(err) => {
                tracing::debug!("Dropping malformed URL_CHANGE message: {}", err);
                None
            }
        }
    } else if let Some(json) = line.strip_prefix(BLOCKED_PREFIX) {
        match serde_json::from_str(json) {
            Ok(notice) => Some(ChannelMessage::NavigationBlocked(notice)),
            Err(err) => {
                tracing::debug!("Dropping malformed blocked-navigation message: {}", err);
                None
            }
        }
    } else {
        None
    }
}
