//! Navigation policy for Paddock
//!
//! Holds the per-site policy store (flags + whitelists), the URL
//! matching rules shared by both enforcement layers, and the resolver
//! that maps a pane's hostname to a configured site key.

pub mod identity;
pub mod matcher;
pub mod store;

pub use identity::resolve_site_key;
pub use matcher::{host_matches, same_origin, same_site, whitelist_matches};
pub use store::PolicyStore;
