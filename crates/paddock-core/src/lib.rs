//! Paddock Core Library
//!
//! This crate provides shared types, errors, and configuration for Paddock.

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{PaddockError, PaddockResult};
