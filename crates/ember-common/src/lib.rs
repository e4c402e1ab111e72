//! # ember-common
//!
//! Common types and configuration for the EmberDB page cache.
//!
//! This crate provides the foundational pieces shared by the storage and
//! server crates:
//!
//! - **Types**: core identifiers (`PageId`, `Lsn`)
//! - **Config**: the page layout (page size -> page count map)
//! - **Constants**: supported page sizes and system-wide limits

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod constants;
pub mod types;

// Re-export commonly used items at the crate root
pub use config::{ConfigError, PageLayout};
pub use types::{Lsn, PageId};
