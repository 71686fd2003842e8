//! Common utilities for the framedom crates.
//!
//! This crate provides shared infrastructure used by the host and the adapter:
//! - **Warning System** - deduplicated warnings for degraded environments

pub mod warning;
