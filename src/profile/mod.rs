//! Sync profiles: the on-disk schema, validation, and file loading.
//!
//! This module handles:
//! - The `.berth.json` profile schema with its defaults table
//! - Field-level validation, run once at load time
//! - Ignore-pattern compilation
//! - Discovery and loading of profile files into a registry

pub mod ignore;
pub mod loader;
pub mod parser;
pub mod types;

pub use ignore::IgnoreSet;
pub use types::{HostInfo, RawProfile, SyncProfile};
