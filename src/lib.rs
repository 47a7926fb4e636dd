//! Berth - resolves which remote sync profile governs a workspace path.
//!
//! This library provides the core functionality for berth, including:
//! - Path normalization into comparable segment keys
//! - A prefix trie answering longest-matching-prefix scope queries
//! - The `.berth.json` profile schema, validation, and file loading
//! - Sealing and unsealing of profile passwords
//!
//! # Example
//!
//! ```no_run
//! use berth_cli::profile::loader::load_enclosing;
//! use berth_cli::scope::ProfileRegistry;
//! use std::path::Path;
//!
//! let cwd = std::env::current_dir().unwrap();
//! let mut registry = ProfileRegistry::new(&cwd).unwrap();
//! load_enclosing(&mut registry, &cwd).unwrap();
//!
//! let profile = registry.resolve(Path::new("/work/app/src/main.rs")).unwrap();
//! println!("{}@{}:{}", profile.username, profile.host, profile.port);
//! ```

pub mod error;
pub mod profile;
pub mod scope;
pub mod secret;

pub use error::{BerthError, Result};
