//! Scope resolution for berth.
//!
//! This module handles:
//! - Path normalization into comparable segment keys
//! - The prefix trie mapping scopes to stored values
//! - The profile registry built on top of both

pub mod path;
pub mod registry;
pub mod trie;

pub use path::PathKey;
pub use registry::ProfileRegistry;
pub use trie::PathTrie;
