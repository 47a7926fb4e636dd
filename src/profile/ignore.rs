use regex::Regex;

use crate::error::{BerthError, Result};

/// A profile's ignore patterns, compiled once and matched many times
/// against scope-relative paths (always `/`-separated).
#[derive(Debug)]
pub struct IgnoreSet {
	patterns: Vec<Regex>,
}

impl IgnoreSet {
	/// Compile every pattern, failing on the first invalid one.
	pub fn compile(patterns: &[String]) -> Result<Self> {
		let patterns = patterns
			.iter()
			.map(|p| compile_pattern(p))
			.collect::<Result<Vec<_>>>()?;
		Ok(IgnoreSet { patterns })
	}

	/// True when any pattern matches the scope-relative path.
	pub fn matches(&self, relative: &str) -> bool {
		self.patterns.iter().any(|p| p.is_match(relative))
	}

	pub fn is_empty(&self) -> bool {
		self.patterns.is_empty()
	}
}

fn compile_pattern(pattern: &str) -> Result<Regex> {
	Regex::new(pattern).map_err(|source| BerthError::InvalidIgnorePattern {
		pattern: pattern.to_string(),
		source,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	fn set(patterns: &[&str]) -> IgnoreSet {
		let owned: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
		IgnoreSet::compile(&owned).unwrap()
	}

	#[test]
	fn test_empty_set_matches_nothing() {
		let ignore = set(&[]);
		assert!(ignore.is_empty());
		assert!(!ignore.matches("src/main.rs"));
	}

	#[test]
	fn test_matches_any_pattern() {
		let ignore = set(&[r"\.git", r"node_modules"]);
		assert!(ignore.matches(".git/HEAD"));
		assert!(ignore.matches("web/node_modules/react/index.js"));
		assert!(!ignore.matches("src/lib.rs"));
	}

	#[test]
	fn test_anchored_pattern_respects_position() {
		let ignore = set(&[r"^target/"]);
		assert!(ignore.matches("target/debug/app"));
		assert!(!ignore.matches("crates/sub/target/debug/app"));
	}

	#[test]
	fn test_invalid_pattern_reports_which_one() {
		let patterns = vec![r"\.git".to_string(), "[unclosed".to_string()];
		match IgnoreSet::compile(&patterns) {
			Err(BerthError::InvalidIgnorePattern { pattern, .. }) => {
				assert_eq!(pattern, "[unclosed");
			}
			other => panic!("expected InvalidIgnorePattern, got {other:?}"),
		}
	}
}
