use serde_json::Value;
use std::path::Path;

use crate::error::{BerthError, Result};
use crate::profile::types::RawProfile;

/// Parse and validate a profile file from the given path.
///
/// A file holds one profile object or an array of them (sibling scopes
/// declared together); either form yields a vector here.
pub fn parse_profile_file(path: &Path) -> Result<Vec<RawProfile>> {
	let content = std::fs::read_to_string(path).map_err(|source| BerthError::ProfileRead {
		path: path.to_path_buf(),
		source,
	})?;

	parse_profile_str(&content, path)
}

/// Parse profiles from a string (useful for testing).
pub fn parse_profile_str(content: &str, path: &Path) -> Result<Vec<RawProfile>> {
	let parse_err = |source| BerthError::ProfileParse {
		path: path.to_path_buf(),
		source,
	};

	let value: Value = serde_json::from_str(content).map_err(parse_err)?;
	let raws: Vec<RawProfile> = match value {
		Value::Array(entries) => entries
			.into_iter()
			.map(serde_json::from_value)
			.collect::<std::result::Result<_, _>>()
			.map_err(parse_err)?,
		single => vec![serde_json::from_value(single).map_err(parse_err)?],
	};

	for raw in &raws {
		raw.validate()?;
	}
	Ok(raws)
}
