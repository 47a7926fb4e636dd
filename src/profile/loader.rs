//! Discovery and loading of `.berth.json` profile files.
//!
//! Loading is the only place profiles touch the filesystem; the registry
//! itself is a pure in-memory structure populated from here.

use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{BerthError, Result};
use crate::profile::parser::parse_profile_file;
use crate::profile::types::SyncProfile;
use crate::scope::path::has_drive_prefix;
use crate::scope::registry::ProfileRegistry;
use crate::secret;

/// File name a profile file must carry, placed in the directory whose
/// subtree it governs.
pub const PROFILE_FILE_NAME: &str = ".berth.json";

/// Starter content written by `berth init`. Carries only the required
/// fields, pre-filled with their documented defaults.
const STARTER_PROFILE: &str = r#"{
    "protocol": "sftp",
    "host": "host",
    "username": "username",
    "remotePath": "./"
}
"#;

/// The profile file path for a directory.
pub fn profile_path(dir: &Path) -> PathBuf {
	dir.join(PROFILE_FILE_NAME)
}

/// The user-level fallback profile path, `~/.berth.json`.
pub fn user_profile_path() -> Result<PathBuf> {
	let home = dirs::home_dir().ok_or(BerthError::HomeDirectoryNotFound)?;
	Ok(home.join(PROFILE_FILE_NAME))
}

/// Every profile file on the walk from `start_dir` up to the filesystem
/// root, nearest first. Purely a directory walk; nothing is parsed.
pub fn discover_profile_files(start_dir: &Path) -> Vec<PathBuf> {
	let mut files = Vec::new();
	let mut current = start_dir.to_path_buf();

	loop {
		let candidate = profile_path(&current);
		if candidate.is_file() {
			files.push(candidate);
		}
		match current.parent() {
			Some(parent) => current = parent.to_path_buf(),
			None => break,
		}
	}

	files
}

/// Parse `path` and register every entry it declares.
///
/// Each entry's scope is its `context` resolved against the file's own
/// directory; entries without one govern that directory itself.
pub fn load_profile_file(
	registry: &mut ProfileRegistry,
	path: &Path,
) -> Result<Vec<SyncProfile>> {
	let raws = parse_profile_file(path)?;
	let file_dir = path.parent().unwrap_or(Path::new("/")).to_path_buf();

	let mut loaded = Vec::with_capacity(raws.len());
	for raw in raws {
		let context = match raw.context.as_deref() {
			Some(c) if c.starts_with('/') || has_drive_prefix(c) => PathBuf::from(c),
			Some(c) => file_dir.join(c),
			None => file_dir.clone(),
		};
		loaded.push(registry.register(&context, raw)?);
	}

	debug!(path = %path.display(), entries = loaded.len(), "loaded profile file");
	Ok(loaded)
}

/// Load `base/.berth.json` into the registry if it exists. A missing file
/// is not an error; the registry just stays empty.
pub fn init_registry(registry: &mut ProfileRegistry, base: &Path) -> Result<Vec<SyncProfile>> {
	let path = profile_path(base);
	if path.is_file() {
		load_profile_file(registry, &path)
	} else {
		Ok(Vec::new())
	}
}

/// Populate the registry with every profile file enclosing `start_dir`,
/// plus the user-level fallback. Returns the files loaded, nearest first.
///
/// Files are registered farthest first so that when two files declare the
/// same context, the nearest file's entry wins under last-write-wins.
pub fn load_enclosing(registry: &mut ProfileRegistry, start_dir: &Path) -> Result<Vec<PathBuf>> {
	let mut files = discover_profile_files(start_dir);

	if let Ok(user_path) = user_profile_path()
		&& user_path.is_file()
		&& !files.contains(&user_path)
	{
		files.push(user_path);
	}

	for path in files.iter().rev() {
		load_profile_file(registry, path)?;
	}
	Ok(files)
}

/// The starter profile file content.
pub fn starter_profile() -> &'static str {
	STARTER_PROFILE
}

/// Write a starter profile file at `path`.
pub fn write_starter_profile(path: &Path) -> Result<()> {
	std::fs::write(path, STARTER_PROFILE).map_err(|source| BerthError::ProfileWrite {
		path: path.to_path_buf(),
		source,
	})
}

/// Seal every unsealed password in the profile file at `path`, in place.
///
/// Entries already flagged `isEncrypted` and entries without a password
/// are left untouched. Returns how many passwords were sealed.
pub fn seal_profile_file(path: &Path, keyphrase: &str) -> Result<usize> {
	let content = std::fs::read_to_string(path).map_err(|source| BerthError::ProfileRead {
		path: path.to_path_buf(),
		source,
	})?;
	let mut value: Value =
		serde_json::from_str(&content).map_err(|source| BerthError::ProfileParse {
			path: path.to_path_buf(),
			source,
		})?;

	let mut sealed = 0;
	match &mut value {
		Value::Array(entries) => {
			for entry in entries {
				sealed += seal_entry(entry, keyphrase);
			}
		}
		single => sealed += seal_entry(single, keyphrase),
	}

	if sealed > 0 {
		let output = format!("{:#}\n", value);
		std::fs::write(path, output).map_err(|source| BerthError::ProfileWrite {
			path: path.to_path_buf(),
			source,
		})?;
	}

	Ok(sealed)
}

fn seal_entry(entry: &mut Value, keyphrase: &str) -> usize {
	let Some(object) = entry.as_object_mut() else {
		return 0;
	};
	if object.get("isEncrypted").and_then(Value::as_bool) == Some(true) {
		return 0;
	}
	let Some(plaintext) = object.get("password").and_then(Value::as_str) else {
		return 0;
	};

	let ciphertext = secret::encrypt(plaintext, keyphrase);
	object.insert("password".to_string(), Value::String(ciphertext));
	object.insert("isEncrypted".to_string(), Value::Bool(true));
	1
}
