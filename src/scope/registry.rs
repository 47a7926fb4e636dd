use std::path::Path;
use tracing::debug;

use crate::error::{BerthError, Result};
use crate::profile::types::{HostInfo, RawProfile, SyncProfile};
use crate::scope::path::{PathKey, has_drive_prefix};
use crate::scope::trie::PathTrie;
use crate::secret;

/// Maps workspace directories to the sync profile governing them.
///
/// One registry is built per workspace: populated once during load, read
/// thereafter. Profiles are stored with their passwords still sealed;
/// [`ProfileRegistry::resolve`] unseals into the returned copy, so the
/// stored record never holds plaintext and repeated resolves of the same
/// scope are idempotent.
#[derive(Debug)]
pub struct ProfileRegistry {
	base: PathKey,
	trie: PathTrie<SyncProfile>,
	keyphrase: String,
}

impl ProfileRegistry {
	/// A registry rooted at `base`, unsealing with the built-in keyphrase.
	pub fn new(base: &Path) -> Result<Self> {
		Self::with_keyphrase(base, secret::DEFAULT_KEYPHRASE)
	}

	/// A registry rooted at `base` with an explicit unsealing keyphrase.
	pub fn with_keyphrase(base: &Path, keyphrase: &str) -> Result<Self> {
		Ok(ProfileRegistry {
			base: PathKey::parse(&base.to_string_lossy())?,
			trie: PathTrie::new(),
			keyphrase: keyphrase.to_string(),
		})
	}

	/// The normalized key for `path`, resolving relative paths against the
	/// registry's base.
	pub fn normalize(&self, path: &Path) -> Result<PathKey> {
		let raw = path.to_string_lossy();
		if raw.starts_with('/') || has_drive_prefix(&raw) {
			PathKey::parse(&raw)
		} else {
			PathKey::parse(&format!("{}/{}", self.base, raw))
		}
	}

	/// Merge `raw` over the defaults and store it at `context`. Returns
	/// the merged snapshot. Re-registering a context replaces its profile
	/// without adding a scope.
	///
	/// Assumes `raw` was already validated by the loader.
	pub fn register(&mut self, context: &Path, raw: RawProfile) -> Result<SyncProfile> {
		let key = self.normalize(context)?;
		let profile = SyncProfile::from_raw(raw, key.clone());
		debug!(context = %key, host = %profile.host, "registered sync scope");
		self.trie.insert(&key, profile.clone());
		Ok(profile)
	}

	/// The profile governing `activity`: the one registered at its deepest
	/// registered ancestor (or at the path itself). The returned copy is
	/// unsealed.
	pub fn resolve(&self, activity: &Path) -> Result<SyncProfile> {
		let key = self.normalize(activity)?;
		let (_, profile) = self
			.trie
			.longest_prefix(&key)
			.ok_or_else(|| BerthError::ProfileNotFound {
				path: activity.to_path_buf(),
			})?;
		self.unseal(profile)
	}

	/// Connection parameters for the profile governing `activity`.
	pub fn host_info(&self, activity: &Path) -> Result<HostInfo> {
		Ok(self.resolve(activity)?.host_info())
	}

	/// Every registered profile, in stable traversal order. Passwords stay
	/// sealed; this is an enumeration surface, not a connection one.
	pub fn list_all(&self) -> impl Iterator<Item = &SyncProfile> {
		self.trie.values()
	}

	/// Registered profiles with no registered ancestor scope: the minimal
	/// set of top-level scopes covering everything registered.
	pub fn distinct_scopes(&self) -> impl Iterator<Item = &SyncProfile> {
		self.trie.shallowest_values()
	}

	/// Number of registered scopes.
	pub fn len(&self) -> usize {
		self.trie.len()
	}

	pub fn is_empty(&self) -> bool {
		self.trie.is_empty()
	}

	/// Copy `profile`, decrypting a sealed password into the copy and
	/// clearing its flag. The stored record keeps its ciphertext.
	fn unseal(&self, profile: &SyncProfile) -> Result<SyncProfile> {
		let mut copy = profile.clone();
		if copy.is_encrypted
			&& let Some(sealed) = copy.password.take()
		{
			copy.password = Some(secret::decrypt(&sealed, &self.keyphrase)?);
			copy.is_encrypted = false;
		}
		Ok(copy)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::profile::types::{Protocol, SyncMode};
	use std::path::PathBuf;

	fn raw(host: &str) -> RawProfile {
		RawProfile {
			host: Some(host.to_string()),
			username: Some("deploy".to_string()),
			remote_path: Some("/srv".to_string()),
			..Default::default()
		}
	}

	fn registry() -> ProfileRegistry {
		ProfileRegistry::new(Path::new("/work")).unwrap()
	}

	#[test]
	fn test_resolve_picks_deepest_registered_ancestor() {
		let mut reg = registry();
		reg.register(Path::new("/a"), raw("a")).unwrap();
		reg.register(Path::new("/a/b"), raw("ab")).unwrap();
		reg.register(Path::new("/a/b/c/d"), raw("abcd")).unwrap();

		let profile = reg.resolve(Path::new("/a/b/c")).unwrap();
		assert_eq!(profile.host, "ab");
	}

	#[test]
	fn test_resolve_without_enclosing_scope_fails() {
		let mut reg = registry();
		reg.register(Path::new("/a"), raw("a")).unwrap();

		let err = reg.resolve(Path::new("/z")).unwrap_err();
		assert!(matches!(
			err,
			BerthError::ProfileNotFound { path } if path == PathBuf::from("/z")
		));
	}

	#[test]
	fn test_reregistration_replaces_without_duplicating() {
		let mut reg = registry();
		reg.register(Path::new("/a"), raw("first")).unwrap();
		reg.register(Path::new("/a"), raw("second")).unwrap();

		assert_eq!(reg.len(), 1);
		assert_eq!(reg.resolve(Path::new("/a/file")).unwrap().host, "second");
		assert_eq!(reg.list_all().count(), 1);
	}

	#[test]
	fn test_register_resolves_relative_context_against_base() {
		let mut reg = registry();
		reg.register(Path::new("sub"), raw("h")).unwrap();

		assert_eq!(reg.resolve(Path::new("/work/sub/f")).unwrap().host, "h");
		assert_eq!(reg.resolve(Path::new("sub/f")).unwrap().host, "h");
		assert!(reg.resolve(Path::new("/work/other")).is_err());
	}

	#[test]
	fn test_register_returns_merged_snapshot() {
		let mut reg = registry();
		let merged = reg.register(Path::new("/a"), raw("h")).unwrap();

		assert_eq!(merged.protocol, Protocol::Sftp);
		assert_eq!(merged.port, 22);
		assert_eq!(merged.sync_mode, SyncMode::Update);
		assert_eq!(merged.concurrency, 512);
		assert_eq!(merged.context.to_string(), "/a");
	}

	#[test]
	fn test_distinct_scopes_suppresses_nested_registrations() {
		let mut reg = registry();
		reg.register(Path::new("/a"), raw("a")).unwrap();
		reg.register(Path::new("/a/b"), raw("ab")).unwrap();
		reg.register(Path::new("/x"), raw("x")).unwrap();

		let distinct: Vec<&str> = reg.distinct_scopes().map(|p| p.host.as_str()).collect();
		assert_eq!(distinct, ["a", "x"]);

		let all: Vec<&str> = reg.list_all().map(|p| p.host.as_str()).collect();
		assert_eq!(all, ["a", "ab", "x"]);
	}

	#[test]
	fn test_drive_letter_case_folds_between_register_and_resolve() {
		let mut reg = registry();
		reg.register(Path::new("C:\\Work"), raw("win")).unwrap();

		let profile = reg.resolve(Path::new("c:\\Work\\file.txt")).unwrap();
		assert_eq!(profile.host, "win");
	}

	#[test]
	fn test_resolve_unseals_password_idempotently() {
		let sealed = secret::encrypt("hunter2", "key");
		let mut reg = ProfileRegistry::with_keyphrase(Path::new("/work"), "key").unwrap();
		reg.register(
			Path::new("/a"),
			RawProfile {
				password: Some(sealed.clone()),
				is_encrypted: Some(true),
				..raw("h")
			},
		)
		.unwrap();

		let first = reg.resolve(Path::new("/a/f")).unwrap();
		let second = reg.resolve(Path::new("/a/f")).unwrap();
		assert_eq!(first.password.as_deref(), Some("hunter2"));
		assert_eq!(first.password, second.password);
		assert!(!first.is_encrypted);

		// The stored record keeps its ciphertext.
		let stored = reg.list_all().next().unwrap();
		assert!(stored.is_encrypted);
		assert_eq!(stored.password.as_deref(), Some(sealed.as_str()));
	}

	#[test]
	fn test_resolve_with_wrong_keyphrase_fails_loudly() {
		let sealed = secret::encrypt("hunter2", "right");
		let mut reg = ProfileRegistry::with_keyphrase(Path::new("/work"), "wrong").unwrap();
		reg.register(
			Path::new("/a"),
			RawProfile {
				password: Some(sealed),
				is_encrypted: Some(true),
				..raw("h")
			},
		)
		.unwrap();

		// Wrong key material either fails padding or yields non-UTF-8.
		match reg.resolve(Path::new("/a/f")) {
			Err(BerthError::SecretDecrypt | BerthError::SecretPlaintext { .. }) => {}
			Ok(profile) => assert_ne!(profile.password.as_deref(), Some("hunter2")),
			Err(other) => panic!("unexpected error: {other:?}"),
		}
	}

	#[test]
	fn test_unsealed_profile_without_password_passes_through() {
		let mut reg = registry();
		reg.register(Path::new("/a"), raw("h")).unwrap();

		let profile = reg.resolve(Path::new("/a/f")).unwrap();
		assert!(profile.password.is_none());
		assert!(!profile.is_encrypted);
	}

	#[test]
	fn test_host_info_projection_is_unsealed() {
		let sealed = secret::encrypt("hunter2", "key");
		let mut reg = ProfileRegistry::with_keyphrase(Path::new("/work"), "key").unwrap();
		reg.register(
			Path::new("/a"),
			RawProfile {
				password: Some(sealed),
				is_encrypted: Some(true),
				..raw("example.com")
			},
		)
		.unwrap();

		let info = reg.host_info(Path::new("/a/f")).unwrap();
		assert_eq!(info.host, "example.com");
		assert_eq!(info.password.as_deref(), Some("hunter2"));
	}

	#[test]
	fn test_registry_base_at_drive_root() {
		let mut reg = ProfileRegistry::new(Path::new("c:\\")).unwrap();
		reg.register(Path::new("Work"), raw("h")).unwrap();

		assert_eq!(reg.resolve(Path::new("C:/Work/sub/f")).unwrap().host, "h");
	}
}
