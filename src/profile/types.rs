use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{BerthError, Result};
use crate::profile::ignore::IgnoreSet;
use crate::scope::path::PathKey;

/// Transfer protocol for a sync scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
	Sftp,
	Ftp,
	Local,
}

impl Protocol {
	pub fn as_str(&self) -> &'static str {
		match self {
			Protocol::Sftp => "sftp",
			Protocol::Ftp => "ftp",
			Protocol::Local => "local",
		}
	}
}

impl fmt::Display for Protocol {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// How uploads reconcile the remote tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
	/// Transfer only files that differ.
	Update,
	/// Mirror the whole tree, deleting remote extras.
	Full,
}

impl SyncMode {
	pub fn as_str(&self) -> &'static str {
		match self {
			SyncMode::Update => "update",
			SyncMode::Full => "full",
		}
	}
}

/// FTPS negotiation. The on-disk value is a boolean or one of the two
/// explicit mode strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Secure {
	Flag(bool),
	Mode(SecureMode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecureMode {
	Control,
	Implicit,
}

/// Private-key passphrase: a literal string, or `true` to prompt for one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Passphrase {
	Prompt(bool),
	Key(String),
}

/// Watcher file selector: a glob string, or `false` for none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WatcherFiles {
	Disabled(bool),
	Pattern(String),
}

/// Watcher sub-options as written in a profile file. Every field is
/// optional; merging fills the gaps from [`Watcher`] defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawWatcher {
	pub files: Option<WatcherFiles>,
	pub auto_upload: Option<bool>,
	pub auto_delete: Option<bool>,
}

/// Merged watcher settings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Watcher {
	pub files: WatcherFiles,
	pub auto_upload: bool,
	pub auto_delete: bool,
}

impl Default for Watcher {
	fn default() -> Self {
		Watcher {
			files: WatcherFiles::Disabled(false),
			auto_upload: false,
			auto_delete: false,
		}
	}
}

/// One profile entry as written in a `.berth.json` file.
///
/// Every field is optional at the type level; [`RawProfile::validate`]
/// enforces which ones a file must actually carry. Unknown fields are
/// rejected so a typo in an option name fails at parse time instead of
/// silently falling back to the default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawProfile {
	pub name: Option<String>,
	/// Directory this entry governs; relative values resolve against the
	/// profile file's own directory. Defaults to that directory itself.
	pub context: Option<String>,
	pub protocol: Option<Protocol>,
	pub host: Option<String>,
	pub port: Option<u16>,
	pub username: Option<String>,
	pub password: Option<String>,
	pub connect_timeout: Option<u64>,
	pub agent: Option<String>,
	pub private_key_path: Option<String>,
	pub passphrase: Option<Passphrase>,
	pub interactive_auth: Option<bool>,
	pub algorithms: Option<serde_json::Value>,
	pub secure: Option<Secure>,
	pub secure_options: Option<serde_json::Value>,
	pub passive: Option<bool>,
	pub remote_path: Option<String>,
	pub upload_on_save: Option<bool>,
	pub download_on_open: Option<bool>,
	pub sync_mode: Option<SyncMode>,
	pub ignore: Option<Vec<String>>,
	pub watcher: Option<RawWatcher>,
	pub concurrency: Option<u32>,
	pub is_encrypted: Option<bool>,
}

impl RawProfile {
	/// Field-level validation, run once at load time. The registry never
	/// re-validates; it only merges and stores.
	pub fn validate(&self) -> Result<()> {
		require_non_empty("host", self.host.as_deref())?;
		require_non_empty("username", self.username.as_deref())?;
		require_non_empty("remotePath", self.remote_path.as_deref())?;

		if self.port == Some(0) {
			return Err(BerthError::InvalidProfile {
				field: "port",
				reason: "must be at least 1",
			});
		}
		if self.connect_timeout == Some(0) {
			return Err(BerthError::InvalidProfile {
				field: "connectTimeout",
				reason: "must be at least 1",
			});
		}
		if self.concurrency == Some(0) {
			return Err(BerthError::InvalidProfile {
				field: "concurrency",
				reason: "must be at least 1",
			});
		}
		if self.passphrase == Some(Passphrase::Prompt(false)) {
			return Err(BerthError::InvalidProfile {
				field: "passphrase",
				reason: "must be a string or true",
			});
		}
		if let Some(watcher) = &self.watcher
			&& watcher.files == Some(WatcherFiles::Disabled(true))
		{
			return Err(BerthError::InvalidProfile {
				field: "watcher.files",
				reason: "must be a glob string or false",
			});
		}
		if self.is_encrypted == Some(true) && self.password.is_none() {
			return Err(BerthError::InvalidProfile {
				field: "isEncrypted",
				reason: "requires a password to unseal",
			});
		}
		if let Some(patterns) = &self.ignore {
			// Compile now so a bad pattern fails at load, not at match time.
			IgnoreSet::compile(patterns)?;
		}
		Ok(())
	}
}

fn require_non_empty(field: &'static str, value: Option<&str>) -> Result<()> {
	match value {
		None => Err(BerthError::InvalidProfile {
			field,
			reason: "is required",
		}),
		Some("") => Err(BerthError::InvalidProfile {
			field,
			reason: "must not be empty",
		}),
		Some(_) => Ok(()),
	}
}

/// A profile merged over the full defaults table, pinned to the scope it
/// governs. Immutable once registered; `resolve` hands out copies.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncProfile {
	pub context: PathKey,
	pub name: Option<String>,
	pub protocol: Protocol,
	pub host: String,
	pub port: u16,
	pub username: String,
	pub password: Option<String>,
	pub connect_timeout: u64,
	pub agent: Option<String>,
	pub private_key_path: Option<String>,
	pub passphrase: Option<Passphrase>,
	pub interactive_auth: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub algorithms: Option<serde_json::Value>,
	pub secure: Secure,
	pub secure_options: Option<serde_json::Value>,
	pub passive: bool,
	pub remote_path: String,
	pub upload_on_save: bool,
	pub download_on_open: bool,
	pub sync_mode: SyncMode,
	pub ignore: Vec<String>,
	pub watcher: Watcher,
	pub concurrency: u32,
	pub is_encrypted: bool,
}

impl SyncProfile {
	/// Merge `raw` over the documented defaults. Field-wise, including the
	/// watcher sub-options, so a partial `watcher` object keeps the
	/// defaults for the sub-options it leaves out.
	pub fn from_raw(raw: RawProfile, context: PathKey) -> SyncProfile {
		let watcher = raw.watcher.unwrap_or_default();
		SyncProfile {
			context,
			name: raw.name,
			protocol: raw.protocol.unwrap_or(Protocol::Sftp),
			host: raw.host.unwrap_or_else(|| "host".to_string()),
			port: raw.port.unwrap_or(22),
			username: raw.username.unwrap_or_else(|| "username".to_string()),
			password: raw.password,
			connect_timeout: raw.connect_timeout.unwrap_or(10_000),
			agent: raw.agent,
			private_key_path: raw.private_key_path,
			passphrase: raw.passphrase,
			interactive_auth: raw.interactive_auth.unwrap_or(false),
			algorithms: raw.algorithms,
			secure: raw.secure.unwrap_or(Secure::Flag(false)),
			secure_options: raw.secure_options,
			passive: raw.passive.unwrap_or(false),
			remote_path: raw.remote_path.unwrap_or_else(|| "./".to_string()),
			upload_on_save: raw.upload_on_save.unwrap_or(false),
			download_on_open: raw.download_on_open.unwrap_or(false),
			sync_mode: raw.sync_mode.unwrap_or(SyncMode::Update),
			ignore: raw.ignore.unwrap_or_default(),
			watcher: Watcher {
				files: watcher.files.unwrap_or(WatcherFiles::Disabled(false)),
				auto_upload: watcher.auto_upload.unwrap_or(false),
				auto_delete: watcher.auto_delete.unwrap_or(false),
			},
			concurrency: raw.concurrency.unwrap_or(512),
			is_encrypted: raw.is_encrypted.unwrap_or(false),
		}
	}

	/// Compile this profile's ignore patterns.
	pub fn ignore_set(&self) -> Result<IgnoreSet> {
		IgnoreSet::compile(&self.ignore)
	}

	/// Map a scope-relative path onto the remote tree. Remote paths always
	/// use `/` separators regardless of the local path style.
	pub fn remote_of(&self, relative: &[String]) -> String {
		let mut remote = self.remote_path.trim_end_matches('/').to_string();
		if remote.is_empty() {
			remote.push('/');
		}
		for segment in relative {
			if !remote.ends_with('/') {
				remote.push('/');
			}
			remote.push_str(segment);
		}
		remote
	}

	/// The connection subset handed to transfer collaborators.
	pub fn host_info(&self) -> HostInfo {
		HostInfo {
			protocol: self.protocol,
			host: self.host.clone(),
			port: self.port,
			username: self.username.clone(),
			password: self.password.clone(),
			connect_timeout: self.connect_timeout,
			agent: self.agent.clone(),
			private_key_path: self.private_key_path.clone(),
			passphrase: self.passphrase.clone(),
			interactive_auth: self.interactive_auth,
			algorithms: self.algorithms.clone(),
			secure: self.secure,
			secure_options: self.secure_options.clone(),
			passive: self.passive,
		}
	}
}

/// Connection parameters projected out of a resolved profile.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostInfo {
	pub protocol: Protocol,
	pub host: String,
	pub port: u16,
	pub username: String,
	pub password: Option<String>,
	pub connect_timeout: u64,
	// sftp
	pub agent: Option<String>,
	pub private_key_path: Option<String>,
	pub passphrase: Option<Passphrase>,
	pub interactive_auth: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub algorithms: Option<serde_json::Value>,
	// ftp
	pub secure: Secure,
	pub secure_options: Option<serde_json::Value>,
	pub passive: bool,
}
