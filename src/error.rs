use std::path::PathBuf;

/// Library-level structured errors for berth.
///
/// Use `thiserror` for structured errors that library consumers can match on.
/// The CLI binary wraps these with `anyhow` for rich context chains.
#[derive(Debug, thiserror::Error)]
pub enum BerthError {
	#[error("Cannot normalize path: {path:?}")]
	InvalidPath { path: String },

	#[error("No sync profile registered for any ancestor of: {path}")]
	ProfileNotFound { path: PathBuf },

	#[error("Failed to read profile file: {path}")]
	ProfileRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse profile file: {path}")]
	ProfileParse {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("Failed to write profile file: {path}")]
	ProfileWrite {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Invalid profile: {field} {reason}")]
	InvalidProfile {
		field: &'static str,
		reason: &'static str,
	},

	#[error("Invalid ignore pattern: {pattern}")]
	InvalidIgnorePattern {
		pattern: String,
		#[source]
		source: regex::Error,
	},

	#[error("Failed to decode sealed secret as base64")]
	SecretDecode {
		#[source]
		source: base64::DecodeError,
	},

	#[error("Failed to unseal secret: wrong keyphrase or corrupt ciphertext")]
	SecretDecrypt,

	#[error("Unsealed secret is not valid UTF-8")]
	SecretPlaintext {
		#[source]
		source: std::string::FromUtf8Error,
	},

	#[error("Failed to resolve home directory")]
	HomeDirectoryNotFound,
}

/// Result type alias using BerthError.
pub type Result<T> = std::result::Result<T, BerthError>;
