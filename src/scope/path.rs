use crate::error::{BerthError, Result};
use std::fmt;

/// Separator family a key was parsed from. Drives `Display` output only;
/// key equality never considers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PathStyle {
	Posix,
	Windows,
}

/// An absolute filesystem path normalized into an ordered segment sequence.
///
/// Segments compare by exact string equality. The one normalization beyond
/// `.`/`..` folding is the drive specifier of a Windows-style path, which is
/// lower-cased because drive letters are case-insensitive while directory
/// names are not. Windows-style inputs are recognized by their leading
/// `letter:` prefix rather than by the host platform, so the same inputs
/// parse the same way everywhere.
///
/// The root path (`/` or a bare drive) has an empty segment sequence on
/// POSIX and a single drive segment on Windows.
#[derive(Debug, Clone)]
pub struct PathKey {
	segments: Vec<String>,
	style: PathStyle,
}

impl PathKey {
	/// Parse an absolute path into its normalized segment form.
	///
	/// Fails on empty input, relative paths, and drive-relative paths
	/// (`c:foo`), none of which can be resolved without outside context.
	pub fn parse(raw: &str) -> Result<Self> {
		if raw.is_empty() {
			return Err(BerthError::InvalidPath {
				path: raw.to_string(),
			});
		}

		if has_drive_prefix(raw) {
			let drive = format!("{}:", raw[..1].to_ascii_lowercase());
			let rest = &raw[2..];
			if !rest.is_empty() && !rest.starts_with(['/', '\\']) {
				// Drive-relative: meaningful only against a per-drive cwd.
				return Err(BerthError::InvalidPath {
					path: raw.to_string(),
				});
			}

			let mut segments = vec![drive];
			for part in rest.split(['/', '\\']) {
				push_segment(&mut segments, part, 1);
			}
			Ok(PathKey {
				segments,
				style: PathStyle::Windows,
			})
		} else if raw.starts_with('/') {
			let mut segments = Vec::new();
			for part in raw.split('/') {
				push_segment(&mut segments, part, 0);
			}
			Ok(PathKey {
				segments,
				style: PathStyle::Posix,
			})
		} else {
			Err(BerthError::InvalidPath {
				path: raw.to_string(),
			})
		}
	}

	/// The normalized segments, root-first.
	pub fn segments(&self) -> &[String] {
		&self.segments
	}

	/// True for a key with no segments below the filesystem root.
	pub fn is_root(&self) -> bool {
		self.segments.is_empty()
	}

	/// The ancestor formed by the first `depth` segments of `self`, clamped
	/// to the key's own depth. Depth zero is the filesystem root.
	pub fn ancestor(&self, depth: usize) -> PathKey {
		let depth = depth.min(self.segments.len());
		PathKey {
			segments: self.segments[..depth].to_vec(),
			style: if depth == 0 { PathStyle::Posix } else { self.style },
		}
	}

	/// The segments of `self` below `base`, or `None` when `base` is not
	/// `self` or one of its ancestors.
	pub fn strip_prefix<'a>(&'a self, base: &PathKey) -> Option<&'a [String]> {
		if self.segments.len() < base.segments.len() {
			return None;
		}
		let (head, tail) = self.segments.split_at(base.segments.len());
		(head == base.segments.as_slice()).then_some(tail)
	}
}

/// Keys are equal iff their segment sequences are equal.
impl PartialEq for PathKey {
	fn eq(&self, other: &Self) -> bool {
		self.segments == other.segments
	}
}

impl Eq for PathKey {}

/// Serializes as the canonical `Display` string.
impl serde::Serialize for PathKey {
	fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

impl fmt::Display for PathKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.style {
			PathStyle::Posix => {
				if self.segments.is_empty() {
					return f.write_str("/");
				}
				for seg in &self.segments {
					write!(f, "/{seg}")?;
				}
				Ok(())
			}
			PathStyle::Windows => {
				// A lone drive segment still needs its separator to stay
				// an absolute path ("c:\" rather than drive-relative "c:").
				if self.segments.len() == 1 {
					write!(f, "{}\\", self.segments[0])
				} else {
					f.write_str(&self.segments.join("\\"))
				}
			}
		}
	}
}

/// True when `raw` opens with a `letter:` drive specifier.
pub fn has_drive_prefix(raw: &str) -> bool {
	let bytes = raw.as_bytes();
	bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Append one raw segment, folding `.` and `..` as it goes. `floor` is the
/// number of leading segments `..` may never pop (the drive specifier).
fn push_segment(segments: &mut Vec<String>, part: &str, floor: usize) {
	match part {
		"" | "." => {}
		".." => {
			if segments.len() > floor {
				segments.pop();
			}
		}
		other => segments.push(other.to_string()),
	}
}
