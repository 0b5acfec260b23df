//! Error types for sanisync operations

use std::error::Error;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Fatal errors: any of these aborts the run before or instead of traversal
#[derive(Debug)]
pub enum SanitizeError {
	/// The scan root does not exist
	RootNotFound { path: PathBuf },

	/// The scan root exists but is not a directory
	RootNotDirectory { path: PathBuf },

	/// Invalid configuration
	InvalidConfig { message: String },

	/// Policy construction failed
	Policy(PolicyError),

	/// I/O error outside of per-entry processing
	Io(io::Error),

	/// Operation aborted by user
	Aborted,
}

impl fmt::Display for SanitizeError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SanitizeError::RootNotFound { path } => {
				write!(f, "Root path does not exist: {}", path.display())
			}
			SanitizeError::RootNotDirectory { path } => {
				write!(f, "Root path is not a directory: {}", path.display())
			}
			SanitizeError::InvalidConfig { message } => {
				write!(f, "Invalid configuration: {}", message)
			}
			SanitizeError::Policy(e) => write!(f, "Policy error: {}", e),
			SanitizeError::Io(e) => write!(f, "I/O error: {}", e),
			SanitizeError::Aborted => write!(f, "Aborted by user"),
		}
	}
}

impl Error for SanitizeError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			SanitizeError::Policy(e) => Some(e),
			SanitizeError::Io(e) => Some(e),
			_ => None,
		}
	}
}

impl From<io::Error> for SanitizeError {
	fn from(e: io::Error) -> Self {
		SanitizeError::Io(e)
	}
}

impl From<PolicyError> for SanitizeError {
	fn from(e: PolicyError) -> Self {
		SanitizeError::Policy(e)
	}
}

/// Per-entry errors; recorded in the traversal result, never fatal
#[derive(Debug)]
pub enum EntryError {
	/// Entry disappeared between enumeration and stat/rename
	Vanished { path: PathBuf },

	/// The filesystem rejected the rename
	RenameFailed { from: PathBuf, to: PathBuf, source: io::Error },
}

impl EntryError {
	/// The entry the error is about
	pub fn path(&self) -> &Path {
		match self {
			EntryError::Vanished { path } => path,
			EntryError::RenameFailed { from, .. } => from,
		}
	}
}

impl fmt::Display for EntryError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			EntryError::Vanished { path } => {
				write!(f, "Entry vanished: {}", path.display())
			}
			EntryError::RenameFailed { from, to, source } => {
				write!(f, "Failed to rename {} -> {}: {}", from.display(), to.display(), source)
			}
		}
	}
}

impl Error for EntryError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			EntryError::RenameFailed { source, .. } => Some(source),
			EntryError::Vanished { .. } => None,
		}
	}
}

/// Errors raised while building a sanitize policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
	/// A temp-file signature failed to compile
	InvalidPattern(String),

	/// A numeric limit is out of range
	InvalidLimit(String),
}

impl fmt::Display for PolicyError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			PolicyError::InvalidPattern(msg) => write!(f, "Invalid temp-file pattern: {}", msg),
			PolicyError::InvalidLimit(msg) => write!(f, "Invalid limit: {}", msg),
		}
	}
}

impl Error for PolicyError {}

/// Notification delivery failure; callers log and move on
#[derive(Debug)]
pub enum NotifyError {
	/// The notification program could not be started
	SpawnFailed { program: String, source: io::Error },

	/// The notification program ran but reported failure
	Rejected { program: String, code: Option<i32> },
}

impl fmt::Display for NotifyError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			NotifyError::SpawnFailed { program, source } => {
				write!(f, "Failed to spawn '{}': {}", program, source)
			}
			NotifyError::Rejected { program, code: Some(code) } => {
				write!(f, "'{}' exited with status {}", program, code)
			}
			NotifyError::Rejected { program, code: None } => {
				write!(f, "'{}' was terminated by a signal", program)
			}
		}
	}
}

impl Error for NotifyError {}


// vim: ts=4
