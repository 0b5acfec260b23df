//! Activity detection
//!
//! Decides whether an entry may be touched while another process (the sync client)
//! could be working on it. The checks are heuristic and lean towards skipping:
//! symlinks, hidden names, temp-file signatures, recent modification times, and for
//! directories any of those anywhere in the subtree.

use crate::policy::SanitizePolicy;
use crate::types::PathEntry;
use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

/// Reason an entry is left alone
#[derive(Debug, Clone, PartialEq)]
pub enum Activity {
	/// Symlinks are never followed or renamed
	Symlink,

	/// Name starts with a dot
	Hidden,

	/// Name matches a temp-file signature
	TempFile,

	/// Modified within the grace period (or in the future)
	RecentlyModified,

	/// Entry disappeared between listing and check
	Vanished,

	/// Entry could not be inspected
	Unreadable { message: String },

	/// Something beneath a directory looks active
	ActiveDescendant { path: PathBuf, cause: Box<Activity> },
}

impl fmt::Display for Activity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Activity::Symlink => write!(f, "symlink"),
			Activity::Hidden => write!(f, "hidden entry"),
			Activity::TempFile => write!(f, "temp-file signature"),
			Activity::RecentlyModified => write!(f, "modified within grace period"),
			Activity::Vanished => write!(f, "vanished"),
			Activity::Unreadable { message } => write!(f, "unreadable: {}", message),
			Activity::ActiveDescendant { path, cause } => {
				write!(f, "active descendant {} ({})", path.display(), cause)
			}
		}
	}
}

/// Activity checks bound to one policy
pub struct ActivityDetector<'a> {
	policy: &'a SanitizePolicy,
}

impl<'a> ActivityDetector<'a> {
	pub fn new(policy: &'a SanitizePolicy) -> Self {
		ActivityDetector { policy }
	}

	/// True when the entry must be skipped
	pub fn is_unsafe(&self, entry: &PathEntry, now: SystemTime) -> bool {
		self.assess(entry, now).is_some()
	}

	/// Full assessment of an entry, including the subtree scan for directories
	///
	/// Takes a fresh lstat; the entry's listing-time metadata is not trusted.
	pub fn assess(&self, entry: &PathEntry, now: SystemTime) -> Option<Activity> {
		let meta = match fs::symlink_metadata(&entry.path) {
			Ok(m) => m,
			Err(e) => return Some(stat_failure(e)),
		};

		if meta.file_type().is_symlink() {
			return Some(Activity::Symlink);
		}
		if let Some(activity) = self.assess_name(entry.name()) {
			return Some(activity);
		}
		if self.is_recent(meta.modified().ok(), now) {
			return Some(Activity::RecentlyModified);
		}
		if meta.is_dir() {
			return self.scan_subtree(&entry.path, now);
		}
		None
	}

	/// Re-check a directory that was already assessed before its children were processed
	///
	/// Only existence and type are verified: renaming children bumps the directory's
	/// own mtime, so timestamps are meaningless at this point.
	pub fn confirm_settled(&self, entry: &PathEntry) -> Option<Activity> {
		match fs::symlink_metadata(&entry.path) {
			Ok(meta) if meta.file_type().is_symlink() => Some(Activity::Symlink),
			Ok(_) => None,
			Err(e) => Some(stat_failure(e)),
		}
	}

	/// Name-only checks: hidden entries and temp-file signatures
	pub fn assess_name(&self, name: &OsStr) -> Option<Activity> {
		let name = name.to_string_lossy();
		if name.starts_with('.') {
			return Some(Activity::Hidden);
		}
		if self.policy.temp_signatures.matches(&name) {
			return Some(Activity::TempFile);
		}
		None
	}

	/// Modification inside the grace window; a future timestamp counts as recent
	pub fn is_recent(&self, modified: Option<SystemTime>, now: SystemTime) -> bool {
		match modified {
			Some(mtime) => match now.duration_since(mtime) {
				Ok(age) => age < self.policy.grace,
				Err(_) => true,
			},
			None => false,
		}
	}

	/// Depth-first scan that stops at the first sign of activity
	pub fn scan_subtree(&self, dir: &Path, now: SystemTime) -> Option<Activity> {
		let mut pending = vec![dir.to_path_buf()];

		while let Some(current) = pending.pop() {
			let entries = match fs::read_dir(&current) {
				Ok(e) => e,
				Err(e) => {
					return Some(descendant(&current, Activity::Unreadable { message: e.to_string() }))
				}
			};

			for entry_result in entries {
				let entry = match entry_result {
					Ok(e) => e,
					Err(e) => {
						return Some(descendant(
							&current,
							Activity::Unreadable { message: e.to_string() },
						))
					}
				};

				let path = entry.path();
				if self.policy.temp_signatures.matches(&entry.file_name().to_string_lossy()) {
					return Some(descendant(&path, Activity::TempFile));
				}

				let meta = match fs::symlink_metadata(&path) {
					Ok(m) => m,
					Err(e) => return Some(descendant(&path, stat_failure(e))),
				};
				if self.is_recent(meta.modified().ok(), now) {
					return Some(descendant(&path, Activity::RecentlyModified));
				}
				if meta.is_dir() {
					pending.push(path);
				}
			}
		}

		None
	}
}

fn descendant(path: &Path, cause: Activity) -> Activity {
	debug!("Activity below directory at {}: {}", path.display(), cause);
	Activity::ActiveDescendant { path: path.to_path_buf(), cause: Box::new(cause) }
}

fn stat_failure(e: io::Error) -> Activity {
	if e.kind() == io::ErrorKind::NotFound {
		Activity::Vanished
	} else {
		Activity::Unreadable { message: e.to_string() }
	}
}


// vim: ts=4
