//! Core data types shared by the walker, detector and renamer

use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryKind {
	File,
	Directory,
	Symlink,
}

impl EntryKind {
	/// Classify lstat metadata; symlinks are never followed
	pub fn from_metadata(meta: &fs::Metadata) -> Self {
		let ft = meta.file_type();
		if ft.is_symlink() {
			EntryKind::Symlink
		} else if ft.is_dir() {
			EntryKind::Directory
		} else {
			// Sockets, fifos and devices get file rules
			EntryKind::File
		}
	}

	pub fn noun(self) -> &'static str {
		match self {
			EntryKind::File => "file",
			EntryKind::Directory => "folder",
			EntryKind::Symlink => "symlink",
		}
	}
}

/// A filesystem object observed during a walk
///
/// `modified` reflects the moment the entry was listed; it is not refreshed.
#[derive(Clone, PartialEq, Debug)]
pub struct PathEntry {
	/// Full path, rooted at the walk root
	pub path: PathBuf,

	/// Path relative to the walk root
	pub relative: PathBuf,

	pub kind: EntryKind,

	pub modified: Option<SystemTime>,
}

impl PathEntry {
	/// Build an entry from a path by taking a fresh lstat
	pub fn observe(root: &Path, path: PathBuf) -> std::io::Result<Self> {
		let meta = fs::symlink_metadata(&path)?;
		Ok(Self::from_metadata(root, path, &meta))
	}

	pub fn from_metadata(root: &Path, path: PathBuf, meta: &fs::Metadata) -> Self {
		let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
		PathEntry {
			path,
			relative,
			kind: EntryKind::from_metadata(meta),
			modified: meta.modified().ok(),
		}
	}

	/// Ordered path segments from the root down to this entry
	pub fn segments(&self) -> Vec<String> {
		self.relative.iter().map(|s| s.to_string_lossy().into_owned()).collect()
	}

	/// Leaf name, empty for the root itself
	pub fn name(&self) -> &OsStr {
		self.path.file_name().unwrap_or_default()
	}

	pub fn is_dir(&self) -> bool {
		self.kind == EntryKind::Directory
	}
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenameAction {
	/// Record the intent only
	Dry,
	/// Mutate the filesystem
	Apply,
}

/// Decision for one entry, consumed immediately by the renamer
#[derive(Clone, PartialEq, Debug)]
pub struct RenamePlan {
	pub source: PathEntry,

	/// Sanitizer output before collision resolution
	pub proposed_name: String,

	/// Unique name actually used
	pub final_name: String,

	pub action: RenameAction,
}

impl RenamePlan {
	pub fn target(&self) -> PathBuf {
		match self.source.path.parent() {
			Some(parent) => parent.join(&self.final_name),
			None => PathBuf::from(&self.final_name),
		}
	}
}

/// One rename that was performed (or planned, in dry-run mode)
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct RenameRecord {
	pub from: PathBuf,
	pub to: PathBuf,
	pub kind: EntryKind,
}

/// One entry that could not be renamed
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct RenameFailure {
	pub path: PathBuf,
	pub reason: String,
}

/// Aggregate outcome of one traversal
#[derive(Clone, Default, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraversalResult {
	/// Renames performed, or planned in dry-run mode
	pub renamed: usize,

	pub renames: Vec<RenameRecord>,

	/// Entries left alone because they looked active
	pub skipped: usize,

	pub failures: Vec<RenameFailure>,

	pub dry_run: bool,
}

impl TraversalResult {
	pub fn is_clean(&self) -> bool {
		self.failures.is_empty()
	}

	pub(crate) fn record_rename(&mut self, plan: &RenamePlan) {
		self.renamed += 1;
		self.renames.push(RenameRecord {
			from: plan.source.path.clone(),
			to: plan.target(),
			kind: plan.source.kind,
		});
	}

	pub(crate) fn record_failure(&mut self, path: &Path, reason: impl ToString) {
		self.failures.push(RenameFailure { path: path.to_path_buf(), reason: reason.to_string() });
	}
}
