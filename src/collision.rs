//! Collision resolution for generated names
//!
//! A sanitized name may already be taken by a sibling, or by another sibling that
//! sanitized to the same name earlier in the pass. [`SiblingNames`] keeps the
//! per-directory picture for one pass; [`resolve`] picks the first free
//! `name_N` / `base_N.ext` variant.

use crate::sanitize::{char_len, take_chars};
use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Return `proposed` if free, otherwise the first free numbered variant
///
/// The suffix goes before the last dot (`a.txt` -> `a_1.txt`, `a` -> `a_1`).
/// The base is shortened when the suffix would push the name past `max_len`; when
/// the extension leaves no room for any base, the whole name is cut and suffixed.
pub fn resolve<F>(proposed: &str, max_len: usize, is_taken: F) -> String
where
	F: Fn(&str) -> bool,
{
	if !is_taken(proposed) {
		return proposed.to_string();
	}

	let (base, ext) = match proposed.rfind('.') {
		Some(idx) => (&proposed[..idx], Some(&proposed[idx + 1..])),
		None => (proposed, None),
	};

	let mut counter: u64 = 1;
	loop {
		let candidate = numbered(proposed, base, ext, counter, max_len);
		if !is_taken(&candidate) {
			return candidate;
		}
		counter += 1;
	}
}

/// Resolve against a plain set of sibling names
pub fn resolve_in(existing: &HashSet<String>, proposed: &str, max_len: usize) -> String {
	resolve(proposed, max_len, |name| existing.contains(name))
}

fn numbered(proposed: &str, base: &str, ext: Option<&str>, counter: u64, max_len: usize) -> String {
	let suffix = format!("_{}", counter);
	let tail_len = char_len(&suffix) + ext.map(|e| char_len(e) + 1).unwrap_or(0);
	if tail_len >= max_len {
		let keep = max_len.saturating_sub(char_len(&suffix));
		return format!("{}{}", take_chars(proposed, keep), suffix);
	}
	let base = if char_len(base) + tail_len > max_len {
		take_chars(base, max_len.saturating_sub(tail_len))
	} else {
		base
	};
	match ext {
		Some(ext) => format!("{}{}.{}", base, suffix, ext),
		None => format!("{}{}", base, suffix),
	}
}

/// Names in one directory for the duration of a pass
///
/// Starts from a listing snapshot; renames performed (or planned) through it move
/// a name from "old" to "new", so later siblings see the names already handed out.
/// Names are kept raw, so a non-UTF-8 name never shadows its own lossy rendering.
#[derive(Debug, Clone)]
pub struct SiblingNames {
	dir: PathBuf,
	names: HashSet<OsString>,
}

impl SiblingNames {
	/// Snapshot the current listing of `dir`
	pub fn snapshot(dir: &Path) -> io::Result<Self> {
		let mut names = HashSet::new();
		for entry in fs::read_dir(dir)? {
			let entry = entry?;
			names.insert(entry.file_name());
		}
		Ok(SiblingNames { dir: dir.to_path_buf(), names })
	}

	pub fn from_names<I, S>(dir: &Path, names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<OsString>,
	{
		SiblingNames { dir: dir.to_path_buf(), names: names.into_iter().map(Into::into).collect() }
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	pub fn contains(&self, name: impl AsRef<OsStr>) -> bool {
		self.names.contains(name.as_ref())
	}

	/// Pick a unique name for `proposed` without reserving it
	pub fn resolve(&self, proposed: &str, max_len: usize) -> String {
		resolve(proposed, max_len, |name| self.contains(name))
	}

	/// Record that `old` became `new`
	pub fn claim(&mut self, old: impl AsRef<OsStr>, new: &str) {
		self.names.remove(old.as_ref());
		self.names.insert(OsString::from(new));
	}
}


// vim: ts=4
