//! Rename orchestrator
//!
//! Drives the bottom-up walk, gates each entry through the activity detector,
//! sanitizes its name, resolves collisions against the per-directory sibling
//! model, and performs (or records) the rename. Per-entry problems are collected
//! in the [`TraversalResult`]; only a bad root aborts a run.

use crate::activity::{Activity, ActivityDetector};
use crate::collision::SiblingNames;
use crate::error::{EntryError, SanitizeError};
use crate::fs_ops;
use crate::logging::*;
use crate::notify::{rename_summary, Notifier, NullNotifier};
use crate::policy::SanitizePolicy;
use crate::sanitize::sanitized_name;
use crate::types::{PathEntry, RenameAction, RenamePlan, TraversalResult};
use crate::walk::{BottomUpWalk, WalkEvent};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Sanitize every name under `root` with the OneDrive rules
///
/// No notifications are sent; use [`Renamer`] for that.
pub fn run(root: &Path, dry_run: bool, grace_secs: u64) -> Result<TraversalResult, SanitizeError> {
	let policy = SanitizePolicy::builder().grace_secs(grace_secs).build()?;
	Renamer::new(policy).dry_run(dry_run).run(root)
}

/// Configured rename engine
///
/// ```rust,ignore
/// use sanisync::{DesktopNotifier, Renamer, SanitizePolicy};
///
/// let result = Renamer::new(SanitizePolicy::onedrive()?)
///     .dry_run(true)
///     .notifier(Box::new(DesktopNotifier::new()))
///     .run(Path::new("/home/me/OneDrive"))?;
/// println!("{} potential renames", result.renamed);
/// ```
pub struct Renamer {
	policy: SanitizePolicy,
	dry_run: bool,
	notifier: Box<dyn Notifier>,
}

impl Renamer {
	pub fn new(policy: SanitizePolicy) -> Self {
		Renamer { policy, dry_run: false, notifier: Box::new(NullNotifier) }
	}

	/// Plan renames without touching the filesystem or notifying
	pub fn dry_run(mut self, dry_run: bool) -> Self {
		self.dry_run = dry_run;
		self
	}

	pub fn notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
		self.notifier = notifier;
		self
	}

	/// Walk `root` bottom-up and sanitize every name beneath it
	///
	/// The root itself is never renamed.
	pub fn run(&self, root: &Path) -> Result<TraversalResult, SanitizeError> {
		check_root(root)?;
		debug!("Walking {}", root.display());

		let detector = ActivityDetector::new(&self.policy);
		let mut pass = Pass {
			detector: &detector,
			siblings: HashMap::new(),
			result: TraversalResult { dry_run: self.dry_run, ..Default::default() },
		};

		let walk = BottomUpWalk::new(root, |dir: &PathEntry| detector.assess(dir, SystemTime::now()))?;
		for event in walk {
			match event {
				WalkEvent::Entry(entry) => self.process(&mut pass, &entry),
				WalkEvent::Pruned { entry, reason } => {
					debug!("Skipping {} and its contents: {}", entry.path.display(), reason);
					pass.result.skipped += 1;
				}
				WalkEvent::Unreadable { entry, error } => {
					warn!("Cannot read directory {}: {}", entry.path.display(), error);
					pass.result.skipped += 1;
				}
			}
		}

		let result = pass.result;
		info!(
			"Finished {}: {} renames, {} skipped, {} failures",
			root.display(),
			result.renamed,
			result.skipped,
			result.failures.len()
		);
		Ok(result)
	}

	fn process(&self, pass: &mut Pass<'_, '_>, entry: &PathEntry) {
		let activity = if entry.is_dir() {
			// Its children are done; their model is no longer needed
			pass.siblings.remove(&entry.path);
			pass.detector.confirm_settled(entry)
		} else {
			pass.detector.assess(entry, SystemTime::now())
		};
		if let Some(activity) = activity {
			skip(pass, entry, &activity);
			return;
		}

		let proposed = match sanitized_name(entry.name(), entry.kind, &self.policy) {
			Some(name) => name,
			None => return,
		};

		let parent = match entry.path.parent() {
			Some(p) => p.to_path_buf(),
			None => return,
		};
		let siblings = match sibling_model(&mut pass.siblings, parent) {
			Ok(s) => s,
			Err(e) => {
				warn!("Cannot list siblings of {}: {}", entry.path.display(), e);
				pass.result.record_failure(&entry.path, format!("cannot list directory: {}", e));
				return;
			}
		};

		let final_name = siblings.resolve(&proposed, self.policy.max_segment_len);
		let plan = RenamePlan {
			source: entry.clone(),
			proposed_name: proposed,
			final_name,
			action: if self.dry_run { RenameAction::Dry } else { RenameAction::Apply },
		};

		if let Err(e) = self.execute(&plan) {
			record_entry_error(&mut pass.result, e);
			return;
		}

		siblings.claim(entry.name(), &plan.final_name);
		pass.result.record_rename(&plan);
	}

	fn execute(&self, plan: &RenamePlan) -> Result<(), EntryError> {
		let from = &plan.source.path;
		let to = plan.target();
		let noun = plan.source.kind.noun();

		match plan.action {
			RenameAction::Dry => {
				info!("[DRY] Rename {}: {} -> {}", noun, from.display(), to.display());
			}
			RenameAction::Apply => {
				fs_ops::rename_no_replace(from, &to).map_err(|e| {
					if e.kind() == io::ErrorKind::NotFound {
						EntryError::Vanished { path: from.clone() }
					} else {
						EntryError::RenameFailed { from: from.clone(), to: to.clone(), source: e }
					}
				})?;
				info!("Renamed {}: {} -> {}", noun, from.display(), to.display());

				let body = format!("{} -> {}", from.display(), to.display());
				if let Err(e) = self.notifier.notify(&rename_summary(noun), &body) {
					debug!("Notification failed: {}", e);
				}
			}
		}
		Ok(())
	}
}

/// Mutable state of one traversal
struct Pass<'d, 'p> {
	detector: &'d ActivityDetector<'p>,
	siblings: HashMap<PathBuf, SiblingNames>,
	result: TraversalResult,
}

fn skip(pass: &mut Pass<'_, '_>, entry: &PathEntry, activity: &Activity) {
	debug!("Skipping {}: {}", entry.path.display(), activity);
	pass.result.skipped += 1;
}

/// Vanished sources count as skipped; everything else is a failure
fn record_entry_error(result: &mut TraversalResult, error: EntryError) {
	match error {
		EntryError::Vanished { .. } => {
			debug!("Skipping {}: vanished before rename", error.path().display());
			result.skipped += 1;
		}
		EntryError::RenameFailed { .. } => {
			warn!("{}", error);
			let path = error.path().to_path_buf();
			result.record_failure(&path, error);
		}
	}
}

/// Sibling model for `parent`, snapshotted on first use
fn sibling_model(
	models: &mut HashMap<PathBuf, SiblingNames>,
	parent: PathBuf,
) -> io::Result<&mut SiblingNames> {
	match models.entry(parent) {
		Entry::Occupied(o) => Ok(o.into_mut()),
		Entry::Vacant(v) => {
			let snapshot = SiblingNames::snapshot(v.key())?;
			Ok(v.insert(snapshot))
		}
	}
}

fn check_root(root: &Path) -> Result<(), SanitizeError> {
	match fs::metadata(root) {
		Ok(meta) if meta.is_dir() => Ok(()),
		Ok(_) => Err(SanitizeError::RootNotDirectory { path: root.to_path_buf() }),
		Err(e) if e.kind() == io::ErrorKind::NotFound => {
			Err(SanitizeError::RootNotFound { path: root.to_path_buf() })
		}
		Err(e) => Err(SanitizeError::Io(e)),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::NotifyError;
	use filetime::{set_symlink_file_times, FileTime};
	use std::cell::RefCell;
	use std::rc::Rc;
	use std::time::Duration;
	use tempfile::TempDir;

	struct Recorder(Rc<RefCell<Vec<(String, String)>>>);

	impl Notifier for Recorder {
		fn notify(&self, summary: &str, body: &str) -> Result<(), NotifyError> {
			self.0.borrow_mut().push((summary.to_string(), body.to_string()));
			Ok(())
		}
	}

	struct Broken;

	impl Notifier for Broken {
		fn notify(&self, _summary: &str, _body: &str) -> Result<(), NotifyError> {
			Err(NotifyError::Rejected { program: "broken".to_string(), code: Some(1) })
		}
	}

	fn age_all(root: &Path) {
		let old = FileTime::from_system_time(SystemTime::now() - Duration::from_secs(3600));
		let mut pending = vec![root.to_path_buf()];
		while let Some(dir) = pending.pop() {
			for entry in fs::read_dir(&dir).unwrap() {
				let path = entry.unwrap().path();
				set_symlink_file_times(&path, old, old).unwrap();
				if fs::symlink_metadata(&path).unwrap().is_dir() {
					pending.push(path);
				}
			}
		}
	}

	fn renamer() -> Renamer {
		Renamer::new(SanitizePolicy::onedrive().unwrap())
	}

	#[test]
	fn test_missing_root() {
		let tmp = TempDir::new().unwrap();
		let err = renamer().run(&tmp.path().join("missing")).unwrap_err();
		assert!(matches!(err, SanitizeError::RootNotFound { .. }));
	}

	#[test]
	fn test_root_is_file() {
		let tmp = TempDir::new().unwrap();
		let file = tmp.path().join("f");
		fs::write(&file, "").unwrap();
		let err = renamer().run(&file).unwrap_err();
		assert!(matches!(err, SanitizeError::RootNotDirectory { .. }));
	}

	#[test]
	fn test_notifies_each_applied_rename() {
		let tmp = TempDir::new().unwrap();
		fs::create_dir(tmp.path().join("Dir?")).unwrap();
		fs::write(tmp.path().join("Dir?").join("a|b.txt"), "").unwrap();
		age_all(tmp.path());

		let events = Rc::new(RefCell::new(vec![]));
		let result = renamer().notifier(Box::new(Recorder(events.clone()))).run(tmp.path()).unwrap();

		assert_eq!(result.renamed, 2);
		let events = events.borrow();
		assert_eq!(events.len(), 2);
		assert_eq!(events[0].0, "OneDrive: Renamed file");
		assert_eq!(events[1].0, "OneDrive: Renamed folder");
		assert!(events[1].1.ends_with("Dir_"));
	}

	#[test]
	fn test_dry_run_never_notifies() {
		let tmp = TempDir::new().unwrap();
		fs::write(tmp.path().join("a:b"), "").unwrap();
		age_all(tmp.path());

		let events = Rc::new(RefCell::new(vec![]));
		let result = renamer()
			.dry_run(true)
			.notifier(Box::new(Recorder(events.clone())))
			.run(tmp.path())
			.unwrap();

		assert_eq!(result.renamed, 1);
		assert!(result.dry_run);
		assert!(events.borrow().is_empty());
		assert!(tmp.path().join("a:b").exists());
	}

	#[test]
	fn test_notification_failure_is_not_fatal() {
		let tmp = TempDir::new().unwrap();
		fs::write(tmp.path().join("a:b"), "").unwrap();
		age_all(tmp.path());

		let result = renamer().notifier(Box::new(Broken)).run(tmp.path()).unwrap();
		assert_eq!(result.renamed, 1);
		assert!(result.is_clean());
		assert!(tmp.path().join("a_b").exists());
	}

	#[test]
	fn test_fresh_entries_are_skipped() {
		let tmp = TempDir::new().unwrap();
		fs::write(tmp.path().join("busy?.txt"), "").unwrap();

		let result = renamer().run(tmp.path()).unwrap();
		assert_eq!(result.renamed, 0);
		assert_eq!(result.skipped, 1);
		assert!(tmp.path().join("busy?.txt").exists());
	}

	#[test]
	fn test_vanished_source_is_skipped_not_failed() {
		let tmp = TempDir::new().unwrap();
		let path = tmp.path().join("gone?.txt");
		fs::write(&path, "").unwrap();
		let entry = PathEntry::observe(tmp.path(), path.clone()).unwrap();
		fs::remove_file(&path).unwrap();

		let plan = RenamePlan {
			source: entry,
			proposed_name: "gone_.txt".to_string(),
			final_name: "gone_.txt".to_string(),
			action: RenameAction::Apply,
		};
		let err = renamer().execute(&plan).unwrap_err();
		assert!(matches!(err, EntryError::Vanished { .. }));

		let mut result = TraversalResult::default();
		record_entry_error(&mut result, err);
		assert_eq!(result.skipped, 1);
		assert!(result.is_clean());
	}

	#[test]
	fn test_rename_failure_is_recorded() {
		let mut result = TraversalResult::default();
		record_entry_error(
			&mut result,
			EntryError::RenameFailed {
				from: PathBuf::from("/sync/a?"),
				to: PathBuf::from("/sync/a_"),
				source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
			},
		);
		assert_eq!(result.skipped, 0);
		assert_eq!(result.failures.len(), 1);
		assert_eq!(result.failures[0].path, PathBuf::from("/sync/a?"));
		assert!(result.failures[0].reason.contains("denied"));
	}

	#[test]
	fn test_free_function_uses_grace() {
		let tmp = TempDir::new().unwrap();
		fs::write(tmp.path().join("now?.txt"), "").unwrap();
		let recent = FileTime::from_system_time(SystemTime::now() - Duration::from_secs(5));
		set_symlink_file_times(tmp.path().join("now?.txt"), recent, recent).unwrap();

		let result = run(tmp.path(), false, 0).unwrap();
		assert_eq!(result.renamed, 1);
		assert!(tmp.path().join("now_.txt").exists());
	}
}

// vim: ts=4
