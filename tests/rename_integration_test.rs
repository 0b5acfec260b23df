//! End-to-end renames on real temporary trees
//!
//! Fixtures are aged past the grace period with `filetime`, otherwise every
//! freshly created entry would count as recently modified.

use filetime::{set_symlink_file_times, FileTime};
use sanisync::error::NotifyError;
use sanisync::{EntryKind, Notifier, Renamer, SanitizeError, SanitizePolicy, TraversalResult};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

fn age_tree(root: &Path) {
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

fn touch(path: &Path) {
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent).unwrap();
	}
	fs::write(path, path.to_string_lossy().as_bytes()).unwrap();
}

fn renamer() -> Renamer {
	Renamer::new(SanitizePolicy::onedrive().unwrap())
}

fn pairs(result: &TraversalResult) -> BTreeSet<(PathBuf, PathBuf)> {
	result.renames.iter().map(|r| (r.from.clone(), r.to.clone())).collect()
}

/// Every name under `root`, relative, sorted
fn listing(root: &Path) -> Vec<String> {
	let mut names = vec![];
	let mut pending = vec![root.to_path_buf()];
	while let Some(dir) = pending.pop() {
		for entry in fs::read_dir(&dir).unwrap() {
			let path = entry.unwrap().path();
			names.push(path.strip_prefix(root).unwrap().to_string_lossy().into_owned());
			if fs::symlink_metadata(&path).unwrap().is_dir() {
				pending.push(path);
			}
		}
	}
	names.sort();
	names
}

struct Recorder(Rc<RefCell<Vec<String>>>);

impl Notifier for Recorder {
	fn notify(&self, summary: &str, body: &str) -> Result<(), NotifyError> {
		self.0.borrow_mut().push(format!("{} | {}", summary, body));
		Ok(())
	}
}

#[test]
fn test_children_renamed_before_parent() {
	let tmp = TempDir::new().unwrap();
	let root = tmp.path();
	touch(&root.join("A:").join("b?.txt"));
	age_tree(root);

	let result = renamer().run(root).unwrap();

	assert_eq!(result.renamed, 2);
	assert!(result.is_clean());
	assert!(root.join("A_").join("b_.txt").is_file());
	assert!(!root.join("A:").exists());

	assert_eq!(result.renames[0].from, root.join("A:").join("b?.txt"));
	assert_eq!(result.renames[0].to, root.join("A:").join("b_.txt"));
	assert_eq!(result.renames[0].kind, EntryKind::File);
	assert_eq!(result.renames[1].from, root.join("A:"));
	assert_eq!(result.renames[1].to, root.join("A_"));
	assert_eq!(result.renames[1].kind, EntryKind::Directory);
}

#[test]
fn test_active_directory_is_left_untouched() {
	let tmp = TempDir::new().unwrap();
	let root = tmp.path();
	touch(&root.join("Proj?").join("bad:name.txt"));
	touch(&root.join("Proj?").join("deep").join("x.tmp.123"));
	touch(&root.join("other|file.txt"));
	age_tree(root);

	let result = renamer().run(root).unwrap();

	assert_eq!(result.renamed, 1);
	assert_eq!(result.skipped, 1);
	assert!(root.join("Proj?").join("bad:name.txt").exists());
	assert!(root.join("Proj?").join("deep").join("x.tmp.123").exists());
	assert!(root.join("other_file.txt").exists());
}

#[test]
fn test_recent_descendant_blocks_directory() {
	let tmp = TempDir::new().unwrap();
	let root = tmp.path();
	touch(&root.join("Dir*").join("old?.txt"));
	age_tree(root);
	touch(&root.join("Dir*").join("sub").join("fresh.txt"));
	let old = FileTime::from_system_time(SystemTime::now() - Duration::from_secs(3600));
	set_symlink_file_times(root.join("Dir*"), old, old).unwrap();

	let result = renamer().run(root).unwrap();

	assert_eq!(result.renamed, 0);
	assert!(root.join("Dir*").join("old?.txt").exists());
}

#[test]
fn test_dry_run_matches_real_run() {
	let tmp = TempDir::new().unwrap();
	let root = tmp.path();
	touch(&root.join("top?.txt"));
	touch(&root.join("CON"));
	touch(&root.join("A:").join("a1|.txt"));
	touch(&root.join("A:").join("B<").join("b1>.txt"));
	touch(&root.join("C").join("clean.txt"));
	touch(&root.join("C").join("x?.md"));
	touch(&root.join("C").join("x*.md"));
	age_tree(root);
	let before = listing(root);

	let dry = renamer().dry_run(true).run(root).unwrap();
	assert!(dry.dry_run);
	assert_eq!(listing(root), before);

	let real = renamer().run(root).unwrap();
	assert!(!real.dry_run);
	assert_eq!(dry.renamed, real.renamed);
	assert_eq!(pairs(&dry), pairs(&real));
	assert_eq!(real.renamed, 8);
}

#[test]
fn test_same_pass_collisions_get_numbered() {
	let tmp = TempDir::new().unwrap();
	let root = tmp.path();
	touch(&root.join("a?.txt"));
	touch(&root.join("a*.txt"));
	age_tree(root);

	let result = renamer().run(root).unwrap();

	assert_eq!(result.renamed, 2);
	assert_eq!(listing(root), vec!["a_.txt".to_string(), "a__1.txt".to_string()]);
	let moved = fs::read_to_string(root.join("a_.txt")).unwrap();
	assert_eq!(moved, root.join("a*.txt").to_string_lossy().into_owned());
}

#[test]
fn test_existing_target_is_not_clobbered() {
	let tmp = TempDir::new().unwrap();
	let root = tmp.path();
	fs::write(root.join("b_.txt"), "keep me").unwrap();
	fs::write(root.join("b?.txt"), "move me").unwrap();
	age_tree(root);

	let result = renamer().run(root).unwrap();

	assert_eq!(result.renamed, 1);
	assert_eq!(fs::read_to_string(root.join("b_.txt")).unwrap(), "keep me");
	assert_eq!(fs::read_to_string(root.join("b__1.txt")).unwrap(), "move me");
}

#[cfg(unix)]
#[test]
fn test_symlinks_and_hidden_entries_are_never_renamed() {
	let tmp = TempDir::new().unwrap();
	let root = tmp.path();
	touch(&root.join(".hid?den"));
	touch(&root.join(".cfg:dir").join("in?side"));
	touch(&root.join("target.txt"));
	std::os::unix::fs::symlink(root.join("target.txt"), root.join("li:nk")).unwrap();
	age_tree(root);

	let result = renamer().run(root).unwrap();

	assert_eq!(result.renamed, 0);
	assert!(root.join(".hid?den").exists());
	assert!(root.join(".cfg:dir").join("in?side").exists());
	assert!(fs::symlink_metadata(root.join("li:nk")).unwrap().file_type().is_symlink());
}

#[cfg(unix)]
#[test]
fn test_non_utf8_name_is_renamed_to_its_lossy_form() {
	use std::ffi::OsStr;
	use std::os::unix::ffi::OsStrExt;

	let tmp = TempDir::new().unwrap();
	let root = tmp.path();
	fs::write(root.join(OsStr::from_bytes(b"bad\xffname")), "raw").unwrap();
	age_tree(root);

	let result = renamer().run(root).unwrap();

	assert_eq!(result.renamed, 1);
	assert!(result.is_clean());
	assert_eq!(listing(root), vec!["bad\u{fffd}name".to_string()]);
}

#[cfg(unix)]
#[test]
fn test_rename_failure_does_not_stop_the_pass() {
	use std::os::unix::fs::PermissionsExt;

	// Permission bits do not bind root
	if unsafe { libc::geteuid() } == 0 {
		return;
	}

	let tmp = TempDir::new().unwrap();
	let root = tmp.path();
	touch(&root.join("a_ro").join("bad?.txt"));
	touch(&root.join("b:dir").join("c?.txt"));
	age_tree(root);
	let locked = root.join("a_ro");
	fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

	let outcome = renamer().run(root);
	fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
	let result = outcome.unwrap();

	assert_eq!(result.failures.len(), 1);
	assert_eq!(result.failures[0].path, locked.join("bad?.txt"));
	assert!(locked.join("bad?.txt").exists());
	assert_eq!(result.renamed, 2);
	assert!(root.join("b_dir").join("c_.txt").is_file());
	assert!(!result.is_clean());
}

#[test]
fn test_root_itself_is_never_renamed() {
	let tmp = TempDir::new().unwrap();
	let root = tmp.path().join("Root?");
	touch(&root.join("in|side.txt"));
	age_tree(tmp.path());

	let result = renamer().run(&root).unwrap();

	assert_eq!(result.renamed, 1);
	assert!(root.join("in_side.txt").exists());
}

#[test]
fn test_second_run_is_a_no_op() {
	let tmp = TempDir::new().unwrap();
	let root = tmp.path();
	touch(&root.join("Work: 2024").join("plan?.docx"));
	touch(&root.join("trailing. ").join("lpt1.txt"));
	touch(&root.join(format!("{}?.txt", "x".repeat(240))));
	touch(&root.join("Cafe\u{301}.txt"));
	age_tree(root);

	let first = renamer().run(root).unwrap();
	assert!(first.renamed > 0);
	assert!(first.is_clean());

	age_tree(root);
	let second = renamer().run(root).unwrap();
	assert_eq!(second.renamed, 0);
	assert!(second.is_clean());
}

#[test]
fn test_long_name_is_shortened_with_extension() {
	let tmp = TempDir::new().unwrap();
	let root = tmp.path();
	let long = format!("{}.txt", "n".repeat(250));
	touch(&root.join(&long));
	age_tree(root);

	let policy = SanitizePolicy::builder().max_segment_len(100).build().unwrap();
	let result = Renamer::new(policy).run(root).unwrap();

	assert_eq!(result.renamed, 1);
	let names = listing(root);
	assert_eq!(names.len(), 1);
	assert_eq!(names[0].chars().count(), 100);
	assert!(names[0].ends_with(".txt"));
}

#[test]
fn test_notifications_follow_applied_renames() {
	let tmp = TempDir::new().unwrap();
	let root = tmp.path();
	touch(&root.join("D>").join("f<.txt"));
	age_tree(root);

	let events = Rc::new(RefCell::new(vec![]));
	renamer().dry_run(true).notifier(Box::new(Recorder(events.clone()))).run(root).unwrap();
	assert!(events.borrow().is_empty());

	renamer().notifier(Box::new(Recorder(events.clone()))).run(root).unwrap();
	let events = events.borrow();
	assert_eq!(events.len(), 2);
	assert!(events[0].starts_with("OneDrive: Renamed file | "));
	assert!(events[0].ends_with("f_.txt"));
	assert!(events[1].starts_with("OneDrive: Renamed folder | "));
	assert!(events[1].ends_with("D_"));
}

#[test]
fn test_missing_root_is_fatal() {
	let tmp = TempDir::new().unwrap();
	let missing = tmp.path().join("OneDrive");

	match renamer().run(&missing) {
		Err(SanitizeError::RootNotFound { path }) => assert_eq!(path, missing),
		other => panic!("expected RootNotFound, got {:?}", other.map(|r| r.renamed)),
	}
}

#[test]
fn test_free_function_dry_run() {
	let tmp = TempDir::new().unwrap();
	let root = tmp.path();
	touch(&root.join("q?.txt"));
	let recent = FileTime::from_system_time(SystemTime::now() - Duration::from_secs(5));
	set_symlink_file_times(root.join("q?.txt"), recent, recent).unwrap();

	let result = sanisync::run(root, true, 0).unwrap();
	assert_eq!(result.renamed, 1);
	assert!(root.join("q?.txt").exists());
}

// vim: ts=4
