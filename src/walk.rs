//! Bottom-up directory walk
//!
//! Yields every entry under a root after all of its children, so a directory can
//! be renamed only once nothing beneath it is still pending. Within a directory,
//! non-directories come first, then subdirectories, each group in byte-wise name
//! order; the order is deterministic so a dry run and a real run agree.
//!
//! Directories pass through a prune predicate before the walk descends into them.
//! A pruned directory is reported once and its subtree is never listed.

use crate::activity::Activity;
use crate::types::PathEntry;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One step of the walk
#[derive(Debug)]
pub enum WalkEvent {
	/// Entry ready for processing; directories arrive after their contents
	Entry(PathEntry),

	/// Directory rejected before descent; nothing beneath it is visited
	Pruned { entry: PathEntry, reason: Activity },

	/// Directory whose listing failed; its contents are unknown
	Unreadable { entry: PathEntry, error: io::Error },
}

struct Frame {
	/// `None` for the walk root, which is never yielded
	dir: Option<PathEntry>,
	children: std::vec::IntoIter<PathEntry>,
}

/// Lazy, restartable children-before-parent walk
pub struct BottomUpWalk<P> {
	root: PathBuf,
	stack: Vec<Frame>,
	prune: P,
}

impl<P> BottomUpWalk<P>
where
	P: FnMut(&PathEntry) -> Option<Activity>,
{
	/// Start a walk at `root`; the root listing is read immediately
	pub fn new(root: &Path, prune: P) -> io::Result<Self> {
		let children = list_children(root, root)?;
		Ok(BottomUpWalk {
			root: root.to_path_buf(),
			stack: vec![Frame { dir: None, children: children.into_iter() }],
			prune,
		})
	}
}

impl<P> Iterator for BottomUpWalk<P>
where
	P: FnMut(&PathEntry) -> Option<Activity>,
{
	type Item = WalkEvent;

	fn next(&mut self) -> Option<WalkEvent> {
		loop {
			let next_child = match self.stack.last_mut() {
				Some(frame) => frame.children.next(),
				None => return None,
			};

			match next_child {
				Some(child) if child.is_dir() => {
					if let Some(reason) = (self.prune)(&child) {
						return Some(WalkEvent::Pruned { entry: child, reason });
					}
					match list_children(&self.root, &child.path) {
						Ok(children) => {
							self.stack.push(Frame { dir: Some(child), children: children.into_iter() })
						}
						Err(error) => return Some(WalkEvent::Unreadable { entry: child, error }),
					}
				}
				Some(child) => return Some(WalkEvent::Entry(child)),
				None => {
					let frame = self.stack.pop()?;
					return frame.dir.map(WalkEvent::Entry);
				}
			}
		}
	}
}

/// List a directory as entries, non-directories first, each group sorted by name
fn list_children(root: &Path, dir: &Path) -> io::Result<Vec<PathEntry>> {
	let mut children = Vec::new();

	for entry_result in fs::read_dir(dir)? {
		let entry = match entry_result {
			Ok(e) => e,
			Err(e) => {
				debug!("Error reading directory entry in {}: {}", dir.display(), e);
				continue;
			}
		};

		// DirEntry::metadata does not traverse symlinks
		let meta = match entry.metadata() {
			Ok(m) => m,
			Err(e) => {
				debug!("Entry vanished during listing {}: {}", entry.path().display(), e);
				continue;
			}
		};
		children.push(PathEntry::from_metadata(root, entry.path(), &meta));
	}

	children.sort_by(|a, b| (a.is_dir(), a.name()).cmp(&(b.is_dir(), b.name())));
	Ok(children)
}


// vim: ts=4
