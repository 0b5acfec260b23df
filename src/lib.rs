//! # sanisync - OneDrive-safe name sanitizer
//!
//! Walks a synced directory tree bottom-up and renames every file and folder whose
//! name a OneDrive-style remote would reject: forbidden characters, reserved device
//! names, trailing dots or spaces, over-long names, decomposed Unicode. Entries the
//! sync client may still be writing are left alone.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let result = sanisync::run(Path::new("/home/me/OneDrive"), true, 600)?;
//!     println!("Dry-run: {} potential renames found.", result.renamed);
//!     Ok(())
//! }
//! ```
//!
//! ## Using the Builder
//!
//! ```rust,ignore
//! use sanisync::{DesktopNotifier, Renamer, SanitizePolicy};
//!
//! let policy = SanitizePolicy::builder().grace_secs(60).temp_pattern("*.crdownload").build()?;
//! let result = Renamer::new(policy)
//!     .notifier(Box::new(DesktopNotifier::new()))
//!     .run(Path::new("/home/me/OneDrive"))?;
//! ```
//!
//! Names alone can be checked without touching the filesystem:
//!
//! ```rust
//! use sanisync::{sanitize, EntryKind, SanitizePolicy};
//!
//! let policy = SanitizePolicy::onedrive().unwrap();
//! assert_eq!(sanitize("Report: Q1?.txt", EntryKind::File, &policy), "Report_ Q1_.txt");
//! ```

pub mod activity;
pub mod collision;
pub mod config;
pub mod error;
pub mod fs_ops;
pub mod logging;
pub mod notify;
pub mod policy;
pub mod renamer;
pub mod sanitize;
pub mod types;
pub mod walk;

// Re-export commonly used types and functions
pub use activity::{Activity, ActivityDetector};
pub use config::Config;
pub use error::{EntryError, NotifyError, PolicyError, SanitizeError};
pub use notify::{DesktopNotifier, Notifier, NullNotifier, TextNotifier};
pub use policy::SanitizePolicy;
pub use renamer::{run, Renamer};
pub use sanitize::{sanitize, sanitized_name};
pub use types::{EntryKind, PathEntry, RenameRecord, TraversalResult};

// vim: ts=4
