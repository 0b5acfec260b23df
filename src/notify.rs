//! Rename notifications
//!
//! Notifications are best effort: the renamer logs a failed delivery and moves on.

use crate::error::NotifyError;
use std::io;
use std::process::{Command, Stdio};

/// Sink for user-facing rename events
pub trait Notifier {
	/// Deliver one notification
	fn notify(&self, summary: &str, body: &str) -> Result<(), NotifyError>;
}

/// Drops every notification
pub struct NullNotifier;

impl Notifier for NullNotifier {
	fn notify(&self, _summary: &str, _body: &str) -> Result<(), NotifyError> {
		Ok(())
	}
}

/// Prints `NOTIFY: summary - body` to stdout
pub struct TextNotifier;

impl Notifier for TextNotifier {
	fn notify(&self, summary: &str, body: &str) -> Result<(), NotifyError> {
		println!("NOTIFY: {} - {}", summary, body);
		Ok(())
	}
}

/// Desktop notifications through `notify-send` (or a compatible program)
///
/// When the program is not installed the notification is printed instead.
pub struct DesktopNotifier {
	program: String,
	fallback: TextNotifier,
}

impl DesktopNotifier {
	pub fn new() -> Self {
		Self::with_program("notify-send")
	}

	pub fn with_program(program: impl Into<String>) -> Self {
		DesktopNotifier { program: program.into(), fallback: TextNotifier }
	}
}

impl Default for DesktopNotifier {
	fn default() -> Self {
		Self::new()
	}
}

impl Notifier for DesktopNotifier {
	fn notify(&self, summary: &str, body: &str) -> Result<(), NotifyError> {
		let status = Command::new(&self.program)
			.arg(summary)
			.arg(body)
			.stdin(Stdio::null())
			.stdout(Stdio::null())
			.stderr(Stdio::null())
			.status();

		match status {
			Ok(s) if s.success() => Ok(()),
			Ok(s) => Err(NotifyError::Rejected { program: self.program.clone(), code: s.code() }),
			Err(e) if e.kind() == io::ErrorKind::NotFound => self.fallback.notify(summary, body),
			Err(e) => Err(NotifyError::SpawnFailed { program: self.program.clone(), source: e }),
		}
	}
}

/// Summary line for a rename of the given kind noun ("file", "folder")
pub fn rename_summary(noun: &str) -> String {
	format!("OneDrive: Renamed {}", noun)
}


// vim: ts=4
