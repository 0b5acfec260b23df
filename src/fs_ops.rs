//! Filesystem primitives used by the renamer
//!
//! Renames never replace an existing target. Where the platform offers an atomic
//! no-replace rename it is used; otherwise an existence check precedes a plain
//! rename and the remaining window is accepted.

use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

/// Rename `from` to `to`, failing with `AlreadyExists` if `to` exists
pub fn rename_no_replace(from: &Path, to: &Path) -> io::Result<()> {
	match platform_rename_no_replace(from, to) {
		Ok(()) => Ok(()),
		Err(e) if fallback_allowed(&e) => {
			debug!("Atomic no-replace rename unavailable ({}), using checked rename", e);
			checked_rename(from, to)
		}
		Err(e) => Err(e),
	}
}

/// Existence check followed by a plain rename
fn checked_rename(from: &Path, to: &Path) -> io::Result<()> {
	match fs::symlink_metadata(to) {
		Ok(_) => Err(io::Error::new(
			io::ErrorKind::AlreadyExists,
			format!("target already exists: {}", to.display()),
		)),
		Err(e) if e.kind() == io::ErrorKind::NotFound => fs::rename(from, to),
		Err(e) => Err(e),
	}
}

fn fallback_allowed(e: &io::Error) -> bool {
	if e.kind() == io::ErrorKind::Unsupported {
		return true;
	}
	#[cfg(unix)]
	{
		matches!(e.raw_os_error(), Some(libc::EINVAL) | Some(libc::ENOSYS) | Some(libc::ENOTSUP))
	}
	#[cfg(not(unix))]
	{
		false
	}
}

#[cfg(unix)]
fn c_path(path: &Path) -> io::Result<std::ffi::CString> {
	use std::os::unix::ffi::OsStrExt;

	std::ffi::CString::new(path.as_os_str().as_bytes()).map_err(|_| {
		io::Error::new(io::ErrorKind::InvalidInput, "path contains interior NUL byte")
	})
}

#[cfg(target_os = "linux")]
fn platform_rename_no_replace(from: &Path, to: &Path) -> io::Result<()> {
	let src = c_path(from)?;
	let dest = c_path(to)?;

	// SAFETY: both strings are NUL-terminated and outlive the call
	let rc = unsafe {
		libc::renameat2(
			libc::AT_FDCWD,
			src.as_ptr(),
			libc::AT_FDCWD,
			dest.as_ptr(),
			libc::RENAME_NOREPLACE,
		)
	};
	if rc == 0 {
		Ok(())
	} else {
		Err(io::Error::last_os_error())
	}
}

#[cfg(target_os = "macos")]
fn platform_rename_no_replace(from: &Path, to: &Path) -> io::Result<()> {
	let src = c_path(from)?;
	let dest = c_path(to)?;

	// SAFETY: both strings are NUL-terminated and outlive the call
	let rc = unsafe { libc::renamex_np(src.as_ptr(), dest.as_ptr(), libc::RENAME_EXCL) };
	if rc == 0 {
		Ok(())
	} else {
		Err(io::Error::last_os_error())
	}
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn platform_rename_no_replace(_from: &Path, _to: &Path) -> io::Result<()> {
	Err(io::Error::new(io::ErrorKind::Unsupported, "no atomic no-replace rename on this platform"))
}


// vim: ts=4
