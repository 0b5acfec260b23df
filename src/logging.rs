//! Logging prelude module for convenient access to tracing macros.
//!
//! ```ignore
//! use crate::logging::*;
//!
//! info!("Renamed file: {} -> {}", from, to);
//! debug!("Skipping {}: {}", path, reason);
//! ```

pub use tracing::{debug, error, info, warn};

/// Initialize the tracing subscriber with environment filter support.
///
/// `RUST_LOG` wins when set; otherwise `default_level` is used, raised to
/// `debug` when `verbose` is on:
///
/// ```bash
/// RUST_LOG=debug sanisync --dry-run
/// RUST_LOG=sanisync::activity=debug sanisync ~/OneDrive
/// ```
pub fn init_tracing(default_level: &str, verbose: bool) {
	let level = if verbose { "debug" } else { default_level };
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
		)
		.with_writer(std::io::stderr)
		.init();
}

// vim: ts=4
