//! Sanitize policy: the rule tables used by the sanitizer and the activity detector
//!
//! A policy is an immutable value. Build it once (usually from [`crate::config::Config`])
//! and share it by reference; several variants can coexist, which keeps tests isolated.

use crate::error::PolicyError;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::collections::BTreeSet;
use std::time::Duration;

/// Characters OneDrive, SharePoint and Windows reject in names
pub const INVALID_CHARS: &[char] = &['"', '*', ':', '<', '>', '\\', '?', '/', '|'];

/// Longest segment the remote accepts
pub const MAX_SEGMENT_LEN: usize = 255;

/// Default quiet period before an entry is considered settled
pub const DEFAULT_GRACE_SECS: u64 = 600;

/// Temp-file signatures that are always honoured
const BUILTIN_TEMP_PATTERNS: &[&str] = &[
	"*.tmp.*",   // partial downloads of sync clients
	"*.partial", // browsers and downloaders
	"~$*",       // Office lock files
];

/// Prefix rewrite for application temp markers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixRule {
	pub prefix: String,
	pub replacement: String,
}

/// Compiled temp-file name signatures
#[derive(Debug, Clone)]
pub struct TempSignatures {
	patterns: Vec<String>,
	set: GlobSet,
}

impl TempSignatures {
	/// Compile the built-in signatures plus `extra` glob patterns
	pub fn new(extra: &[String]) -> Result<Self, PolicyError> {
		let patterns: Vec<String> = BUILTIN_TEMP_PATTERNS
			.iter()
			.map(|p| p.to_string())
			.chain(extra.iter().cloned())
			.collect();

		let mut builder = GlobSetBuilder::new();
		for pattern in &patterns {
			let glob = GlobBuilder::new(pattern)
				.literal_separator(true)
				.build()
				.map_err(|e| PolicyError::InvalidPattern(format!("{}: {}", pattern, e)))?;
			builder.add(glob);
		}
		let set = builder.build().map_err(|e| {
			PolicyError::InvalidPattern(format!("Failed to build pattern set: {}", e))
		})?;

		Ok(Self { patterns, set })
	}

	/// Check a leaf name (not a path) against every signature
	pub fn matches(&self, name: &str) -> bool {
		self.set.is_match(name)
	}

	pub fn patterns(&self) -> &[String] {
		&self.patterns
	}
}

/// Immutable rule set driving sanitization and activity detection
#[derive(Debug, Clone)]
pub struct SanitizePolicy {
	pub invalid_chars: BTreeSet<char>,

	pub replacement: char,

	/// Upper-case reserved base names
	pub reserved_names: BTreeSet<String>,

	pub max_segment_len: usize,

	/// Strip trailing dots from file names (directories keep them)
	pub strip_trailing_dots: bool,

	pub temp_prefix: Option<PrefixRule>,

	pub temp_signatures: TempSignatures,

	/// Entries modified more recently than this are left alone
	pub grace: Duration,
}

impl SanitizePolicy {
	/// The OneDrive rule set with the default grace period
	pub fn onedrive() -> Result<Self, PolicyError> {
		Self::builder().build()
	}

	pub fn builder() -> PolicyBuilder {
		PolicyBuilder::default()
	}

	/// Case-insensitive reserved-name check
	pub fn is_reserved(&self, name: &str) -> bool {
		self.reserved_names.contains(&name.to_uppercase())
	}

	pub fn is_invalid_char(&self, c: char) -> bool {
		self.invalid_chars.contains(&c)
	}
}

/// Reserved device names: CON, PRN, AUX, NUL, COM0-9, LPT0-9
pub fn reserved_names() -> BTreeSet<String> {
	let mut names: BTreeSet<String> =
		["CON", "PRN", "AUX", "NUL"].iter().map(|s| s.to_string()).collect();
	for i in 0..10 {
		names.insert(format!("COM{}", i));
		names.insert(format!("LPT{}", i));
	}
	names
}

/// Builder for [`SanitizePolicy`]
#[derive(Debug, Clone)]
pub struct PolicyBuilder {
	max_segment_len: usize,
	grace: Duration,
	extra_temp_patterns: Vec<String>,
	strip_trailing_dots: bool,
	temp_prefix: bool,
}

impl Default for PolicyBuilder {
	fn default() -> Self {
		PolicyBuilder {
			max_segment_len: MAX_SEGMENT_LEN,
			grace: Duration::from_secs(DEFAULT_GRACE_SECS),
			extra_temp_patterns: vec![],
			strip_trailing_dots: true,
			temp_prefix: true,
		}
	}
}

impl PolicyBuilder {
	pub fn max_segment_len(mut self, len: usize) -> Self {
		self.max_segment_len = len;
		self
	}

	pub fn grace(mut self, grace: Duration) -> Self {
		self.grace = grace;
		self
	}

	pub fn grace_secs(self, secs: u64) -> Self {
		self.grace(Duration::from_secs(secs))
	}

	/// Add a temp-file glob on top of the built-in signatures
	pub fn temp_pattern(mut self, pattern: impl Into<String>) -> Self {
		self.extra_temp_patterns.push(pattern.into());
		self
	}

	pub fn temp_patterns(mut self, patterns: &[String]) -> Self {
		self.extra_temp_patterns.extend(patterns.iter().cloned());
		self
	}

	pub fn strip_trailing_dots(mut self, strip: bool) -> Self {
		self.strip_trailing_dots = strip;
		self
	}

	/// Toggle the `~$` -> `x_` rewrite
	pub fn temp_prefix(mut self, enabled: bool) -> Self {
		self.temp_prefix = enabled;
		self
	}

	pub fn build(self) -> Result<SanitizePolicy, PolicyError> {
		if self.max_segment_len == 0 || self.max_segment_len > MAX_SEGMENT_LEN {
			return Err(PolicyError::InvalidLimit(format!(
				"max segment length must be between 1 and {}, got {}",
				MAX_SEGMENT_LEN, self.max_segment_len
			)));
		}

		let temp_prefix = if self.temp_prefix {
			Some(PrefixRule { prefix: "~$".to_string(), replacement: "x_".to_string() })
		} else {
			None
		};

		Ok(SanitizePolicy {
			invalid_chars: INVALID_CHARS.iter().copied().collect(),
			replacement: '_',
			reserved_names: reserved_names(),
			max_segment_len: self.max_segment_len,
			strip_trailing_dots: self.strip_trailing_dots,
			temp_prefix,
			temp_signatures: TempSignatures::new(&self.extra_temp_patterns)?,
			grace: self.grace,
		})
	}
}


// vim: ts=4
