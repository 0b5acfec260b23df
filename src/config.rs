//! Unified configuration for sanisync
//!
//! The configuration follows a priority chain:
//! 1. Built-in defaults (Config::default())
//! 2. Config file (~/.config/sanisync/config.toml or config.json)
//! 3. Environment variables (SANISYNC_* prefix)
//! 4. CLI flags (highest priority)

use crate::error::SanitizeError;
use crate::policy::{SanitizePolicy, DEFAULT_GRACE_SECS, MAX_SEGMENT_LEN};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Prefix of every environment variable read by [`Config::apply_env`]
pub const ENV_PREFIX: &str = "SANISYNC_";

// ============================================================================
// MAIN CONFIGURATION STRUCT
// ============================================================================

/// Everything a run needs, merged from defaults, file, environment and CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
	// ========================================================================
	// TARGET
	// ========================================================================
	/// Root of the synced tree; never renamed itself
	pub root: PathBuf,

	// ========================================================================
	// RUN BEHAVIOR
	// ========================================================================
	/// Report intended renames without touching anything
	pub dry_run: bool,

	/// Skip the interactive confirmation
	pub assume_yes: bool,

	/// Entries modified within this many seconds are left alone
	pub grace_secs: u64,

	/// Name length limit in characters (1..=255)
	pub max_name_len: usize,

	/// Temp-file globs added to the built-in signatures
	pub extra_temp_patterns: Vec<String>,

	// ========================================================================
	// NOTIFICATIONS
	// ========================================================================
	/// Send a desktop notification per applied rename
	pub notify: bool,

	/// Notification program, called as `<program> <summary> <body>`
	pub notify_command: String,

	// ========================================================================
	// OUTPUT & LOGGING
	// ========================================================================
	/// Debug-level logging
	pub verbose: bool,

	/// Default filter when RUST_LOG is not set
	pub log_level: String,

	/// Print the traversal result as JSON on stdout
	pub json_output: bool,
}

impl Default for Config {
	fn default() -> Self {
		Config {
			root: default_root(),
			dry_run: false,
			assume_yes: false,
			grace_secs: DEFAULT_GRACE_SECS,
			max_name_len: MAX_SEGMENT_LEN,
			extra_temp_patterns: vec![],
			notify: true,
			notify_command: "notify-send".to_string(),
			verbose: false,
			log_level: "info".to_string(),
			json_output: false,
		}
	}
}

impl Config {
	/// Load a config file; `.json` files are parsed as JSON, everything else as TOML
	pub fn load_file(path: &Path) -> Result<Config, SanitizeError> {
		let contents = fs::read_to_string(path).map_err(|e| SanitizeError::InvalidConfig {
			message: format!("cannot read {}: {}", path.display(), e),
		})?;

		let is_json = path.extension().map(|ext| ext == "json").unwrap_or(false);
		let mut config: Config = if is_json {
			serde_json::from_str(&contents).map_err(|e| SanitizeError::InvalidConfig {
				message: format!("{}: {}", path.display(), e),
			})?
		} else {
			toml::from_str(&contents).map_err(|e| SanitizeError::InvalidConfig {
				message: format!("{}: {}", path.display(), e),
			})?
		};

		config.root = expand_home(&config.root);
		Ok(config)
	}

	/// Load `path` if given (must exist), else the default location if present, else defaults
	pub fn load(path: Option<&Path>) -> Result<Config, SanitizeError> {
		if let Some(path) = path {
			return Config::load_file(path);
		}
		match Config::default_path() {
			Some(path) if path.is_file() => Config::load_file(&path),
			Some(path) => match path.with_extension("json") {
				json if json.is_file() => Config::load_file(&json),
				_ => Ok(Config::default()),
			},
			None => Ok(Config::default()),
		}
	}

	/// `~/.config/sanisync/config.toml`
	pub fn default_path() -> Option<PathBuf> {
		home_dir().map(|h| h.join(".config").join("sanisync").join("config.toml"))
	}

	/// Overlay `SANISYNC_*` variables from the process environment
	pub fn apply_env(&mut self) -> Result<(), SanitizeError> {
		self.apply_env_from(|key| std::env::var(key).ok())
	}

	/// Overlay variables produced by `lookup`
	pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), SanitizeError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

		if let Some(root) = var("ROOT") {
			self.root = expand_home(Path::new(&root));
		}
		if let Some(v) = var("DRY_RUN") {
			self.dry_run = parse_bool("DRY_RUN", &v)?;
		}
		if let Some(v) = var("GRACE_SECS") {
			self.grace_secs = parse_number("GRACE_SECS", &v)?;
		}
		if let Some(v) = var("MAX_NAME_LEN") {
			self.max_name_len = parse_number("MAX_NAME_LEN", &v)?;
		}
		if let Some(v) = var("NOTIFY") {
			self.notify = parse_bool("NOTIFY", &v)?;
		}
		if let Some(v) = var("NOTIFY_COMMAND") {
			self.notify_command = v;
		}
		if let Some(v) = var("LOG_LEVEL") {
			self.log_level = v;
		}
		Ok(())
	}

	pub fn validate(&self) -> Result<(), SanitizeError> {
		if self.max_name_len == 0 || self.max_name_len > MAX_SEGMENT_LEN {
			return Err(SanitizeError::InvalidConfig {
				message: format!(
					"maxNameLen must be between 1 and {}, got {}",
					MAX_SEGMENT_LEN, self.max_name_len
				),
			});
		}
		if self.notify && self.notify_command.trim().is_empty() {
			return Err(SanitizeError::InvalidConfig {
				message: "notifyCommand must not be empty when notifications are enabled"
					.to_string(),
			});
		}
		if self.root.as_os_str().is_empty() {
			return Err(SanitizeError::InvalidConfig { message: "root must not be empty".to_string() });
		}
		Ok(())
	}

	/// Build the sanitize policy described by this config
	pub fn to_policy(&self) -> Result<SanitizePolicy, SanitizeError> {
		self.validate()?;
		let policy = SanitizePolicy::builder()
			.max_segment_len(self.max_name_len)
			.grace_secs(self.grace_secs)
			.temp_patterns(&self.extra_temp_patterns)
			.build()?;
		Ok(policy)
	}
}

fn home_dir() -> Option<PathBuf> {
	std::env::var_os("HOME").filter(|h| !h.is_empty()).map(PathBuf::from)
}

fn default_root() -> PathBuf {
	home_dir().map(|h| h.join("OneDrive")).unwrap_or_else(|| PathBuf::from("OneDrive"))
}

/// Replace a leading `~` with $HOME
pub fn expand_home(path: &Path) -> PathBuf {
	match path.strip_prefix("~") {
		Ok(rest) => match home_dir() {
			Some(home) => home.join(rest),
			None => path.to_path_buf(),
		},
		Err(_) => path.to_path_buf(),
	}
}

fn parse_bool(name: &str, value: &str) -> Result<bool, SanitizeError> {
	match value.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" | "" => Ok(false),
		_ => Err(SanitizeError::InvalidConfig {
			message: format!("{}{}: expected a boolean, got '{}'", ENV_PREFIX, name, value),
		}),
	}
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, SanitizeError> {
	value.trim().parse().map_err(|_| SanitizeError::InvalidConfig {
		message: format!("{}{}: expected a number, got '{}'", ENV_PREFIX, name, value),
	})
}


// vim: ts=4
