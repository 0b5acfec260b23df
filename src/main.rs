use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::ExitCode;

use sanisync::config::{expand_home, Config};
use sanisync::logging::*;
use sanisync::{DesktopNotifier, Notifier, NullNotifier, Renamer, SanitizeError, TraversalResult};

const EXIT_FAILURE: u8 = 1;
const EXIT_ROOT_NOT_FOUND: u8 = 2;

fn cli() -> Command {
	Command::new("sanisync")
		.version(env!("CARGO_PKG_VERSION"))
		.about("Rename files and folders so OneDrive accepts every name")
		.arg(Arg::new("root").value_name("ROOT").help("Root of the synced tree (default: ~/OneDrive)"))
		.arg(
			Arg::new("dry-run")
				.short('n')
				.long("dry-run")
				.action(ArgAction::SetTrue)
				.help("Show what would be renamed without renaming"),
		)
		.arg(
			Arg::new("verbose")
				.short('v')
				.long("verbose")
				.action(ArgAction::SetTrue)
				.help("Debug logging"),
		)
		.arg(
			Arg::new("yes")
				.short('y')
				.long("yes")
				.action(ArgAction::SetTrue)
				.help("Do not ask for confirmation"),
		)
		.arg(
			Arg::new("grace-secs")
				.long("grace-secs")
				.value_name("SECONDS")
				.value_parser(value_parser!(u64))
				.help("Leave entries modified within this many seconds alone (default: 600)"),
		)
		.arg(
			Arg::new("no-notify")
				.long("no-notify")
				.action(ArgAction::SetTrue)
				.help("Disable desktop notifications"),
		)
		.arg(
			Arg::new("json")
				.long("json")
				.action(ArgAction::SetTrue)
				.help("Print the result as JSON"),
		)
		.arg(
			Arg::new("config")
				.short('c')
				.long("config")
				.value_name("PATH")
				.help("Config file (default: ~/.config/sanisync/config.toml)"),
		)
}

/// Defaults, then config file, then environment, then flags
fn build_config(matches: &ArgMatches) -> Result<Config, SanitizeError> {
	let config_path = matches.get_one::<String>("config").map(|p| expand_home(Path::new(p)));
	let mut config = Config::load(config_path.as_deref())?;
	config.apply_env()?;

	if let Some(root) = matches.get_one::<String>("root") {
		config.root = expand_home(Path::new(root));
	}
	if let Some(secs) = matches.get_one::<u64>("grace-secs") {
		config.grace_secs = *secs;
	}
	if matches.get_flag("dry-run") {
		config.dry_run = true;
	}
	if matches.get_flag("verbose") {
		config.verbose = true;
	}
	if matches.get_flag("yes") {
		config.assume_yes = true;
	}
	if matches.get_flag("no-notify") {
		config.notify = false;
	}
	if matches.get_flag("json") {
		config.json_output = true;
	}

	config.validate()?;
	Ok(config)
}

fn confirm(prompt: &str) -> io::Result<bool> {
	print!("{} ", prompt);
	io::stdout().flush()?;

	let mut answer = String::new();
	io::stdin().lock().read_line(&mut answer)?;
	Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn print_result(config: &Config, result: &TraversalResult) -> Result<(), SanitizeError> {
	if config.json_output {
		let json = serde_json::to_string_pretty(result)
			.map_err(|e| SanitizeError::Io(io::Error::new(io::ErrorKind::Other, e)))?;
		println!("{}", json);
	} else if result.dry_run {
		println!("Dry-run: {} potential renames found.", result.renamed);
	} else {
		println!("Completed: {} items renamed.", result.renamed);
	}

	for failure in &result.failures {
		eprintln!("Failed: {}: {}", failure.path.display(), failure.reason);
	}
	Ok(())
}

fn sanitize_tree(config: &Config) -> Result<ExitCode, SanitizeError> {
	let policy = config.to_policy()?;

	println!("Scanning: {}", config.root.display());
	if !config.dry_run && !config.assume_yes {
		if !confirm("Proceed with renaming (this will rename files in-place)? [y/N]:")? {
			println!("{}.", SanitizeError::Aborted);
			return Ok(ExitCode::SUCCESS);
		}
	}

	let notifier: Box<dyn Notifier> = if config.notify {
		Box::new(DesktopNotifier::with_program(config.notify_command.clone()))
	} else {
		Box::new(NullNotifier)
	};

	let result = Renamer::new(policy).dry_run(config.dry_run).notifier(notifier).run(&config.root)?;
	print_result(config, &result)?;

	if result.is_clean() {
		Ok(ExitCode::SUCCESS)
	} else {
		Ok(ExitCode::from(EXIT_FAILURE))
	}
}

fn main() -> ExitCode {
	let matches = cli().get_matches();

	let config = match build_config(&matches) {
		Ok(c) => c,
		Err(e) => {
			eprintln!("Error: {}", e);
			return ExitCode::from(EXIT_FAILURE);
		}
	};
	init_tracing(&config.log_level, config.verbose);
	debug!("Effective config: {:?}", config);

	match sanitize_tree(&config) {
		Ok(code) => code,
		Err(e @ SanitizeError::RootNotFound { .. }) => {
			error!("{}", e);
			eprintln!("Error: {}", e);
			ExitCode::from(EXIT_ROOT_NOT_FOUND)
		}
		Err(e) => {
			error!("{}", e);
			eprintln!("Error: {}", e);
			ExitCode::from(EXIT_FAILURE)
		}
	}
}


// vim: ts=4
