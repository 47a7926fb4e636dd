use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use berth_cli::profile::loader::{
	PROFILE_FILE_NAME, discover_profile_files, load_enclosing, seal_profile_file,
	user_profile_path, write_starter_profile,
};
use berth_cli::profile::parser::parse_profile_file;
use berth_cli::profile::types::SyncProfile;
use berth_cli::scope::ProfileRegistry;
use berth_cli::scope::path::has_drive_prefix;

#[derive(Parser)]
#[command(name = "berth")]
#[command(
	author,
	version,
	about = "CLI tool for resolving which remote sync profile governs a workspace path"
)]
#[command(arg_required_else_help = true)]
struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Create a starter .berth.json in the current directory
	Init {
		/// Overwrite an existing .berth.json
		#[arg(long)]
		force: bool,
	},

	/// Resolve the sync profile governing a path
	Resolve {
		/// File or directory to resolve
		path: PathBuf,

		/// Print the full profile as JSON (password redacted)
		#[arg(long)]
		json: bool,

		/// Keyphrase for unsealing encrypted passwords
		#[arg(long, env = "BERTH_KEYPHRASE")]
		keyphrase: Option<String>,
	},

	/// List every registered sync scope enclosing the current directory
	List {
		/// Print profiles as JSON (passwords redacted)
		#[arg(long)]
		json: bool,
	},

	/// List distinct top-level scopes, suppressing nested ones
	Targets {
		/// Print profiles as JSON (passwords redacted)
		#[arg(long)]
		json: bool,
	},

	/// Seal plaintext passwords in a profile file in place
	Seal {
		/// Profile file to seal (default: ./.berth.json)
		path: Option<PathBuf>,

		/// Keyphrase to seal with
		#[arg(long, env = "BERTH_KEYPHRASE")]
		keyphrase: Option<String>,
	},

	/// Profile file management commands
	Config {
		#[command(subcommand)]
		action: ConfigAction,
	},
}

#[derive(Subcommand)]
enum ConfigAction {
	/// Display discovered profile files and their entries
	Show,
	/// Check all discovered profile files for errors
	Validate,
}

fn main() -> ExitCode {
	// Log output goes to stderr; stdout is reserved for command payloads.
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::from_default_env())
		.with_writer(std::io::stderr)
		.init();

	match run() {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:?}");
			ExitCode::FAILURE
		}
	}
}

fn run() -> Result<ExitCode> {
	let cli = Cli::parse();

	match cli.command {
		Commands::Init { force } => handle_init(force),
		Commands::Resolve {
			path,
			json,
			keyphrase,
		} => handle_resolve(&path, json, keyphrase.as_deref()),
		Commands::List { json } => handle_list(json, false),
		Commands::Targets { json } => handle_list(json, true),
		Commands::Seal { path, keyphrase } => handle_seal(path.as_deref(), keyphrase.as_deref()),
		Commands::Config { action } => match action {
			ConfigAction::Show => handle_config_show(),
			ConfigAction::Validate => handle_config_validate(),
		},
	}
}

fn handle_init(force: bool) -> Result<ExitCode> {
	let path = PathBuf::from(PROFILE_FILE_NAME);

	if path.exists() && !force {
		anyhow::bail!("{PROFILE_FILE_NAME} already exists. Use --force to overwrite.");
	}

	write_starter_profile(&path)
		.with_context(|| format!("Failed to write {}", path.display()))?;

	println!("Created {PROFILE_FILE_NAME}");
	Ok(ExitCode::SUCCESS)
}

fn handle_resolve(path: &Path, json: bool, keyphrase: Option<&str>) -> Result<ExitCode> {
	let activity = absolutize(path)?;
	let start_dir = if activity.is_dir() {
		activity.clone()
	} else {
		activity.parent().unwrap_or(Path::new("/")).to_path_buf()
	};

	let mut registry = new_registry(&start_dir, keyphrase)?;
	load_enclosing(&mut registry, &start_dir).context("Failed to load profile files")?;

	let profile = registry
		.resolve(&activity)
		.with_context(|| format!("Failed to resolve {}", activity.display()))?;

	let key = registry.normalize(&activity)?;
	let relative: Vec<String> = key
		.strip_prefix(&profile.context)
		.map(|segments| segments.to_vec())
		.unwrap_or_default();
	let relative_str = relative.join("/");
	let ignored = profile
		.ignore_set()
		.context("Failed to compile ignore patterns")?
		.matches(&relative_str);

	if json {
		println!("{}", serde_json::to_string_pretty(&redacted(&profile))?);
		return Ok(ExitCode::SUCCESS);
	}

	if let Some(ref name) = profile.name {
		println!("profile:     {name}");
	}
	println!("context:     {}", profile.context);
	println!("protocol:    {}", profile.protocol);
	println!("server:      {}:{}", profile.host, profile.port);
	println!("username:    {}", profile.username);
	println!("remote path: {}", profile.remote_of(&relative));
	println!("sync mode:   {}", profile.sync_mode.as_str());
	println!("ignored:     {ignored}");

	Ok(ExitCode::SUCCESS)
}

fn handle_list(json: bool, distinct: bool) -> Result<ExitCode> {
	let cwd = std::env::current_dir().context("Failed to get current directory")?;
	let mut registry = new_registry(&cwd, None)?;
	load_enclosing(&mut registry, &cwd).context("Failed to load profile files")?;

	let profiles: Vec<&SyncProfile> = if distinct {
		registry.distinct_scopes().collect()
	} else {
		registry.list_all().collect()
	};

	if json {
		let payload: Vec<SyncProfile> = profiles.iter().map(|p| redacted(p)).collect();
		println!("{}", serde_json::to_string_pretty(&payload)?);
		return Ok(ExitCode::SUCCESS);
	}

	if profiles.is_empty() {
		println!("No sync scopes registered.");
		return Ok(ExitCode::SUCCESS);
	}

	if distinct {
		println!("Distinct sync targets:\n");
	} else {
		println!("Registered sync scopes:\n");
	}
	for profile in profiles {
		println!("  {} -> {}", profile.context, summary(profile));
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_seal(path: Option<&Path>, keyphrase: Option<&str>) -> Result<ExitCode> {
	let path = match path {
		Some(p) => p.to_path_buf(),
		None => PathBuf::from(PROFILE_FILE_NAME),
	};
	let keyphrase = keyphrase.unwrap_or(berth_cli::secret::DEFAULT_KEYPHRASE);

	let sealed = seal_profile_file(&path, keyphrase)
		.with_context(|| format!("Failed to seal {}", path.display()))?;

	if sealed == 0 {
		println!("Nothing to seal in {}", path.display());
	} else {
		println!("Sealed {sealed} password(s) in {}", path.display());
	}
	Ok(ExitCode::SUCCESS)
}

fn handle_config_show() -> Result<ExitCode> {
	let cwd = std::env::current_dir().context("Failed to get current directory")?;
	let files = discover_profile_files(&cwd);

	if files.is_empty() {
		println!("No profile files found.");
	} else {
		println!("Profile files (nearest first):\n");
		for path in &files {
			let raws = parse_profile_file(path)
				.with_context(|| format!("Failed to load {}", path.display()))?;
			println!("# Source: {}", path.display());
			println!("# entries: {}", raws.len());
			for raw in &raws {
				let label = raw.name.as_deref().or(raw.host.as_deref()).unwrap_or("?");
				match raw.context.as_deref() {
					Some(context) => println!("  {label} (context {context})"),
					None => println!("  {label}"),
				}
			}
			println!();
		}
	}

	if let Ok(user_path) = user_profile_path() {
		println!("User profile path: {}", user_path.display());
		if user_path.exists() {
			println!("  (exists)");
		} else {
			println!("  (not found)");
		}
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_config_validate() -> Result<ExitCode> {
	let cwd = std::env::current_dir().context("Failed to get current directory")?;
	let mut files = discover_profile_files(&cwd);
	if let Ok(user_path) = user_profile_path()
		&& user_path.is_file()
		&& !files.contains(&user_path)
	{
		files.push(user_path);
	}

	if files.is_empty() {
		println!("No profile files found.");
		return Ok(ExitCode::SUCCESS);
	}

	let mut valid = true;
	for path in &files {
		match parse_profile_file(path) {
			Ok(raws) => println!("  {} ({} entries)", path.display(), raws.len()),
			Err(e) => {
				eprintln!("Profile error in {}: {e}", path.display());
				valid = false;
			}
		}
	}

	if valid {
		println!("All profile files are valid.");
		Ok(ExitCode::SUCCESS)
	} else {
		Ok(ExitCode::FAILURE)
	}
}

fn new_registry(base: &Path, keyphrase: Option<&str>) -> Result<ProfileRegistry> {
	let registry = match keyphrase {
		Some(key) => ProfileRegistry::with_keyphrase(base, key),
		None => ProfileRegistry::new(base),
	};
	registry.with_context(|| format!("Invalid base path {}", base.display()))
}

/// Resolve a command-line path against the current directory. Purely
/// lexical; the path itself does not have to exist.
fn absolutize(path: &Path) -> Result<PathBuf> {
	let raw = path.to_string_lossy();
	if raw.starts_with('/') || has_drive_prefix(&raw) {
		return Ok(path.to_path_buf());
	}
	let cwd = std::env::current_dir().context("Failed to get current directory")?;
	Ok(cwd.join(path))
}

/// One-line connection summary for scope listings.
fn summary(profile: &SyncProfile) -> String {
	format!(
		"{}://{}@{}:{}{}",
		profile.protocol, profile.username, profile.host, profile.port, profile.remote_path
	)
}

/// Copy a profile for display, hiding any password it carries.
fn redacted(profile: &SyncProfile) -> SyncProfile {
	let mut copy = profile.clone();
	if copy.password.is_some() {
		copy.password = Some("<redacted>".to_string());
	}
	copy
}
