use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;

use envcascade::config::{LoadedConfig, find_project_config, parse_config_file};
use envcascade::exec;
use envcascade::resolved::display_value;
use envcascade::{EnvError, NamingStyle, Requirement, ResolveOptions, ResolvedEnv, Resolver};

#[derive(Parser)]
#[command(name = "envcascade")]
#[command(
	author,
	version,
	about = "Resolve layered .env files with mode chasing and requirement checks"
)]
#[command(arg_required_else_help = true)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	/// Directory holding the .env files
	#[arg(long, global = true, value_name = "DIR", default_value = ".")]
	dir: PathBuf,

	/// Project config file (defaults to envcascade.toml in --dir)
	#[arg(long, global = true, value_name = "FILE")]
	config: Option<PathBuf>,

	/// Mode to resolve, in place of the MODE environment variable
	#[arg(long, global = true)]
	mode: Option<String>,

	/// Naming of local override files
	#[arg(long, global = true, value_enum)]
	local_naming: Option<StyleArg>,

	/// Naming of mode and import files
	#[arg(long, global = true, value_enum)]
	mode_naming: Option<StyleArg>,

	/// Do not fill unset keys from the process environment
	#[arg(long, global = true)]
	no_env: bool,

	/// Require KEY to be set (repeatable)
	#[arg(long = "require", global = true, value_name = "KEY")]
	require: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
	/// Print the resolved environment
	Show {
		/// Output format
		#[arg(long, value_enum, default_value_t = Format::Env)]
		format: Format,

		/// Annotate each key with where its value came from
		#[arg(long)]
		sources: bool,
	},
	/// List the env files that were read, in merge order
	Files,
	/// Resolve and check requirements without printing values
	Check,
	/// Run a command with the resolved environment
	Run {
		/// Command and arguments
		#[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
		args: Vec<String>,
	},
}

#[derive(Clone, Copy, ValueEnum)]
enum StyleArg {
	Prefix,
	Suffix,
}

impl From<StyleArg> for NamingStyle {
	fn from(style: StyleArg) -> Self {
		match style {
			StyleArg::Prefix => NamingStyle::Prefix,
			StyleArg::Suffix => NamingStyle::Suffix,
		}
	}
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
	Env,
	Json,
}

fn main() -> ExitCode {
	if let Err(e) = envcascade::logging::init("warn") {
		eprintln!("warning: failed to initialize logging: {e}");
	}

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
	let options = build_options(&cli)?;
	let mut resolver = Resolver::new();

	match cli.command {
		Commands::Show { format, sources } => {
			let resolved = resolver
				.resolve(&options)
				.context("Failed to resolve environment")?;
			handle_show(resolved, format, sources)
		}
		Commands::Files => {
			let resolved = resolver
				.resolve(&options)
				.context("Failed to resolve environment")?;
			handle_files(resolved)
		}
		Commands::Check => handle_check(&mut resolver, &options),
		Commands::Run { args } => {
			let resolved = resolver
				.resolve(&options)
				.context("Failed to resolve environment")?;
			handle_run(resolved, &args)
		}
	}
}

/// Combine the project config file with command-line flags. Flags win.
fn build_options(cli: &Cli) -> Result<ResolveOptions> {
	let loaded = match cli.config {
		Some(ref path) => Some(LoadedConfig {
			config: parse_config_file(path)
				.with_context(|| format!("Failed to load {}", path.display()))?,
			path: path.clone(),
		}),
		None => find_project_config(&cli.dir).context("Failed to load project config")?,
	};

	let mut options = ResolveOptions::new(&cli.dir);
	if let Some(loaded) = loaded {
		options = loaded.config.apply(options);
	}

	if let Some(style) = cli.local_naming {
		options.naming.local = style.into();
	}
	if let Some(style) = cli.mode_naming {
		options.naming.mode = style.into();
	}
	if let Some(ref mode) = cli.mode {
		options.mode = Some(mode.clone());
	}
	if cli.no_env {
		options.include_environment = false;
	}
	for key in &cli.require {
		options.required.push(Requirement::key(key.clone()));
	}

	Ok(options)
}

fn handle_show(resolved: &ResolvedEnv, format: Format, sources: bool) -> Result<ExitCode> {
	match format {
		Format::Env => {
			for (key, value) in resolved.values() {
				let value = display_value(value);
				match resolved.origin(key) {
					Some(origin) if sources => println!("{key}={value}  # {origin}"),
					_ => println!("{key}={value}"),
				}
			}
		}
		Format::Json => {
			let output = if sources {
				serde_json::json!({
					"values": resolved.values(),
					"sources": resolved
						.values()
						.keys()
						.map(|key| {
							let origin = serde_json::to_value(resolved.origin(key)).unwrap_or_default();
							(key.clone(), origin)
						})
						.collect::<serde_json::Map<_, _>>(),
				})
			} else {
				serde_json::to_value(resolved.values()).context("Failed to serialize values")?
			};
			println!(
				"{}",
				serde_json::to_string_pretty(&output).context("Failed to serialize values")?
			);
		}
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_files(resolved: &ResolvedEnv) -> Result<ExitCode> {
	if resolved.layers().is_empty() {
		println!("No env files found.");
	} else {
		println!("Env files (in merge order):\n");
		for layer in resolved.layers() {
			println!("  {:<10} {}", layer.tier.as_str(), layer.path.display());
		}
	}

	if let Some(mode) = resolved.mode() {
		println!("\nMode: {mode}");
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_check(resolver: &mut Resolver, options: &ResolveOptions) -> Result<ExitCode> {
	match resolver.resolve(options) {
		Ok(resolved) => {
			println!("ok ({} keys)", resolved.values().len());
			Ok(ExitCode::SUCCESS)
		}
		Err(e @ EnvError::MissingRequired { .. }) => {
			eprintln!("{e}");
			Ok(ExitCode::FAILURE)
		}
		Err(e) => Err(e).context("Failed to resolve environment"),
	}
}

fn handle_run(resolved: &ResolvedEnv, args: &[String]) -> Result<ExitCode> {
	let (command, command_args) = args
		.split_first()
		.context("No command given")?;

	let vars = resolved.to_env_pairs();
	let exit_code = exec::run(command, command_args, &vars)
		.with_context(|| format!("Failed to execute: {command}"))?;

	Ok(exec::exit_code(exit_code))
}
