//! Running a command under a resolved environment.
//!
//! This module handles:
//! - Locating the command on PATH
//! - Executing it with the resolved values added to its environment
//! - Exit code propagation

use crate::error::{EnvError, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode, ExitStatus, Stdio};
use tracing::debug;

/// Execute a command with the given variables layered over the inherited
/// environment.
///
/// stdin, stdout and stderr pass through to the child process.
pub fn execute_command(
	binary: &Path,
	args: &[String],
	vars: &[(String, String)],
) -> Result<ExitStatus> {
	debug!(command = %binary.display(), vars = vars.len(), "executing command");

	let mut cmd = Command::new(binary);
	cmd.args(args)
		.envs(vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
		.stdin(Stdio::inherit())
		.stdout(Stdio::inherit())
		.stderr(Stdio::inherit());

	let status = cmd.status().map_err(|source| {
		if source.kind() == std::io::ErrorKind::NotFound {
			EnvError::CommandNotFound {
				command: binary.to_string_lossy().to_string(),
			}
		} else {
			EnvError::CommandFailed {
				command: binary.to_string_lossy().to_string(),
				source,
			}
		}
	})?;

	Ok(status)
}

/// Resolve a command name to its full path.
///
/// Paths containing a separator are returned as-is if they exist. Otherwise
/// the resolved `PATH` (falling back to the process `PATH`) is searched.
pub fn resolve_command(command: &str, search_path: Option<&str>) -> Option<PathBuf> {
	let path = Path::new(command);

	if path.components().count() > 1 || path.is_absolute() {
		return path.exists().then(|| path.to_path_buf());
	}

	let process_path = std::env::var("PATH").ok();
	let path_var = search_path.or(process_path.as_deref())?;
	std::env::split_paths(path_var)
		.map(|dir| dir.join(command))
		.find(|full_path| full_path.is_file())
}

/// Resolve and run a command, mapping a missing binary to an error.
pub fn run(command: &str, args: &[String], vars: &[(String, String)]) -> Result<i32> {
	let search_path = vars
		.iter()
		.find(|(key, _)| key == "PATH")
		.map(|(_, value)| value.as_str());
	let binary = resolve_command(command, search_path).ok_or_else(|| EnvError::CommandNotFound {
		command: command.to_string(),
	})?;

	let status = execute_command(&binary, args, vars)?;
	Ok(status.code().unwrap_or(1))
}

/// Map a child's exit code onto our own. Codes outside `0..=255` become a
/// generic failure instead of being truncated.
pub fn exit_code(code: i32) -> ExitCode {
	u8::try_from(code).map_or(ExitCode::FAILURE, ExitCode::from)
}
