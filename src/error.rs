use crate::requirements::RequirementFailure;
use std::path::PathBuf;

/// Boxed error returned by schema validators and transform functions.
pub type SchemaError = Box<dyn std::error::Error + Send + Sync>;

/// Library-level structured errors for envcascade.
///
/// Use `thiserror` for structured errors that library consumers can match on.
/// The CLI binary wraps these with `anyhow` for rich context chains.
#[derive(Debug, thiserror::Error)]
pub enum EnvError {
	#[error("Missing required environment variable: {failure}")]
	MissingRequired { failure: RequirementFailure },

	/// Passed through from the schema collaborator untouched.
	#[error(transparent)]
	Validation(SchemaError),

	#[error("Failed to transform value of {key}")]
	Transform {
		key: String,
		#[source]
		source: SchemaError,
	},

	#[error("Failed to read env file: {path}")]
	EnvFileRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Cyclic import: {}", format_chain(.chain))]
	CyclicImport { chain: Vec<PathBuf> },

	#[error("Mode cycle: {}", .chain.join(" -> "))]
	ModeCycle { chain: Vec<String> },

	#[error("Failed to read config file: {path}")]
	ConfigRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse config file: {path}")]
	ConfigParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Command execution failed: {command}")]
	CommandFailed {
		command: String,
		#[source]
		source: std::io::Error,
	},

	#[error("Command not found: {command}")]
	CommandNotFound { command: String },

	#[error("Invalid config value for {field}: {reason}")]
	InvalidConfig { field: String, reason: String },
}

fn format_chain(chain: &[PathBuf]) -> String {
	chain
		.iter()
		.map(|p| p.display().to_string())
		.collect::<Vec<_>>()
		.join(" -> ")
}

/// Result type alias using EnvError.
pub type Result<T> = std::result::Result<T, EnvError>;
