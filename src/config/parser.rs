use crate::config::types::{LoadedConfig, ProjectConfig};
use crate::error::{EnvError, Result};
use std::path::Path;
use tracing::debug;

/// File name of the project config, looked up in the base directory.
pub const CONFIG_FILE: &str = "envcascade.toml";

/// Parse a config file from the given path.
pub fn parse_config_file(path: &Path) -> Result<ProjectConfig> {
	let content = std::fs::read_to_string(path).map_err(|source| EnvError::ConfigRead {
		path: path.to_path_buf(),
		source,
	})?;

	parse_config_str(&content, path)
}

/// Parse a config from a string (useful for testing).
pub fn parse_config_str(content: &str, path: &Path) -> Result<ProjectConfig> {
	let config: ProjectConfig = toml::from_str(content).map_err(|source| EnvError::ConfigParse {
		path: path.to_path_buf(),
		source,
	})?;

	// Validate the parsed config
	config.validate()?;

	Ok(config)
}

/// Load `envcascade.toml` from `dir` if it exists.
pub fn find_project_config(dir: &Path) -> Result<Option<LoadedConfig>> {
	let path = dir.join(CONFIG_FILE);
	if !path.is_file() {
		return Ok(None);
	}

	debug!(path = %path.display(), "loading project config");
	let config = parse_config_file(&path)?;
	Ok(Some(LoadedConfig { config, path }))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::cascade::{ModePrecedence, NamingStyle, ResolveOptions};
	use crate::requirements::Requirement;
	use serde_json::Value;
	use std::path::PathBuf;

	#[test]
	fn test_parse_empty_config() {
		let content = "";
		let path = PathBuf::from("envcascade.toml");
		let config = parse_config_str(content, &path).unwrap();

		assert!(config.local_naming.is_none());
		assert!(config.mode_key.is_none());
		assert!(config.required.is_empty());
		assert!(config.defaults.is_empty());
	}

	#[test]
	fn test_parse_full_config() {
		let content = r#"
local-naming = "prefix"
mode-naming = "suffix"
mode-key = "APP_ENV"
mode-precedence = "files"
include-environment = false
required = ["DATABASE_URL", { or = [{ key = "APP_ENV", value = "dev" }, "API_TOKEN"] }]

[defaults]
PORT = "8080"
WORKERS = 4
"#;
		let path = PathBuf::from("envcascade.toml");
		let config = parse_config_str(content, &path).unwrap();

		assert_eq!(config.local_naming, Some(NamingStyle::Prefix));
		assert_eq!(config.mode_naming, Some(NamingStyle::Suffix));
		assert_eq!(config.mode_key.as_deref(), Some("APP_ENV"));
		assert_eq!(config.mode_precedence, Some(ModePrecedence::Files));
		assert_eq!(config.include_environment, Some(false));
		assert_eq!(config.required.len(), 2);
		assert_eq!(config.defaults["PORT"], Value::from("8080"));
		assert_eq!(config.defaults["WORKERS"], Value::from(4));
	}

	#[test]
	fn test_unknown_field_is_rejected() {
		let content = "naming = \"prefix\"\n";
		let path = PathBuf::from("envcascade.toml");
		match parse_config_str(content, &path) {
			Err(EnvError::ConfigParse { path, .. }) => {
				assert_eq!(path, PathBuf::from("envcascade.toml"));
			}
			other => panic!("Expected ConfigParse error, got {other:?}"),
		}
	}

	#[test]
	fn test_invalid_key_names() {
		let path = PathBuf::from("envcascade.toml");

		let result = parse_config_str("mode-key = \"\"\n", &path);
		assert!(matches!(result, Err(EnvError::InvalidConfig { ref field, .. }) if field == "mode-key"));

		let result = parse_config_str("required = [{ and = [\"OK\", \"NOT OK\"] }]\n", &path);
		assert!(matches!(result, Err(EnvError::InvalidConfig { ref field, .. }) if field == "required"));
	}

	#[test]
	fn test_apply_layers_onto_options() {
		let content = r#"
mode-naming = "prefix"
required = ["A"]

[defaults]
PORT = "8080"
HOST = "config"
"#;
		let config = parse_config_str(content, Path::new("envcascade.toml")).unwrap();
		let options = ResolveOptions::new("/srv")
			.require(Requirement::key("B"))
			.default_value("HOST", "caller");
		let options = config.apply(options);

		assert_eq!(options.naming.mode, NamingStyle::Prefix);
		assert_eq!(options.naming.local, NamingStyle::Suffix);
		assert_eq!(options.required.len(), 2);
		assert_eq!(options.defaults["PORT"], Value::from("8080"));
		assert_eq!(options.defaults["HOST"], Value::from("caller"));
	}

	#[test]
	fn test_find_project_config() {
		let dir = tempfile::tempdir().unwrap();
		assert!(find_project_config(dir.path()).unwrap().is_none());

		std::fs::write(dir.path().join(CONFIG_FILE), "mode-key = \"STAGE\"\n").unwrap();
		let loaded = find_project_config(dir.path()).unwrap().unwrap();
		assert_eq!(loaded.path, dir.path().join(CONFIG_FILE));
		assert_eq!(loaded.config.mode_key.as_deref(), Some("STAGE"));
	}
}
