use crate::cascade::{ModePrecedence, NamingStyle, ResolveOptions};
use crate::error::EnvError;
use crate::requirements::Requirement;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::LazyLock;

static KEY_NAME: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*$").expect("key pattern is valid"));

/// Project configuration from an `envcascade.toml` file.
///
/// Every field is optional; unset fields keep the library defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ProjectConfig {
	/// `prefix` for `local.env`, `suffix` for `.env.local`.
	pub local_naming: Option<NamingStyle>,

	/// `prefix` for `<mode>.env`, `suffix` for `.env.<mode>`.
	pub mode_naming: Option<NamingStyle>,

	/// Key holding the active mode.
	pub mode_key: Option<String>,

	pub mode_precedence: Option<ModePrecedence>,

	/// Whether the process environment fills keys no file set.
	pub include_environment: Option<bool>,

	/// Requirements checked after resolution.
	#[serde(default)]
	pub required: Vec<Requirement>,

	/// Values for keys nothing else set.
	#[serde(default)]
	pub defaults: BTreeMap<String, Value>,
}

/// A loaded project configuration with its source path.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
	pub config: ProjectConfig,
	pub path: PathBuf,
}

impl ProjectConfig {
	/// Check key names and the mode key.
	pub fn validate(&self) -> Result<(), EnvError> {
		if let Some(ref mode_key) = self.mode_key {
			check_key("mode-key", mode_key)?;
		}

		for key in self.defaults.keys() {
			check_key("defaults", key)?;
		}

		for requirement in &self.required {
			check_requirement(requirement)?;
		}

		Ok(())
	}

	/// Layer this config onto `options`. Fields already chosen by the caller
	/// are overwritten only where the config sets them.
	pub fn apply(&self, mut options: ResolveOptions) -> ResolveOptions {
		if let Some(style) = self.local_naming {
			options.naming.local = style;
		}
		if let Some(style) = self.mode_naming {
			options.naming.mode = style;
		}
		if let Some(ref key) = self.mode_key {
			options.mode_key = key.clone();
		}
		if let Some(precedence) = self.mode_precedence {
			options.mode_precedence = precedence;
		}
		if let Some(include) = self.include_environment {
			options.include_environment = include;
		}

		options.required.extend(self.required.iter().cloned());
		for (key, value) in &self.defaults {
			options
				.defaults
				.entry(key.clone())
				.or_insert_with(|| value.clone());
		}

		options
	}
}

fn check_key(field: &str, key: &str) -> Result<(), EnvError> {
	if KEY_NAME.is_match(key) {
		Ok(())
	} else {
		Err(EnvError::InvalidConfig {
			field: field.to_string(),
			reason: format!("invalid key name {key:?}"),
		})
	}
}

fn check_requirement(requirement: &Requirement) -> Result<(), EnvError> {
	match requirement {
		Requirement::Key(key) | Requirement::Equals { key, .. } => check_key("required", key),
		Requirement::All(children) | Requirement::Any(children) => {
			children.iter().try_for_each(check_requirement)
		}
		Requirement::Predicate { .. } => Ok(()),
	}
}
