use crate::cascade::naming::{FileLayer, Tier};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Resolved key/value map. Raw values are `Value::String`.
pub type EnvMap = BTreeMap<String, Value>;

/// Where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Origin {
	/// Read from an env file, possibly through an import.
	File { path: PathBuf, tier: Tier },

	/// Taken from the live process environment.
	Environment,

	/// Filled from a caller-supplied default.
	Default,

	/// Produced by the schema; the key did not exist before validation.
	Schema,
}

impl fmt::Display for Origin {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Origin::File { path, tier } => write!(f, "{} ({tier})", path.display()),
			Origin::Environment => f.write_str("environment"),
			Origin::Default => f.write_str("default"),
			Origin::Schema => f.write_str("schema"),
		}
	}
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedEnv {
	pub(crate) values: EnvMap,
	pub(crate) origins: BTreeMap<String, Origin>,
	pub(crate) layers: Vec<FileLayer>,
	pub(crate) mode: Option<String>,
}

impl ResolvedEnv {
	pub fn values(&self) -> &EnvMap {
		&self.values
	}

	pub fn into_values(self) -> EnvMap {
		self.values
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.values.get(key)
	}

	/// String value of `key`; `None` if absent or not a string.
	pub fn get_str(&self, key: &str) -> Option<&str> {
		self.values.get(key).and_then(Value::as_str)
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.values.contains_key(key)
	}

	pub fn origin(&self, key: &str) -> Option<&Origin> {
		self.origins.get(key)
	}

	/// Every file that was read, in merge order, including imported files.
	pub fn layers(&self) -> &[FileLayer] {
		&self.layers
	}

	/// The active mode after resolution.
	pub fn mode(&self) -> Option<&str> {
		self.mode.as_deref()
	}

	/// Deserialize the resolved map into a typed struct.
	pub fn deserialize<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
		let object = self.values.clone().into_iter().collect();
		serde_json::from_value(Value::Object(object))
	}

	/// Values rendered as plain strings, for handing to child processes.
	pub fn to_env_pairs(&self) -> Vec<(String, String)> {
		self.values
			.iter()
			.map(|(key, value)| (key.clone(), display_value(value)))
			.collect()
	}
}

/// Render a value the way it would appear in an env file.
pub fn display_value(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		Value::Null => String::new(),
		other => other.to_string(),
	}
}
