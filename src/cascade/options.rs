use crate::cascade::naming::{NamingConvention, NamingStyle};
use crate::error::SchemaError;
use crate::requirements::Requirement;
use crate::schema::{Schema, TransformFn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default key holding the active mode.
pub const DEFAULT_MODE_KEY: &str = "MODE";

/// Which mode source seeds the chase and ends up in the resolved map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModePrecedence {
	/// The live mode seeds the chase and is what the resolved map reports.
	/// Files only choose the mode when the live environment has none.
	#[default]
	Environment,

	/// A mode set by the base or local file seeds the chase, the live mode is
	/// only a fallback, and the chase result is reported.
	Files,
}

/// Inputs to one resolution pass.
#[derive(Clone)]
pub struct ResolveOptions {
	/// Directory holding `.env` and its siblings.
	pub base_path: PathBuf,

	/// Top-level requirements, checked as an implicit `and`.
	pub required: Vec<Requirement>,

	/// Replaces the merged map with its validated form.
	pub schema: Option<Arc<dyn Schema>>,

	/// Ignore a cached result and resolve again.
	pub force: bool,

	pub naming: NamingConvention,

	pub mode_key: String,

	pub mode_precedence: ModePrecedence,

	/// Explicit mode, used in place of the live environment's mode.
	pub mode: Option<String>,

	/// Merge the live environment as the lowest-priority layer.
	pub include_environment: bool,

	/// Per-key transforms applied to raw values that survived the cascade.
	pub transforms: BTreeMap<String, TransformFn>,

	/// Values for keys still unset after the cascade.
	pub defaults: BTreeMap<String, Value>,
}

impl ResolveOptions {
	pub fn new(base_path: impl Into<PathBuf>) -> Self {
		Self {
			base_path: base_path.into(),
			..Default::default()
		}
	}

	pub fn require(mut self, requirement: Requirement) -> Self {
		self.required.push(requirement);
		self
	}

	pub fn with_schema(mut self, schema: impl Schema + 'static) -> Self {
		self.schema = Some(Arc::new(schema));
		self
	}

	pub fn force(mut self, force: bool) -> Self {
		self.force = force;
		self
	}

	pub fn local_naming(mut self, style: NamingStyle) -> Self {
		self.naming.local = style;
		self
	}

	pub fn mode_naming(mut self, style: NamingStyle) -> Self {
		self.naming.mode = style;
		self
	}

	pub fn mode_key(mut self, key: impl Into<String>) -> Self {
		self.mode_key = key.into();
		self
	}

	pub fn mode_precedence(mut self, precedence: ModePrecedence) -> Self {
		self.mode_precedence = precedence;
		self
	}

	pub fn mode(mut self, mode: impl Into<String>) -> Self {
		self.mode = Some(mode.into());
		self
	}

	pub fn include_environment(mut self, include: bool) -> Self {
		self.include_environment = include;
		self
	}

	pub fn transform(
		mut self,
		key: impl Into<String>,
		transform: impl Fn(&str) -> Result<Value, SchemaError> + Send + Sync + 'static,
	) -> Self {
		self.transforms.insert(key.into(), Arc::new(transform));
		self
	}

	pub fn default_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.defaults.insert(key.into(), value.into());
		self
	}
}

impl Default for ResolveOptions {
	fn default() -> Self {
		Self {
			base_path: PathBuf::from("."),
			required: Vec::new(),
			schema: None,
			force: false,
			naming: NamingConvention::default(),
			mode_key: DEFAULT_MODE_KEY.to_string(),
			mode_precedence: ModePrecedence::default(),
			mode: None,
			include_environment: true,
			transforms: BTreeMap::new(),
			defaults: BTreeMap::new(),
		}
	}
}

impl fmt::Debug for ResolveOptions {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ResolveOptions")
			.field("base_path", &self.base_path)
			.field("required", &self.required)
			.field("schema", &self.schema.is_some())
			.field("force", &self.force)
			.field("naming", &self.naming)
			.field("mode_key", &self.mode_key)
			.field("mode_precedence", &self.mode_precedence)
			.field("mode", &self.mode)
			.field("include_environment", &self.include_environment)
			.field("transforms", &self.transforms.keys().collect::<Vec<_>>())
			.field("defaults", &self.defaults)
			.finish()
	}
}
