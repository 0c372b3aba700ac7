//! Validation and transformation hooks run after the cascade.

use crate::error::SchemaError;
use crate::resolved::EnvMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

/// Per-key transform applied to the raw string that survived the cascade.
pub type TransformFn = Arc<dyn Fn(&str) -> Result<Value, SchemaError> + Send + Sync>;

/// Validates the merged map and returns its typed replacement.
///
/// Errors are surfaced to the caller unchanged.
pub trait Schema: Send + Sync {
	fn validate(&self, env: EnvMap) -> Result<EnvMap, SchemaError>;
}

impl<F> Schema for F
where
	F: Fn(EnvMap) -> Result<EnvMap, SchemaError> + Send + Sync,
{
	fn validate(&self, env: EnvMap) -> Result<EnvMap, SchemaError> {
		self(env)
	}
}

/// Schema backed by a serde type.
///
/// The map is deserialized into `T` (so `#[serde(default)]` and
/// `deserialize_with` apply) and serialized back, which yields the typed,
/// defaulted map.
pub struct TypedSchema<T> {
	_marker: PhantomData<fn() -> T>,
}

impl<T> TypedSchema<T> {
	pub fn new() -> Self {
		Self {
			_marker: PhantomData,
		}
	}
}

impl<T> Default for TypedSchema<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> Schema for TypedSchema<T>
where
	T: DeserializeOwned + Serialize,
{
	fn validate(&self, env: EnvMap) -> Result<EnvMap, SchemaError> {
		let typed: T = serde_json::from_value(Value::Object(env.into_iter().collect()))?;
		match serde_json::to_value(&typed)? {
			Value::Object(map) => Ok(map.into_iter().collect()),
			other => Err(format!("schema must serialize to a map, got {other}").into()),
		}
	}
}

/// Transform parsing the raw value with `FromStr`, e.g. `parse::<u16>()`.
pub fn parse<T>() -> TransformFn
where
	T: std::str::FromStr + Serialize + 'static,
	T::Err: std::error::Error + Send + Sync + 'static,
{
	Arc::new(|raw: &str| -> Result<Value, SchemaError> {
		let parsed: T = raw.trim().parse()?;
		Ok(serde_json::to_value(parsed)?)
	})
}

/// Transform mapping `true`/`1`/`yes`/`on` (any case) to `true`, all else to `false`.
pub fn flag() -> TransformFn {
	Arc::new(|raw: &str| -> Result<Value, SchemaError> {
		let lower = raw.trim().to_lowercase();
		Ok(Value::Bool(matches!(lower.as_str(), "true" | "1" | "yes" | "on")))
	})
}
