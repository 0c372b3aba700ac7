use crate::requirements::failure::RequirementFailure;
use crate::resolved::EnvMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Caller-supplied check over the whole resolved map.
pub type PredicateFn = Arc<dyn Fn(&EnvMap) -> bool + Send + Sync>;

/// A constraint on the resolved environment.
#[derive(Clone)]
pub enum Requirement {
	/// The key must be present. Empty values count as present.
	Key(String),

	/// The key must hold exactly this value.
	Equals { key: String, value: String },

	/// Every child must hold.
	All(Vec<Requirement>),

	/// At least one child must hold.
	Any(Vec<Requirement>),

	/// Opaque check with an optional label used when rendering failures.
	Predicate {
		label: Option<String>,
		check: PredicateFn,
	},
}

impl Requirement {
	pub fn key(key: impl Into<String>) -> Self {
		Requirement::Key(key.into())
	}

	pub fn equals(key: impl Into<String>, value: impl Into<String>) -> Self {
		Requirement::Equals {
			key: key.into(),
			value: value.into(),
		}
	}

	pub fn all(children: impl IntoIterator<Item = Requirement>) -> Self {
		Requirement::All(children.into_iter().collect())
	}

	pub fn any(children: impl IntoIterator<Item = Requirement>) -> Self {
		Requirement::Any(children.into_iter().collect())
	}

	pub fn predicate(check: impl Fn(&EnvMap) -> bool + Send + Sync + 'static) -> Self {
		Requirement::Predicate {
			label: None,
			check: Arc::new(check),
		}
	}

	pub fn labeled_predicate(
		label: impl Into<String>,
		check: impl Fn(&EnvMap) -> bool + Send + Sync + 'static,
	) -> Self {
		Requirement::Predicate {
			label: Some(label.into()),
			check: Arc::new(check),
		}
	}
}

impl fmt::Debug for Requirement {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Requirement::Key(key) => f.debug_tuple("Key").field(key).finish(),
			Requirement::Equals { key, value } => f
				.debug_struct("Equals")
				.field("key", key)
				.field("value", value)
				.finish(),
			Requirement::All(children) => f.debug_tuple("All").field(children).finish(),
			Requirement::Any(children) => f.debug_tuple("Any").field(children).finish(),
			Requirement::Predicate { label, .. } => f
				.debug_struct("Predicate")
				.field("label", label)
				.finish_non_exhaustive(),
		}
	}
}

/// Evaluate `requirement` against `env`.
///
/// Returns `None` when satisfied. `All` stops at its first failing child;
/// `Any` evaluates every child and reports all of their failures.
pub fn solve(requirement: &Requirement, env: &EnvMap) -> Option<RequirementFailure> {
	match requirement {
		Requirement::Key(key) => {
			if env.contains_key(key) {
				None
			} else {
				Some(RequirementFailure::Missing(key.clone()))
			}
		}
		Requirement::Equals { key, value } => {
			if env.get(key).is_some_and(|actual| value_matches(actual, value)) {
				None
			} else {
				Some(RequirementFailure::Mismatch {
					key: key.clone(),
					expected: value.clone(),
				})
			}
		}
		Requirement::All(children) => {
			children.iter().enumerate().find_map(|(index, child)| {
				solve(child, env).map(|failure| RequirementFailure::All {
					index,
					failure: Box::new(failure),
				})
			})
		}
		Requirement::Any(children) => {
			let mut failures = Vec::with_capacity(children.len());
			for child in children {
				match solve(child, env) {
					None => return None,
					Some(failure) => failures.push(failure),
				}
			}
			Some(RequirementFailure::Any(failures))
		}
		Requirement::Predicate { label, check } => {
			if check(env) {
				None
			} else {
				Some(RequirementFailure::Predicate(label.clone()))
			}
		}
	}
}

/// Evaluate a top-level list, which is an implicit `All`.
pub fn solve_all(requirements: &[Requirement], env: &EnvMap) -> Option<RequirementFailure> {
	requirements.iter().enumerate().find_map(|(index, child)| {
		solve(child, env).map(|failure| RequirementFailure::All {
			index,
			failure: Box::new(failure),
		})
	})
}

fn value_matches(actual: &Value, expected: &str) -> bool {
	match actual {
		Value::String(s) => s == expected,
		other => other.to_string() == expected,
	}
}

/// Serialized shape of a requirement in config files.
///
/// A bare string is a key, `{ key, value }` is an equality check, and
/// `{ and = [...] }` / `{ or = [...] }` nest.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RequirementDef {
	Key(String),
	Equals { key: String, value: String },
	And { and: Vec<RequirementDef> },
	Or { or: Vec<RequirementDef> },
}

impl From<RequirementDef> for Requirement {
	fn from(def: RequirementDef) -> Self {
		match def {
			RequirementDef::Key(key) => Requirement::Key(key),
			RequirementDef::Equals { key, value } => Requirement::Equals { key, value },
			RequirementDef::And { and } => Requirement::all(and.into_iter().map(Into::into)),
			RequirementDef::Or { or } => Requirement::any(or.into_iter().map(Into::into)),
		}
	}
}

impl<'de> Deserialize<'de> for Requirement {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		RequirementDef::deserialize(deserializer).map(Requirement::from)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn env(pairs: &[(&str, &str)]) -> EnvMap {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
			.collect()
	}

	#[test]
	fn test_key_presence_not_truthiness() {
		let env = env(&[("EMPTY", "")]);
		assert_eq!(solve(&Requirement::key("EMPTY"), &env), None);
		assert_eq!(
			solve(&Requirement::key("ABSENT"), &env),
			Some(RequirementFailure::Missing("ABSENT".into()))
		);
	}

	#[test]
	fn test_equals_exact_match() {
		let env = env(&[("K", "1")]);
		assert_eq!(solve(&Requirement::equals("K", "1"), &env), None);
		assert_eq!(
			solve(&Requirement::equals("K", "01"), &env),
			Some(RequirementFailure::Mismatch {
				key: "K".into(),
				expected: "01".into()
			})
		);
		assert!(solve(&Requirement::equals("ABSENT", ""), &env).is_some());
	}

	#[test]
	fn test_equals_typed_value() {
		let mut env = EnvMap::new();
		env.insert("PORT".into(), Value::from(8080));
		env.insert("DEBUG".into(), Value::Bool(true));
		assert_eq!(solve(&Requirement::equals("PORT", "8080"), &env), None);
		assert_eq!(solve(&Requirement::equals("DEBUG", "true"), &env), None);
	}

	#[test]
	fn test_all_reports_first_failure_with_index() {
		let env = env(&[("A", "1")]);
		let requirement = Requirement::all([
			Requirement::key("A"),
			Requirement::key("B"),
			Requirement::key("C"),
		]);
		assert_eq!(
			solve(&requirement, &env),
			Some(RequirementFailure::All {
				index: 1,
				failure: Box::new(RequirementFailure::Missing("B".into())),
			})
		);
	}

	#[test]
	fn test_empty_all_holds_and_empty_any_fails() {
		let env = EnvMap::new();
		assert_eq!(solve(&Requirement::all([]), &env), None);
		assert_eq!(
			solve(&Requirement::any([]), &env),
			Some(RequirementFailure::Any(vec![]))
		);
	}

	#[test]
	fn test_any_collects_every_failure() {
		let env = env(&[("K", "1")]);
		let requirement = Requirement::any([Requirement::key("X"), Requirement::equals("K", "2")]);
		let failure = solve(&requirement, &env).unwrap();
		assert_eq!(failure.to_string(), "[X, K=2]");
	}

	#[test]
	fn test_any_succeeds_on_later_branch() {
		let env = env(&[("K", "3"), ("K2", "x")]);
		let requirement = Requirement::any([
			Requirement::all([Requirement::equals("K", "2"), Requirement::key("K2")]),
			Requirement::all([Requirement::equals("K", "3"), Requirement::key("K2")]),
		]);
		assert_eq!(solve(&requirement, &env), None);
	}

	#[test]
	fn test_or_of_ands_reports_first_failing_member_per_branch() {
		let env = env(&[("K1", "x"), ("K", "1")]);
		let requirements = vec![
			Requirement::key("K1"),
			Requirement::any([
				Requirement::all([Requirement::equals("K", "2"), Requirement::key("K2")]),
				Requirement::all([Requirement::equals("K", "3"), Requirement::key("K2")]),
			]),
		];
		let failure = solve_all(&requirements, &env).unwrap();
		assert_eq!(failure.to_string(), "[K=2, K=3]");
	}

	#[test]
	fn test_or_branch_reports_missing_key_after_match() {
		let env = env(&[("K", "2")]);
		let requirement = Requirement::any([
			Requirement::all([Requirement::equals("K", "2"), Requirement::key("K2")]),
			Requirement::all([Requirement::equals("K", "3"), Requirement::key("K2")]),
		]);
		assert_eq!(solve(&requirement, &env).unwrap().to_string(), "[K2, K=3]");
	}

	#[test]
	fn test_predicate() {
		let env = env(&[("PORT", "70000")]);
		let in_range = Requirement::labeled_predicate("PORT < 65536", |env| {
			env.get("PORT")
				.and_then(Value::as_str)
				.and_then(|s| s.parse::<u32>().ok())
				.is_some_and(|port| port < 65536)
		});
		assert_eq!(solve(&in_range, &env).unwrap().to_string(), "PORT < 65536");

		let anonymous = Requirement::predicate(|_| false);
		assert_eq!(
			solve(&anonymous, &env),
			Some(RequirementFailure::Predicate(None))
		);
		assert_eq!(solve(&Requirement::predicate(|_| true), &env), None);
	}

	#[test]
	fn test_deserialize_from_toml() {
		#[derive(Deserialize)]
		struct Doc {
			required: Vec<Requirement>,
		}

		let doc: Doc = toml::from_str(
			r#"
required = [
    "ALWAYS",
    { or = [
        { and = [{ key = "K", value = "1" }, "IF_1"] },
        { and = [{ key = "K", value = "2" }, "IF_2"] },
    ] },
]
"#,
		)
		.unwrap();

		assert_eq!(doc.required.len(), 2);
		assert!(matches!(&doc.required[0], Requirement::Key(k) if k == "ALWAYS"));
		match &doc.required[1] {
			Requirement::Any(branches) => {
				assert_eq!(branches.len(), 2);
				assert!(matches!(&branches[0], Requirement::All(c) if c.len() == 2));
			}
			other => panic!("Expected Any, got {other:?}"),
		}

		let env = env(&[("ALWAYS", "1"), ("K", "2")]);
		let failure = solve_all(&doc.required, &env).unwrap();
		assert_eq!(failure.to_string(), "[K=1, IF_2]");
	}
}
