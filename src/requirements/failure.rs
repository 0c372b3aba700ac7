use std::fmt;

/// The failing path through a requirement tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequirementFailure {
	/// A required key is absent.
	Missing(String),

	/// A key is absent or holds a different value.
	Mismatch { key: String, expected: String },

	/// The child at `index` of an `all` node failed.
	All {
		index: usize,
		failure: Box<RequirementFailure>,
	},

	/// Every child of an `any` node failed.
	Any(Vec<RequirementFailure>),

	/// A caller-supplied predicate returned false.
	Predicate(Option<String>),
}

impl fmt::Display for RequirementFailure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			RequirementFailure::Missing(key) => f.write_str(key),
			RequirementFailure::Mismatch { key, expected } => write!(f, "{key}={expected}"),
			RequirementFailure::All { failure, .. } => write!(f, "{failure}"),
			RequirementFailure::Any(failures) => {
				f.write_str("[")?;
				for (i, failure) in failures.iter().enumerate() {
					if i > 0 {
						f.write_str(", ")?;
					}
					write!(f, "{failure}")?;
				}
				f.write_str("]")
			}
			RequirementFailure::Predicate(label) => f.write_str(label.as_deref().unwrap_or("")),
		}
	}
}
