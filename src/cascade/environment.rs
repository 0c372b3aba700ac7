use std::collections::{BTreeMap, HashMap};

/// Read access to the ambient key/value store of the process.
///
/// The resolver only reads from it; it never writes back.
pub trait Environment {
	fn var(&self, key: &str) -> Option<String>;

	fn vars(&self) -> Vec<(String, String)>;
}

/// The real process environment. Non-UTF-8 entries are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
	fn var(&self, key: &str) -> Option<String> {
		std::env::var(key).ok()
	}

	fn vars(&self) -> Vec<(String, String)> {
		std::env::vars_os()
			.filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
			.collect()
	}
}

impl Environment for BTreeMap<String, String> {
	fn var(&self, key: &str) -> Option<String> {
		self.get(key).cloned()
	}

	fn vars(&self) -> Vec<(String, String)> {
		self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
	}
}

impl Environment for HashMap<String, String> {
	fn var(&self, key: &str) -> Option<String> {
		self.get(key).cloned()
	}

	fn vars(&self) -> Vec<(String, String)> {
		self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_map_environment() {
		let env = BTreeMap::from([("MODE".to_string(), "test".to_string())]);
		assert_eq!(env.var("MODE"), Some("test".to_string()));
		assert_eq!(env.var("MISSING"), None);
		assert_eq!(env.vars().len(), 1);
	}

	#[test]
	fn test_process_environment_sees_path() {
		#[cfg(unix)]
		{
			assert!(ProcessEnvironment.var("PATH").is_some());
			assert!(ProcessEnvironment.vars().iter().any(|(k, _)| k == "PATH"));
		}
	}
}
