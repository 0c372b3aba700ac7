use crate::cascade::lines::{Line, read_env_file};
use crate::cascade::naming::NamingConvention;
use crate::error::{EnvError, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::trace;

/// One assignment after import expansion, tagged with the file it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
	pub key: String,
	pub value: String,
	pub source: PathBuf,
}

/// Flattened contents of an env file with all imports spliced in.
#[derive(Debug, Clone, Default)]
pub struct Expansion {
	/// Assignments in file order.
	pub entries: Vec<Entry>,

	/// Every imported file that was read, in the order it was read.
	pub imported: Vec<PathBuf>,
}

impl Expansion {
	/// Collapse to one value per key. Later lines win.
	pub fn collapse(&self) -> BTreeMap<&str, &Entry> {
		let mut values = BTreeMap::new();
		for entry in &self.entries {
			values.insert(entry.key.as_str(), entry);
		}
		values
	}

	/// Value the expansion assigns to `key`, if any.
	pub fn last_value(&self, key: &str) -> Option<&str> {
		self.entries
			.iter()
			.rev()
			.find(|entry| entry.key == key)
			.map(|entry| entry.value.as_str())
	}
}

/// Expands `import` directives recursively.
#[derive(Debug, Clone, Copy)]
pub struct ImportExpander<'a> {
	naming: &'a NamingConvention,
	mode_key: &'a str,
}

impl<'a> ImportExpander<'a> {
	pub fn new(naming: &'a NamingConvention, mode_key: &'a str) -> Self {
		Self { naming, mode_key }
	}

	/// Read `path` and splice in every file it imports, transitively.
	///
	/// For each `import name` the local variant is spliced before the shared
	/// one, so the shared file's lines come later and win on collapse. Mode
	/// assignments inside imported content are dropped. Missing import targets
	/// are skipped.
	pub fn expand(&self, path: &Path) -> Result<Expansion> {
		let mut expansion = Expansion::default();
		let mut stack = Vec::new();
		self.expand_into(path, false, &mut stack, &mut expansion)?;
		Ok(expansion)
	}

	fn expand_into(
		&self,
		path: &Path,
		imported: bool,
		stack: &mut Vec<PathBuf>,
		out: &mut Expansion,
	) -> Result<()> {
		let identity = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
		if stack.contains(&identity) {
			let mut chain = stack.clone();
			chain.push(identity);
			return Err(EnvError::CyclicImport { chain });
		}
		stack.push(identity);

		if imported {
			out.imported.push(path.to_path_buf());
		}

		let dir = path.parent().unwrap_or_else(|| Path::new("."));
		for line in read_env_file(path)? {
			match line {
				Line::Assignment { key, value } => {
					if imported && key == self.mode_key {
						trace!(path = %path.display(), "dropping mode assignment from imported file");
						continue;
					}
					out.entries.push(Entry {
						key,
						value,
						source: path.to_path_buf(),
					});
				}
				Line::Import(target) => {
					for candidate in self.import_candidates(dir, &target) {
						if candidate.is_file() {
							trace!(from = %path.display(), import = %candidate.display(), "expanding import");
							self.expand_into(&candidate, true, stack, out)?;
						} else {
							trace!(from = %path.display(), import = %candidate.display(), "import target not found");
						}
					}
				}
			}
		}

		stack.pop();
		Ok(())
	}

	/// Local variant first, then the shared file, relative to `dir`.
	fn import_candidates(&self, dir: &Path, target: &str) -> [PathBuf; 2] {
		let target = Path::new(target);
		let name = target
			.file_name()
			.map(|name| name.to_string_lossy().into_owned())
			.unwrap_or_default();
		let target_dir = match target.parent() {
			Some(parent) if !parent.as_os_str().is_empty() => dir.join(parent),
			_ => dir.to_path_buf(),
		};

		[
			target_dir.join(self.naming.file_name(Some(&name), true)),
			target_dir.join(self.naming.file_name(Some(&name), false)),
		]
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::cascade::naming::NamingStyle;
	use std::fs;

	fn prefix_naming() -> NamingConvention {
		NamingConvention::new(NamingStyle::Prefix, NamingStyle::Prefix)
	}

	#[test]
	fn test_expand_without_imports() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join(".env");
		fs::write(&path, "A=1\nB=2\n").unwrap();

		let naming = prefix_naming();
		let expansion = ImportExpander::new(&naming, "MODE").expand(&path).unwrap();

		assert_eq!(expansion.entries.len(), 2);
		assert!(expansion.imported.is_empty());
		assert_eq!(expansion.entries[0].source, path);
	}

	#[test]
	fn test_local_spliced_before_shared() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("mode.env");
		fs::write(&path, "BEFORE=1\nimport shared\nAFTER=1\n").unwrap();
		fs::write(dir.path().join("local.shared.env"), "SHARED=local\nONLY_LOCAL=1\n").unwrap();
		fs::write(dir.path().join("shared.env"), "SHARED=shared\n").unwrap();

		let naming = prefix_naming();
		let expansion = ImportExpander::new(&naming, "MODE").expand(&path).unwrap();

		let keys: Vec<_> = expansion.entries.iter().map(|e| e.key.as_str()).collect();
		assert_eq!(keys, vec!["BEFORE", "SHARED", "ONLY_LOCAL", "SHARED", "AFTER"]);

		let collapsed = expansion.collapse();
		assert_eq!(collapsed["SHARED"].value, "shared");
		assert_eq!(collapsed["ONLY_LOCAL"].value, "1");
		assert_eq!(
			expansion.imported,
			vec![
				dir.path().join("local.shared.env"),
				dir.path().join("shared.env")
			]
		);
	}

	#[test]
	fn test_nested_imports_resolve_relative_to_importing_file() {
		let dir = tempfile::tempdir().unwrap();
		let nested = dir.path().join("nested");
		fs::create_dir(&nested).unwrap();

		let path = dir.path().join(".env");
		fs::write(&path, "import nested/outer\n").unwrap();
		fs::write(nested.join("outer.env"), "OUTER=1\nimport deep.outer\n").unwrap();
		fs::write(nested.join("deep.outer.env"), "DEEP=1\n").unwrap();
		fs::write(nested.join("local.deep.outer.env"), "LOCAL_DEEP=1\n").unwrap();

		let naming = prefix_naming();
		let expansion = ImportExpander::new(&naming, "MODE").expand(&path).unwrap();
		let collapsed = expansion.collapse();

		assert_eq!(collapsed["OUTER"].value, "1");
		assert_eq!(collapsed["DEEP"].value, "1");
		assert_eq!(collapsed["LOCAL_DEEP"].value, "1");
		assert_eq!(collapsed["DEEP"].source, nested.join("deep.outer.env"));
	}

	#[test]
	fn test_suffix_import_names() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join(".env");
		fs::write(&path, "import db\n").unwrap();
		fs::write(dir.path().join(".env.db"), "DB=shared\n").unwrap();
		fs::write(dir.path().join(".env.db.local"), "DB=local\n").unwrap();

		let naming = NamingConvention::default();
		let expansion = ImportExpander::new(&naming, "MODE").expand(&path).unwrap();

		assert_eq!(expansion.last_value("DB"), Some("shared"));
	}

	#[test]
	fn test_mode_assignment_dropped_from_imports_only() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("a.env");
		fs::write(&path, "MODE=a\nimport other\n").unwrap();
		fs::write(dir.path().join("other.env"), "MODE=hijack\nX=1\n").unwrap();

		let naming = prefix_naming();
		let expansion = ImportExpander::new(&naming, "MODE").expand(&path).unwrap();

		assert_eq!(expansion.last_value("MODE"), Some("a"));
		assert_eq!(expansion.last_value("X"), Some("1"));
	}

	#[test]
	fn test_missing_import_is_skipped() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join(".env");
		fs::write(&path, "import nowhere\nA=1\n").unwrap();

		let naming = prefix_naming();
		let expansion = ImportExpander::new(&naming, "MODE").expand(&path).unwrap();

		assert_eq!(expansion.entries.len(), 1);
		assert!(expansion.imported.is_empty());
	}

	#[test]
	fn test_cyclic_import_fails() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join(".env");
		fs::write(&path, "import a\n").unwrap();
		fs::write(dir.path().join("a.env"), "import b\n").unwrap();
		fs::write(dir.path().join("b.env"), "import a\n").unwrap();

		let naming = prefix_naming();
		let result = ImportExpander::new(&naming, "MODE").expand(&path);

		match result {
			Err(EnvError::CyclicImport { chain }) => {
				let names: Vec<_> = chain
					.iter()
					.map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
					.collect();
				assert_eq!(names, vec![".env", "a.env", "b.env", "a.env"]);
			}
			other => panic!("Expected CyclicImport error, got {other:?}"),
		}
	}

	#[test]
	fn test_diamond_import_is_not_a_cycle() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join(".env");
		fs::write(&path, "import a\nimport b\n").unwrap();
		fs::write(dir.path().join("a.env"), "import common\n").unwrap();
		fs::write(dir.path().join("b.env"), "import common\n").unwrap();
		fs::write(dir.path().join("common.env"), "COMMON=1\n").unwrap();

		let naming = prefix_naming();
		let expansion = ImportExpander::new(&naming, "MODE").expand(&path).unwrap();

		assert_eq!(expansion.entries.len(), 2);
		assert_eq!(expansion.last_value("COMMON"), Some("1"));
	}
}
