use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Name of the base env file.
pub const BASE_FILE: &str = ".env";

/// Qualifier used for machine-local override files.
pub const LOCAL_QUALIFIER: &str = "local";

/// Where a qualifier goes relative to the `env` stem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamingStyle {
	/// `local.env`, `<mode>.env`
	Prefix,

	/// `.env.local`, `.env.<mode>`
	#[default]
	Suffix,
}

/// Naming convention, chosen independently for the local and mode axes.
///
/// The mode axis also names import targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NamingConvention {
	pub local: NamingStyle,
	pub mode: NamingStyle,
}

impl NamingConvention {
	pub fn new(local: NamingStyle, mode: NamingStyle) -> Self {
		Self { local, mode }
	}

	/// Build a file name from an optional name qualifier and the local flag.
	///
	/// Prefix qualifiers stack outward (`local.<name>.env`), suffix qualifiers
	/// stack inward (`.env.<name>.local`).
	pub fn file_name(&self, name: Option<&str>, local: bool) -> String {
		let mut prefixes: Vec<&str> = Vec::new();
		let mut suffixes: Vec<&str> = Vec::new();

		if local {
			match self.local {
				NamingStyle::Prefix => prefixes.push(LOCAL_QUALIFIER),
				NamingStyle::Suffix => suffixes.push(LOCAL_QUALIFIER),
			}
		}

		if let Some(name) = name {
			match self.mode {
				NamingStyle::Prefix => prefixes.push(name),
				NamingStyle::Suffix => suffixes.insert(0, name),
			}
		}

		let mut file_name = String::new();
		if !prefixes.is_empty() {
			file_name.push_str(&prefixes.join("."));
		}
		file_name.push_str(BASE_FILE);
		for suffix in suffixes {
			file_name.push('.');
			file_name.push_str(suffix);
		}
		file_name
	}
}

/// Which step of the cascade a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
	Base,
	Local,
	Mode,
	ModeLocal,
	Import,
}

impl Tier {
	pub fn as_str(&self) -> &'static str {
		match self {
			Tier::Base => "base",
			Tier::Local => "local",
			Tier::Mode => "mode",
			Tier::ModeLocal => "mode-local",
			Tier::Import => "import",
		}
	}
}

impl fmt::Display for Tier {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A physical env file together with its tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileLayer {
	pub path: PathBuf,
	pub tier: Tier,
}

impl FileLayer {
	pub fn base(dir: &Path, naming: &NamingConvention) -> Self {
		Self {
			path: dir.join(naming.file_name(None, false)),
			tier: Tier::Base,
		}
	}

	pub fn local(dir: &Path, naming: &NamingConvention) -> Self {
		Self {
			path: dir.join(naming.file_name(None, true)),
			tier: Tier::Local,
		}
	}

	pub fn mode(dir: &Path, naming: &NamingConvention, mode: &str) -> Self {
		Self {
			path: dir.join(naming.file_name(Some(mode), false)),
			tier: Tier::Mode,
		}
	}

	pub fn mode_local(dir: &Path, naming: &NamingConvention, mode: &str) -> Self {
		Self {
			path: dir.join(naming.file_name(Some(mode), true)),
			tier: Tier::ModeLocal,
		}
	}
}
