use crate::error::{EnvError, Result};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::warn;

static IMPORT_LINE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^import\s+(\S.*?)\s*$").expect("import pattern is valid"));

/// A single meaningful line of an env file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
	/// `KEY=value`
	Assignment { key: String, value: String },

	/// `import <relative-path>`
	Import(String),
}

/// Read and parse an env file.
///
/// Callers check for existence first; a missing file here is a read error.
pub fn read_env_file(path: &Path) -> Result<Vec<Line>> {
	let bytes = std::fs::read(path).map_err(|source| EnvError::EnvFileRead {
		path: path.to_path_buf(),
		source,
	})?;

	let content = match String::from_utf8(bytes) {
		Ok(content) => content,
		Err(e) => {
			warn!(path = %path.display(), "env file is not valid UTF-8, replacing invalid bytes");
			String::from_utf8_lossy(e.as_bytes()).into_owned()
		}
	};

	Ok(parse_env_str(&content, path))
}

/// Parse env file content (useful for testing).
///
/// `path` is only used for diagnostics.
pub fn parse_env_str(content: &str, path: &Path) -> Vec<Line> {
	let mut lines = Vec::new();

	for (index, raw) in content.lines().enumerate() {
		let line = raw.trim();
		if line.is_empty() || line.starts_with('#') {
			continue;
		}

		if let Some(captures) = IMPORT_LINE.captures(line) {
			lines.push(Line::Import(captures[1].to_string()));
			continue;
		}

		let line = line.strip_prefix("export ").unwrap_or(line);
		let Some((key, value)) = line.split_once('=') else {
			warn!(path = %path.display(), line = index + 1, "ignoring line without '='");
			continue;
		};

		let key = key.trim();
		if key.is_empty() {
			warn!(path = %path.display(), line = index + 1, "ignoring assignment with empty key");
			continue;
		}

		lines.push(Line::Assignment {
			key: key.to_string(),
			value: unquote(value.trim()).to_string(),
		});
	}

	lines
}

/// Strip one pair of matching surrounding quotes.
fn unquote(value: &str) -> &str {
	for quote in ['"', '\''] {
		if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
			return &value[1..value.len() - 1];
		}
	}
	value
}
