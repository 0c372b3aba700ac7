//! Project configuration for envcascade.
//!
//! This module handles:
//! - `envcascade.toml` parsing and validation
//! - Layering the project config onto resolve options

pub mod parser;
pub mod types;

pub use parser::{CONFIG_FILE, find_project_config, parse_config_file, parse_config_str};
pub use types::{LoadedConfig, ProjectConfig};
