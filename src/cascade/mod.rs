//! Layered env file resolution.
//!
//! This module handles:
//! - Env file parsing and `import` expansion
//! - The base → local → mode → mode-local cascade with mode chasing
//! - Transforms, defaults, schema validation and requirement checks
//! - Caching the resolved result per `Resolver`

pub mod environment;
pub mod imports;
pub mod lines;
pub mod naming;
pub mod options;
pub mod resolver;

pub use environment::{Environment, ProcessEnvironment};
pub use naming::{FileLayer, NamingConvention, NamingStyle, Tier};
pub use options::{DEFAULT_MODE_KEY, ModePrecedence, ResolveOptions};
pub use resolver::{Resolver, resolve, resolve_with};
