//! envcascade - layered `.env` resolution with mode chasing and requirement checks.
//!
//! This library provides:
//! - The file cascade: `.env`, its local override, then mode files chased
//!   until the mode stops changing
//! - Recursive `import` expansion with local-before-shared ordering
//! - Transforms, defaults and a pluggable schema
//! - An `and`/`or`/`key=value` requirement solver with readable failures
//!
//! Within the cascade the first file to set a key wins, so `.env` has the
//! highest priority and the process environment the lowest.
//!
//! # Example
//!
//! ```no_run
//! use envcascade::{Requirement, ResolveOptions, Resolver};
//!
//! let options = ResolveOptions::new(".")
//!     .default_value("PORT", "8080")
//!     .require(Requirement::key("DATABASE_URL"))
//!     .require(Requirement::any([
//!         Requirement::equals("MODE", "development"),
//!         Requirement::key("API_TOKEN"),
//!     ]));
//!
//! let mut resolver = Resolver::new();
//! let env = resolver.resolve(&options).unwrap();
//! println!("port: {:?}", env.get_str("PORT"));
//! ```

pub mod cascade;
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod requirements;
pub mod resolved;
pub mod schema;

pub use cascade::{
	Environment, ModePrecedence, NamingConvention, NamingStyle, ProcessEnvironment,
	ResolveOptions, Resolver, resolve, resolve_with,
};
pub use error::{EnvError, Result, SchemaError};
pub use requirements::{Requirement, RequirementFailure};
pub use resolved::{EnvMap, Origin, ResolvedEnv};
pub use schema::{Schema, TypedSchema};
