//! Requirement constraints checked against the resolved environment.
//!
//! This module handles:
//! - The requirement tree (`key`, `key=value`, `and`, `or`, predicates)
//! - Evaluation with a traceable failure path
//! - Rendering failures into a single message

pub mod failure;
pub mod solver;

pub use failure::RequirementFailure;
pub use solver::{PredicateFn, Requirement, solve, solve_all};
