//! The semantic layer: validation, join routing, and query resolution.
//!
//! - [`validator`] - model invariants, reported as a full issue list
//! - [`join_graph`] - join-topology routing (paths, trees, ON conditions)
//! - [`query`] - the structured query request surface
//! - [`resolver`] / [`resolved`] - request -> planner input
//! - [`error`] - the error taxonomy shared by the whole core

pub mod error;
pub mod join_graph;
pub mod query;
pub mod resolved;
pub mod resolver;
pub mod validator;

pub use error::{CompileError, CompileResult, ErrorCode, Span};
pub use query::{Filter, FilterOp, QueryObject, SelectBlock, UsePathName};
pub use resolved::{ResolvedQuery, ResolvedReport};
pub use resolver::{resolve, Resolver};
pub use validator::{validate, IssueCode, ValidationIssue};
