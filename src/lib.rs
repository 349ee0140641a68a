//! # Trellis
//!
//! A semantic model compiler that generates multi-dialect warehouse SQL.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │            YAML Semantic Model (declarative)             │
//! │   (data objects, joins, dimensions, measures, metrics)   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [loader + validator]
//! ┌─────────────────────────────────────────────────────────┐
//! │                SemanticModel (Rust types)                │
//! └─────────────────────────────────────────────────────────┘
//!                          │   + QueryObject
//!                          ▼ [resolver]
//! ┌─────────────────────────────────────────────────────────┐
//! │    ResolvedQuery (join steps, aggregates, filters)       │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [star / composite-fact planner]
//! ┌─────────────────────────────────────────────────────────┐
//! │                      SQL AST                             │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [dialect rendering]
//! │   PostgreSQL · Snowflake · ClickHouse · Dremio ·         │
//! │   Databricks SQL                                         │
//! ```
//!
//! The core is synchronous, stateless, and allocation-only; it is safe
//! to call concurrently with independent (model, query) pairs.

pub mod compile;
pub mod model;
pub mod planner;
pub mod semantic;
pub mod sql;

// Re-export SQL submodules at crate level for convenient paths
pub use sql::dialect;
pub use sql::expr;
pub use sql::query;
pub use sql::token;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::compile::{compile, CompileOptions, CompileOutput};
    pub use crate::dialect::{Dialect, DialectCapabilities, SqlDialect};
    pub use crate::expr::{
        avg, col, count, count_distinct, func, lit_bool, lit_float, lit_int, lit_null, lit_str,
        max, min, sum, table_col, BinaryOperator, Expr, ExprExt, Literal,
    };
    pub use crate::model::{SemanticModel, TimeGrain};
    pub use crate::query::{Cte, CteBody, OrderByExpr, Query, SelectExpr, TableRef, UnionAll};
    pub use crate::semantic::{
        validate, CompileError, CompileResult, ErrorCode, QueryObject, ValidationIssue,
    };
}

// Also export the front door at the crate root
pub use compile::{compile, compile_with_options, CompileOptions, CompileOutput};
pub use dialect::Dialect;
pub use model::SemanticModel;
pub use semantic::error::{CompileError, CompileResult, ErrorCode};
pub use semantic::query::QueryObject;
