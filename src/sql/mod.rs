//! SQL generation module.
//!
//! A type-safe SQL AST that renders to multi-dialect SQL text:
//!
//! - [`expr`] - expression AST and builder DSL
//! - [`query`] - SELECT / CTE / UNION ALL statement AST
//! - [`token`] - dialect-agnostic token stream
//! - [`dialect`] - warehouse dialect implementations and registry

pub mod dialect;
pub mod expr;
pub mod query;
pub mod token;

// Re-export commonly used types at the sql module level
pub use dialect::{Dialect, DialectCapabilities, SqlDialect};
pub use expr::{
    avg, cast_as, coalesce, col, count, count_distinct, count_star, func, lit_bool, lit_float,
    lit_int, lit_null, lit_str, max, min, raw_sql, star, sum, table_col, BinaryOperator, Expr,
    ExprExt, Literal, OrderSpec, UnaryOperator,
};
pub use query::{Cte, CteBody, Join, JoinType, OrderByExpr, Query, SelectExpr, TableRef, UnionAll};
pub use token::{Token, TokenStream};
