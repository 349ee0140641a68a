//! PostgreSQL dialect.
//!
//! - ANSI identifier quoting (`"`)
//! - Native ILIKE for case-insensitive matching
//! - Interval arithmetic for date shifting
//! - FILTER clause for aggregates

use super::helpers;
use super::{DialectCapabilities, SqlDialect};
use crate::model::types::{ColumnType, TimeGrain};
use crate::sql::expr::{raw_sql, Expr, ExprExt};

/// PostgreSQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Postgres;

impl SqlDialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn capabilities(&self) -> DialectCapabilities {
        DialectCapabilities {
            supports_cte: true,
            supports_qualify: false,
            supports_arrays: true,
            supports_window_filters: true,
            supports_ilike: true,
            supports_time_travel: false,
            supports_semi_structured: true,
            union_by_name: false,
        }
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn render_string_contains(&self, col: Expr, pattern: &str) -> Expr {
        helpers::contains_ilike(col, pattern)
    }

    fn render_date_add(&self, expr: Expr, grain: TimeGrain, count: i64) -> Expr {
        expr.add(raw_sql(&format!("INTERVAL '{} {}'", count, grain.as_str())))
    }

    fn emit_data_type(&self, ty: ColumnType) -> String {
        helpers::emit_data_type_postgres(ty)
    }
}
