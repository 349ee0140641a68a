//! Databricks (Spark SQL) dialect.
//!
//! - Backtick identifier quoting
//! - No ILIKE in generated SQL: containment lowers both sides around LIKE
//! - Interval arithmetic for date shifting

use super::helpers;
use super::{DialectCapabilities, SqlDialect};
use crate::model::types::{ColumnType, TimeGrain};
use crate::sql::expr::{raw_sql, Expr, ExprExt};

/// Databricks (Spark SQL) dialect.
#[derive(Debug, Clone, Copy)]
pub struct Databricks;

impl SqlDialect for Databricks {
    fn name(&self) -> &'static str {
        "databricks"
    }

    fn capabilities(&self) -> DialectCapabilities {
        DialectCapabilities {
            supports_cte: true,
            supports_qualify: true,
            supports_arrays: true,
            supports_window_filters: true,
            supports_ilike: false,
            supports_time_travel: true,
            supports_semi_structured: true,
            union_by_name: false,
        }
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_backtick(ident)
    }

    fn render_string_contains(&self, col: Expr, pattern: &str) -> Expr {
        helpers::contains_lower_like(col, pattern)
    }

    fn render_date_add(&self, expr: Expr, grain: TimeGrain, count: i64) -> Expr {
        expr.add(raw_sql(&format!(
            "INTERVAL {} {}",
            count,
            grain.as_str().to_uppercase()
        )))
    }

    fn emit_data_type(&self, ty: ColumnType) -> String {
        helpers::emit_data_type_databricks(ty)
    }
}
