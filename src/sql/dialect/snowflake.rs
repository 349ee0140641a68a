//! Snowflake dialect.
//!
//! - ANSI identifier quoting (`"`)
//! - CONTAINS() for substring matching
//! - DATEADD for date shifting
//! - UNION ALL BY NAME, which lets composite-fact legs omit sibling columns

use super::helpers;
use super::{DialectCapabilities, SqlDialect};
use crate::model::types::{ColumnType, TimeGrain};
use crate::sql::expr::{func, lit_int, lit_str, Expr};

/// Snowflake dialect.
#[derive(Debug, Clone, Copy)]
pub struct Snowflake;

impl SqlDialect for Snowflake {
    fn name(&self) -> &'static str {
        "snowflake"
    }

    fn capabilities(&self) -> DialectCapabilities {
        DialectCapabilities {
            supports_cte: true,
            supports_qualify: true,
            supports_arrays: true,
            supports_window_filters: false,
            supports_ilike: true,
            supports_time_travel: true,
            supports_semi_structured: true,
            union_by_name: true,
        }
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn render_time_grain(&self, expr: Expr, grain: TimeGrain) -> Expr {
        helpers::date_trunc("DATE_TRUNC", grain, expr)
    }

    fn render_string_contains(&self, col: Expr, pattern: &str) -> Expr {
        func("CONTAINS", vec![col, lit_str(pattern)])
    }

    fn render_date_add(&self, expr: Expr, grain: TimeGrain, count: i64) -> Expr {
        func(
            "DATEADD",
            vec![lit_str(grain.as_str()), lit_int(count), expr],
        )
    }

    fn emit_data_type(&self, ty: ColumnType) -> String {
        helpers::emit_data_type_snowflake(ty)
    }
}
