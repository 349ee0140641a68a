//! Dremio dialect.
//!
//! - ANSI identifier quoting (`"`)
//! - No ILIKE: containment lowers both sides around LIKE
//! - TIMESTAMPADD for date shifting

use super::helpers;
use super::{DialectCapabilities, SqlDialect};
use crate::model::types::{ColumnType, TimeGrain};
use crate::sql::expr::{func, lit_int, raw_sql, Expr};

/// Dremio dialect.
#[derive(Debug, Clone, Copy)]
pub struct Dremio;

impl SqlDialect for Dremio {
    fn name(&self) -> &'static str {
        "dremio"
    }

    fn capabilities(&self) -> DialectCapabilities {
        DialectCapabilities {
            supports_cte: true,
            supports_qualify: false,
            supports_arrays: true,
            supports_window_filters: false,
            supports_ilike: false,
            supports_time_travel: true,
            supports_semi_structured: true,
            union_by_name: false,
        }
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn render_string_contains(&self, col: Expr, pattern: &str) -> Expr {
        helpers::contains_lower_like(col, pattern)
    }

    fn render_date_add(&self, expr: Expr, grain: TimeGrain, count: i64) -> Expr {
        func(
            "TIMESTAMPADD",
            vec![
                raw_sql(&grain.as_str().to_uppercase()),
                lit_int(count),
                expr,
            ],
        )
    }

    fn emit_data_type(&self, ty: ColumnType) -> String {
        helpers::emit_data_type_dremio(ty)
    }
}
