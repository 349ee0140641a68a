//! ClickHouse dialect.
//!
//! - ANSI identifier quoting (`"`)
//! - Per-grain truncation functions (`toStartOfMonth`, `toMonday`, ...)
//! - Native conversion functions instead of CAST for the common types
//! - `addDays`/`addMonths`/... for date shifting, `today()` for the
//!   current date

use super::helpers;
use super::{DialectCapabilities, SqlDialect};
use crate::model::types::{ColumnType, TimeGrain};
use crate::sql::expr::{cast_as, func, lit_int, raw_sql, Expr};

/// ClickHouse dialect.
#[derive(Debug, Clone, Copy)]
pub struct ClickHouse;

impl SqlDialect for ClickHouse {
    fn name(&self) -> &'static str {
        "clickhouse"
    }

    fn capabilities(&self) -> DialectCapabilities {
        DialectCapabilities {
            supports_cte: true,
            supports_qualify: true,
            supports_arrays: true,
            supports_window_filters: false,
            supports_ilike: true,
            supports_time_travel: false,
            supports_semi_structured: true,
            union_by_name: false,
        }
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn render_time_grain(&self, expr: Expr, grain: TimeGrain) -> Expr {
        helpers::clickhouse_time_grain(grain, expr)
    }

    fn render_cast(&self, expr: Expr, target: ColumnType) -> Expr {
        // Conversion functions also absorb NULL (yielding Nullable values),
        // which plain CAST does not.
        let conversion = match target {
            ColumnType::Int => Some("toInt64"),
            ColumnType::Float => Some("toFloat64"),
            ColumnType::String => Some("toString"),
            ColumnType::Date => Some("toDate"),
            _ => None,
        };
        match conversion {
            Some(name) => func(name, vec![expr]),
            None => cast_as(expr, &self.emit_data_type(target)),
        }
    }

    fn render_string_contains(&self, col: Expr, pattern: &str) -> Expr {
        helpers::contains_ilike(col, pattern)
    }

    fn current_date(&self) -> Expr {
        raw_sql("today()")
    }

    fn render_date_add(&self, expr: Expr, grain: TimeGrain, count: i64) -> Expr {
        let name = match grain {
            TimeGrain::Year => "addYears",
            TimeGrain::Quarter => "addQuarters",
            TimeGrain::Month => "addMonths",
            TimeGrain::Week => "addWeeks",
            TimeGrain::Day => "addDays",
            TimeGrain::Hour => "addHours",
            TimeGrain::Minute => "addMinutes",
            TimeGrain::Second => "addSeconds",
        };
        func(name, vec![expr, lit_int(count)])
    }

    fn emit_data_type(&self, ty: ColumnType) -> String {
        helpers::emit_data_type_clickhouse(ty)
    }
}
