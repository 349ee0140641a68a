//! Shared helper functions for SQL dialect implementations.
//!
//! Reusable building blocks the dialects compose to implement
//! `SqlDialect` with minimal duplication.

use crate::model::types::{ColumnType, TimeGrain};
use crate::sql::expr::{func, lit_str, Expr, ExprExt};

// =============================================================================
// Identifier Quoting
// =============================================================================

/// Quote identifier with double quotes (ANSI style).
/// Used by: Postgres, Snowflake, ClickHouse, Dremio
pub fn quote_double(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote identifier with backticks.
/// Used by: Databricks (Spark SQL)
pub fn quote_backtick(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

// =============================================================================
// Literal Formatting
// =============================================================================

/// Quote string with single quotes, doubling embedded quotes.
pub fn quote_string_single(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Format boolean as literal TRUE/FALSE.
pub fn format_bool_literal(b: bool) -> &'static str {
    if b {
        "TRUE"
    } else {
        "FALSE"
    }
}

// =============================================================================
// Time Grain
// =============================================================================

/// DATE_TRUNC-style truncation: `name('grain', expr)`.
/// Used by: Postgres, Snowflake, Dremio, Databricks
pub fn date_trunc(name: &str, grain: TimeGrain, expr: Expr) -> Expr {
    func(name, vec![lit_str(grain.as_str()), expr])
}

/// ClickHouse truncation via per-grain named functions.
pub fn clickhouse_time_grain(grain: TimeGrain, expr: Expr) -> Expr {
    let name = match grain {
        TimeGrain::Year => "toStartOfYear",
        TimeGrain::Quarter => "toStartOfQuarter",
        TimeGrain::Month => "toStartOfMonth",
        TimeGrain::Week => "toMonday",
        TimeGrain::Day => "toDate",
        TimeGrain::Hour => "toStartOfHour",
        TimeGrain::Minute => "toStartOfMinute",
        TimeGrain::Second => "toStartOfSecond",
    };
    func(name, vec![expr])
}

// =============================================================================
// String Containment
// =============================================================================

/// Case-insensitive containment via ILIKE: `col ILIKE '%' || pat || '%'`.
/// Used by: Postgres, ClickHouse
pub fn contains_ilike(col: Expr, pattern: &str) -> Expr {
    col.ilike(lit_str("%").concat(lit_str(pattern)).concat(lit_str("%")))
}

/// Containment via lowered LIKE: `lower(col) LIKE '%' || lower(pat) || '%'`.
/// Used by: Dremio, Databricks
pub fn contains_lower_like(col: Expr, pattern: &str) -> Expr {
    func("lower", vec![col]).like(
        lit_str("%")
            .concat(func("lower", vec![lit_str(pattern)]))
            .concat(lit_str("%")),
    )
}

// =============================================================================
// Data Type Emission
// =============================================================================

/// Emit data type for Postgres.
pub fn emit_data_type_postgres(ty: ColumnType) -> String {
    match ty {
        ColumnType::String => "TEXT",
        ColumnType::Int => "BIGINT",
        ColumnType::Float => "DOUBLE PRECISION",
        ColumnType::Date => "DATE",
        ColumnType::Time => "TIME",
        ColumnType::TimeTz => "TIMETZ",
        ColumnType::Timestamp => "TIMESTAMP",
        ColumnType::TimestampTz => "TIMESTAMPTZ",
        ColumnType::Boolean => "BOOLEAN",
        ColumnType::Json => "JSONB",
    }
    .into()
}

/// Emit data type for Snowflake.
pub fn emit_data_type_snowflake(ty: ColumnType) -> String {
    match ty {
        ColumnType::String => "VARCHAR",
        ColumnType::Int => "BIGINT",
        ColumnType::Float => "DOUBLE",
        ColumnType::Date => "DATE",
        ColumnType::Time | ColumnType::TimeTz => "TIME",
        ColumnType::Timestamp => "TIMESTAMP_NTZ",
        ColumnType::TimestampTz => "TIMESTAMP_TZ",
        ColumnType::Boolean => "BOOLEAN",
        ColumnType::Json => "VARIANT",
    }
    .into()
}

/// Emit data type for ClickHouse.
pub fn emit_data_type_clickhouse(ty: ColumnType) -> String {
    match ty {
        ColumnType::String => "String",
        ColumnType::Int => "Int64",
        ColumnType::Float => "Float64",
        ColumnType::Date => "Date",
        // ClickHouse has no standalone TIME type
        ColumnType::Time | ColumnType::TimeTz => "String",
        ColumnType::Timestamp | ColumnType::TimestampTz => "DateTime",
        ColumnType::Boolean => "Bool",
        ColumnType::Json => "String",
    }
    .into()
}

/// Emit data type for Dremio.
pub fn emit_data_type_dremio(ty: ColumnType) -> String {
    match ty {
        ColumnType::String => "VARCHAR",
        ColumnType::Int => "BIGINT",
        ColumnType::Float => "DOUBLE",
        ColumnType::Date => "DATE",
        ColumnType::Time | ColumnType::TimeTz => "TIME",
        ColumnType::Timestamp | ColumnType::TimestampTz => "TIMESTAMP",
        ColumnType::Boolean => "BOOLEAN",
        ColumnType::Json => "VARCHAR",
    }
    .into()
}

/// Emit data type for Databricks (Spark SQL).
pub fn emit_data_type_databricks(ty: ColumnType) -> String {
    match ty {
        ColumnType::String => "STRING",
        ColumnType::Int => "BIGINT",
        ColumnType::Float => "DOUBLE",
        ColumnType::Date => "DATE",
        ColumnType::Time | ColumnType::TimeTz => "STRING",
        ColumnType::Timestamp | ColumnType::TimestampTz => "TIMESTAMP",
        ColumnType::Boolean => "BOOLEAN",
        ColumnType::Json => "STRING",
    }
    .into()
}
