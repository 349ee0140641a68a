//! SQL dialect definitions and formatting rules.
//!
//! A trait-based abstraction over warehouse syntax differences:
//!
//! - Identifier quoting: `"` (Postgres/Snowflake/ClickHouse/Dremio),
//!   `` ` `` (Databricks)
//! - Time-grain truncation: `date_trunc` vs ClickHouse's named functions
//! - Casts: `CAST(x AS T)` vs ClickHouse conversion functions
//! - Case-insensitive containment: ILIKE vs CONTAINS vs lowered LIKE
//! - Multi-branch unions: positional `UNION ALL` vs `UNION ALL BY NAME`
//!
//! Dialects are looked up through a process-wide registry keyed by name,
//! populated once before the first compile; lookup never depends on
//! initialization order.

pub mod helpers;

mod clickhouse;
mod databricks;
mod dremio;
mod postgres;
mod snowflake;

pub use clickhouse::ClickHouse;
pub use databricks::Databricks;
pub use dremio::Dremio;
pub use postgres::Postgres;
pub use snowflake::Snowflake;

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::model::types::{ColumnType, TimeGrain};
use crate::sql::expr::{cast_as, raw_sql, Expr};

/// Feature flags a dialect surfaces to the planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialectCapabilities {
    pub supports_cte: bool,
    pub supports_qualify: bool,
    pub supports_arrays: bool,
    pub supports_window_filters: bool,
    pub supports_ilike: bool,
    pub supports_time_travel: bool,
    pub supports_semi_structured: bool,
    pub union_by_name: bool,
}

/// SQL dialect trait - defines how dialect-divergent constructs render.
///
/// The default implementations follow the Postgres-flavored common case;
/// each dialect overrides where its syntax diverges.
pub trait SqlDialect: std::fmt::Debug {
    /// Dialect name - the registry key.
    fn name(&self) -> &'static str;

    /// Feature flags for this dialect.
    fn capabilities(&self) -> DialectCapabilities;

    /// Quote an identifier (column, alias, CTE column).
    fn quote_identifier(&self, ident: &str) -> String;

    /// Quote a string literal. All five dialects double embedded quotes.
    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_single(s)
    }

    /// Format a boolean literal.
    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_literal(b)
    }

    /// Truncate a temporal expression to a grain.
    fn render_time_grain(&self, expr: Expr, grain: TimeGrain) -> Expr {
        helpers::date_trunc("date_trunc", grain, expr)
    }

    /// Cast an expression to an abstract column type.
    fn render_cast(&self, expr: Expr, target: ColumnType) -> Expr {
        cast_as(expr, &self.emit_data_type(target))
    }

    /// Case-insensitive substring match.
    fn render_string_contains(&self, col: Expr, pattern: &str) -> Expr;

    /// The dialect's current-date expression.
    fn current_date(&self) -> Expr {
        raw_sql("CURRENT_DATE")
    }

    /// Shift a temporal expression by `count` grains (negative = past).
    fn render_date_add(&self, expr: Expr, grain: TimeGrain, count: i64) -> Expr;

    /// Type name for an abstract column type, used by casts and typed NULLs.
    fn emit_data_type(&self, ty: ColumnType) -> String;
}

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Snowflake,
    ClickHouse,
    Dremio,
    Databricks,
}

impl Dialect {
    /// All dialects, in registry order.
    pub const ALL: [Dialect; 5] = [
        Dialect::Postgres,
        Dialect::Snowflake,
        Dialect::ClickHouse,
        Dialect::Dremio,
        Dialect::Databricks,
    ];

    /// Get the dialect implementation.
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::Postgres => &Postgres,
            Dialect::Snowflake => &Snowflake,
            Dialect::ClickHouse => &ClickHouse,
            Dialect::Dremio => &Dremio,
            Dialect::Databricks => &Databricks,
        }
    }

    /// Look up a dialect by its registry name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Dialect> {
        REGISTRY.get(name.to_lowercase().as_str()).copied()
    }

    /// Registered dialect names, in registry order.
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|d| d.name()).collect()
    }
}

/// Process-wide dialect registry, populated once on first access.
static REGISTRY: Lazy<HashMap<&'static str, Dialect>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for dialect in Dialect::ALL {
        map.insert(dialect.name(), dialect);
    }
    map
});

// Delegate SqlDialect to the concrete implementations so `Dialect` can be
// passed by value everywhere tokens serialize.
impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        self.dialect().name()
    }

    fn capabilities(&self) -> DialectCapabilities {
        self.dialect().capabilities()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        self.dialect().quote_identifier(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        self.dialect().quote_string(s)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        self.dialect().format_bool(b)
    }

    fn render_time_grain(&self, expr: Expr, grain: TimeGrain) -> Expr {
        self.dialect().render_time_grain(expr, grain)
    }

    fn render_cast(&self, expr: Expr, target: ColumnType) -> Expr {
        self.dialect().render_cast(expr, target)
    }

    fn render_string_contains(&self, col: Expr, pattern: &str) -> Expr {
        self.dialect().render_string_contains(col, pattern)
    }

    fn current_date(&self) -> Expr {
        self.dialect().current_date()
    }

    fn render_date_add(&self, expr: Expr, grain: TimeGrain, count: i64) -> Expr {
        self.dialect().render_date_add(expr, grain, count)
    }

    fn emit_data_type(&self, ty: ColumnType) -> String {
        self.dialect().emit_data_type(ty)
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::expr::table_col;

    #[test]
    fn test_registry_lookup() {
        assert_eq!(Dialect::from_name("postgres"), Some(Dialect::Postgres));
        assert_eq!(Dialect::from_name("Snowflake"), Some(Dialect::Snowflake));
        assert_eq!(Dialect::from_name("CLICKHOUSE"), Some(Dialect::ClickHouse));
        assert_eq!(Dialect::from_name("oracle"), None);
    }

    #[test]
    fn test_names() {
        assert_eq!(
            Dialect::names(),
            vec!["postgres", "snowflake", "clickhouse", "dremio", "databricks"]
        );
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(Dialect::Postgres.quote_identifier("Orders"), "\"Orders\"");
        assert_eq!(Dialect::Snowflake.quote_identifier("Orders"), "\"Orders\"");
        assert_eq!(Dialect::ClickHouse.quote_identifier("Orders"), "\"Orders\"");
        assert_eq!(Dialect::Dremio.quote_identifier("Orders"), "\"Orders\"");
        assert_eq!(Dialect::Databricks.quote_identifier("Orders"), "`Orders`");
    }

    #[test]
    fn test_quote_identifier_escaping() {
        assert_eq!(
            Dialect::Postgres.quote_identifier("weird\"name"),
            "\"weird\"\"name\""
        );
        assert_eq!(
            Dialect::Databricks.quote_identifier("weird`name"),
            "`weird``name`"
        );
    }

    #[test]
    fn test_union_by_name_capability() {
        assert!(Dialect::Snowflake.capabilities().union_by_name);
        for d in [
            Dialect::Postgres,
            Dialect::ClickHouse,
            Dialect::Dremio,
            Dialect::Databricks,
        ] {
            assert!(!d.capabilities().union_by_name, "{d}");
        }
    }

    #[test]
    fn test_time_grain_rendering() {
        let e = table_col("Orders", "ORDER_DATE");
        assert_eq!(
            Dialect::Postgres
                .render_time_grain(e.clone(), TimeGrain::Month)
                .to_sql(Dialect::Postgres),
            "date_trunc('month', \"Orders\".\"ORDER_DATE\")"
        );
        assert_eq!(
            Dialect::Snowflake
                .render_time_grain(e.clone(), TimeGrain::Month)
                .to_sql(Dialect::Snowflake),
            "DATE_TRUNC('month', \"Orders\".\"ORDER_DATE\")"
        );
        assert_eq!(
            Dialect::ClickHouse
                .render_time_grain(e.clone(), TimeGrain::Quarter)
                .to_sql(Dialect::ClickHouse),
            "toStartOfQuarter(\"Orders\".\"ORDER_DATE\")"
        );
        assert_eq!(
            Dialect::ClickHouse
                .render_time_grain(e, TimeGrain::Week)
                .to_sql(Dialect::ClickHouse),
            "toMonday(\"Orders\".\"ORDER_DATE\")"
        );
    }

    #[test]
    fn test_string_contains_rendering() {
        let e = || table_col("Customers", "COUNTRY");
        assert_eq!(
            Dialect::Postgres
                .render_string_contains(e(), "United")
                .to_sql(Dialect::Postgres),
            "\"Customers\".\"COUNTRY\" ILIKE '%' || 'United' || '%'"
        );
        assert_eq!(
            Dialect::Snowflake
                .render_string_contains(e(), "United")
                .to_sql(Dialect::Snowflake),
            "CONTAINS(\"Customers\".\"COUNTRY\", 'United')"
        );
        assert_eq!(
            Dialect::Databricks
                .render_string_contains(e(), "United")
                .to_sql(Dialect::Databricks),
            "lower(`Customers`.`COUNTRY`) LIKE '%' || lower('United') || '%'"
        );
        assert_eq!(
            Dialect::Dremio
                .render_string_contains(e(), "United")
                .to_sql(Dialect::Dremio),
            "lower(\"Customers\".\"COUNTRY\") LIKE '%' || lower('United') || '%'"
        );
    }

    #[test]
    fn test_cast_rendering() {
        use crate::sql::expr::lit_null;
        assert_eq!(
            Dialect::Postgres
                .render_cast(lit_null(), ColumnType::Float)
                .to_sql(Dialect::Postgres),
            "CAST(NULL AS DOUBLE PRECISION)"
        );
        assert_eq!(
            Dialect::ClickHouse
                .render_cast(lit_null(), ColumnType::Float)
                .to_sql(Dialect::ClickHouse),
            "toFloat64(NULL)"
        );
        assert_eq!(
            Dialect::ClickHouse
                .render_cast(lit_null(), ColumnType::Boolean)
                .to_sql(Dialect::ClickHouse),
            "CAST(NULL AS Bool)"
        );
    }
}
