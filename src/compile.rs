//! End-to-end compilation: (model, query, dialect name) -> SQL text.
//!
//! ```text
//! QueryObject -> resolve -> ResolvedQuery -> star/cfl plan -> SQL AST
//!             -> dialect rendering -> SQL + report + warnings
//! ```
//!
//! The core never recovers internally; the first structural error
//! surfaces to the caller. The post-generation syntax check is the one
//! exception: it only appends warnings.

use log::debug;

use crate::model::SemanticModel;
use crate::planner::{cfl_plan, star_plan};
use crate::semantic::error::{CompileError, CompileResult};
use crate::semantic::query::QueryObject;
use crate::semantic::resolved::ResolvedReport;
use crate::semantic::resolver::resolve;
use crate::sql::dialect::Dialect;

/// Compilation options.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Run the sqlparser-based syntax sanity check on the generated SQL.
    /// Failures become warnings, never errors.
    pub syntax_check: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self { syntax_check: true }
    }
}

/// A successful compilation.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    pub sql: String,
    pub dialect: String,
    pub resolved: ResolvedReport,
    pub warnings: Vec<String>,
}

/// Compile a query against a model for a named dialect.
pub fn compile(
    model: &SemanticModel,
    query: &QueryObject,
    dialect_name: &str,
) -> CompileResult<CompileOutput> {
    compile_with_options(model, query, dialect_name, CompileOptions::default())
}

/// Compile with explicit options.
pub fn compile_with_options(
    model: &SemanticModel,
    query: &QueryObject,
    dialect_name: &str,
    options: CompileOptions,
) -> CompileResult<CompileOutput> {
    let dialect = Dialect::from_name(dialect_name)
        .ok_or_else(|| CompileError::unsupported_dialect(dialect_name))?;

    let resolved = resolve(query, model, dialect)?;
    let report = resolved.report();

    let plan = if resolved.requires_cfl {
        cfl_plan(&resolved, model, dialect)?
    } else {
        star_plan(&resolved, model)?
    };

    let sql = plan.to_sql(dialect);
    debug!("compiled {} bytes of {} SQL", sql.len(), dialect);

    let mut warnings = Vec::new();
    if options.syntax_check {
        if let Some(warning) = syntax_check(&sql, dialect) {
            warnings.push(warning);
        }
    }

    Ok(CompileOutput {
        sql,
        dialect: dialect.to_string(),
        resolved: report,
        warnings,
    })
}

/// Parse the generated SQL with the closest sqlparser dialect; a failure
/// is reported as a warning, never as an error.
fn syntax_check(sql: &str, dialect: Dialect) -> Option<String> {
    use sqlparser::dialect as sp;
    use sqlparser::parser::Parser;

    let parser_dialect: Box<dyn sp::Dialect> = match dialect {
        Dialect::Postgres => Box::new(sp::PostgreSqlDialect {}),
        Dialect::Snowflake => Box::new(sp::SnowflakeDialect {}),
        Dialect::ClickHouse => Box::new(sp::ClickHouseDialect {}),
        Dialect::Databricks => Box::new(sp::DatabricksDialect {}),
        // No dedicated Dremio dialect upstream; generic is closest.
        Dialect::Dremio => Box::new(sp::GenericDialect {}),
    };

    match Parser::parse_sql(&*parser_dialect, sql) {
        Ok(_) => None,
        Err(err) => Some(format!("SQL syntax check: {}", err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> SemanticModel {
        SemanticModel::from_yaml_str(
            r#"
dataObjects:
  - name: Orders
    code: ORDERS
    database: WAREHOUSE
    schema: PUBLIC
    columns:
      - { name: Order Id, code: ORDER_ID, type: int }
      - { name: Customer Id, code: CUSTOMER_ID, type: int }
      - { name: Price, code: PRICE, type: float }
    joins:
      - joinTo: Customers
        joinColumns: [Customer Id]
        targetColumns: [Customer Id]
        joinType: many-to-one
  - name: Customers
    code: CUSTOMERS
    database: WAREHOUSE
    schema: PUBLIC
    columns:
      - { name: Customer Id, code: CUSTOMER_ID, type: int }
      - { name: Country, code: COUNTRY, type: string }
dimensions:
  - { name: Country, dataObject: Customers, column: Country }
measures:
  - name: Revenue
    aggregation: sum
    expression: "{[Orders].[Price]}"
"#,
        )
        .unwrap()
    }

    fn query() -> QueryObject {
        serde_json::from_str(
            r#"{"select": {"dimensions": ["Country"], "measures": ["Revenue"]}}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_compile_happy_path() {
        let output = compile(&model(), &query(), "postgres").unwrap();
        assert!(output.sql.contains("SELECT"));
        assert_eq!(output.dialect, "postgres");
        assert_eq!(output.resolved.fact_tables, vec!["Orders"]);
        assert_eq!(output.resolved.dimensions, vec!["Country"]);
        assert_eq!(output.resolved.measures, vec!["Revenue"]);
        assert!(output.warnings.is_empty(), "{:?}", output.warnings);
    }

    #[test]
    fn test_unsupported_dialect() {
        let err = compile(&model(), &query(), "oracle").unwrap_err();
        assert_eq!(
            err.code,
            crate::semantic::error::ErrorCode::UnsupportedDialect
        );
    }

    #[test]
    fn test_determinism() {
        let first = compile(&model(), &query(), "snowflake").unwrap();
        let second = compile(&model(), &query(), "snowflake").unwrap();
        assert_eq!(first.sql, second.sql);
    }
}
