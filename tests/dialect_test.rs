//! Dialect-divergent rendering, end to end.

mod common;

use common::{query, sales_model};
use trellis::compile::compile;

fn contains_query() -> trellis::semantic::query::QueryObject {
    query(
        r#"{
            "select": {"dimensions": ["Country"], "measures": ["Revenue"]},
            "where": [{"field": "Country", "op": "contains", "value": "United"}]
        }"#,
    )
}

#[test]
fn test_string_contains_postgres() {
    let sql = compile(&sales_model(), &contains_query(), "postgres")
        .unwrap()
        .sql;
    assert!(
        sql.contains("\"Customers\".\"COUNTRY\" ILIKE '%' || 'United' || '%'"),
        "{sql}"
    );
}

#[test]
fn test_string_contains_snowflake() {
    let sql = compile(&sales_model(), &contains_query(), "snowflake")
        .unwrap()
        .sql;
    assert!(
        sql.contains("CONTAINS(\"Customers\".\"COUNTRY\", 'United')"),
        "{sql}"
    );
}

#[test]
fn test_string_contains_clickhouse() {
    let sql = compile(&sales_model(), &contains_query(), "clickhouse")
        .unwrap()
        .sql;
    assert!(
        sql.contains("\"Customers\".\"COUNTRY\" ILIKE '%' || 'United' || '%'"),
        "{sql}"
    );
}

#[test]
fn test_string_contains_dremio() {
    let sql = compile(&sales_model(), &contains_query(), "dremio")
        .unwrap()
        .sql;
    assert!(
        sql.contains("lower(\"Customers\".\"COUNTRY\") LIKE '%' || lower('United') || '%'"),
        "{sql}"
    );
}

#[test]
fn test_string_contains_databricks() {
    let sql = compile(&sales_model(), &contains_query(), "databricks")
        .unwrap()
        .sql;
    assert!(
        sql.contains("lower(`Customers`.`COUNTRY`) LIKE '%' || lower('United') || '%'"),
        "{sql}"
    );
}

#[test]
fn test_databricks_backtick_quoting() {
    let sql = compile(
        &sales_model(),
        &query(r#"{"select": {"dimensions": ["Country"], "measures": ["Revenue"]}}"#),
        "databricks",
    )
    .unwrap()
    .sql;

    assert!(sql.contains("FROM WAREHOUSE.PUBLIC.ORDERS AS `Orders`"), "{sql}");
    assert!(sql.contains("`Customers`.`COUNTRY` AS `Country`"), "{sql}");
    assert!(
        sql.contains("SUM(`Orders`.`PRICE` * `Orders`.`QUANTITY`) AS `Revenue`"),
        "{sql}"
    );
    assert!(!sql.contains('"'), "no double quotes in Databricks SQL: {sql}");
}

#[test]
fn test_time_grain_across_dialects() {
    let model = sales_model();
    let q = query(
        r#"{"select": {"dimensions": ["Order Date:month"], "measures": ["Order Count"]}}"#,
    );

    let sql = compile(&model, &q, "postgres").unwrap().sql;
    assert!(
        sql.contains("date_trunc('month', \"Orders\".\"ORDER_DATE\") AS \"Order Date\""),
        "{sql}"
    );

    let sql = compile(&model, &q, "snowflake").unwrap().sql;
    assert!(
        sql.contains("DATE_TRUNC('month', \"Orders\".\"ORDER_DATE\") AS \"Order Date\""),
        "{sql}"
    );

    let sql = compile(&model, &q, "clickhouse").unwrap().sql;
    assert!(
        sql.contains("toStartOfMonth(\"Orders\".\"ORDER_DATE\") AS \"Order Date\""),
        "{sql}"
    );

    let sql = compile(&model, &q, "dremio").unwrap().sql;
    assert!(
        sql.contains("date_trunc('month', \"Orders\".\"ORDER_DATE\") AS \"Order Date\""),
        "{sql}"
    );

    let sql = compile(&model, &q, "databricks").unwrap().sql;
    assert!(
        sql.contains("date_trunc('month', `Orders`.`ORDER_DATE`) AS `Order Date`"),
        "{sql}"
    );
}

#[test]
fn test_week_grain_clickhouse_uses_to_monday() {
    let sql = compile(
        &sales_model(),
        &query(
            r#"{"select": {"dimensions": ["Order Date:week"], "measures": ["Order Count"]}}"#,
        ),
        "clickhouse",
    )
    .unwrap()
    .sql;
    assert!(sql.contains("toMonday(\"Orders\".\"ORDER_DATE\")"), "{sql}");
}

#[test]
fn test_relative_filter_per_dialect_date_math() {
    let model = sales_model();
    let q = query(
        r#"{
            "select": {"dimensions": ["Country"], "measures": ["Revenue"]},
            "where": [{"field": "Order Date", "op": "relative",
                       "value": {"unit": "day", "count": 7}}]
        }"#,
    );

    let sql = compile(&model, &q, "snowflake").unwrap().sql;
    assert!(
        sql.contains("DATEADD('day', -7, DATE_TRUNC('day', CURRENT_DATE))"),
        "{sql}"
    );

    let sql = compile(&model, &q, "clickhouse").unwrap().sql;
    assert!(sql.contains("addDays(toDate(today()), -7)"), "{sql}");

    let sql = compile(&model, &q, "dremio").unwrap().sql;
    assert!(
        sql.contains("TIMESTAMPADD(DAY, -7, date_trunc('day', CURRENT_DATE))"),
        "{sql}"
    );

    let sql = compile(&model, &q, "databricks").unwrap().sql;
    assert!(
        sql.contains("date_trunc('day', CURRENT_DATE) + INTERVAL -7 DAY"),
        "{sql}"
    );
}

#[test]
fn test_every_dialect_compiles_the_seed_query() {
    let model = sales_model();
    let q = query(r#"{"select": {"dimensions": ["Country"], "measures": ["Revenue"]}}"#);
    for dialect in ["postgres", "snowflake", "clickhouse", "dremio", "databricks"] {
        let output = compile(&model, &q, dialect).unwrap();
        assert_eq!(output.dialect, dialect);
        assert!(output.sql.contains("SELECT"), "{dialect}: {}", output.sql);
    }
}
