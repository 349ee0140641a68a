//! End-to-end star-plan compilation.

mod common;

use common::{query, sales_model};
use pretty_assertions::assert_eq;
use trellis::compile::compile;
use trellis::semantic::error::ErrorCode;

#[test]
fn test_star_single_dimension_and_measure_postgres() {
    let output = compile(
        &sales_model(),
        &query(r#"{"select": {"dimensions": ["Country"], "measures": ["Revenue"]}}"#),
        "postgres",
    )
    .unwrap();

    let sql = &output.sql;
    assert!(sql.contains("FROM WAREHOUSE.PUBLIC.ORDERS AS \"Orders\""), "{sql}");
    assert!(
        sql.contains(
            "LEFT JOIN WAREHOUSE.PUBLIC.CUSTOMERS AS \"Customers\" \
             ON \"Orders\".\"CUSTOMER_ID\" = \"Customers\".\"CUSTOMER_ID\""
        ),
        "{sql}"
    );
    assert!(sql.contains("\"Customers\".\"COUNTRY\" AS \"Country\""), "{sql}");
    assert!(
        sql.contains("SUM(\"Orders\".\"PRICE\" * \"Orders\".\"QUANTITY\") AS \"Revenue\""),
        "{sql}"
    );
    assert!(sql.contains("GROUP BY \"Customers\".\"COUNTRY\""), "{sql}");
    // Single-fact queries never produce a CTE.
    assert!(!sql.contains("WITH"), "{sql}");
    assert!(output.warnings.is_empty(), "{:?}", output.warnings);

    assert_eq!(output.resolved.fact_tables, vec!["Orders"]);
    assert_eq!(output.resolved.dimensions, vec!["Country"]);
    assert_eq!(output.resolved.measures, vec!["Revenue"]);
}

#[test]
fn test_exact_star_sql_postgres() {
    let output = compile(
        &sales_model(),
        &query(r#"{"select": {"dimensions": ["Country"], "measures": ["Revenue"]}}"#),
        "postgres",
    )
    .unwrap();

    assert_eq!(
        output.sql,
        "SELECT\n  \"Customers\".\"COUNTRY\" AS \"Country\",\n  \
         SUM(\"Orders\".\"PRICE\" * \"Orders\".\"QUANTITY\") AS \"Revenue\"\n\
         FROM WAREHOUSE.PUBLIC.ORDERS AS \"Orders\"\n\
         LEFT JOIN WAREHOUSE.PUBLIC.CUSTOMERS AS \"Customers\" \
         ON \"Orders\".\"CUSTOMER_ID\" = \"Customers\".\"CUSTOMER_ID\"\n\
         GROUP BY \"Customers\".\"COUNTRY\""
    );
}

#[test]
fn test_time_grain_clickhouse() {
    let output = compile(
        &sales_model(),
        &query(
            r#"{"select": {"dimensions": ["Order Date:quarter"], "measures": ["Order Count"]}}"#,
        ),
        "clickhouse",
    )
    .unwrap();

    let sql = &output.sql;
    assert!(
        sql.contains("toStartOfQuarter(\"Orders\".\"ORDER_DATE\") AS \"Order Date\""),
        "{sql}"
    );
    assert!(
        sql.contains("GROUP BY toStartOfQuarter(\"Orders\".\"ORDER_DATE\")"),
        "{sql}"
    );
}

#[test]
fn test_invalid_grain_suffix() {
    let err = compile(
        &sales_model(),
        &query(r#"{"select": {"dimensions": ["Order Date:fortnight"], "measures": []}}"#),
        "postgres",
    )
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidGrain);
}

#[test]
fn test_grain_on_non_temporal_dimension() {
    let err = compile(
        &sales_model(),
        &query(r#"{"select": {"dimensions": ["Country:month"], "measures": []}}"#),
        "postgres",
    )
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidGrain);
}

#[test]
fn test_dimensions_only_query_groups() {
    // No measures selected: GROUP BY still repeats the dimension
    // expressions, so the result is the deduplicated set.
    let output = compile(
        &sales_model(),
        &query(r#"{"select": {"dimensions": ["Country"], "measures": []}}"#),
        "postgres",
    )
    .unwrap();

    assert_eq!(
        output.sql,
        "SELECT\n  \"Customers\".\"COUNTRY\" AS \"Country\"\n\
         FROM WAREHOUSE.PUBLIC.CUSTOMERS AS \"Customers\"\n\
         GROUP BY \"Customers\".\"COUNTRY\""
    );
    assert!(output.resolved.fact_tables.is_empty());
}

#[test]
fn test_where_having_order_limit() {
    let output = compile(
        &sales_model(),
        &query(
            r#"{
                "select": {"dimensions": ["Country"], "measures": ["Revenue"]},
                "where": [{"field": "Country", "op": "in", "value": ["US", "DE"]}],
                "having": [{"field": "Revenue", "op": ">", "value": 1000}],
                "order_by": [{"field": "Revenue", "direction": "desc"}],
                "limit": 10
            }"#,
        ),
        "postgres",
    )
    .unwrap();

    let sql = &output.sql;
    assert!(
        sql.contains("WHERE \"Customers\".\"COUNTRY\" IN ('US', 'DE')"),
        "{sql}"
    );
    assert!(
        sql.contains("HAVING SUM(\"Orders\".\"PRICE\" * \"Orders\".\"QUANTITY\") > 1000"),
        "{sql}"
    );
    assert!(sql.contains("ORDER BY \"Revenue\" DESC"), "{sql}");
    assert!(sql.ends_with("LIMIT 10"), "{sql}");
}

#[test]
fn test_measure_filter_classified_as_having() {
    // A measure filter in the `where` block still lands in HAVING.
    let output = compile(
        &sales_model(),
        &query(
            r#"{
                "select": {"dimensions": ["Country"], "measures": ["Revenue"]},
                "where": [{"field": "Revenue", "op": "gt", "value": 1000}]
            }"#,
        ),
        "postgres",
    )
    .unwrap();

    let sql = &output.sql;
    assert!(!sql.contains("WHERE"), "{sql}");
    assert!(
        sql.contains("HAVING SUM(\"Orders\".\"PRICE\" * \"Orders\".\"QUANTITY\") > 1000"),
        "{sql}"
    );
}

#[test]
fn test_operator_aliases_produce_identical_sql() {
    let model = sales_model();
    let template = |op: &str| {
        format!(
            r#"{{
                "select": {{"dimensions": ["Country"], "measures": ["Revenue"]}},
                "where": [{{"field": "Country", "op": "{op}", "value": "US"}}]
            }}"#
        )
    };

    for aliases in [
        vec!["equals", "=", "eq"],
        vec!["notequals", "!=", "neq"],
        vec!["gt", ">"],
        vec!["lte", "<="],
    ] {
        let reference = compile(&model, &query(&template(aliases[0])), "postgres")
            .unwrap()
            .sql;
        for alias in &aliases[1..] {
            let sql = compile(&model, &query(&template(alias)), "postgres")
                .unwrap()
                .sql;
            assert_eq!(reference, sql, "alias '{alias}' diverged");
        }
    }
}

#[test]
fn test_null_and_string_operators() {
    let model = sales_model();
    let compile_where = |filter: &str| {
        compile(
            &model,
            &query(&format!(
                r#"{{
                    "select": {{"dimensions": ["Country"], "measures": ["Revenue"]}},
                    "where": [{filter}]
                }}"#
            )),
            "postgres",
        )
        .unwrap()
        .sql
    };

    let sql = compile_where(r#"{"field": "Country", "op": "is_null"}"#);
    assert!(sql.contains("\"Customers\".\"COUNTRY\" IS NULL"), "{sql}");

    let sql = compile_where(r#"{"field": "Country", "op": "set"}"#);
    assert!(sql.contains("\"Customers\".\"COUNTRY\" IS NOT NULL"), "{sql}");

    let sql = compile_where(r#"{"field": "Country", "op": "starts_with", "value": "Un"}"#);
    assert!(sql.contains("\"Customers\".\"COUNTRY\" LIKE 'Un%'"), "{sql}");

    let sql = compile_where(r#"{"field": "Country", "op": "ends_with", "value": "land"}"#);
    assert!(sql.contains("\"Customers\".\"COUNTRY\" LIKE '%land'"), "{sql}");

    let sql = compile_where(r#"{"field": "Country", "op": "notlike", "value": "X%"}"#);
    assert!(sql.contains("\"Customers\".\"COUNTRY\" NOT LIKE 'X%'"), "{sql}");

    let sql = compile_where(r#"{"field": "Order Date", "op": "between",
                               "value": ["2024-01-01", "2024-12-31"]}"#);
    assert!(
        sql.contains("\"Orders\".\"ORDER_DATE\" BETWEEN '2024-01-01' AND '2024-12-31'"),
        "{sql}"
    );
}

#[test]
fn test_relative_filter_postgres() {
    let output = compile(
        &sales_model(),
        &query(
            r#"{
                "select": {"dimensions": ["Country"], "measures": ["Revenue"]},
                "where": [{"field": "Order Date", "op": "relative",
                           "value": {"unit": "month", "count": 3}}]
            }"#,
        ),
        "postgres",
    )
    .unwrap();

    let sql = &output.sql;
    assert!(
        sql.contains(
            "\"Orders\".\"ORDER_DATE\" BETWEEN \
             date_trunc('month', CURRENT_DATE) + INTERVAL '-3 month' AND CURRENT_DATE"
        ),
        "{sql}"
    );
}

#[test]
fn test_fanout_refused() {
    // A Customers-grained measure with an Orders dimension walks the
    // many-to-one edge backwards into the "many" side.
    let err = compile(
        &sales_model(),
        &query(
            r#"{"select": {"dimensions": ["Order Status"], "measures": ["Customer Count"]}}"#,
        ),
        "postgres",
    )
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::Fanout);
}

#[test]
fn test_fanout_allowed_when_declared() {
    let output = compile(
        &sales_model(),
        &query(
            r#"{"select": {"dimensions": ["Order Status"], "measures": ["Customer Reach"]}}"#,
        ),
        "postgres",
    )
    .unwrap();
    assert!(
        output
            .sql
            .contains("COUNT(DISTINCT \"Customers\".\"CUSTOMER_ID\") AS \"Customer Reach\""),
        "{}",
        output.sql
    );
}

#[test]
fn test_unknown_field_errors() {
    let err = compile(
        &sales_model(),
        &query(r#"{"select": {"dimensions": ["Country"], "measures": ["Profit"]}}"#),
        "postgres",
    )
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::UnknownField);

    let err = compile(
        &sales_model(),
        &query(r#"{"select": {"dimensions": ["Planet"], "measures": ["Revenue"]}}"#),
        "postgres",
    )
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::UnknownDimension);
}

#[test]
fn test_determinism() {
    let model = sales_model();
    let q = query(
        r#"{
            "select": {"dimensions": ["Country", "Order Date:month"],
                       "measures": ["Revenue", "Order Count"]},
            "order_by": [{"field": "Country", "direction": "asc"}]
        }"#,
    );
    let first = compile(&model, &q, "postgres").unwrap().sql;
    for _ in 0..5 {
        assert_eq!(first, compile(&model, &q, "postgres").unwrap().sql);
    }
}
