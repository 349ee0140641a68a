//! End-to-end composite-fact-layer compilation.

mod common;

use common::{query, sales_model};
use trellis::compile::compile;

fn two_fact_query() -> trellis::semantic::query::QueryObject {
    query(
        r#"{"select": {"dimensions": ["Country"],
                       "measures": ["Revenue", "Return Amount"]}}"#,
    )
}

#[test]
fn test_cfl_two_facts_postgres() {
    let output = compile(&sales_model(), &two_fact_query(), "postgres").unwrap();
    let sql = &output.sql;

    assert!(sql.contains("WITH composite_01 AS ("), "{sql}");
    assert!(sql.contains("UNION ALL"), "{sql}");
    assert!(!sql.contains("BY NAME"), "{sql}");

    // Orders leg: its own pre-aggregation column plus a typed NULL for
    // the sibling measure.
    assert!(
        sql.contains("\"Orders\".\"PRICE\" * \"Orders\".\"QUANTITY\" AS \"Revenue\""),
        "{sql}"
    );
    assert!(
        sql.contains("CAST(NULL AS DOUBLE PRECISION) AS \"Return Amount\""),
        "{sql}"
    );

    // Store Returns leg, mirrored.
    assert!(
        sql.contains("\"Store Returns\".\"RETURN_AMOUNT\" AS \"Return Amount\""),
        "{sql}"
    );
    assert!(sql.contains("CAST(NULL AS DOUBLE PRECISION) AS \"Revenue\""), "{sql}");

    // Outer aggregation over the composite layer.
    assert!(sql.contains("FROM composite_01"), "{sql}");
    assert!(sql.contains("SUM(\"Revenue\") AS \"Revenue\""), "{sql}");
    assert!(sql.contains("SUM(\"Return Amount\") AS \"Return Amount\""), "{sql}");
    assert!(sql.contains("GROUP BY \"Country\""), "{sql}");

    assert_eq!(
        output.resolved.fact_tables,
        vec!["Orders", "Store Returns"]
    );
}

#[test]
fn test_cfl_union_discipline_positional() {
    // Every leg projects the same columns in the same order.
    let output = compile(&sales_model(), &two_fact_query(), "postgres").unwrap();
    let sql = &output.sql;

    assert_eq!(sql.matches("AS \"Country\"").count(), 3, "{sql}"); // 2 legs + outer
    assert_eq!(sql.matches("AS \"Revenue\"").count(), 3, "{sql}");
    assert_eq!(sql.matches("AS \"Return Amount\"").count(), 3, "{sql}");

    // Both legs start their select list with the conformed dimension.
    let legs: Vec<&str> = sql.split("UNION ALL").collect();
    assert_eq!(legs.len(), 2, "{sql}");
    for leg in &legs {
        let country = leg.find("AS \"Country\"").expect("leg projects Country");
        let revenue = leg.find("AS \"Revenue\"").expect("leg projects Revenue");
        assert!(country < revenue, "dimension precedes measures: {leg}");
    }
}

#[test]
fn test_cfl_snowflake_union_by_name() {
    let output = compile(&sales_model(), &two_fact_query(), "snowflake").unwrap();
    let sql = &output.sql;

    assert!(sql.contains("WITH composite_01 AS ("), "{sql}");
    assert!(sql.contains("UNION ALL BY NAME"), "{sql}");
    // No NULL padding: each leg only projects its own measure.
    assert!(!sql.contains("CAST(NULL"), "{sql}");
    assert_eq!(sql.matches("AS \"Revenue\"").count(), 2, "{sql}"); // 1 leg + outer
    assert_eq!(sql.matches("AS \"Return Amount\"").count(), 2, "{sql}");
}

#[test]
fn test_cfl_legs_join_their_own_dimensions() {
    let output = compile(&sales_model(), &two_fact_query(), "postgres").unwrap();
    let sql = &output.sql;

    assert!(sql.contains("FROM WAREHOUSE.PUBLIC.ORDERS AS \"Orders\""), "{sql}");
    assert!(
        sql.contains("FROM WAREHOUSE.PUBLIC.STORE_RETURNS AS \"Store Returns\""),
        "{sql}"
    );
    assert!(
        sql.contains(
            "LEFT JOIN WAREHOUSE.PUBLIC.CUSTOMERS AS \"Customers\" \
             ON \"Store Returns\".\"CUSTOMER_ID\" = \"Customers\".\"CUSTOMER_ID\""
        ),
        "{sql}"
    );
}

#[test]
fn test_metric_spanning_facts_uses_cfl() {
    let output = compile(
        &sales_model(),
        &query(r#"{"select": {"dimensions": ["Country"], "measures": ["Net Revenue"]}}"#),
        "postgres",
    )
    .unwrap();
    let sql = &output.sql;

    assert!(sql.contains("WITH composite_01 AS ("), "{sql}");
    // The metric expression applies over the aggregated leg columns.
    assert!(
        sql.contains("SUM(\"Revenue\") - SUM(\"Return Amount\") AS \"Net Revenue\""),
        "{sql}"
    );
    assert_eq!(
        output.resolved.fact_tables,
        vec!["Orders", "Store Returns"]
    );
}

#[test]
fn test_single_fact_metric_stays_star() {
    // Both components of this metric live on Orders, so no CTE appears.
    let model = trellis::model::SemanticModel::from_yaml_str(&format!(
        "{}{}",
        common::SALES_MODEL,
        r#"  - name: Average Item Value
    expression: "{[Revenue]} / {[Order Count]}"
"#
    ))
    .unwrap();

    let output = compile(
        &model,
        &query(
            r#"{"select": {"dimensions": ["Country"], "measures": ["Average Item Value"]}}"#,
        ),
        "postgres",
    )
    .unwrap();
    let sql = &output.sql;

    assert!(!sql.contains("composite_01"), "{sql}");
    assert!(
        sql.contains(
            "SUM(\"Orders\".\"PRICE\" * \"Orders\".\"QUANTITY\") / \
             COUNT(\"Orders\".\"ORDER_ID\") AS \"Average Item Value\""
        ),
        "{sql}"
    );
}

#[test]
fn test_cfl_where_filters_run_inside_legs() {
    let output = compile(
        &sales_model(),
        &query(
            r#"{
                "select": {"dimensions": ["Country"],
                           "measures": ["Revenue", "Return Amount"]},
                "where": [{"field": "Country", "op": "equals", "value": "US"}]
            }"#,
        ),
        "postgres",
    )
    .unwrap();
    let sql = &output.sql;

    // One WHERE per leg, none on the outer aggregation.
    assert_eq!(
        sql.matches("WHERE \"Customers\".\"COUNTRY\" = 'US'").count(),
        2,
        "{sql}"
    );
}

#[test]
fn test_cfl_having_on_shared_measure() {
    let output = compile(
        &sales_model(),
        &query(
            r#"{
                "select": {"dimensions": ["Country"],
                           "measures": ["Revenue", "Return Amount"]},
                "having": [{"field": "Revenue", "op": ">", "value": 1000}]
            }"#,
        ),
        "postgres",
    )
    .unwrap();
    let sql = &output.sql;
    assert!(sql.contains("HAVING SUM(\"Revenue\") > 1000"), "{sql}");
}

#[test]
fn test_total_measure_rejected_under_cfl() {
    let yaml = common::SALES_MODEL.replace(
        "  - name: Revenue\n    aggregation: sum\n",
        "  - name: Revenue\n    aggregation: sum\n    total: true\n",
    );
    let model = trellis::model::SemanticModel::from_yaml_str(&yaml).unwrap();

    let err = compile(&model, &two_fact_query(), "postgres").unwrap_err();
    assert_eq!(
        err.code,
        trellis::semantic::error::ErrorCode::UnsupportedFeature
    );
}

#[test]
fn test_total_measure_in_star_plan() {
    let yaml = common::SALES_MODEL.replace(
        "  - name: Revenue\n    aggregation: sum\n",
        "  - name: Revenue\n    aggregation: sum\n    total: true\n",
    );
    let model = trellis::model::SemanticModel::from_yaml_str(&yaml).unwrap();

    let output = compile(
        &model,
        &query(r#"{"select": {"dimensions": ["Country"], "measures": ["Revenue"]}}"#),
        "postgres",
    )
    .unwrap();
    assert!(
        output.sql.contains(
            "SUM(SUM(\"Orders\".\"PRICE\" * \"Orders\".\"QUANTITY\")) OVER () AS \"Revenue\""
        ),
        "{}",
        output.sql
    );
}
