//! Shared fixtures for the integration suites.

use trellis::model::SemanticModel;
use trellis::semantic::query::QueryObject;

/// A small retail model: two facts (Orders, Store Returns) sharing the
/// Customers dimension table.
pub const SALES_MODEL: &str = r#"
version: 1
dataObjects:
  - name: Orders
    code: ORDERS
    database: WAREHOUSE
    schema: PUBLIC
    columns:
      - { name: Order Id, code: ORDER_ID, type: int }
      - { name: Customer Id, code: CUSTOMER_ID, type: int }
      - { name: Price, code: PRICE, type: float }
      - { name: Quantity, code: QUANTITY, type: int }
      - { name: Order Date, code: ORDER_DATE, type: date }
      - { name: Status, code: STATUS, type: string }
    joins:
      - joinTo: Customers
        joinColumns: [Customer Id]
        targetColumns: [Customer Id]
        joinType: many-to-one
  - name: Store Returns
    code: STORE_RETURNS
    database: WAREHOUSE
    schema: PUBLIC
    columns:
      - { name: Return Id, code: RETURN_ID, type: int }
      - { name: Customer Id, code: CUSTOMER_ID, type: int }
      - { name: Return Amount, code: RETURN_AMOUNT, type: float }
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
  - { name: Order Date, dataObject: Orders, column: Order Date }
  - { name: Order Status, dataObject: Orders, column: Status }
measures:
  - name: Revenue
    aggregation: sum
    expression: "{[Orders].[Price]} * {[Orders].[Quantity]}"
  - name: Return Amount
    aggregation: sum
    expression: "{[Store Returns].[Return Amount]}"
  - name: Order Count
    aggregation: count
    dataObject: Orders
    column: Order Id
  - name: Customer Count
    aggregation: count_distinct
    dataObject: Customers
    column: Customer Id
  - name: Customer Reach
    aggregation: count_distinct
    dataObject: Customers
    column: Customer Id
    allowFanOut: true
metrics:
  - name: Net Revenue
    expression: "{[Revenue]} - {[Return Amount]}"
"#;

pub fn sales_model() -> SemanticModel {
    let model = SemanticModel::from_yaml_str(SALES_MODEL).expect("fixture model loads");
    let issues = model.validate();
    assert!(issues.is_empty(), "fixture model is valid: {:?}", issues);
    model
}

pub fn query(json: &str) -> QueryObject {
    serde_json::from_str(json).expect("fixture query parses")
}
