//! Model validation - enforces invariants before queries run.
//!
//! Unlike the resolver, which fails fast, validation sweeps the whole
//! model and reports the complete ordered issue list.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::model::expr_parser::{parse_measure_expr, parse_metric_expr};
use crate::model::{DataObject, SemanticModel};
use crate::semantic::error::Span;
use crate::semantic::join_graph::JoinGraph;

/// Validation issue codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueCode {
    DuplicateName,
    NonUniqueColumn,
    CyclicJoin,
    MultipathJoin,
    UnknownJoinTarget,
    UnknownJoinColumn,
    SecondaryMissingPathname,
    DuplicateSecondaryPath,
    UnresolvedMeasureRef,
    UnresolvedDimensionRef,
    MetricCycle,
    ParseError,
}

impl IssueCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCode::DuplicateName => "DUPLICATE_NAME",
            IssueCode::NonUniqueColumn => "NON_UNIQUE_COLUMN",
            IssueCode::CyclicJoin => "CYCLIC_JOIN",
            IssueCode::MultipathJoin => "MULTIPATH_JOIN",
            IssueCode::UnknownJoinTarget => "UNKNOWN_JOIN_TARGET",
            IssueCode::UnknownJoinColumn => "UNKNOWN_JOIN_COLUMN",
            IssueCode::SecondaryMissingPathname => "SECONDARY_MISSING_PATHNAME",
            IssueCode::DuplicateSecondaryPath => "DUPLICATE_SECONDARY_PATH",
            IssueCode::UnresolvedMeasureRef => "UNRESOLVED_MEASURE_REF",
            IssueCode::UnresolvedDimensionRef => "UNRESOLVED_DIMENSION_REF",
            IssueCode::MetricCycle => "METRIC_CYCLE",
            IssueCode::ParseError => "PARSE_ERROR",
        }
    }
}

impl std::fmt::Display for IssueCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One validation finding.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub code: IssueCode,
    pub message: String,
    pub path: Option<String>,
    pub span: Option<Span>,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(span) = &self.span {
            write!(f, " (at {})", span)?;
        }
        Ok(())
    }
}

/// Validate a model, returning every issue found, in sweep order.
pub fn validate(model: &SemanticModel) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    check_uniqueness(model, &mut issues);
    check_join_references(model, &mut issues);
    check_secondary_joins(model, &mut issues);

    // Topology checks need a buildable graph; reference errors above
    // already cover the failure case.
    if let Ok(graph) = JoinGraph::from_model(model) {
        check_cycles(model, &graph, &mut issues);
        check_diamonds(model, &graph, &mut issues);
    }

    check_dimensions(model, &mut issues);
    check_measures(model, &mut issues);
    check_metrics(model, &mut issues);

    issues
}

fn issue(
    model: &SemanticModel,
    code: IssueCode,
    message: String,
    path: String,
) -> ValidationIssue {
    let span = model.span_of(&path);
    ValidationIssue {
        code,
        message,
        path: Some(path),
        span,
    }
}

fn check_uniqueness(model: &SemanticModel, issues: &mut Vec<ValidationIssue>) {
    let mut seen_objects = HashSet::new();
    for object in &model.data_objects {
        if !seen_objects.insert(&object.name) {
            issues.push(issue(
                model,
                IssueCode::DuplicateName,
                format!("Duplicate data object name: '{}'", object.name),
                format!("dataObjects.{}", object.name),
            ));
        }

        let mut seen_columns = HashSet::new();
        for column in &object.columns {
            if !seen_columns.insert(&column.name) {
                issues.push(issue(
                    model,
                    IssueCode::NonUniqueColumn,
                    format!(
                        "Column '{}' appears more than once on '{}'",
                        column.name, object.name
                    ),
                    format!("dataObjects.{}", object.name),
                ));
            }
        }
    }

    // Dimensions, measures, and metrics share one namespace.
    let mut seen_fields: HashMap<&str, &str> = HashMap::new();
    let buckets: [(&str, Vec<&str>); 3] = [
        (
            "dimensions",
            model.dimensions.iter().map(|d| d.name.as_str()).collect(),
        ),
        (
            "measures",
            model.measures.iter().map(|m| m.name.as_str()).collect(),
        ),
        (
            "metrics",
            model.metrics.iter().map(|m| m.name.as_str()).collect(),
        ),
    ];
    for (bucket, names) in buckets {
        for name in names {
            if let Some(existing) = seen_fields.insert(name, bucket) {
                let kind = if existing == bucket {
                    format!("Duplicate {} name: '{}'", bucket.trim_end_matches('s'), name)
                } else {
                    format!(
                        "'{}' is declared both in {} and {}",
                        name, existing, bucket
                    )
                };
                issues.push(issue(
                    model,
                    IssueCode::DuplicateName,
                    kind,
                    format!("{}.{}", bucket, name),
                ));
            }
        }
    }
}

fn check_join_references(model: &SemanticModel, issues: &mut Vec<ValidationIssue>) {
    for object in &model.data_objects {
        for (join_idx, join) in object.joins.iter().enumerate() {
            let path = format!("dataObjects.{}.joins.{}", object.name, join_idx);

            let Some(target) = model.data_object(&join.join_to) else {
                issues.push(ValidationIssue {
                    code: IssueCode::UnknownJoinTarget,
                    message: format!(
                        "Join on '{}' targets unknown data object '{}'",
                        object.name, join.join_to
                    ),
                    span: model.span_of(&format!("dataObjects.{}", object.name)),
                    path: Some(path),
                });
                continue;
            };

            if join.join_columns.len() != join.target_columns.len()
                || join.join_columns.is_empty()
            {
                issues.push(ValidationIssue {
                    code: IssueCode::UnknownJoinColumn,
                    message: format!(
                        "Join from '{}' to '{}' needs matching non-empty column lists \
                         ({} vs {})",
                        object.name,
                        join.join_to,
                        join.join_columns.len(),
                        join.target_columns.len()
                    ),
                    span: model.span_of(&format!("dataObjects.{}", object.name)),
                    path: Some(path),
                });
                continue;
            }

            check_join_columns(model, object, &join.join_columns, &path, issues);
            check_join_columns(model, target, &join.target_columns, &path, issues);
        }
    }
}

fn check_join_columns(
    model: &SemanticModel,
    object: &DataObject,
    columns: &[String],
    path: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    for column in columns {
        if object.column(column).is_none() {
            issues.push(ValidationIssue {
                code: IssueCode::UnknownJoinColumn,
                message: format!(
                    "Join column '{}' does not exist on '{}'",
                    column, object.name
                ),
                span: model.span_of(&format!("dataObjects.{}", object.name)),
                path: Some(path.to_string()),
            });
        }
    }
}

fn check_secondary_joins(model: &SemanticModel, issues: &mut Vec<ValidationIssue>) {
    let mut seen_paths: HashSet<(String, String, String)> = HashSet::new();

    for object in &model.data_objects {
        for (join_idx, join) in object.joins.iter().enumerate() {
            if !join.secondary {
                continue;
            }
            let path = format!("dataObjects.{}.joins.{}", object.name, join_idx);

            let Some(path_name) = &join.path_name else {
                issues.push(ValidationIssue {
                    code: IssueCode::SecondaryMissingPathname,
                    message: format!(
                        "Secondary join from '{}' to '{}' is missing a pathName",
                        object.name, join.join_to
                    ),
                    span: model.span_of(&format!("dataObjects.{}", object.name)),
                    path: Some(path),
                });
                continue;
            };

            let key = (
                object.name.clone(),
                join.join_to.clone(),
                path_name.clone(),
            );
            if !seen_paths.insert(key) {
                issues.push(ValidationIssue {
                    code: IssueCode::DuplicateSecondaryPath,
                    message: format!(
                        "Duplicate secondary path '{}' from '{}' to '{}'",
                        path_name, object.name, join.join_to
                    ),
                    span: model.span_of(&format!("dataObjects.{}", object.name)),
                    path: Some(path),
                });
            }
        }
    }
}

fn check_cycles(model: &SemanticModel, graph: &JoinGraph, issues: &mut Vec<ValidationIssue>) {
    if let Some(cycle) = graph.detect_cycle() {
        issues.push(ValidationIssue {
            code: IssueCode::CyclicJoin,
            message: format!("Join cycle detected: {}", cycle.join(" -> ")),
            span: cycle
                .first()
                .and_then(|name| model.span_of(&format!("dataObjects.{}", name))),
            path: None,
        });
    }
}

fn check_diamonds(model: &SemanticModel, graph: &JoinGraph, issues: &mut Vec<ValidationIssue>) {
    let names = graph.object_names();
    for (i, from) in names.iter().enumerate() {
        for to in &names[i + 1..] {
            let paths = graph.all_simple_paths(from, to, 6);
            if paths.len() < 2 {
                continue;
            }
            // Canonical exception: a single direct edge coexisting with a
            // longer indirect route.
            let direct = paths.iter().filter(|p| p.len() == 1).count();
            if direct == 1 && paths.len() == 2 {
                continue;
            }
            issues.push(ValidationIssue {
                code: IssueCode::MultipathJoin,
                message: format!(
                    "{} join paths between '{}' and '{}'; only a direct edge may \
                     coexist with one indirect route",
                    paths.len(),
                    from,
                    to
                ),
                span: model.span_of(&format!("dataObjects.{}", from)),
                path: None,
            });
        }
    }
}

fn check_dimensions(model: &SemanticModel, issues: &mut Vec<ValidationIssue>) {
    for dimension in &model.dimensions {
        let path = format!("dimensions.{}", dimension.name);
        match model.data_object(&dimension.data_object) {
            None => issues.push(issue(
                model,
                IssueCode::UnresolvedDimensionRef,
                format!(
                    "Dimension '{}' references unknown data object '{}'",
                    dimension.name, dimension.data_object
                ),
                path,
            )),
            Some(object) => {
                if object.column(&dimension.column).is_none() {
                    issues.push(issue(
                        model,
                        IssueCode::UnresolvedDimensionRef,
                        format!(
                            "Dimension '{}' references unknown column '{}' on '{}'",
                            dimension.name, dimension.column, dimension.data_object
                        ),
                        path,
                    ));
                }
            }
        }
    }
}

fn check_measures(model: &SemanticModel, issues: &mut Vec<ValidationIssue>) {
    for measure in &model.measures {
        let path = format!("measures.{}", measure.name);

        let Some(text) = measure.expression_text() else {
            issues.push(issue(
                model,
                IssueCode::UnresolvedMeasureRef,
                format!(
                    "Measure '{}' defines neither a column nor an expression",
                    measure.name
                ),
                path,
            ));
            continue;
        };

        let mut texts = vec![text];
        if let Some(filter) = &measure.filter {
            texts.push(filter.clone());
        }
        texts.extend(measure.order_within_group.iter().cloned());

        for text in texts {
            match parse_measure_expr(&text) {
                Err(err) => issues.push(issue(
                    model,
                    IssueCode::ParseError,
                    format!("Measure '{}': {}", measure.name, err),
                    path.clone(),
                )),
                Ok(expr) => {
                    for (object_name, column_name) in expr.column_refs() {
                        match model.data_object(object_name) {
                            None => issues.push(issue(
                                model,
                                IssueCode::UnresolvedMeasureRef,
                                format!(
                                    "Measure '{}' references unknown data object '{}'",
                                    measure.name, object_name
                                ),
                                path.clone(),
                            )),
                            Some(object) => {
                                if object.column(column_name).is_none() {
                                    issues.push(issue(
                                        model,
                                        IssueCode::UnresolvedMeasureRef,
                                        format!(
                                            "Measure '{}' references unknown column \
                                             '{}' on '{}'",
                                            measure.name, column_name, object_name
                                        ),
                                        path.clone(),
                                    ));
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn check_metrics(model: &SemanticModel, issues: &mut Vec<ValidationIssue>) {
    // Reference resolution plus a metric -> metric dependency graph for
    // cycle detection (a `{[Name]}` may name a measure or another metric).
    let mut deps: HashMap<&str, Vec<String>> = HashMap::new();

    for metric in &model.metrics {
        let path = format!("metrics.{}", metric.name);
        match parse_metric_expr(&metric.expression) {
            Err(err) => issues.push(issue(
                model,
                IssueCode::ParseError,
                format!("Metric '{}': {}", metric.name, err),
                path,
            )),
            Ok(expr) => {
                let mut metric_deps = Vec::new();
                for name in expr.measure_refs() {
                    if model.measure(name).is_some() {
                        continue;
                    }
                    if model.metric(name).is_some() {
                        metric_deps.push(name.to_string());
                        continue;
                    }
                    issues.push(issue(
                        model,
                        IssueCode::UnresolvedMeasureRef,
                        format!(
                            "Metric '{}' references unknown measure '{}'",
                            metric.name, name
                        ),
                        path.clone(),
                    ));
                }
                deps.insert(&metric.name, metric_deps);
            }
        }
    }

    // The same cycle is reachable from each of its members; report it
    // once, keyed by its node set.
    let mut seen_cycles: Vec<BTreeSet<String>> = Vec::new();
    for metric in &model.metrics {
        let mut visited = HashSet::new();
        let mut path_stack = Vec::new();
        if let Some(cycle) = metric_cycle(&metric.name, &deps, &mut visited, &mut path_stack) {
            let nodes: BTreeSet<String> = cycle.iter().cloned().collect();
            if seen_cycles.contains(&nodes) {
                continue;
            }
            seen_cycles.push(nodes);
            issues.push(issue(
                model,
                IssueCode::MetricCycle,
                format!("Metric reference cycle: {}", cycle.join(" -> ")),
                format!("metrics.{}", metric.name),
            ));
        }
    }
}

fn metric_cycle(
    node: &str,
    deps: &HashMap<&str, Vec<String>>,
    visited: &mut HashSet<String>,
    path: &mut Vec<String>,
) -> Option<Vec<String>> {
    if path.iter().any(|n| n == node) {
        let start = path.iter().position(|n| n == node).unwrap();
        let mut cycle = path[start..].to_vec();
        cycle.push(node.to_string());
        return Some(cycle);
    }
    if visited.contains(node) {
        return None;
    }
    visited.insert(node.to_string());
    path.push(node.to_string());

    if let Some(children) = deps.get(node) {
        for child in children {
            if let Some(cycle) = metric_cycle(child, deps, visited, path) {
                return Some(cycle);
            }
        }
    }

    path.pop();
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SemanticModel;

    fn model(yaml: &str) -> SemanticModel {
        SemanticModel::from_yaml_str(yaml).unwrap()
    }

    fn codes(issues: &[ValidationIssue]) -> Vec<IssueCode> {
        issues.iter().map(|i| i.code).collect()
    }

    #[test]
    fn test_clean_model_has_no_issues() {
        let m = model(
            r#"
dataObjects:
  - name: Orders
    code: ORDERS
    columns:
      - { name: Customer Id, code: CUSTOMER_ID, type: int }
      - { name: Price, code: PRICE, type: float }
    joins:
      - joinTo: Customers
        joinColumns: [Customer Id]
        targetColumns: [Customer Id]
        joinType: many-to-one
  - name: Customers
    code: CUSTOMERS
    columns:
      - { name: Customer Id, code: CUSTOMER_ID, type: int }
      - { name: Country, code: COUNTRY, type: string }
dimensions:
  - { name: Country, dataObject: Customers, column: Country }
measures:
  - name: Revenue
    aggregation: sum
    expression: "{[Orders].[Price]}"
metrics:
  - { name: Double Revenue, expression: "{[Revenue]} * 2" }
"#,
        );
        assert!(validate(&m).is_empty(), "{:?}", validate(&m));
    }

    #[test]
    fn test_duplicate_names() {
        let m = model(
            r#"
dataObjects:
  - name: Orders
    code: ORDERS
    columns:
      - { name: Price, code: PRICE, type: float }
      - { name: Price, code: PRICE_2, type: float }
dimensions: []
measures:
  - { name: Revenue, aggregation: sum, dataObject: Orders, column: Price }
metrics:
  - { name: Revenue, expression: "{[Revenue]}" }
"#,
        );
        let issues = validate(&m);
        assert!(codes(&issues).contains(&IssueCode::NonUniqueColumn));
        assert!(codes(&issues).contains(&IssueCode::DuplicateName));
    }

    #[test]
    fn test_unknown_join_target_and_column() {
        let m = model(
            r#"
dataObjects:
  - name: Orders
    code: ORDERS
    columns:
      - { name: Customer Id, code: CUSTOMER_ID, type: int }
    joins:
      - joinTo: Nowhere
        joinColumns: [Customer Id]
        targetColumns: [Customer Id]
        joinType: many-to-one
      - joinTo: Orders
        joinColumns: [Ghost]
        targetColumns: [Customer Id]
        joinType: one-to-one
"#,
        );
        let issues = validate(&m);
        assert!(codes(&issues).contains(&IssueCode::UnknownJoinTarget));
        assert!(codes(&issues).contains(&IssueCode::UnknownJoinColumn));
    }

    #[test]
    fn test_secondary_join_constraints() {
        let m = model(
            r#"
dataObjects:
  - name: Orders
    code: ORDERS
    columns:
      - { name: Customer Id, code: CUSTOMER_ID, type: int }
      - { name: Payer Id, code: PAYER_ID, type: int }
    joins:
      - joinTo: Customers
        joinColumns: [Customer Id]
        targetColumns: [Customer Id]
        joinType: many-to-one
      - joinTo: Customers
        joinColumns: [Payer Id]
        targetColumns: [Customer Id]
        joinType: many-to-one
        secondary: true
      - joinTo: Customers
        joinColumns: [Payer Id]
        targetColumns: [Customer Id]
        joinType: many-to-one
        secondary: true
        pathName: payer
      - joinTo: Customers
        joinColumns: [Payer Id]
        targetColumns: [Customer Id]
        joinType: many-to-one
        secondary: true
        pathName: payer
  - name: Customers
    code: CUSTOMERS
    columns:
      - { name: Customer Id, code: CUSTOMER_ID, type: int }
"#,
        );
        let issues = validate(&m);
        assert!(codes(&issues).contains(&IssueCode::SecondaryMissingPathname));
        assert!(codes(&issues).contains(&IssueCode::DuplicateSecondaryPath));
    }

    #[test]
    fn test_cycle_detection() {
        let m = model(
            r#"
dataObjects:
  - name: A
    code: A
    columns: [{ name: Id, code: ID, type: int }]
    joins:
      - { joinTo: B, joinColumns: [Id], targetColumns: [Id], joinType: many-to-one }
  - name: B
    code: B
    columns: [{ name: Id, code: ID, type: int }]
    joins:
      - { joinTo: A, joinColumns: [Id], targetColumns: [Id], joinType: many-to-one }
"#,
        );
        assert!(codes(&validate(&m)).contains(&IssueCode::CyclicJoin));
    }

    #[test]
    fn test_diamond_rejected_canonical_allowed() {
        let diamond = model(
            r#"
dataObjects:
  - name: A
    code: A
    columns:
      - { name: B Id, code: B_ID, type: int }
      - { name: C Id, code: C_ID, type: int }
    joins:
      - { joinTo: B, joinColumns: [B Id], targetColumns: [Id], joinType: many-to-one }
      - { joinTo: C, joinColumns: [C Id], targetColumns: [Id], joinType: many-to-one }
  - name: B
    code: B
    columns:
      - { name: Id, code: ID, type: int }
      - { name: D Id, code: D_ID, type: int }
    joins:
      - { joinTo: D, joinColumns: [D Id], targetColumns: [Id], joinType: many-to-one }
  - name: C
    code: C
    columns:
      - { name: Id, code: ID, type: int }
      - { name: D Id, code: D_ID, type: int }
    joins:
      - { joinTo: D, joinColumns: [D Id], targetColumns: [Id], joinType: many-to-one }
  - name: D
    code: D
    columns: [{ name: Id, code: ID, type: int }]
"#,
        );
        assert!(codes(&validate(&diamond)).contains(&IssueCode::MultipathJoin));

        let canonical = model(
            r#"
dataObjects:
  - name: A
    code: A
    columns:
      - { name: B Id, code: B_ID, type: int }
      - { name: C Id, code: C_ID, type: int }
    joins:
      - { joinTo: B, joinColumns: [B Id], targetColumns: [Id], joinType: many-to-one }
      - { joinTo: C, joinColumns: [C Id], targetColumns: [Id], joinType: many-to-one }
  - name: B
    code: B
    columns:
      - { name: Id, code: ID, type: int }
      - { name: C Id, code: C_ID, type: int }
    joins:
      - { joinTo: C, joinColumns: [C Id], targetColumns: [Id], joinType: many-to-one }
  - name: C
    code: C
    columns: [{ name: Id, code: ID, type: int }]
"#,
        );
        let issues = validate(&canonical);
        assert!(
            !codes(&issues).contains(&IssueCode::MultipathJoin),
            "{:?}",
            issues
        );
    }

    #[test]
    fn test_unresolved_references() {
        let m = model(
            r#"
dataObjects:
  - name: Orders
    code: ORDERS
    columns: [{ name: Price, code: PRICE, type: float }]
dimensions:
  - { name: Country, dataObject: Customers, column: Country }
measures:
  - name: Revenue
    aggregation: sum
    expression: "{[Orders].[Ghost]}"
metrics:
  - { name: Margin, expression: "{[Profit]} / {[Revenue]}" }
"#,
        );
        let issues = validate(&m);
        assert!(codes(&issues).contains(&IssueCode::UnresolvedDimensionRef));
        assert!(codes(&issues).contains(&IssueCode::UnresolvedMeasureRef));
    }

    #[test]
    fn test_metric_cycle() {
        let m = model(
            r#"
dataObjects:
  - name: Orders
    code: ORDERS
    columns: [{ name: Price, code: PRICE, type: float }]
measures:
  - { name: Revenue, aggregation: sum, dataObject: Orders, column: Price }
metrics:
  - { name: A, expression: "{[B]} + {[Revenue]}" }
  - { name: B, expression: "{[A]} * 2" }
"#,
        );
        assert!(codes(&validate(&m)).contains(&IssueCode::MetricCycle));
    }

    #[test]
    fn test_independent_metric_cycles_all_reported() {
        let m = model(
            r#"
dataObjects:
  - name: Orders
    code: ORDERS
    columns: [{ name: Price, code: PRICE, type: float }]
measures:
  - { name: Revenue, aggregation: sum, dataObject: Orders, column: Price }
metrics:
  - { name: A, expression: "{[B]} + {[Revenue]}" }
  - { name: B, expression: "{[A]} * 2" }
  - { name: C, expression: "{[D]} + {[Revenue]}" }
  - { name: D, expression: "{[C]} * 2" }
"#,
        );
        let issues = validate(&m);
        let cycles: Vec<_> = issues
            .iter()
            .filter(|i| i.code == IssueCode::MetricCycle)
            .collect();
        // One issue per distinct cycle: A<->B and C<->D, with neither
        // repeated for its second member.
        assert_eq!(cycles.len(), 2, "{:?}", issues);
    }

    #[test]
    fn test_issue_carries_span() {
        let m = model(
            r#"
dataObjects:
  - name: Orders
    code: ORDERS
    columns: [{ name: Price, code: PRICE, type: float }]
dimensions:
  - { name: Country, dataObject: Customers, column: Country }
"#,
        );
        let issues = validate(&m);
        let dim_issue = issues
            .iter()
            .find(|i| i.code == IssueCode::UnresolvedDimensionRef)
            .unwrap();
        assert!(dim_issue.span.is_some());
        assert_eq!(dim_issue.path.as_deref(), Some("dimensions.Country"));
    }
}
