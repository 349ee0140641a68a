//! Star planner - single-fact plans.
//!
//! Emits one SELECT: the base fact as root, a LEFT JOIN per join step in
//! traversal order, dimensions then measures in the projection, and the
//! bare dimension expressions repeated in GROUP BY.

use log::debug;

use crate::model::types::AggregationKind;
use crate::model::SemanticModel;
use crate::semantic::error::CompileResult;
use crate::semantic::join_graph::JoinGraph;
use crate::semantic::resolved::{ResolvedMeasure, ResolvedMeasureItem, ResolvedQuery};
use crate::sql::expr::Expr;
use crate::sql::query::{OrderByExpr, Query, SelectExpr};

use super::table_ref;

/// Assemble the star plan for a resolved single-fact query.
pub fn star_plan(resolved: &ResolvedQuery, model: &SemanticModel) -> CompileResult<Query> {
    debug!(
        "star plan: base '{}', {} joins",
        resolved.base_object,
        resolved.join_steps.len()
    );

    let mut query = Query::new().from(table_ref(model, &resolved.base_object)?);

    for step in &resolved.join_steps {
        let on = JoinGraph::build_on_condition(step, model)?;
        query = query.left_join(table_ref(model, &step.to_object)?, on);
    }

    let mut projections: Vec<SelectExpr> = Vec::new();
    for dim in &resolved.dimensions {
        projections.push(SelectExpr::new(dim.expr.clone()).with_alias(&dim.name));
    }
    for item in &resolved.items {
        projections.push(SelectExpr::new(item_expr(item, resolved)).with_alias(item.name()));
    }
    query = query.select(projections);

    if let Some(where_expr) = resolved.where_expr() {
        query = query.filter(where_expr);
    }

    if !resolved.dimensions.is_empty() {
        query = query.group_by(resolved.dimensions.iter().map(|d| d.expr.clone()).collect());
    }

    for having in &resolved.having_predicates {
        query = query.having(having.star_expr.clone());
    }

    if !resolved.order_by.is_empty() {
        query = query.order_by(
            resolved
                .order_by
                .iter()
                .map(|(expr, descending)| {
                    if *descending {
                        OrderByExpr::desc(expr.clone())
                    } else {
                        OrderByExpr::asc(expr.clone())
                    }
                })
                .collect(),
        );
    }

    if let Some(limit) = resolved.limit {
        query = query.limit(limit);
    }

    Ok(query)
}

/// The projection expression for a measure-or-metric item, applying
/// total windowing when the measure asks for it and the query groups.
fn item_expr(item: &ResolvedMeasureItem, resolved: &ResolvedQuery) -> Expr {
    match item {
        ResolvedMeasureItem::Measure(measure)
            if measure.total && !resolved.dimensions.is_empty() =>
        {
            total_window(measure)
        }
        other => other.star_expr(),
    }
}

/// Grand total over the grouped result: the aggregate re-aggregated over
/// an empty window, e.g. `SUM(SUM(x)) OVER ()`. Counts re-aggregate with
/// SUM.
fn total_window(measure: &ResolvedMeasure) -> Expr {
    let outer_name = match measure.aggregation {
        AggregationKind::Count | AggregationKind::CountDistinct => "SUM",
        kind => kind.function_name(),
    };
    Expr::WindowFunction {
        function: Box::new(Expr::Function {
            name: outer_name.into(),
            args: vec![measure.aggregate.clone()],
            distinct: false,
        }),
        partition_by: vec![],
        order_by: vec![],
    }
}
