//! Composite Fact Layer planner - multi-fact plans.
//!
//! Strategy: one CTE (`composite_01`) whose body unions one SELECT per
//! contributing fact. Every leg projects the conformed dimensions in a
//! shared order plus its own pre-aggregation measure columns; sibling
//! measures are padded with typed NULLs (or omitted under
//! `UNION ALL BY NAME`). The outer SELECT re-aggregates each measure
//! over its composite-layer column, groups by the conformed dimensions,
//! and applies HAVING, ORDER BY, and LIMIT.

use log::debug;

use crate::model::SemanticModel;
use crate::semantic::error::CompileResult;
use crate::semantic::join_graph::JoinGraph;
use crate::semantic::resolved::ResolvedQuery;
use crate::sql::dialect::{Dialect, SqlDialect};
use crate::sql::expr::{col, lit_null};
use crate::sql::query::{Cte, CteBody, OrderByExpr, Query, SelectExpr, TableRef, UnionAll};

use super::{star_plan, table_ref, COMPOSITE_CTE};

/// Assemble the composite-fact plan for a resolved multi-fact query.
///
/// Delegates to the star planner when a single fact remains (a metric
/// whose measures all share one fact can arrive here with the CFL flag
/// set by an earlier heuristic).
pub fn cfl_plan(
    resolved: &ResolvedQuery,
    model: &SemanticModel,
    dialect: Dialect,
) -> CompileResult<Query> {
    let facts = resolved.fact_objects();
    if facts.len() < 2 {
        return star_plan(resolved, model);
    }

    let by_name = dialect.capabilities().union_by_name;
    let components = resolved.component_measures();
    debug!(
        "cfl plan: {} legs over {:?}, {} measure columns, by_name: {}",
        facts.len(),
        facts,
        components.len(),
        by_name
    );

    let mut legs = Vec::new();
    for leg in &resolved.legs {
        let mut query = Query::new().from(table_ref(model, &leg.fact)?);
        for step in &leg.join_steps {
            let on = JoinGraph::build_on_condition(step, model)?;
            query = query.left_join(table_ref(model, &step.to_object)?, on);
        }

        let mut projections: Vec<SelectExpr> = Vec::new();
        for dim in &resolved.dimensions {
            projections.push(SelectExpr::new(dim.expr.clone()).with_alias(&dim.name));
        }
        for measure in &components {
            if measure.data_object == leg.fact {
                projections
                    .push(SelectExpr::new(measure.pre_aggregation.clone()).with_alias(&measure.name));
            } else if !by_name {
                // Sibling measure: typed NULL keeps the positional union
                // aligned; the outer aggregate absorbs it.
                let padded = dialect.render_cast(lit_null(), measure.result_type);
                projections.push(SelectExpr::new(padded).with_alias(&measure.name));
            }
        }
        query = query.select(projections);

        // Dimension filters run inside the legs, where source tables are
        // in scope; filtering group keys before aggregation is
        // equivalent to filtering after.
        if let Some(where_expr) = resolved.where_expr() {
            query = query.filter(where_expr);
        }

        legs.push(query);
    }

    let union = UnionAll {
        selects: legs,
        by_name,
    };

    let mut outer = Query::new()
        .with_cte(Cte::new(COMPOSITE_CTE, CteBody::UnionAll(union)))
        .from(TableRef::new(COMPOSITE_CTE));

    let mut projections: Vec<SelectExpr> = Vec::new();
    for dim in &resolved.dimensions {
        projections.push(SelectExpr::new(col(&dim.name)).with_alias(&dim.name));
    }
    for item in &resolved.items {
        projections.push(SelectExpr::new(item.outer_expr()).with_alias(item.name()));
    }
    outer = outer.select(projections);

    if !resolved.dimensions.is_empty() {
        outer = outer.group_by(resolved.dimensions.iter().map(|d| col(&d.name)).collect());
    }

    for having in &resolved.having_predicates {
        outer = outer.having(having.outer_expr.clone());
    }

    if !resolved.order_by.is_empty() {
        outer = outer.order_by(
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
        outer = outer.limit(limit);
    }

    Ok(outer)
}
