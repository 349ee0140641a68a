//! Query resolution - transforms a query request into planner input.
//!
//! Resolution maps every name in the request to concrete model entities,
//! applies time grains, builds aggregate expressions, picks the base
//! fact, computes join steps, classifies filters, and runs the fanout
//! check, producing a [`ResolvedQuery`] the planners consume verbatim.

use std::collections::HashSet;

use log::debug;

use crate::model::expr_parser::{self, ModelExpr};
use crate::model::types::{ColumnType, TimeGrain};
use crate::model::{Measure, SemanticModel};
use crate::semantic::error::{CompileError, CompileResult, ErrorCode};
use crate::semantic::join_graph::{JoinGraph, JoinStep, PathOverrides};
use crate::semantic::query::{
    Filter, FilterOp, QueryObject, RelativeDirection, RelativeSpec, SortDirection,
    split_grain_suffix,
};
use crate::semantic::resolved::{
    lower_bin_op, FactLeg, ResolvedDimension, ResolvedHaving, ResolvedMeasure,
    ResolvedMeasureItem, ResolvedMetricExpr, ResolvedQuery, ResolvedWhere,
};
use crate::sql::dialect::{Dialect, SqlDialect};
use crate::sql::expr::{
    col, lit_bool, lit_float, lit_int, lit_str, table_col, Expr, ExprExt, OrderSpec,
    UnaryOperator,
};

/// Resolver over one (model, dialect) pair.
pub struct Resolver<'a> {
    model: &'a SemanticModel,
    graph: JoinGraph,
    dialect: Dialect,
}

/// Resolve a query against a model for a dialect.
pub fn resolve(
    query: &QueryObject,
    model: &SemanticModel,
    dialect: Dialect,
) -> CompileResult<ResolvedQuery> {
    Resolver::new(model, dialect)?.resolve(query)
}

impl<'a> Resolver<'a> {
    pub fn new(model: &'a SemanticModel, dialect: Dialect) -> CompileResult<Self> {
        Ok(Self {
            model,
            graph: JoinGraph::from_model(model)?,
            dialect,
        })
    }

    pub fn resolve(&self, query: &QueryObject) -> CompileResult<ResolvedQuery> {
        if query.select.dimensions.is_empty() && query.select.measures.is_empty() {
            return Err(CompileError::new(
                ErrorCode::NoFact,
                "Query selects no dimensions and no measures",
            ));
        }

        // Select block
        let dimensions = self.resolve_dimensions(&query.select.dimensions)?;
        let items = self.resolve_measure_items(&query.select.measures)?;

        // Filters classify by the referenced field, not by the block the
        // caller put them in.
        let mut where_predicates = Vec::new();
        let mut having_predicates = Vec::new();
        let mut having_components: Vec<ResolvedMeasure> = Vec::new();
        for filter in query.where_filters.iter().chain(&query.having) {
            self.classify_filter(
                filter,
                &mut where_predicates,
                &mut having_predicates,
                &mut having_components,
            )?;
        }

        // Fact selection
        let mut components: Vec<&ResolvedMeasure> = Vec::new();
        {
            let mut seen = HashSet::new();
            for measure in items
                .iter()
                .flat_map(|i| i.component_measures())
                .chain(having_components.iter())
            {
                if seen.insert(measure.name.as_str()) {
                    components.push(measure);
                }
            }
        }

        let facts: Vec<String> = {
            let mut seen = HashSet::new();
            components
                .iter()
                .filter(|m| seen.insert(m.data_object.as_str()))
                .map(|m| m.data_object.clone())
                .collect()
        };

        let requires_cfl = facts.len() > 1;
        let base_object = match facts.first() {
            None => dimensions
                .first()
                .map(|d| d.data_object.clone())
                .ok_or_else(|| {
                    CompileError::new(
                        ErrorCode::NoFact,
                        "Query has no resolvable base data object",
                    )
                })?,
            Some(fact) if facts.len() == 1 => fact.clone(),
            Some(_) => self.pick_base(&facts),
        };
        debug!(
            "resolved base fact '{}' (facts: {:?}, cfl: {})",
            base_object, facts, requires_cfl
        );

        if requires_cfl {
            for measure in &components {
                if measure.total {
                    return Err(CompileError::unsupported_feature(format!(
                        "Measure '{}' uses total windowing, which is not supported \
                         in multi-fact queries",
                        measure.name
                    )));
                }
                if let Some(def) = self.model.measure(&measure.name) {
                    if !def.order_within_group.is_empty() {
                        return Err(CompileError::unsupported_feature(format!(
                            "Measure '{}' orders within group, which is not supported \
                             in multi-fact queries",
                            measure.name
                        )));
                    }
                }
            }
        }

        // Required objects: dimension sources, measure sources, filter
        // sources.
        let mut required_objects: Vec<String> = Vec::new();
        let push_required = |name: &str, required: &mut Vec<String>| {
            if !required.iter().any(|r| r == name) {
                required.push(name.to_string());
            }
        };
        push_required(&base_object, &mut required_objects);
        for dim in &dimensions {
            push_required(&dim.data_object, &mut required_objects);
        }
        for measure in &components {
            for object in &measure.referenced_objects {
                push_required(object, &mut required_objects);
            }
        }
        for predicate in &where_predicates {
            push_required(&predicate.data_object, &mut required_objects);
        }

        // Join routing
        let overrides = self.build_overrides(query)?;
        let join_steps =
            self.graph
                .find_join_tree(&base_object, &required_objects, &overrides)?;
        debug!("star join steps: {}", join_steps.len());

        let legs = if requires_cfl {
            self.resolve_legs(&facts, &components, &dimensions, &where_predicates, &overrides)?
        } else {
            vec![]
        };

        // Fanout check, before any planning.
        if requires_cfl {
            for leg in &legs {
                let leg_measures: Vec<&ResolvedMeasure> = components
                    .iter()
                    .copied()
                    .filter(|m| m.data_object == leg.fact)
                    .collect();
                self.check_fanout(&leg.join_steps, leg_measures.iter().copied())?;
            }
        } else {
            self.check_fanout(&join_steps, components.iter().copied())?;
        }

        // ORDER BY maps to projection aliases.
        let mut order_by = Vec::new();
        for entry in &query.order_by {
            let alias = self.order_alias(entry.field.as_str(), &dimensions, &items)?;
            order_by.push((col(alias), entry.direction == SortDirection::Desc));
        }

        Ok(ResolvedQuery {
            dimensions,
            items,
            base_object,
            required_objects,
            join_steps,
            legs,
            where_predicates,
            having_predicates,
            having_components,
            order_by,
            limit: query.limit,
            overrides,
            requires_cfl,
        })
    }

    // =========================================================================
    // Dimensions
    // =========================================================================

    fn resolve_dimensions(&self, tokens: &[String]) -> CompileResult<Vec<ResolvedDimension>> {
        let mut out = Vec::new();
        for token in tokens {
            let (name, grain_suffix) = split_grain_suffix(token);
            let dimension = self.model.dimension(name).ok_or_else(|| {
                CompileError::new(
                    ErrorCode::UnknownDimension,
                    format!("Unknown dimension: '{}'", name),
                )
                .with_related(name)
            })?;

            let object = self
                .model
                .data_object(&dimension.data_object)
                .ok_or_else(|| CompileError::unknown_data_object(&dimension.data_object))?;
            let column = object
                .column(&dimension.column)
                .ok_or_else(|| CompileError::unknown_column(&object.name, &dimension.column))?;

            // Query-level grain override wins over the dimension default.
            let grain = match grain_suffix {
                Some(suffix) => Some(TimeGrain::parse(suffix).ok_or_else(|| {
                    CompileError::new(
                        ErrorCode::InvalidGrain,
                        format!("Invalid time grain '{}' on '{}'", suffix, name),
                    )
                    .with_related(suffix)
                })?),
                None => dimension.default_grain,
            };

            if grain.is_some() && !column.column_type.is_temporal() {
                return Err(CompileError::new(
                    ErrorCode::InvalidGrain,
                    format!(
                        "Dimension '{}' is not temporal; a time grain cannot apply",
                        name
                    ),
                )
                .with_related(name));
            }

            let mut expr = table_col(&object.name, &column.code);
            if let Some(grain) = grain {
                expr = self.dialect.render_time_grain(expr, grain);
            }

            out.push(ResolvedDimension {
                name: dimension.name.clone(),
                data_object: object.name.clone(),
                expr,
                column_type: dimension.result_type.unwrap_or(column.column_type),
            });
        }
        Ok(out)
    }

    // =========================================================================
    // Measures and metrics
    // =========================================================================

    fn resolve_measure_items(&self, names: &[String]) -> CompileResult<Vec<ResolvedMeasureItem>> {
        let mut out = Vec::new();
        for name in names {
            if let Some(measure) = self.model.measure(name) {
                out.push(ResolvedMeasureItem::Measure(self.resolve_measure(measure)?));
            } else if self.model.metric(name).is_some() {
                let mut visited = Vec::new();
                let expr = self.resolve_metric_expr(name, &mut visited)?;
                out.push(ResolvedMeasureItem::Metric {
                    name: name.clone(),
                    expr,
                });
            } else {
                return Err(CompileError::unknown_field(name));
            }
        }
        Ok(out)
    }

    fn resolve_measure(&self, measure: &Measure) -> CompileResult<ResolvedMeasure> {
        let text = measure.expression_text().ok_or_else(|| {
            CompileError::new(
                ErrorCode::UnresolvedMeasureRef,
                format!(
                    "Measure '{}' defines neither a column nor an expression",
                    measure.name
                ),
            )
            .with_related(&measure.name)
        })?;

        let parsed = expr_parser::parse_measure_expr(&text)?;
        let refs = parsed.column_refs();
        if refs.is_empty() {
            return Err(CompileError::new(
                ErrorCode::UnresolvedMeasureRef,
                format!("Measure '{}' references no columns", measure.name),
            )
            .with_related(&measure.name));
        }

        let mut referenced_objects = Vec::new();
        for (object, _) in &refs {
            if !referenced_objects.iter().any(|o| o == object) {
                referenced_objects.push(object.to_string());
            }
        }
        let home = referenced_objects[0].clone();
        let input_type = self.column_type_of(refs[0].0, refs[0].1)?;

        let mut pre_aggregation = self.lower_measure_expr(&parsed)?;
        if let Some(filter) = &measure.filter {
            let predicate = self.lower_measure_expr(&expr_parser::parse_measure_expr(filter)?)?;
            pre_aggregation = Expr::Case {
                operand: None,
                when_clauses: vec![(predicate, pre_aggregation)],
                else_clause: None,
            };
        }

        let aggregate = self.build_aggregate(measure, pre_aggregation.clone())?;

        Ok(ResolvedMeasure {
            name: measure.name.clone(),
            data_object: home,
            referenced_objects,
            aggregate,
            pre_aggregation,
            aggregation: measure.aggregation,
            distinct: measure.distinct,
            delimiter: measure.delimiter.clone(),
            result_type: measure.aggregation.result_type(input_type),
            total: measure.total,
            allow_fan_out: measure.allow_fan_out,
        })
    }

    fn build_aggregate(&self, measure: &Measure, inner: Expr) -> CompileResult<Expr> {
        use crate::model::types::AggregationKind;

        let aggregate = match measure.aggregation {
            AggregationKind::CountDistinct => crate::sql::expr::count_distinct(inner),
            AggregationKind::ListAgg => {
                let delimiter = measure.delimiter.as_deref().unwrap_or(",");
                let call = Expr::Function {
                    name: "LISTAGG".into(),
                    args: vec![inner, lit_str(delimiter)],
                    distinct: measure.distinct,
                };
                if measure.order_within_group.is_empty() {
                    call
                } else {
                    let mut order_by = Vec::new();
                    for text in &measure.order_within_group {
                        let expr = self
                            .lower_measure_expr(&expr_parser::parse_measure_expr(text)?)?;
                        order_by.push(OrderSpec::asc(expr));
                    }
                    Expr::WithinGroup {
                        function: Box::new(call),
                        order_by,
                    }
                }
            }
            kind => Expr::Function {
                name: kind.function_name().into(),
                args: vec![inner],
                distinct: measure.distinct,
            },
        };
        Ok(aggregate)
    }

    fn resolve_metric_expr(
        &self,
        name: &str,
        visited: &mut Vec<String>,
    ) -> CompileResult<ResolvedMetricExpr> {
        if visited.iter().any(|v| v == name) {
            return Err(CompileError::new(
                ErrorCode::MetricCycle,
                format!("Metric reference cycle through '{}'", name),
            )
            .with_related(name));
        }
        visited.push(name.to_string());

        let metric = self
            .model
            .metric(name)
            .ok_or_else(|| CompileError::new(ErrorCode::UnknownMetric, format!(
                "Unknown metric: '{}'",
                name
            )))?;
        let parsed = expr_parser::parse_metric_expr(&metric.expression)?;
        let lowered = self.lower_metric_expr(&parsed, visited)?;

        visited.pop();
        Ok(lowered)
    }

    fn lower_metric_expr(
        &self,
        expr: &ModelExpr,
        visited: &mut Vec<String>,
    ) -> CompileResult<ResolvedMetricExpr> {
        match expr {
            ModelExpr::MeasureRef(name) => {
                if let Some(measure) = self.model.measure(name) {
                    Ok(ResolvedMetricExpr::Measure(self.resolve_measure(measure)?))
                } else if self.model.metric(name).is_some() {
                    // Nested metric: inline its expression.
                    let inner = self.resolve_metric_expr(name, visited)?;
                    Ok(ResolvedMetricExpr::Paren(Box::new(inner)))
                } else {
                    Err(CompileError::unknown_measure(name))
                }
            }
            ModelExpr::Int(n) => Ok(ResolvedMetricExpr::Int(*n)),
            ModelExpr::Float(f) => Ok(ResolvedMetricExpr::Float(*f)),
            ModelExpr::Str(s) => Ok(ResolvedMetricExpr::Str(s.clone())),
            ModelExpr::Binary { left, op, right } => Ok(ResolvedMetricExpr::Binary {
                left: Box::new(self.lower_metric_expr(left, visited)?),
                op: *op,
                right: Box::new(self.lower_metric_expr(right, visited)?),
            }),
            ModelExpr::Neg(inner) => Ok(ResolvedMetricExpr::Neg(Box::new(
                self.lower_metric_expr(inner, visited)?,
            ))),
            ModelExpr::Paren(inner) => Ok(ResolvedMetricExpr::Paren(Box::new(
                self.lower_metric_expr(inner, visited)?,
            ))),
            ModelExpr::Func { name, args } => {
                let mut lowered = Vec::new();
                for arg in args {
                    lowered.push(self.lower_metric_expr(arg, visited)?);
                }
                Ok(ResolvedMetricExpr::Func {
                    name: name.clone(),
                    args: lowered,
                })
            }
            ModelExpr::Not(_) | ModelExpr::ColumnRef { .. } => Err(CompileError::parse(
                "Metric expressions support measures, literals, arithmetic, and functions",
            )),
        }
    }

    /// Lower a parsed measure expression to SQL, mapping display names to
    /// physical codes.
    fn lower_measure_expr(&self, expr: &ModelExpr) -> CompileResult<Expr> {
        match expr {
            ModelExpr::ColumnRef { object, column } => {
                let data_object = self
                    .model
                    .data_object(object)
                    .ok_or_else(|| CompileError::unknown_data_object(object))?;
                let code = &data_object
                    .column(column)
                    .ok_or_else(|| CompileError::unknown_column(object, column))?
                    .code;
                Ok(table_col(&data_object.name, code))
            }
            ModelExpr::MeasureRef(name) => Err(CompileError::unknown_measure(name)),
            ModelExpr::Int(n) => Ok(lit_int(*n)),
            ModelExpr::Float(f) => Ok(lit_float(*f)),
            ModelExpr::Str(s) => Ok(lit_str(s)),
            ModelExpr::Binary { left, op, right } => Ok(Expr::BinaryOp {
                left: Box::new(self.lower_measure_expr(left)?),
                op: lower_bin_op(*op),
                right: Box::new(self.lower_measure_expr(right)?),
            }),
            ModelExpr::Neg(inner) => Ok(Expr::UnaryOp {
                op: UnaryOperator::Minus,
                expr: Box::new(self.lower_measure_expr(inner)?),
            }),
            ModelExpr::Not(inner) => Ok(Expr::UnaryOp {
                op: UnaryOperator::Not,
                expr: Box::new(Expr::Paren(Box::new(self.lower_measure_expr(inner)?))),
            }),
            ModelExpr::Paren(inner) => {
                Ok(Expr::Paren(Box::new(self.lower_measure_expr(inner)?)))
            }
            ModelExpr::Func { name, args } => {
                let mut lowered = Vec::new();
                for arg in args {
                    lowered.push(self.lower_measure_expr(arg)?);
                }
                Ok(Expr::Function {
                    name: name.clone(),
                    args: lowered,
                    distinct: false,
                })
            }
        }
    }

    fn column_type_of(&self, object: &str, column: &str) -> CompileResult<ColumnType> {
        let data_object = self
            .model
            .data_object(object)
            .ok_or_else(|| CompileError::unknown_data_object(object))?;
        Ok(data_object
            .column(column)
            .ok_or_else(|| CompileError::unknown_column(object, column))?
            .column_type)
    }

    // =========================================================================
    // Base fact, legs, fanout
    // =========================================================================

    /// Tie-break for the base fact: prefer objects declaring outbound
    /// joins, then lexicographic.
    fn pick_base(&self, facts: &[String]) -> String {
        let mut candidates: Vec<&String> = facts.iter().collect();
        candidates.sort_by_key(|name| {
            let has_joins = self
                .model
                .data_object(name)
                .map(|o| !o.joins.is_empty())
                .unwrap_or(false);
            (!has_joins, (*name).clone())
        });
        candidates[0].clone()
    }

    fn resolve_legs(
        &self,
        facts: &[String],
        components: &[&ResolvedMeasure],
        dimensions: &[ResolvedDimension],
        where_predicates: &[ResolvedWhere],
        overrides: &PathOverrides,
    ) -> CompileResult<Vec<FactLeg>> {
        let mut legs = Vec::new();
        for fact in facts {
            let mut targets: Vec<String> = Vec::new();
            let push = |name: &str, targets: &mut Vec<String>| {
                if !targets.iter().any(|t| t == name) {
                    targets.push(name.to_string());
                }
            };
            for dim in dimensions {
                push(&dim.data_object, &mut targets);
            }
            for predicate in where_predicates {
                push(&predicate.data_object, &mut targets);
            }
            for measure in components.iter().filter(|m| &m.data_object == fact) {
                for object in &measure.referenced_objects {
                    push(object, &mut targets);
                }
            }

            let join_steps = self.graph.find_join_tree(fact, &targets, overrides)?;
            legs.push(FactLeg {
                fact: fact.clone(),
                join_steps,
            });
        }
        Ok(legs)
    }

    fn check_fanout<'m>(
        &self,
        steps: &[JoinStep],
        measures: impl Iterator<Item = &'m ResolvedMeasure> + Clone,
    ) -> CompileResult<()> {
        for step in steps {
            if !step.causes_fanout() {
                continue;
            }
            if let Some(measure) = measures.clone().find(|m| !m.allow_fan_out) {
                return Err(CompileError::fanout(
                    &step.from_object,
                    &step.to_object,
                    &measure.name,
                ));
            }
        }
        Ok(())
    }

    fn build_overrides(&self, query: &QueryObject) -> CompileResult<PathOverrides> {
        let mut overrides = PathOverrides::new();
        for entry in &query.use_path_names {
            overrides.insert(
                (entry.source.clone(), entry.target.clone()),
                entry.path_name.clone(),
            );
        }
        Ok(overrides)
    }

    // =========================================================================
    // Filters
    // =========================================================================

    fn classify_filter(
        &self,
        filter: &Filter,
        where_predicates: &mut Vec<ResolvedWhere>,
        having_predicates: &mut Vec<ResolvedHaving>,
        having_components: &mut Vec<ResolvedMeasure>,
    ) -> CompileResult<()> {
        if let Some(dimension) = self.model.dimension(&filter.field) {
            let object = self
                .model
                .data_object(&dimension.data_object)
                .ok_or_else(|| CompileError::unknown_data_object(&dimension.data_object))?;
            let column = object
                .column(&dimension.column)
                .ok_or_else(|| CompileError::unknown_column(&object.name, &dimension.column))?;

            let target = table_col(&object.name, &column.code);
            let expr =
                self.build_predicate(target, column.column_type, filter.op, &filter.value)?;
            debug!("filter on '{}' classified as WHERE", filter.field);
            where_predicates.push(ResolvedWhere {
                data_object: object.name.clone(),
                expr,
            });
            return Ok(());
        }

        if let Some(measure) = self.model.measure(&filter.field) {
            let resolved = self.resolve_measure(measure)?;
            let star_expr = self.build_predicate(
                resolved.aggregate.clone(),
                resolved.result_type,
                filter.op,
                &filter.value,
            )?;
            let outer_expr = self.build_predicate(
                resolved.outer_aggregate(),
                resolved.result_type,
                filter.op,
                &filter.value,
            )?;
            debug!("filter on '{}' classified as HAVING", filter.field);
            having_components.push(resolved);
            having_predicates.push(ResolvedHaving {
                star_expr,
                outer_expr,
            });
            return Ok(());
        }

        if self.model.metric(&filter.field).is_some() {
            let mut visited = Vec::new();
            let metric = self.resolve_metric_expr(&filter.field, &mut visited)?;
            let star_target = metric.lower(&|m| m.aggregate.clone());
            let outer_target = metric.lower(&|m| m.outer_aggregate());
            let star_expr =
                self.build_predicate(star_target, ColumnType::Float, filter.op, &filter.value)?;
            let outer_expr =
                self.build_predicate(outer_target, ColumnType::Float, filter.op, &filter.value)?;
            debug!("filter on '{}' classified as HAVING (metric)", filter.field);
            for measure in metric.measures() {
                having_components.push(measure.clone());
            }
            having_predicates.push(ResolvedHaving {
                star_expr,
                outer_expr,
            });
            return Ok(());
        }

        Err(CompileError::unknown_field(&filter.field))
    }

    fn build_predicate(
        &self,
        target: Expr,
        value_type: ColumnType,
        op: FilterOp,
        value: &serde_json::Value,
    ) -> CompileResult<Expr> {
        let expr = match op {
            FilterOp::Equals => target.eq(self.scalar_literal(value, value_type)?),
            FilterOp::NotEquals => target.ne(self.scalar_literal(value, value_type)?),
            FilterOp::Gt => target.gt(self.scalar_literal(value, value_type)?),
            FilterOp::Gte => target.gte(self.scalar_literal(value, value_type)?),
            FilterOp::Lt => target.lt(self.scalar_literal(value, value_type)?),
            FilterOp::Lte => target.lte(self.scalar_literal(value, value_type)?),
            FilterOp::InList => target.in_list(self.list_literals(value, value_type)?),
            FilterOp::NotInList => target.not_in_list(self.list_literals(value, value_type)?),
            FilterOp::IsNull => target.is_null(),
            FilterOp::IsNotNull => target.is_not_null(),
            FilterOp::Contains => self
                .dialect
                .render_string_contains(target, self.string_value(value)?),
            FilterOp::NotContains => Expr::UnaryOp {
                op: UnaryOperator::Not,
                expr: Box::new(Expr::Paren(Box::new(
                    self.dialect
                        .render_string_contains(target, self.string_value(value)?),
                ))),
            },
            FilterOp::StartsWith => {
                target.like(lit_str(&format!("{}%", self.string_value(value)?)))
            }
            FilterOp::EndsWith => {
                target.like(lit_str(&format!("%{}", self.string_value(value)?)))
            }
            FilterOp::Like => target.like(lit_str(self.string_value(value)?)),
            FilterOp::NotLike => target.not_like(lit_str(self.string_value(value)?)),
            FilterOp::Between => {
                let (low, high) = self.pair_literals(value, value_type)?;
                target.between(low, high)
            }
            FilterOp::NotBetween => {
                let (low, high) = self.pair_literals(value, value_type)?;
                target.not_between(low, high)
            }
            FilterOp::Relative => self.build_relative(target, value_type, value)?,
        };
        Ok(expr)
    }

    /// Expand a relative-time filter into a BETWEEN anchored at the
    /// dialect's current date truncated to the unit grain.
    fn build_relative(
        &self,
        target: Expr,
        value_type: ColumnType,
        value: &serde_json::Value,
    ) -> CompileResult<Expr> {
        if !value_type.is_temporal() {
            return Err(CompileError::new(
                ErrorCode::InvalidFilterValue,
                "Relative filters require a temporal field",
            ));
        }
        let spec: RelativeSpec = serde_json::from_value(value.clone()).map_err(|err| {
            CompileError::new(
                ErrorCode::InvalidFilterValue,
                format!("Invalid relative filter value: {}", err),
            )
        })?;

        let current = self.dialect.current_date();
        let period_start = self
            .dialect
            .render_time_grain(current.clone(), spec.unit);

        let (low, high) = match spec.direction {
            RelativeDirection::Past => {
                let low =
                    self.dialect
                        .render_date_add(period_start.clone(), spec.unit, -spec.count);
                let high = if spec.include_current {
                    current
                } else {
                    period_start
                };
                (low, high)
            }
            RelativeDirection::Future => {
                let low = if spec.include_current {
                    period_start.clone()
                } else {
                    self.dialect.render_date_add(period_start.clone(), spec.unit, 1)
                };
                let high = self.dialect.render_date_add(period_start, spec.unit, spec.count);
                (low, high)
            }
        };

        Ok(target.between(low, high))
    }

    fn scalar_literal(
        &self,
        value: &serde_json::Value,
        value_type: ColumnType,
    ) -> CompileResult<Expr> {
        match value {
            serde_json::Value::String(s) => Ok(lit_str(s)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(lit_int(i))
                } else {
                    Ok(lit_float(n.as_f64().unwrap_or_default()))
                }
            }
            serde_json::Value::Bool(b) => Ok(lit_bool(*b)),
            other => Err(CompileError::new(
                ErrorCode::InvalidFilterValue,
                format!(
                    "Expected a scalar {} value, got {}",
                    value_type, other
                ),
            )),
        }
    }

    fn list_literals(
        &self,
        value: &serde_json::Value,
        value_type: ColumnType,
    ) -> CompileResult<Vec<Expr>> {
        let serde_json::Value::Array(entries) = value else {
            return Err(CompileError::new(
                ErrorCode::InvalidFilterValue,
                "Expected a list value",
            ));
        };
        entries
            .iter()
            .map(|entry| self.scalar_literal(entry, value_type))
            .collect()
    }

    fn pair_literals(
        &self,
        value: &serde_json::Value,
        value_type: ColumnType,
    ) -> CompileResult<(Expr, Expr)> {
        let mut literals = self.list_literals(value, value_type)?;
        if literals.len() != 2 {
            return Err(CompileError::new(
                ErrorCode::InvalidFilterValue,
                format!("Between expects exactly 2 values, got {}", literals.len()),
            ));
        }
        let high = literals.pop().expect("len checked");
        let low = literals.pop().expect("len checked");
        Ok((low, high))
    }

    fn string_value<'v>(&self, value: &'v serde_json::Value) -> CompileResult<&'v str> {
        value.as_str().ok_or_else(|| {
            CompileError::new(ErrorCode::InvalidFilterValue, "Expected a string value")
        })
    }

    // =========================================================================
    // ORDER BY
    // =========================================================================

    fn order_alias<'q>(
        &self,
        field: &'q str,
        dimensions: &'q [ResolvedDimension],
        items: &'q [ResolvedMeasureItem],
    ) -> CompileResult<&'q str> {
        if let Some(dim) = dimensions.iter().find(|d| d.name == field) {
            return Ok(&dim.name);
        }
        if let Some(item) = items.iter().find(|i| i.name() == field) {
            return Ok(item.name());
        }
        Err(CompileError::new(
            ErrorCode::UnknownField,
            format!("ORDER BY field '{}' is not in the select list", field),
        )
        .with_related(field))
    }
}
