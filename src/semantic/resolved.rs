//! Resolved query types - the planner's input.
//!
//! Everything here is fully concrete: display names mapped to physical
//! codes, grains applied, aggregates built, join steps ordered, filters
//! classified. The planners only assemble; they never consult the model
//! again except for physical table names.

use crate::model::expr_parser::BinOp;
use crate::model::types::{AggregationKind, ColumnType};
use crate::semantic::join_graph::{JoinStep, PathOverrides};
use crate::sql::expr::{Expr, ExprExt};

/// A resolved dimension: grain-applied expression plus its home object.
#[derive(Debug, Clone)]
pub struct ResolvedDimension {
    /// Projection alias - the dimension's display name.
    pub name: String,
    pub data_object: String,
    /// Source-qualified expression with the effective grain applied.
    pub expr: Expr,
    pub column_type: ColumnType,
}

/// A resolved concrete measure.
#[derive(Debug, Clone)]
pub struct ResolvedMeasure {
    /// Projection alias - the measure's display name.
    pub name: String,
    /// Home fact.
    pub data_object: String,
    /// Every data object the measure expression touches (home first).
    pub referenced_objects: Vec<String>,
    /// Full aggregate expression over source tables (star form).
    pub aggregate: Expr,
    /// Row-level expression (composite-leg form, filter already folded in).
    pub pre_aggregation: Expr,
    pub aggregation: AggregationKind,
    pub distinct: bool,
    pub delimiter: Option<String>,
    pub result_type: ColumnType,
    pub total: bool,
    pub allow_fan_out: bool,
}

impl ResolvedMeasure {
    /// Re-aggregation of this measure over its composite-layer column.
    ///
    /// Sibling legs project NULL for this column, which the aggregate
    /// absorbs.
    pub fn outer_aggregate(&self) -> Expr {
        let column = crate::sql::expr::col(&self.name);
        match self.aggregation {
            AggregationKind::CountDistinct => crate::sql::expr::count_distinct(column),
            AggregationKind::ListAgg => Expr::Function {
                name: "LISTAGG".into(),
                args: vec![
                    column,
                    crate::sql::expr::lit_str(self.delimiter.as_deref().unwrap_or(",")),
                ],
                distinct: self.distinct,
            },
            kind => Expr::Function {
                name: kind.function_name().into(),
                args: vec![column],
                distinct: self.distinct,
            },
        }
    }
}

/// A resolved metric expression tree. Leaves are concrete measures; the
/// planner decides how each measure renders (full aggregate in a star
/// plan, re-aggregation over the composite layer in a CFL plan).
#[derive(Debug, Clone)]
pub enum ResolvedMetricExpr {
    Measure(ResolvedMeasure),
    Int(i64),
    Float(f64),
    Str(String),
    Binary {
        left: Box<ResolvedMetricExpr>,
        op: BinOp,
        right: Box<ResolvedMetricExpr>,
    },
    Neg(Box<ResolvedMetricExpr>),
    Paren(Box<ResolvedMetricExpr>),
    Func {
        name: String,
        args: Vec<ResolvedMetricExpr>,
    },
}

impl ResolvedMetricExpr {
    /// Lower to a SQL expression, rendering each measure leaf through
    /// `measure_expr`.
    pub fn lower(&self, measure_expr: &dyn Fn(&ResolvedMeasure) -> Expr) -> Expr {
        match self {
            ResolvedMetricExpr::Measure(m) => measure_expr(m),
            ResolvedMetricExpr::Int(n) => crate::sql::expr::lit_int(*n),
            ResolvedMetricExpr::Float(f) => crate::sql::expr::lit_float(*f),
            ResolvedMetricExpr::Str(s) => crate::sql::expr::lit_str(s),
            ResolvedMetricExpr::Binary { left, op, right } => Expr::BinaryOp {
                left: Box::new(left.lower(measure_expr)),
                op: lower_bin_op(*op),
                right: Box::new(right.lower(measure_expr)),
            },
            ResolvedMetricExpr::Neg(inner) => Expr::UnaryOp {
                op: crate::sql::expr::UnaryOperator::Minus,
                expr: Box::new(inner.lower(measure_expr)),
            },
            ResolvedMetricExpr::Paren(inner) => {
                Expr::Paren(Box::new(inner.lower(measure_expr)))
            }
            ResolvedMetricExpr::Func { name, args } => Expr::Function {
                name: name.clone(),
                args: args.iter().map(|a| a.lower(measure_expr)).collect(),
                distinct: false,
            },
        }
    }

    /// Concrete measures in this tree, in order.
    pub fn measures(&self) -> Vec<&ResolvedMeasure> {
        let mut out = Vec::new();
        self.collect_measures(&mut out);
        out
    }

    fn collect_measures<'a>(&'a self, out: &mut Vec<&'a ResolvedMeasure>) {
        match self {
            ResolvedMetricExpr::Measure(m) => out.push(m),
            ResolvedMetricExpr::Binary { left, right, .. } => {
                left.collect_measures(out);
                right.collect_measures(out);
            }
            ResolvedMetricExpr::Neg(inner) | ResolvedMetricExpr::Paren(inner) => {
                inner.collect_measures(out)
            }
            ResolvedMetricExpr::Func { args, .. } => {
                for arg in args {
                    arg.collect_measures(out);
                }
            }
            _ => {}
        }
    }
}

pub(crate) fn lower_bin_op(op: BinOp) -> crate::sql::expr::BinaryOperator {
    use crate::sql::expr::BinaryOperator as B;
    match op {
        BinOp::Or => B::Or,
        BinOp::And => B::And,
        BinOp::Eq => B::Eq,
        BinOp::Ne => B::Ne,
        BinOp::Lt => B::Lt,
        BinOp::Lte => B::Lte,
        BinOp::Gt => B::Gt,
        BinOp::Gte => B::Gte,
        BinOp::Add => B::Plus,
        BinOp::Sub => B::Minus,
        BinOp::Mul => B::Mul,
        BinOp::Div => B::Div,
    }
}

/// One selected measure-or-metric, in select order.
#[derive(Debug, Clone)]
pub enum ResolvedMeasureItem {
    Measure(ResolvedMeasure),
    Metric {
        name: String,
        expr: ResolvedMetricExpr,
    },
}

impl ResolvedMeasureItem {
    /// Projection alias of this item.
    pub fn name(&self) -> &str {
        match self {
            ResolvedMeasureItem::Measure(m) => &m.name,
            ResolvedMeasureItem::Metric { name, .. } => name,
        }
    }

    /// The concrete measures this item needs.
    pub fn component_measures(&self) -> Vec<&ResolvedMeasure> {
        match self {
            ResolvedMeasureItem::Measure(m) => vec![m],
            ResolvedMeasureItem::Metric { expr, .. } => expr.measures(),
        }
    }

    /// The expression projected in a star plan.
    pub fn star_expr(&self) -> Expr {
        match self {
            ResolvedMeasureItem::Measure(m) => m.aggregate.clone(),
            ResolvedMeasureItem::Metric { expr, .. } => expr.lower(&|m| m.aggregate.clone()),
        }
    }

    /// The expression projected in the outer SELECT of a CFL plan.
    pub fn outer_expr(&self) -> Expr {
        match self {
            ResolvedMeasureItem::Measure(m) => m.outer_aggregate(),
            ResolvedMeasureItem::Metric { expr, .. } => expr.lower(&|m| m.outer_aggregate()),
        }
    }
}

/// A classified WHERE predicate.
///
/// The expression is source-qualified: valid in a star plan's WHERE and
/// inside each composite-fact leg, where the source tables are in scope.
#[derive(Debug, Clone)]
pub struct ResolvedWhere {
    pub data_object: String,
    pub expr: Expr,
}

/// A classified HAVING predicate, carried in both plan shapes.
#[derive(Debug, Clone)]
pub struct ResolvedHaving {
    /// Predicate over full aggregates (star plan).
    pub star_expr: Expr,
    /// Predicate over composite-layer re-aggregates (CFL outer SELECT).
    pub outer_expr: Expr,
}

/// A per-fact join tree for composite-fact legs.
#[derive(Debug, Clone)]
pub struct FactLeg {
    pub fact: String,
    pub join_steps: Vec<JoinStep>,
}

/// A fully resolved query - everything a planner needs.
#[derive(Debug, Clone)]
pub struct ResolvedQuery {
    pub dimensions: Vec<ResolvedDimension>,
    pub items: Vec<ResolvedMeasureItem>,
    /// The base fact (star) or the first contributing fact (CFL).
    pub base_object: String,
    /// All data objects the query touches, in resolution order.
    pub required_objects: Vec<String>,
    /// Join steps for the star plan, in traversal order.
    pub join_steps: Vec<JoinStep>,
    /// Per-fact join trees, populated when `requires_cfl`.
    pub legs: Vec<FactLeg>,
    pub where_predicates: Vec<ResolvedWhere>,
    pub having_predicates: Vec<ResolvedHaving>,
    /// Measures referenced only by HAVING predicates; they still need a
    /// composite-layer column.
    pub having_components: Vec<ResolvedMeasure>,
    /// (alias expression, descending) pairs; ORDER BY references aliases.
    pub order_by: Vec<(Expr, bool)>,
    pub limit: Option<u64>,
    pub overrides: PathOverrides,
    pub requires_cfl: bool,
}

impl ResolvedQuery {
    /// Distinct contributing facts, in order of first appearance.
    pub fn fact_objects(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for measure in self.component_measures() {
            if seen.insert(measure.data_object.as_str()) {
                out.push(measure.data_object.as_str());
            }
        }
        out
    }

    /// Distinct component measures across select items and HAVING
    /// predicates, in order of first appearance - the composite layer's
    /// measure columns.
    pub fn component_measures(&self) -> Vec<&ResolvedMeasure> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for measure in self
            .items
            .iter()
            .flat_map(|i| i.component_measures())
            .chain(self.having_components.iter())
        {
            if seen.insert(measure.name.as_str()) {
                out.push(measure);
            }
        }
        out
    }

    /// Combined WHERE predicate for a star plan.
    pub fn where_expr(&self) -> Option<Expr> {
        combine_and(self.where_predicates.iter().map(|p| p.expr.clone()))
    }

    /// Summary for the compilation report.
    pub fn report(&self) -> ResolvedReport {
        ResolvedReport {
            fact_tables: self.fact_objects().iter().map(|s| s.to_string()).collect(),
            dimensions: self.dimensions.iter().map(|d| d.name.clone()).collect(),
            measures: self.items.iter().map(|i| i.name().to_string()).collect(),
        }
    }
}

/// Summary of what a query resolved to.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ResolvedReport {
    pub fact_tables: Vec<String>,
    pub dimensions: Vec<String>,
    pub measures: Vec<String>,
}

/// AND-fold a sequence of predicates.
pub(crate) fn combine_and(exprs: impl IntoIterator<Item = Expr>) -> Option<Expr> {
    exprs.into_iter().reduce(|acc, e| acc.and(e))
}
