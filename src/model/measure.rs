//! Measures: named aggregations over data-object columns.

use serde::{Deserialize, Serialize};

use super::types::AggregationKind;

/// A measure definition.
///
/// Carries either the single-column shortcut (`data_object` + `column`)
/// or an `expression` over `{[Object].[Column]}` placeholders; the
/// validator rejects definitions with neither or both.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measure {
    pub name: String,
    pub aggregation: AggregationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_object: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    /// Row-level predicate folded into the aggregate as CASE WHEN.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(default)]
    pub distinct: bool,
    /// LISTAGG separator; defaults to `,`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
    /// LISTAGG WITHIN GROUP ordering, as placeholder expressions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_within_group: Vec<String>,
    /// Grand-total windowing over the grouped result.
    #[serde(default)]
    pub total: bool,
    #[serde(default)]
    pub allow_fan_out: bool,
}

impl Measure {
    /// The single-column shortcut as a placeholder expression, when used.
    pub fn expression_text(&self) -> Option<String> {
        if let Some(expr) = &self.expression {
            return Some(expr.clone());
        }
        match (&self.data_object, &self.column) {
            (Some(obj), Some(col)) => Some(format!("{{[{}].[{}]}}", obj, col)),
            _ => None,
        }
    }
}
