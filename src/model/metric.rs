//! Metrics: expressions over measures.

use serde::{Deserialize, Serialize};

/// A metric definition: an expression with `{[Measure Name]}` placeholders
/// resolving to measures. Measure references must be acyclic across the
/// model (metrics never reference metrics).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    pub name: String,
    pub expression: String,
}
