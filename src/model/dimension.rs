//! Groupable attributes exposed to queries.

use serde::{Deserialize, Serialize};

use super::types::{ColumnType, TimeGrain};

/// A dimension: one column of one data object, with an optional default
/// time grain for temporal columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimension {
    pub name: String,
    pub data_object: String,
    pub column: String,
    /// Result type; defaults to the underlying column's type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub result_type: Option<ColumnType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_grain: Option<TimeGrain>,
}
