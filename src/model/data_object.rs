//! Physical data objects: tables (or SQL expressions) with columns and joins.

use serde::{Deserialize, Serialize};

use super::types::{ColumnType, JoinKind};

/// A column on a data object.
///
/// `name` is the display name used in model references; `code` is the
/// physical column emitted (quoted) into SQL.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: String,
    pub code: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Optional warehouse-native type string, carried as metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql_type: Option<String>,
}

/// A join declared on the owning data object's side.
///
/// `join_columns` and `target_columns` are equal-length ordered lists of
/// column display names; `secondary` joins are alternates selected at
/// query time via their `path_name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Join {
    pub join_to: String,
    pub join_columns: Vec<String>,
    pub target_columns: Vec<String>,
    pub join_type: JoinKind,
    #[serde(default)]
    pub secondary: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_name: Option<String>,
}

/// A physical table or SQL expression with columns and outbound joins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataObject {
    pub name: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub joins: Vec<Join>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl DataObject {
    /// Look up a column by display name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Primary (non-secondary) joins declared on this object.
    pub fn primary_joins(&self) -> impl Iterator<Item = &Join> {
        self.joins.iter().filter(|j| !j.secondary)
    }

    /// Secondary joins declared on this object.
    pub fn secondary_joins(&self) -> impl Iterator<Item = &Join> {
        self.joins.iter().filter(|j| j.secondary)
    }
}
