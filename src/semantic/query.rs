//! Query request types - the structured contract callers submit.

use serde::{Deserialize, Deserializer, Serialize};

use crate::model::types::TimeGrain;

/// An analytical query against a semantic model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryObject {
    pub select: SelectBlock,
    #[serde(default, rename = "where")]
    pub where_filters: Vec<Filter>,
    #[serde(default)]
    pub having: Vec<Filter>,
    #[serde(default)]
    pub order_by: Vec<OrderByField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default)]
    pub use_path_names: Vec<UsePathName>,
}

/// The select block: dimension names (optionally `:grain`-suffixed) and
/// measure-or-metric names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectBlock {
    #[serde(default)]
    pub dimensions: Vec<String>,
    #[serde(default)]
    pub measures: Vec<String>,
}

/// One ORDER BY entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderByField {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Selects a secondary join in place of the default primary for a pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct UsePathName {
    pub source: String,
    pub target: String,
    pub path_name: String,
}

/// A filter on a dimension (WHERE) or measure/metric (HAVING).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub value: serde_json::Value,
}

/// Filter operators. Every alias in the request surface resolves to one
/// of these variants, so alias spellings generate byte-identical SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Equals,
    NotEquals,
    Gt,
    Gte,
    Lt,
    Lte,
    InList,
    NotInList,
    IsNull,
    IsNotNull,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    Like,
    NotLike,
    Between,
    NotBetween,
    Relative,
}

impl FilterOp {
    /// Parse an operator, accepting every documented alias.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "equals" | "=" | "eq" => Some(FilterOp::Equals),
            "notequals" | "!=" | "neq" => Some(FilterOp::NotEquals),
            "gt" | ">" => Some(FilterOp::Gt),
            "gte" | ">=" => Some(FilterOp::Gte),
            "lt" | "<" => Some(FilterOp::Lt),
            "lte" | "<=" => Some(FilterOp::Lte),
            "inlist" | "in" => Some(FilterOp::InList),
            "notinlist" | "not_in" => Some(FilterOp::NotInList),
            "notset" | "is_null" => Some(FilterOp::IsNull),
            "set" | "is_not_null" => Some(FilterOp::IsNotNull),
            "contains" => Some(FilterOp::Contains),
            "notcontains" => Some(FilterOp::NotContains),
            "starts_with" => Some(FilterOp::StartsWith),
            "ends_with" => Some(FilterOp::EndsWith),
            "like" => Some(FilterOp::Like),
            "notlike" => Some(FilterOp::NotLike),
            "between" => Some(FilterOp::Between),
            "notbetween" => Some(FilterOp::NotBetween),
            "relative" => Some(FilterOp::Relative),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for FilterOp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        FilterOp::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown filter operator '{}'", raw)))
    }
}

/// Relative-time filter payload: `{ unit, count, direction?, include_current? }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelativeSpec {
    pub unit: TimeGrain,
    pub count: i64,
    #[serde(default)]
    pub direction: RelativeDirection,
    #[serde(default = "default_include_current")]
    pub include_current: bool,
}

fn default_include_current() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelativeDirection {
    #[default]
    Past,
    Future,
}

/// Split a select-list dimension token into its name and optional
/// `:grain` suffix. The suffix is validated by the resolver.
pub fn split_grain_suffix(token: &str) -> (&str, Option<&str>) {
    match token.rsplit_once(':') {
        Some((name, suffix)) if !suffix.is_empty() => (name, Some(suffix)),
        _ => (token, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_aliases() {
        for alias in ["equals", "=", "eq"] {
            assert_eq!(FilterOp::parse(alias), Some(FilterOp::Equals));
        }
        for alias in ["notequals", "!=", "neq"] {
            assert_eq!(FilterOp::parse(alias), Some(FilterOp::NotEquals));
        }
        assert_eq!(FilterOp::parse(">"), Some(FilterOp::Gt));
        assert_eq!(FilterOp::parse("not_in"), Some(FilterOp::NotInList));
        assert_eq!(FilterOp::parse("notset"), Some(FilterOp::IsNull));
        assert_eq!(FilterOp::parse("set"), Some(FilterOp::IsNotNull));
        assert_eq!(FilterOp::parse("EQUALS"), Some(FilterOp::Equals));
        assert_eq!(FilterOp::parse("matches"), None);
    }

    #[test]
    fn test_query_deserialization() {
        let query: QueryObject = serde_json::from_str(
            r#"{
                "select": {
                    "dimensions": ["Country", "Order Date:quarter"],
                    "measures": ["Revenue"]
                },
                "where": [{"field": "Country", "op": "=", "value": "US"}],
                "order_by": [{"field": "Revenue", "direction": "desc"}],
                "limit": 10
            }"#,
        )
        .unwrap();

        assert_eq!(query.select.dimensions.len(), 2);
        assert_eq!(query.where_filters[0].op, FilterOp::Equals);
        assert_eq!(query.order_by[0].direction, SortDirection::Desc);
        assert_eq!(query.limit, Some(10));
    }

    #[test]
    fn test_unknown_operator_fails_deserialization() {
        let result: Result<Filter, _> =
            serde_json::from_str(r#"{"field": "x", "op": "matches", "value": 1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_relative_spec_defaults() {
        let spec: RelativeSpec = serde_json::from_str(r#"{"unit": "month", "count": 3}"#).unwrap();
        assert_eq!(spec.direction, RelativeDirection::Past);
        assert!(spec.include_current);
    }

    #[test]
    fn test_grain_suffix() {
        assert_eq!(split_grain_suffix("Country"), ("Country", None));
        assert_eq!(
            split_grain_suffix("Order Date:quarter"),
            ("Order Date", Some("quarter"))
        );
    }
}
