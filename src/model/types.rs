//! Core type vocabulary for the semantic model.

use serde::{Deserialize, Serialize};

/// Abstract column types carried by the model.
///
/// These are warehouse-independent; each dialect maps them to its own
/// type names when a cast or typed NULL is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    String,
    Int,
    Float,
    Date,
    Time,
    TimeTz,
    Timestamp,
    TimestampTz,
    Boolean,
    Json,
}

impl ColumnType {
    /// Parse a type string as it appears in model YAML.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "string" | "text" | "varchar" => Some(ColumnType::String),
            "int" | "integer" | "bigint" => Some(ColumnType::Int),
            "float" | "double" | "decimal" | "numeric" => Some(ColumnType::Float),
            "date" => Some(ColumnType::Date),
            "time" => Some(ColumnType::Time),
            "time_tz" => Some(ColumnType::TimeTz),
            "timestamp" | "datetime" => Some(ColumnType::Timestamp),
            "timestamp_tz" => Some(ColumnType::TimestampTz),
            "boolean" | "bool" => Some(ColumnType::Boolean),
            "json" | "jsonb" => Some(ColumnType::Json),
            _ => None,
        }
    }

    /// Is this a date/time type a grain can be applied to?
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            ColumnType::Date
                | ColumnType::Time
                | ColumnType::TimeTz
                | ColumnType::Timestamp
                | ColumnType::TimestampTz
        )
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Int | ColumnType::Float)
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ColumnType::String => "string",
            ColumnType::Int => "int",
            ColumnType::Float => "float",
            ColumnType::Date => "date",
            ColumnType::Time => "time",
            ColumnType::TimeTz => "time_tz",
            ColumnType::Timestamp => "timestamp",
            ColumnType::TimestampTz => "timestamp_tz",
            ColumnType::Boolean => "boolean",
            ColumnType::Json => "json",
        };
        write!(f, "{}", name)
    }
}

/// Truncation grain for temporal dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeGrain {
    Year,
    Quarter,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
}

impl TimeGrain {
    /// Parse a grain as it appears in `dimension:grain` suffixes and YAML.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "year" => Some(TimeGrain::Year),
            "quarter" => Some(TimeGrain::Quarter),
            "month" => Some(TimeGrain::Month),
            "week" => Some(TimeGrain::Week),
            "day" => Some(TimeGrain::Day),
            "hour" => Some(TimeGrain::Hour),
            "minute" => Some(TimeGrain::Minute),
            "second" => Some(TimeGrain::Second),
            _ => None,
        }
    }

    /// Lowercase name as used inside DATE_TRUNC literals.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeGrain::Year => "year",
            TimeGrain::Quarter => "quarter",
            TimeGrain::Month => "month",
            TimeGrain::Week => "week",
            TimeGrain::Day => "day",
            TimeGrain::Hour => "hour",
            TimeGrain::Minute => "minute",
            TimeGrain::Second => "second",
        }
    }
}

impl std::fmt::Display for TimeGrain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Aggregation kinds for measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationKind {
    Sum,
    Count,
    CountDistinct,
    Avg,
    Min,
    Max,
    AnyValue,
    Median,
    Mode,
    #[serde(rename = "listagg")]
    ListAgg,
}

impl AggregationKind {
    /// SQL function name. COUNT_DISTINCT renders as COUNT with DISTINCT.
    pub fn function_name(&self) -> &'static str {
        match self {
            AggregationKind::Sum => "SUM",
            AggregationKind::Count | AggregationKind::CountDistinct => "COUNT",
            AggregationKind::Avg => "AVG",
            AggregationKind::Min => "MIN",
            AggregationKind::Max => "MAX",
            AggregationKind::AnyValue => "ANY_VALUE",
            AggregationKind::Median => "MEDIAN",
            AggregationKind::Mode => "MODE",
            AggregationKind::ListAgg => "LISTAGG",
        }
    }

    /// Result type of the aggregate, given the type of its input.
    ///
    /// Drives the typed NULL padding in composite-fact legs.
    pub fn result_type(&self, input: ColumnType) -> ColumnType {
        match self {
            AggregationKind::Count | AggregationKind::CountDistinct => ColumnType::Int,
            AggregationKind::ListAgg => ColumnType::String,
            AggregationKind::Avg | AggregationKind::Median => ColumnType::Float,
            AggregationKind::Sum => {
                if input == ColumnType::Int {
                    ColumnType::Int
                } else {
                    ColumnType::Float
                }
            }
            AggregationKind::Min
            | AggregationKind::Max
            | AggregationKind::AnyValue
            | AggregationKind::Mode => input,
        }
    }
}

impl std::fmt::Display for AggregationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.function_name())
    }
}

/// Declared cardinality of a join, seen from the declaring side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JoinKind {
    ManyToOne,
    OneToOne,
    ManyToMany,
}

impl JoinKind {
    /// Does traversing this edge multiply rows?
    ///
    /// `reversed` means the edge is walked against its declared direction
    /// (from the "one" side into the "many" side for many-to-one).
    pub fn causes_fanout(&self, reversed: bool) -> bool {
        match self {
            JoinKind::ManyToOne => reversed,
            JoinKind::OneToOne => false,
            JoinKind::ManyToMany => true,
        }
    }
}

impl std::fmt::Display for JoinKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            JoinKind::ManyToOne => "many-to-one",
            JoinKind::OneToOne => "one-to-one",
            JoinKind::ManyToMany => "many-to-many",
        };
        write!(f, "{}", name)
    }
}
