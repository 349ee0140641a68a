//! Unified error type for the compilation core.
//!
//! Every failure carries a stable machine-readable code plus a human
//! message; source spans and dotted model paths ride along when known.

use thiserror::Error;

/// Result type for compilation operations.
pub type CompileResult<T> = Result<T, CompileError>;

/// A position in the model source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// 1-based line.
    pub line: usize,
    /// 1-based column.
    pub column: usize,
    /// Length of the spanned fragment, when known.
    pub len: Option<usize>,
}

impl Span {
    pub fn new(line: usize, column: usize) -> Self {
        Self {
            line,
            column,
            len: None,
        }
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Stable error codes, grouped by failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Parse
    ParseError,

    // Reference
    UnknownDataObject,
    UnknownColumn,
    UnknownDimension,
    UnknownMeasure,
    UnknownMetric,
    UnknownField,
    UnknownJoinTarget,
    UnknownPathName,

    // Semantic
    CyclicJoin,
    MultipathJoin,
    DuplicateName,
    NonUniqueColumn,
    SecondaryMissingPathname,
    DuplicateSecondaryPath,
    UnresolvedMeasureRef,
    UnresolvedDimensionRef,
    MetricCycle,
    InvalidModel,

    // Resolution
    UnknownFilterOperator,
    InvalidFilterValue,
    InvalidGrain,
    AmbiguousJoin,
    Fanout,
    NoPath,
    NoFact,

    // Configuration
    UnsupportedDialect,
    UnsupportedFeature,
}

impl ErrorCode {
    /// The stable wire name of this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ParseError => "PARSE_ERROR",
            ErrorCode::UnknownDataObject => "UNKNOWN_DATA_OBJECT",
            ErrorCode::UnknownColumn => "UNKNOWN_COLUMN",
            ErrorCode::UnknownDimension => "UNKNOWN_DIMENSION",
            ErrorCode::UnknownMeasure => "UNKNOWN_MEASURE",
            ErrorCode::UnknownMetric => "UNKNOWN_METRIC",
            ErrorCode::UnknownField => "UNKNOWN_FIELD",
            ErrorCode::UnknownJoinTarget => "UNKNOWN_JOIN_TARGET",
            ErrorCode::UnknownPathName => "UNKNOWN_PATH_NAME",
            ErrorCode::CyclicJoin => "CYCLIC_JOIN",
            ErrorCode::MultipathJoin => "MULTIPATH_JOIN",
            ErrorCode::DuplicateName => "DUPLICATE_NAME",
            ErrorCode::NonUniqueColumn => "NON_UNIQUE_COLUMN",
            ErrorCode::SecondaryMissingPathname => "SECONDARY_MISSING_PATHNAME",
            ErrorCode::DuplicateSecondaryPath => "DUPLICATE_SECONDARY_PATH",
            ErrorCode::UnresolvedMeasureRef => "UNRESOLVED_MEASURE_REF",
            ErrorCode::UnresolvedDimensionRef => "UNRESOLVED_DIMENSION_REF",
            ErrorCode::MetricCycle => "METRIC_CYCLE",
            ErrorCode::InvalidModel => "INVALID_MODEL",
            ErrorCode::UnknownFilterOperator => "UNKNOWN_FILTER_OPERATOR",
            ErrorCode::InvalidFilterValue => "INVALID_FILTER_VALUE",
            ErrorCode::InvalidGrain => "INVALID_GRAIN",
            ErrorCode::AmbiguousJoin => "AMBIGUOUS_JOIN",
            ErrorCode::Fanout => "FANOUT",
            ErrorCode::NoPath => "NO_PATH",
            ErrorCode::NoFact => "NO_FACT",
            ErrorCode::UnsupportedDialect => "UNSUPPORTED_DIALECT",
            ErrorCode::UnsupportedFeature => "UNSUPPORTED_FEATURE",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A compilation failure: code, message, and optional source context.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{code}: {message}")]
pub struct CompileError {
    pub code: ErrorCode,
    pub message: String,
    /// Source position in the model YAML, when known.
    pub span: Option<Span>,
    /// Dotted model path (e.g. `dataObjects.Orders.joins.0`), when known.
    pub path: Option<String>,
    /// The identifier the failure is about, when there is one.
    pub related: Option<String>,
}

impl CompileError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            span: None,
            path: None,
            related: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_related(mut self, related: impl Into<String>) -> Self {
        self.related = Some(related.into());
        self
    }

    // Common constructors

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParseError, message)
    }

    pub fn unknown_data_object(name: &str) -> Self {
        Self::new(
            ErrorCode::UnknownDataObject,
            format!("Unknown data object: '{}'", name),
        )
        .with_related(name)
    }

    pub fn unknown_column(object: &str, column: &str) -> Self {
        Self::new(
            ErrorCode::UnknownColumn,
            format!("Unknown column '{}' on data object '{}'", column, object),
        )
        .with_related(column)
    }

    pub fn unknown_field(name: &str) -> Self {
        Self::new(
            ErrorCode::UnknownField,
            format!(
                "'{}' is not a dimension, measure, or metric in this model",
                name
            ),
        )
        .with_related(name)
    }

    pub fn unknown_measure(name: &str) -> Self {
        Self::new(
            ErrorCode::UnknownMeasure,
            format!("Unknown measure: '{}'", name),
        )
        .with_related(name)
    }

    pub fn no_path(from: &str, to: &str) -> Self {
        Self::new(
            ErrorCode::NoPath,
            format!("No join path from '{}' to '{}'", from, to),
        )
    }

    pub fn ambiguous_join(from: &str, to: &str) -> Self {
        Self::new(
            ErrorCode::AmbiguousJoin,
            format!(
                "Multiple join paths from '{}' to '{}'; select one with usePathNames",
                from, to
            ),
        )
    }

    pub fn fanout(from: &str, to: &str, measure: &str) -> Self {
        Self::new(
            ErrorCode::Fanout,
            format!(
                "Join from '{}' to '{}' multiplies rows for measure '{}' \
                 which does not allow fan-out",
                from, to, measure
            ),
        )
        .with_related(measure)
    }

    pub fn unsupported_dialect(name: &str) -> Self {
        Self::new(
            ErrorCode::UnsupportedDialect,
            format!("Unsupported dialect: '{}'", name),
        )
        .with_related(name)
    }

    pub fn unsupported_feature(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnsupportedFeature, message)
    }
}

impl From<crate::model::expr_parser::ParseError> for CompileError {
    fn from(err: crate::model::expr_parser::ParseError) -> Self {
        CompileError::parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_code() {
        let err = CompileError::fanout("Customers", "Orders", "Lifetime Value");
        assert!(err.to_string().starts_with("FANOUT: "));
        assert_eq!(err.related.as_deref(), Some("Lifetime Value"));
    }

    #[test]
    fn test_code_names() {
        assert_eq!(ErrorCode::MetricCycle.as_str(), "METRIC_CYCLE");
        assert_eq!(ErrorCode::UnsupportedDialect.as_str(), "UNSUPPORTED_DIALECT");
    }
}
