//! The semantic model: typed in-memory representation of the parsed YAML.
//!
//! A model is constructed once (via [`loader`]), validated, and then
//! treated as immutable input to the compiler. Nothing in the core
//! mutates a loaded model.

mod data_object;
mod dimension;
pub mod expr_parser;
pub mod loader;
mod measure;
mod metric;
pub mod types;

pub use data_object::{Column, DataObject, Join};
pub use dimension::Dimension;
pub use measure::Measure;
pub use metric::Metric;
pub use types::{AggregationKind, ColumnType, JoinKind, TimeGrain};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::semantic::error::{CompileResult, Span};

/// Map from dotted model paths (`measures.Revenue`) to source positions.
pub type SourceMap = HashMap<String, Span>;

/// A full semantic model: data objects, dimensions, measures, metrics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticModel {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub data_objects: Vec<DataObject>,
    #[serde(default)]
    pub dimensions: Vec<Dimension>,
    #[serde(default)]
    pub measures: Vec<Measure>,
    #[serde(default)]
    pub metrics: Vec<Metric>,
    /// Source positions captured at load time, for error reporting.
    #[serde(skip)]
    pub source_map: SourceMap,
}

fn default_version() -> u32 {
    1
}

impl SemanticModel {
    /// Load a model from YAML text, retaining source positions.
    pub fn from_yaml_str(source: &str) -> CompileResult<Self> {
        loader::load(source)
    }

    /// Look up a data object by display name.
    pub fn data_object(&self, name: &str) -> Option<&DataObject> {
        self.data_objects.iter().find(|o| o.name == name)
    }

    /// Look up a dimension by name.
    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    /// Look up a measure by name.
    pub fn measure(&self, name: &str) -> Option<&Measure> {
        self.measures.iter().find(|m| m.name == name)
    }

    /// Look up a metric by name.
    pub fn metric(&self, name: &str) -> Option<&Metric> {
        self.metrics.iter().find(|m| m.name == name)
    }

    /// Source position of a dotted model path, when captured.
    pub fn span_of(&self, path: &str) -> Option<Span> {
        self.source_map.get(path).copied()
    }

    /// Validate the model, returning the complete issue list.
    pub fn validate(&self) -> Vec<crate::semantic::validator::ValidationIssue> {
        crate::semantic::validator::validate(self)
    }
}
