//! YAML model loading with source-position retention.
//!
//! The model deserializes through typed serde structs; alongside that a
//! line scan records where each named entity sits in the source so
//! validation issues can point at a (line, column).

use crate::semantic::error::{CompileError, CompileResult, Span};

use super::{SemanticModel, SourceMap};

/// Load a semantic model from YAML text.
pub fn load(source: &str) -> CompileResult<SemanticModel> {
    let mut model: SemanticModel = serde_yaml::from_str(source).map_err(|err| {
        let mut out = CompileError::parse(format!("Invalid model YAML: {}", err));
        if let Some(location) = err.location() {
            out = out.with_span(Span::new(location.line(), location.column()));
        }
        out
    })?;
    model.source_map = build_source_map(source);
    Ok(model)
}

/// Scan the source for `name:` entries under each top-level section.
///
/// This is a positional index, not a parser: it only needs to be good
/// enough to attach a line/column to entities the validator names. The
/// first occurrence wins, which matches the entity-before-children order
/// of the YAML layout.
fn build_source_map(source: &str) -> SourceMap {
    let mut map = SourceMap::new();
    let mut section: Option<&str> = None;

    for (idx, line) in source.lines().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        // Top-level section headers are unindented `key:` lines.
        if !line.starts_with(' ') && !line.starts_with('\t') {
            section = match trimmed.trim_end_matches(':') {
                key @ ("dataObjects" | "dimensions" | "measures" | "metrics")
                    if trimmed.ends_with(':') =>
                {
                    Some(key)
                }
                _ => None,
            };
            continue;
        }

        let Some(section) = section else { continue };

        let entry = trimmed.strip_prefix("- ").unwrap_or(trimmed);
        // Flow-style entries (`- { name: X, ... }`) carry the same key.
        let entry = match entry.strip_prefix('{') {
            Some(rest) => rest.trim_start(),
            None => entry,
        };
        if let Some(value) = entry.strip_prefix("name:") {
            let value = value.trim();
            let name = value
                .split([',', '}'])
                .next()
                .unwrap_or(value)
                .trim()
                .trim_matches('"')
                .trim_matches('\'');
            if name.is_empty() {
                continue;
            }
            let column = line.len() - trimmed.len() + 1;
            let span = Span {
                line: idx + 1,
                column,
                len: Some(name.len()),
            };
            map.entry(format!("{}.{}", section, name)).or_insert(span);
        }
    }

    map
}
