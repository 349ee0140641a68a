//! Plan assembly: resolved queries become SQL statement trees.
//!
//! - [`star`] - single-fact plans: one SELECT with LEFT JOINs
//! - [`cfl`] - multi-fact plans: a composite-fact CTE with one UNION ALL
//!   leg per fact, aggregated by an outer SELECT

pub mod cfl;
pub mod star;

pub use cfl::cfl_plan;
pub use star::star_plan;

use crate::model::SemanticModel;
use crate::semantic::error::{CompileError, CompileResult};
use crate::sql::query::TableRef;

/// The canonical name of the composite-fact CTE.
pub const COMPOSITE_CTE: &str = "composite_01";

/// Physical table reference for a data object, aliased by display name.
pub(crate) fn table_ref(model: &SemanticModel, name: &str) -> CompileResult<TableRef> {
    let object = model
        .data_object(name)
        .ok_or_else(|| CompileError::unknown_data_object(name))?;

    let mut table = TableRef::new(&object.code).with_alias(&object.name);
    if let Some(database) = &object.database {
        table = table.with_database(database);
    }
    if let Some(schema) = &object.schema {
        table = table.with_schema(schema);
    }
    Ok(table)
}
