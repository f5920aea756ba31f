//! Output formatting for CLI results

use serde::Serialize;
use tabled::Tabled;

use crate::cli::OutputFormat;
use crate::error::Result;

pub mod json;
pub mod table;

/// Render a list either as a table of display rows or as the JSON envelope
/// around the untouched items.
pub fn format_list<T, D>(action: &str, items: &[T], format: OutputFormat, empty: &str) -> Result<String>
where
    T: Serialize,
    D: for<'a> From<&'a T> + Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<D> = items.iter().map(D::from).collect();
            Ok(table::format_table(&rows, empty))
        }
        OutputFormat::Json => Ok(json::format_json(action, items)?),
    }
}
