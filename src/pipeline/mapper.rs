//! Translation of source-language headers into the canonical feature vocabulary.

use indexmap::IndexMap;
use polars::prelude::DataFrame;

use crate::error::PipelineError;

/// Rename every column that appears as a key in `mapping`.
///
/// Columns without an entry are left alone, so running the mapper over an
/// already canonical table changes nothing.
pub fn rename_columns(
    mut frame: DataFrame,
    mapping: &IndexMap<String, String>,
) -> Result<DataFrame, PipelineError> {
    for (source, target) in mapping {
        if source == target || frame.get_column_index(source).is_none() {
            continue;
        }
        if frame.get_column_index(target).is_some() {
            return Err(PipelineError::MalformedInput(format!(
                "columns `{source}` and `{target}` both describe the same feature"
            )));
        }
        frame.rename(source, target.as_str().into())?;
    }
    Ok(frame)
}
