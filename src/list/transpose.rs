//! Column-oriented list payload to display rows

use serde_json::Value;

use super::{Column, DisplayRow, RawRow};

/// Cell value shown where a column has no value at a position
pub const PLACEHOLDER: &str = "-";

/// Convert a sparse column-oriented payload into display rows.
///
/// Each column takes its values from the first raw row carrying a truthy
/// value under its name, split on `,` and trimmed. The number of output rows
/// is the value count of the *first* column: later columns with more values
/// are cut, later columns with fewer values are padded with [`PLACEHOLDER`].
/// A column found in no raw row renders as placeholders.
pub fn transpose(columns: &[Column], raw_rows: &[RawRow]) -> Vec<DisplayRow> {
    if columns.is_empty() || raw_rows.is_empty() {
        return Vec::new();
    }

    let values: Vec<Option<Vec<String>>> = columns
        .iter()
        .map(|column| column_values(&column.attribute_name, raw_rows))
        .collect();

    // First column decides the length; if it is absent there is nothing to show
    let len = values[0].as_ref().map_or(0, Vec::len);

    (0..len)
        .map(|i| {
            columns
                .iter()
                .zip(&values)
                .map(|(column, cells)| {
                    let cell = cells
                        .as_ref()
                        .and_then(|cells| cells.get(i))
                        .filter(|cell| !cell.is_empty())
                        .map_or(PLACEHOLDER, String::as_str);
                    (column.attribute_name.as_str(), cell)
                })
                .collect::<DisplayRow>()
        })
        .collect()
}

fn column_values(attribute_name: &str, raw_rows: &[RawRow]) -> Option<Vec<String>> {
    let joined = raw_rows
        .iter()
        .find_map(|row| row.get(attribute_name).and_then(carried_value))?;

    Some(joined.split(',').map(|v| v.trim().to_string()).collect())
}

/// The joined value string a raw row carries, if any.
///
/// Empty strings, zero, `null` and booleans do not count as carried.
fn carried_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64().is_some_and(|f| f != 0.0) => Some(n.to_string()),
        _ => None,
    }
}
