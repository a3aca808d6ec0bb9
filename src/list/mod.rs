//! Tabular commune lists
//!
//! The data API stores lists column-wise: each raw row carries the
//! comma-joined values of one (or more) columns. Views need them row-wise,
//! which is what [`transpose`] produces.

mod page;
mod render;
mod transpose;

pub use page::{load_list, load_lists, DisplayList, ListsView, LIST_LOAD_ERROR};
pub use render::{render_cell, render_row, CellView};
pub use transpose::{transpose, PLACEHOLDER};

use serde::{Deserialize, Deserializer, Serialize};

/// Sparse, column-keyed record as delivered by the data API
pub type RawRow = serde_json::Map<String, serde_json::Value>;

/// How a column's cells are presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    #[default]
    Text,
    Link,
    /// Any type this crate does not know; rendered as text
    #[serde(other)]
    Other,
}

/// A list column definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name, unique within a list
    pub attribute_name: String,
    #[serde(default)]
    pub attribute_type: AttributeType,
}

impl Column {
    pub fn new(name: impl Into<String>, attribute_type: AttributeType) -> Self {
        Self {
            attribute_name: name.into(),
            attribute_type,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, AttributeType::Text)
    }

    pub fn link(name: impl Into<String>) -> Self {
        Self::new(name, AttributeType::Link)
    }
}

/// Descriptive metadata of a list post
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListMeta {
    #[serde(default, deserialize_with = "string_or_number")]
    pub post_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub links: Option<String>,
}

/// A list snapshot as retrieved from the data API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct List {
    #[serde(rename = "metaData", default)]
    pub meta: ListMeta,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub rows: Vec<RawRow>,
}

/// A row-major record ready for tabular rendering.
///
/// Cells are kept in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayRow {
    cells: Vec<(String, String)>,
}

impl DisplayRow {
    /// Cell value for a column, if the column exists
    pub fn get(&self, attribute_name: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(name, _)| name == attribute_name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DisplayRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

// MySQL ids arrive as numbers, other backends send strings
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}
