//! Cell presentation policy

use std::fmt;

use super::{AttributeType, Column, DisplayRow, PLACEHOLDER};

/// How a single table cell is presented
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellView {
    Text(String),
    /// Hyperlink whose label is the target itself
    Link(String),
    Placeholder,
}

impl fmt::Display for CellView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellView::Text(text) => write!(f, "{}", text),
            CellView::Link(href) => write!(f, "<{}>", href),
            CellView::Placeholder => write!(f, "{}", PLACEHOLDER),
        }
    }
}

/// Present one cell of `row` for `column`.
///
/// Link columns become hyperlinks unless the cell is the placeholder.
pub fn render_cell(column: &Column, row: &DisplayRow) -> CellView {
    let value = match row.get(&column.attribute_name) {
        Some(value) if !value.is_empty() && value != PLACEHOLDER => value,
        _ => return CellView::Placeholder,
    };

    match column.attribute_type {
        AttributeType::Link => CellView::Link(value.to_string()),
        AttributeType::Text | AttributeType::Other => CellView::Text(value.to_string()),
    }
}

pub fn render_row(columns: &[Column], row: &DisplayRow) -> Vec<CellView> {
    columns.iter().map(|c| render_cell(c, row)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_column_renders_hyperlink() {
        let column = Column::link("site");
        let row: DisplayRow = [("site", "https://example.org")].into_iter().collect();
        assert_eq!(
            render_cell(&column, &row),
            CellView::Link("https://example.org".into())
        );
    }

    #[test]
    fn test_placeholder_never_becomes_link() {
        let column = Column::link("site");
        let row: DisplayRow = [("site", "-")].into_iter().collect();
        assert_eq!(render_cell(&column, &row), CellView::Placeholder);
    }

    #[test]
    fn test_unknown_types_render_as_text() {
        let columns = vec![Column::text("a"), Column::new("b", AttributeType::Other)];
        let row: DisplayRow = [("a", "1"), ("b", "2")].into_iter().collect();
        assert_eq!(
            render_row(&columns, &row),
            vec![CellView::Text("1".into()), CellView::Text("2".into())]
        );
    }

    #[test]
    fn test_column_missing_from_row_is_placeholder() {
        let row = DisplayRow::default();
        assert_eq!(render_cell(&Column::text("a"), &row), CellView::Placeholder);
        assert_eq!(CellView::Placeholder.to_string(), "-");
    }
}
