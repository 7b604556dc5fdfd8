//! Grid layout for the summary image.
//!
//! Rows fill the first column top to bottom, then the next. Positions come
//! from the row index only; rows past the last column are not placed.

use crate::models::{ColumnGeometry, ComparisonRow, ComparisonTable, RenderConfig};
use crate::utils::{format_count, format_signed};

/// A piece of text at a pixel position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextPlacement {
    pub x: i32,
    pub y: i32,
    pub text: String,
}

/// Column and row geometry of the table grid.
#[derive(Debug, Clone)]
pub struct TableLayout {
    pub columns: Vec<ColumnGeometry>,
    pub rows_per_column: usize,
    pub row_height: i32,
    pub top: i32,
    /// Municipality whose count text uses the column's wide offset
    pub wide_label: String,
}

impl TableLayout {
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            columns: config.columns.clone(),
            rows_per_column: config.rows_per_column,
            row_height: config.row_height,
            top: config.top,
            wide_label: config.wide_label.clone(),
        }
    }

    /// Number of rows the grid can hold.
    pub fn capacity(&self) -> usize {
        self.columns.len() * self.rows_per_column
    }

    /// Name and count placements for the row at `index`.
    pub fn place(&self, index: usize, row: &ComparisonRow) -> Option<[TextPlacement; 2]> {
        if self.rows_per_column == 0 {
            return None;
        }
        let column = self.columns.get(index / self.rows_per_column)?;
        let y = self.top + (index % self.rows_per_column) as i32 * self.row_height;

        let value_x = match column.wide_value_x {
            Some(wide) if row.municipality == self.wide_label => wide,
            _ => column.value_x,
        };

        Some([
            TextPlacement {
                x: column.name_x,
                y,
                text: row.municipality.clone(),
            },
            TextPlacement {
                x: value_x,
                y,
                text: value_text(row),
            },
        ])
    }
}

/// `previous → current(±delta)` with thousands separators.
pub fn value_text(row: &ComparisonRow) -> String {
    format!(
        "{} → {}({})",
        format_count(row.previous),
        format_count(row.current),
        format_signed(row.delta)
    )
}

/// Place every row that fits the grid.
pub fn layout_rows(rows: &[ComparisonRow], layout: &TableLayout) -> Vec<TextPlacement> {
    if rows.len() > layout.capacity() {
        log::debug!(
            "{} rows exceed grid capacity {}; extra rows are not drawn",
            rows.len(),
            layout.capacity()
        );
    }

    rows.iter()
        .enumerate()
        .filter_map(|(i, row)| layout.place(i, row))
        .flatten()
        .collect()
}

/// Caption naming which date is on which side of the arrow.
pub fn caption_text(table: &ComparisonTable) -> String {
    format!(
        "左辺:{} 右辺:{}",
        table.previous_label(),
        table.current_label()
    )
}
