//! Day-over-day comparison of two case tables.
//!
//! Inner-joins the current and previous tables on municipality. Rows follow
//! the current table's order, so the totals row stays last. Municipalities
//! that appear in only one table are reported instead of silently vanishing.

use chrono::NaiveDate;

use crate::error::{AppError, Result};
use crate::models::{CaseTable, ComparisonRow, ComparisonTable};

/// Join two tables and compute `current - previous` per row.
///
/// With `strict` set, any municipality missing from either side is an error.
pub fn compare(
    current: &CaseTable,
    previous: &CaseTable,
    current_date: NaiveDate,
    previous_date: NaiveDate,
    strict: bool,
) -> Result<ComparisonTable> {
    let mut rows = Vec::with_capacity(current.rows().len());
    let mut dropped = Vec::new();

    for row in current.rows() {
        match previous.get(&row.municipality) {
            Some(before) => rows.push(ComparisonRow::new(&row.municipality, before, row.count)?),
            None => dropped.push(row.municipality.clone()),
        }
    }

    for row in previous.rows() {
        if current.get(&row.municipality).is_none() {
            dropped.push(row.municipality.clone());
        }
    }

    if !dropped.is_empty() {
        if strict {
            return Err(AppError::Join(format!(
                "municipalities present in only one bulletin: {}",
                dropped.join(", ")
            )));
        }
        for name in &dropped {
            log::warn!("Dropping {} from comparison: not present in both bulletins", name);
        }
    }

    Ok(ComparisonTable {
        rows,
        previous_date,
        current_date,
        dropped,
    })
}
