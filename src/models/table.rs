//! Case tables and their comparison.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// One municipality row of a bulletin table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaseRow {
    pub municipality: String,
    pub count: u64,
}

/// Municipality case counts from one bulletin, in table order.
///
/// The totals row is always the last row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaseTable {
    rows: Vec<CaseRow>,
}

impl CaseTable {
    /// Build a table from extracted rows and append the totals row.
    ///
    /// Municipality names must be unique.
    pub fn with_total(rows: Vec<CaseRow>, total_label: &str) -> Result<Self> {
        for (i, row) in rows.iter().enumerate() {
            if row.municipality == total_label {
                return Err(AppError::table(
                    &row.municipality,
                    "totals label used as a municipality",
                ));
            }
            if rows[..i].iter().any(|r| r.municipality == row.municipality) {
                return Err(AppError::table(&row.municipality, "duplicate municipality"));
            }
        }

        let total = rows.iter().try_fold(0u64, |sum, r| {
            sum.checked_add(r.count)
                .ok_or_else(|| AppError::table(total_label, "sum of counts overflows"))
        })?;
        let mut rows = rows;
        rows.push(CaseRow {
            municipality: total_label.to_string(),
            count: total,
        });
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[CaseRow] {
        &self.rows
    }

    /// Count for a municipality, totals row included.
    pub fn get(&self, municipality: &str) -> Option<u64> {
        self.rows
            .iter()
            .find(|r| r.municipality == municipality)
            .map(|r| r.count)
    }

    /// The synthesized totals row.
    pub fn total(&self) -> &CaseRow {
        // with_total always pushes the totals row
        &self.rows[self.rows.len() - 1]
    }
}

/// One joined row of the comparison.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComparisonRow {
    pub municipality: String,
    pub previous: u64,
    pub current: u64,
    /// current - previous
    pub delta: i64,
}

impl ComparisonRow {
    /// Join one municipality's counts; counts beyond `i64::MAX` are rejected.
    pub fn new(municipality: impl Into<String>, previous: u64, current: u64) -> Result<Self> {
        let municipality = municipality.into();
        let (Ok(current_signed), Ok(previous_signed)) =
            (i64::try_from(current), i64::try_from(previous))
        else {
            return Err(AppError::table(
                municipality,
                "count too large to compute a delta",
            ));
        };

        Ok(Self {
            municipality,
            previous,
            current,
            delta: current_signed - previous_signed,
        })
    }
}

/// Joined current and previous tables with their publication dates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComparisonTable {
    pub rows: Vec<ComparisonRow>,
    pub previous_date: NaiveDate,
    pub current_date: NaiveDate,
    /// Municipalities present in only one of the two tables
    pub dropped: Vec<String>,
}

impl ComparisonTable {
    /// The totals row, last after the join.
    pub fn total(&self) -> Option<&ComparisonRow> {
        self.rows.last()
    }

    pub fn previous_label(&self) -> String {
        display_date(self.previous_date)
    }

    pub fn current_label(&self) -> String {
        display_date(self.current_date)
    }
}

/// Format a bulletin date as `YYYY/MM/DD`.
pub fn display_date(date: NaiveDate) -> String {
    date.format("%Y/%m/%d").to_string()
}
