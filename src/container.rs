//! Result containers.
//!
//! Every query returns headings and rows. The three containers shape that
//! data for the common cases:
//! - [`RecordSet`]: any number of rows
//! - [`Record`]: at most one row
//! - [`RecordScalar`]: the first column of the first row

use crate::core::db::{Row, Value};
use crate::core::{Result, SimqleError};
use tracing::warn;

/// A row as `(heading, value)` pairs in column order. Duplicate headings are kept.
pub type Fields = Vec<(String, Value)>;

static NULL: Value = Value::Null;

/// Zero or more rows.
///
/// `has_data()` is false when the query ran but returned no rows. Iterating
/// such a set yields nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSet {
    headings: Vec<String>,
    rows: Option<Vec<Row>>,
}

impl RecordSet {
    pub fn new(headings: Vec<String>, rows: Vec<Row>) -> Self {
        let rows = if rows.is_empty() { None } else { Some(rows) };
        RecordSet { headings, rows }
    }

    pub fn headings(&self) -> &[String] {
        &self.headings
    }

    pub fn has_data(&self) -> bool {
        self.rows.is_some()
    }

    pub fn len(&self) -> usize {
        self.rows.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        !self.has_data()
    }

    pub fn rows(&self) -> &[Row] {
        self.rows.as_deref().unwrap_or(&[])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows().iter()
    }

    /// Values of one column, in row order. A row shorter than the headings
    /// reads as null.
    ///
    /// # Errors
    ///
    /// `UnknownHeading` if the query did not return `heading`, even when there are no rows.
    pub fn column(&self, heading: &str) -> Result<Vec<Value>> {
        let index = heading_index(&self.headings, heading)?;
        Ok(self
            .iter()
            .map(|row| row.get(index).cloned().unwrap_or(Value::Null))
            .collect())
    }

    /// Each row as heading and value pairs.
    pub fn rows_as_fields(&self) -> Vec<Fields> {
        self.iter().map(|row| zip_row(&self.headings, row)).collect()
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for RecordSet {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.unwrap_or_default().into_iter()
    }
}

/// At most one row.
///
/// When more than one row is returned the first is kept and the rest are
/// dropped with a warning.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    headings: Vec<String>,
    row: Option<Row>,
    discarded: usize,
}

impl Record {
    pub fn new(headings: Vec<String>, rows: Vec<Row>) -> Self {
        let discarded = rows.len().saturating_sub(1);
        if discarded > 0 {
            warn!(
                "Record object initialised with a query that returned more than 1 row ({} dropped)",
                discarded
            );
        }
        Record {
            headings,
            row: rows.into_iter().next(),
            discarded,
        }
    }

    pub fn headings(&self) -> &[String] {
        &self.headings
    }

    pub fn has_data(&self) -> bool {
        self.row.is_some()
    }

    /// Rows dropped beyond the first.
    pub fn discarded_rows(&self) -> usize {
        self.discarded
    }

    /// The value under `heading`; `None` when no row was returned.
    ///
    /// # Errors
    ///
    /// `UnknownHeading` if the query did not return `heading`.
    pub fn get(&self, heading: &str) -> Result<Option<&Value>> {
        let index = heading_index(&self.headings, heading)?;
        Ok(self
            .row
            .as_ref()
            .map(|row| row.get(index).unwrap_or(&NULL)))
    }

    pub fn row(&self) -> Option<&Row> {
        self.row.as_ref()
    }

    /// The row as heading and value pairs; empty when no row was returned.
    pub fn fields(&self) -> Fields {
        self.row
            .as_ref()
            .map(|row| zip_row(&self.headings, row))
            .unwrap_or_default()
    }
}

/// The first column of the first row.
///
/// There are four outcomes to tell apart: no row, a null value, a falsy
/// value and a truthy value. `has_data()` answers only whether a row came
/// back; use [`Value::is_truthy`] on the datum for the value's own truthiness.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordScalar {
    heading: Option<String>,
    datum: Option<Value>,
}

impl RecordScalar {
    pub fn new(headings: Vec<String>, rows: Vec<Row>) -> Self {
        let heading = headings.into_iter().next();
        let datum = rows
            .into_iter()
            .next()
            .map(|row| row.into_iter().next().unwrap_or(Value::Null));
        RecordScalar { heading, datum }
    }

    pub fn heading(&self) -> Option<&str> {
        self.heading.as_deref()
    }

    /// Was a row, even one holding null, returned?
    pub fn has_data(&self) -> bool {
        self.datum.is_some()
    }

    /// The datum, which may be `Value::Null`.
    ///
    /// # Errors
    ///
    /// `NoScalarData` when the query returned no rows.
    pub fn datum(&self) -> Result<&Value> {
        self.datum.as_ref().ok_or(SimqleError::NoScalarData)
    }

    /// The datum, or `default` when no row was returned.
    pub fn sdatum<'a>(&'a self, default: &'a Value) -> &'a Value {
        self.datum.as_ref().unwrap_or(default)
    }
}

fn heading_index(headings: &[String], heading: &str) -> Result<usize> {
    headings
        .iter()
        .position(|h| h == heading)
        .ok_or_else(|| SimqleError::UnknownHeading(heading.to_string()))
}

fn zip_row(headings: &[String], row: &Row) -> Fields {
    headings
        .iter()
        .enumerate()
        .map(|(i, h)| (h.clone(), row.get(i).cloned().unwrap_or(Value::Null)))
        .collect()
}
