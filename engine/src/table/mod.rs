//! Tabular result sink for a batch run.


use std::io::Write;

use crate::value::Value;

/// Result table: one row per processed item, one column per declared output
/// of the unit of work.
///
/// The column set is fixed once, from the first instance's output schema;
/// rows keep insertion order and are never reordered.
#[derive(Debug, Default, PartialEq)]
pub struct ResultTable {
    columns: Vec<String>,
    column_index: hashbrown::HashMap<String, usize>,
    rows: Vec<Row>,
}

/// One row of the result: a label derived from the source value plus one
/// cell per column. Cells of failed items stay unset.
#[derive(Debug, PartialEq)]
pub struct Row {
    label: String,
    cells: Vec<Option<Value>>,
}

impl Row {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn cells(&self) -> &[Option<Value>] {
        &self.cells
    }
}

/// Opaque handle to one appended row, used to set its cells.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RowHandle(usize);

#[derive(Debug, thiserror::Error)]
pub enum ColumnError {
    #[error("table has no column named {name:?}")]
    UnknownColumn { name: String },
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixes the column set from the declared output schema. Call once per
    /// run, before any rows are appended.
    pub fn set_columns<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = names.into_iter().map(Into::into).collect();
        self.column_index = self
            .columns
            .iter()
            .enumerate()
            .map(|(index, name)| (name.clone(), index))
            .collect();
    }

    /// Appends an empty row labeled `label` and returns its handle.
    pub fn append_row(&mut self, label: impl Into<String>) -> RowHandle {
        self.rows.push(Row {
            label: label.into(),
            cells: vec![None; self.columns.len()],
        });
        RowHandle(self.rows.len() - 1)
    }

    /// Removes and returns the most recently appended row.
    pub fn pop_row(&mut self) -> Option<Row> {
        self.rows.pop()
    }

    /// Sets one cell. The row handle must come from this table's
    /// [ResultTable::append_row]; naming a column outside the fixed schema
    /// is an error.
    pub fn set(&mut self, row: RowHandle, column: &str, value: Value) -> Result<(), ColumnError> {
        let index = *self
            .column_index
            .get(column)
            .ok_or_else(|| ColumnError::UnknownColumn {
                name: column.to_string(),
            })?;
        self.rows[row.0].cells[index] = Some(value);
        Ok(())
    }

    /// The cell at `row` and `column`, if set.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let index = *self.column_index.get(column)?;
        self.rows.get(row)?.cells[index].as_ref()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Writes the table as CSV: a header of `label` plus the column names,
    /// then one record per row with empty fields for unset cells.
    pub fn write_csv<W: Write>(&self, writer: W) -> csv::Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        let header = std::iter::once("label".to_string()).chain(self.columns.iter().cloned());
        csv_writer.write_record(header)?;

        for row in &self.rows {
            let record = std::iter::once(row.label.clone()).chain(
                row.cells
                    .iter()
                    .map(|cell| cell.as_ref().map(Value::to_string).unwrap_or_default()),
            );
            csv_writer.write_record(record)?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}
