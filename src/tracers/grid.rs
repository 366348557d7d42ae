//! Cell grid shared by the array, chart and scatter tracers.

use serde::Serialize;
use serde_json::Value;

use crate::protocol::TraceError;
use crate::view::{format_value, ArrayView, CellView};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub value: Value,
    pub selected: bool,
    pub patched: bool,
}

impl Cell {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            selected: false,
            patched: false,
        }
    }
}

/// Rows of cells addressed as `(x, y)` = `(row, column)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Grid {
    rows: Vec<Vec<Cell>>,
}

impl Grid {
    pub fn from_values(rows: &[Value], method: &str) -> Result<Self, TraceError> {
        let rows = rows
            .iter()
            .enumerate()
            .map(|(i, row)| match row {
                Value::Array(values) => Ok(values.iter().cloned().map(Cell::new).collect()),
                other => Err(TraceError::argument(
                    method,
                    format!("row {i} must be an array, got {other}"),
                )),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rows })
    }

    pub fn single_row(values: &[Value]) -> Self {
        Self {
            rows: vec![values.iter().cloned().map(Cell::new).collect()],
        }
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<&Cell> {
        self.rows.get(x).and_then(|row| row.get(y))
    }

    fn cell_mut(&mut self, x: usize, y: usize) -> Result<&mut Cell, TraceError> {
        let rows = self.rows.len();
        let row = self
            .rows
            .get_mut(x)
            .ok_or_else(|| TraceError::index(format!("row {x} out of range (rows: {rows})")))?;
        let cols = row.len();
        row.get_mut(y)
            .ok_or_else(|| TraceError::index(format!("cell ({x}, {y}) out of range (columns: {cols})")))
    }

    /// Mark a cell modified. Without a value the cell keeps its current one.
    /// Patching past the end of a row grows it, filling gaps with null cells.
    pub fn patch(&mut self, x: usize, y: usize, value: Option<Value>) -> Result<(), TraceError> {
        let rows = self.rows.len();
        let row = self
            .rows
            .get_mut(x)
            .ok_or_else(|| TraceError::index(format!("row {x} out of range (rows: {rows})")))?;
        if y >= row.len() {
            let Some(value) = value else {
                return Err(TraceError::index(format!(
                    "cell ({x}, {y}) out of range (columns: {})",
                    row.len()
                )));
            };
            row.resize_with(y, || Cell::new(Value::Null));
            row.push(Cell::new(value));
        } else if let Some(value) = value {
            row[y].value = value;
        }
        row[y].patched = true;
        Ok(())
    }

    pub fn depatch(&mut self, x: usize, y: usize) -> Result<(), TraceError> {
        self.cell_mut(x, y)?.patched = false;
        Ok(())
    }

    /// Set the selection flag over the inclusive rectangle. The whole range is
    /// bounds-checked before any cell changes.
    pub fn mark_selected(
        &mut self,
        (sx, sy): (usize, usize),
        (ex, ey): (usize, usize),
        selected: bool,
    ) -> Result<(), TraceError> {
        for x in sx..=ex {
            for y in sy..=ey {
                if self.cell(x, y).is_none() {
                    return Err(TraceError::index(format!(
                        "cell ({x}, {y}) out of range in selection ({sx}, {sy})..=({ex}, {ey})"
                    )));
                }
            }
        }
        for x in sx..=ex {
            for y in sy..=ey {
                self.cell_mut(x, y)?.selected = selected;
            }
        }
        Ok(())
    }

    pub fn array_view(&self, title: &str, with_row_indices: bool) -> ArrayView {
        let longest = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        ArrayView {
            title: title.to_string(),
            column_indices: (0..longest).collect(),
            row_indices: with_row_indices.then(|| (0..self.rows.len()).collect()),
            rows: self
                .rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|cell| CellView {
                            text: format_value(&cell.value),
                            selected: cell.selected,
                            patched: cell.patched,
                        })
                        .collect()
                })
                .collect(),
        }
    }
}
