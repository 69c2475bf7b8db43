//! Floor occupancy matrix
//!
//! A row-major matrix of optional table ids. The grid records which table
//! covers which cell; overlap prevention itself is a rectangle test over the
//! table list (see [`crate::layout`]), the grid is the queryable projection
//! of it.

use shared::models::Table;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: i32,
    cols: i32,
    cells: Vec<Option<i64>>,
}

impl Grid {
    pub fn new(rows: i32, cols: i32) -> Self {
        Self {
            rows,
            cols,
            cells: vec![None; (rows * cols).max(0) as usize],
        }
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    fn index(&self, row: i32, col: i32) -> Option<usize> {
        if row < 0 || col < 0 || row >= self.rows || col >= self.cols {
            return None;
        }
        Some((row * self.cols + col) as usize)
    }

    /// Table id occupying a cell, if any. Out-of-bounds cells read as empty.
    pub fn cell(&self, row: i32, col: i32) -> Option<i64> {
        self.index(row, col).and_then(|i| self.cells[i])
    }

    /// Write or clear the table's id across every cell its footprint covers.
    /// Cells outside the grid bounds are skipped, not an error.
    pub fn mark(&mut self, table: &Table, occupied: bool) {
        for r in table.row..table.row + table.height {
            for c in table.column..table.column + table.width {
                match self.index(r, c) {
                    Some(i) => self.cells[i] = occupied.then_some(table.id),
                    None => {
                        tracing::debug!(
                            table_id = table.id,
                            row = r,
                            col = c,
                            "Skipping out-of-bounds cell"
                        );
                    }
                }
            }
        }
    }

    pub fn unmark(&mut self, table: &Table) {
        self.mark(table, false);
    }

    /// Clear everything and re-mark the given tables.
    pub fn rebuild(&mut self, tables: &[Table]) {
        self.cells.fill(None);
        for table in tables {
            self.mark(table, true);
        }
    }

    /// Whether the table's footprint lies fully inside the grid.
    pub fn in_bounds(&self, table: &Table) -> bool {
        table.row >= 0
            && table.column >= 0
            && table.row + table.height <= self.rows
            && table.column + table.width <= self.cols
    }
}
