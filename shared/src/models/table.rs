//! Physical table model (桌台)

use serde::{Deserialize, Serialize};

/// Fixed table footprint in grid cells.
///
/// Every table in the current furniture set occupies a 3×3 block, and the
/// adjacency offset below is this stride. Variable footprints would need a
/// different adjacency rule; keep the constant explicit rather than deriving
/// it per table.
pub const TABLE_FOOTPRINT: i32 = 3;

fn default_footprint() -> i32 {
    TABLE_FOOTPRINT
}

/// Axis-aligned rectangle in grid coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridRect {
    pub row: i32,
    pub col: i32,
    pub width: i32,
    pub height: i32,
}

impl GridRect {
    /// Two rectangles overlap unless one's max edge is at or before the
    /// other's min edge on some axis. Touching edges do not overlap.
    pub fn intersects(&self, other: &GridRect) -> bool {
        !(self.col + self.width <= other.col
            || other.col + other.width <= self.col
            || self.row + self.height <= other.row
            || other.row + other.height <= self.row)
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &GridRect) -> GridRect {
        let row = self.row.min(other.row);
        let col = self.col.min(other.col);
        let max_row = (self.row + self.height).max(other.row + other.height);
        let max_col = (self.col + self.width).max(other.col + other.width);
        GridRect {
            row,
            col,
            width: max_col - col,
            height: max_row - row,
        }
    }
}

/// One of the four table sides, used for adjacency probing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableSide {
    Top,
    Bottom,
    Left,
    Right,
}

impl TableSide {
    pub const ALL: [TableSide; 4] = [
        TableSide::Top,
        TableSide::Bottom,
        TableSide::Left,
        TableSide::Right,
    ];

    /// Origin offset of a neighbor sitting flush against this side.
    pub fn offset(&self) -> (i32, i32) {
        match self {
            TableSide::Top => (-TABLE_FOOTPRINT, 0),
            TableSide::Bottom => (TABLE_FOOTPRINT, 0),
            TableSide::Left => (0, -TABLE_FOOTPRINT),
            TableSide::Right => (0, TABLE_FOOTPRINT),
        }
    }
}

/// Physical table placed on the floor grid
///
/// Immutable except for `row`/`column`, which change on a successful move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub id: i64,
    pub name: String,
    pub max_capacity: i32,
    pub row: i32,
    pub column: i32,
    #[serde(default = "default_footprint")]
    pub width: i32,
    #[serde(default = "default_footprint")]
    pub height: i32,
}

impl Table {
    pub fn new(id: i64, name: impl Into<String>, max_capacity: i32, row: i32, column: i32) -> Self {
        Self {
            id,
            name: name.into(),
            max_capacity,
            row,
            column,
            width: TABLE_FOOTPRINT,
            height: TABLE_FOOTPRINT,
        }
    }

    pub fn rect(&self) -> GridRect {
        GridRect {
            row: self.row,
            col: self.column,
            width: self.width,
            height: self.height,
        }
    }

    pub fn intersects(&self, other: &Table) -> bool {
        self.rect().intersects(&other.rect())
    }

    /// Fixed-offset adjacency: the neighbor's origin sits exactly one
    /// footprint stride away on one axis and zero on the other.
    pub fn is_adjacent(&self, other: &Table) -> bool {
        let row_diff = (self.row - other.row).abs();
        let col_diff = (self.column - other.column).abs();
        (row_diff == TABLE_FOOTPRINT && col_diff == 0)
            || (row_diff == 0 && col_diff == TABLE_FOOTPRINT)
    }

    /// Side of `self` that `other` sits against, if adjacent.
    pub fn adjacent_side(&self, other: &Table) -> Option<TableSide> {
        TableSide::ALL.into_iter().find(|side| {
            let (dr, dc) = side.offset();
            other.row == self.row + dr && other.column == self.column + dc
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_intersection_is_strict() {
        let a = Table::new(1, "T1", 2, 0, 0);
        let b = Table::new(2, "T2", 2, 0, 3); // flush against a's right edge
        let c = Table::new(3, "T3", 2, 0, 2); // overlaps a by one column

        assert!(!a.intersects(&b));
        assert!(a.intersects(&c));
        assert!(b.intersects(&c));
    }

    #[test]
    fn adjacency_is_exactly_one_stride() {
        let a = Table::new(1, "T1", 2, 0, 0);
        assert!(a.is_adjacent(&Table::new(2, "T2", 2, 0, 3)));
        assert!(a.is_adjacent(&Table::new(3, "T3", 2, 3, 0)));
        // Diagonal and gapped placements are not adjacent
        assert!(!a.is_adjacent(&Table::new(4, "T4", 2, 3, 3)));
        assert!(!a.is_adjacent(&Table::new(5, "T5", 2, 0, 4)));
        assert!(!a.is_adjacent(&Table::new(6, "T6", 2, 0, 6)));
    }

    #[test]
    fn adjacent_side_reports_direction() {
        let a = Table::new(1, "T1", 2, 3, 3);
        assert_eq!(
            a.adjacent_side(&Table::new(2, "T2", 2, 0, 3)),
            Some(TableSide::Top)
        );
        assert_eq!(
            a.adjacent_side(&Table::new(3, "T3", 2, 3, 6)),
            Some(TableSide::Right)
        );
        assert_eq!(a.adjacent_side(&Table::new(4, "T4", 2, 9, 9)), None);
    }

    #[test]
    fn decodes_layout_without_footprint_fields() {
        let raw = r#"{"id":1,"name":"T1","max_capacity":2,"row":1,"column":14}"#;
        let table: Table = serde_json::from_str(raw).unwrap();
        assert_eq!(table.width, TABLE_FOOTPRINT);
        assert_eq!(table.height, TABLE_FOOTPRINT);
    }
}
