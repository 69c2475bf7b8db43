//! Layout service
//!
//! Owns the per-(day, category) table layouts and the live occupancy grid.
//! Placement is validated with strict rectangle intersection over the table
//! list; the grid mirrors the accepted placements. Layout keys missing an
//! exact entry fall back to the closest prior key of the same category, so a
//! saved rearrangement carries forward to later days until overridden.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::RwLock;
use shared::models::Table;
use shared::types::ServiceCategory;
use shared::util::{layout_key, layout_signature};

use crate::grid::Grid;
use crate::store::LayoutStore;

/// Result of a table move attempt.
///
/// `Invalid` is a recoverable no-op: the table snapped back and the grid is
/// unchanged. Callers may surface a message but must not treat it as an
/// error to propagate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    Invalid,
}

pub struct LayoutService {
    rows: i32,
    cols: i32,
    base_tables: Vec<Table>,
    store: Arc<dyn LayoutStore>,
    cached: RwLock<HashMap<String, Vec<Table>>>,
    tables: RwLock<Vec<Table>>,
    grid: RwLock<Grid>,
}

impl LayoutService {
    pub fn new(rows: i32, cols: i32, base_tables: Vec<Table>, store: Arc<dyn LayoutStore>) -> Self {
        let mut grid = Grid::new(rows, cols);
        grid.rebuild(&base_tables);
        Self {
            rows,
            cols,
            tables: RwLock::new(base_tables.clone()),
            cached: RwLock::new(HashMap::new()),
            base_tables,
            store,
            grid: RwLock::new(grid),
        }
    }

    pub fn key_for(&self, date: NaiveDate, category: ServiceCategory) -> String {
        layout_key(date, category)
    }

    /// Snapshot of the live layout.
    pub fn tables(&self) -> Vec<Table> {
        self.tables.read().clone()
    }

    /// Snapshot of the live grid.
    pub fn grid(&self) -> Grid {
        self.grid.read().clone()
    }

    /// Fingerprint of the live layout.
    pub fn signature(&self) -> String {
        layout_signature(&self.tables.read())
    }

    /// Load the layout for a key, falling back through: exact cache entry →
    /// persisted layout → closest prior key of the same category → base
    /// tables. The result becomes the live layout.
    pub fn load_tables(&self, date: NaiveDate, category: ServiceCategory) -> Vec<Table> {
        let key = self.key_for(date, category);

        let tables = if let Some(hit) = self.cached.read().get(&key).cloned() {
            tracing::debug!(key = %key, "Loaded exact layout");
            hit
        } else if let Ok(Some(persisted)) = self.store.load(date, category) {
            // An empty decode result means the stored value was malformed;
            // treat it like a miss rather than wiping the floor.
            if persisted.is_empty() {
                self.fallback_tables(date, &key, category)
            } else {
                tracing::debug!(key = %key, count = persisted.len(), "Loaded persisted layout");
                persisted
            }
        } else {
            self.fallback_tables(date, &key, category)
        };

        self.cached.write().insert(key, tables.clone());
        self.install(tables.clone());
        tables
    }

    fn fallback_tables(&self, date: NaiveDate, key: &str, category: ServiceCategory) -> Vec<Table> {
        if let Some((prior_key, tables)) = self.closest_prior_entry(key, category) {
            tracing::debug!(
                from = %prior_key,
                to = %key,
                "Copied fallback layout from prior key"
            );
            return tables;
        }
        // A fresh process has an empty in-memory map; inheritance still has
        // to see layouts saved before the restart
        if let Ok(Some(persisted)) = self.store.load_closest_prior(date, category) {
            if !persisted.is_empty() {
                tracing::debug!(key = %key, "Copied fallback layout from persisted prior key");
                return persisted;
            }
        }
        tracing::debug!(key = %key, "Initialized new layout from base tables");
        self.base_tables.clone()
    }

    /// Latest cached key of the same category strictly before `key`
    /// (ISO-date prefixes sort chronologically).
    fn closest_prior_entry(
        &self,
        key: &str,
        category: ServiceCategory,
    ) -> Option<(String, Vec<Table>)> {
        let suffix = format!("-{category}");
        let cached = self.cached.read();
        cached
            .iter()
            .filter(|(k, _)| k.ends_with(&suffix) && k.as_str() < key)
            .max_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(k, v)| (k.clone(), v.clone()))
    }

    /// Save a layout for a key and persist it. The saved layout becomes the
    /// live one. Future keys need no explicit propagation: they inherit it
    /// through the closest-prior-key fallback on load.
    pub fn save_tables(
        &self,
        tables: &[Table],
        date: NaiveDate,
        category: ServiceCategory,
    ) -> shared::error::EngineResult<()> {
        let key = self.key_for(date, category);
        self.cached.write().insert(key.clone(), tables.to_vec());
        self.install(tables.to_vec());
        self.store.save(tables, date, category)?;
        tracing::debug!(key = %key, count = tables.len(), "Saved layout");
        Ok(())
    }

    /// Restore the base configuration for a key.
    pub fn reset_tables(
        &self,
        date: NaiveDate,
        category: ServiceCategory,
    ) -> shared::error::EngineResult<()> {
        let key = self.key_for(date, category);
        let base = self.base_tables.clone();
        self.cached.write().insert(key.clone(), base.clone());
        self.install(base.clone());
        self.store.save(&base, date, category)?;
        tracing::info!(key = %key, "Reset layout to base tables");
        Ok(())
    }

    fn install(&self, tables: Vec<Table>) {
        self.grid.write().rebuild(&tables);
        *self.tables.write() = tables;
    }

    /// True iff the table's footprint is in bounds and intersects no live
    /// table outside the exclusion set.
    pub fn can_place(&self, table: &Table, excluding: &HashSet<i64>) -> bool {
        if !self.grid.read().in_bounds(table) {
            tracing::debug!(table_id = table.id, "Placement out of bounds");
            return false;
        }
        let tables = self.tables.read();
        for other in tables.iter() {
            if other.id == table.id || excluding.contains(&other.id) {
                continue;
            }
            if table.intersects(other) {
                tracing::debug!(
                    table_id = table.id,
                    other_id = other.id,
                    "Placement intersects existing table"
                );
                return false;
            }
        }
        true
    }

    /// Move a table to a clamped target position.
    ///
    /// The target is clamped into `[0, rows-height] × [0, cols-width]`. The
    /// table's cells are unmarked, the clamped position validated, and the
    /// move either committed and remarked or rolled back untouched.
    pub fn move_table(&self, table_id: i64, to_row: i32, to_col: i32) -> MoveOutcome {
        let Some(table) = self.tables.read().iter().find(|t| t.id == table_id).cloned() else {
            tracing::warn!(table_id, "Move requested for unknown table");
            return MoveOutcome::Invalid;
        };

        let max_row = self.rows - table.height;
        let max_col = self.cols - table.width;
        let mut moved = table.clone();
        moved.row = to_row.clamp(0, max_row.max(0));
        moved.column = to_col.clamp(0, max_col.max(0));

        self.grid.write().unmark(&table);

        if self.can_place(&moved, &HashSet::new()) {
            {
                let mut tables = self.tables.write();
                if let Some(slot) = tables.iter_mut().find(|t| t.id == table_id) {
                    *slot = moved.clone();
                }
            }
            self.grid.write().mark(&moved, true);
            tracing::info!(table_id, row = moved.row, col = moved.column, "Table moved");
            MoveOutcome::Moved
        } else {
            // Snap back: remark the original cells, layout unchanged
            self.grid.write().mark(&table, true);
            tracing::debug!(table_id, row = to_row, col = to_col, "Move rejected");
            MoveOutcome::Invalid
        }
    }
}

/// Decode a persisted layout value, degrading gracefully.
///
/// Primary shape is a bare table array; older layouts were written as a
/// `{"tables": [...]}` wrapper. Anything else logs and yields an empty list
/// rather than failing the engine.
pub fn decode_tables(raw: &serde_json::Value, key: &str) -> Vec<Table> {
    if let Ok(tables) = serde_json::from_value::<Vec<Table>>(raw.clone()) {
        return tables;
    }

    #[derive(serde::Deserialize)]
    struct LegacyLayout {
        tables: Vec<Table>,
    }
    if let Ok(legacy) = serde_json::from_value::<LegacyLayout>(raw.clone()) {
        tracing::debug!(key = %key, "Decoded layout via legacy wrapper shape");
        return legacy.tables;
    }

    tracing::warn!(key = %key, "Malformed layout data, falling back to empty list");
    Vec::new()
}
