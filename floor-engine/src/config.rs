//! Engine configuration

use shared::models::Table;

/// Configuration for the floor engine
#[derive(Debug, Clone)]
pub struct FloorConfig {
    /// Grid height in cells
    pub total_rows: i32,
    /// Grid width in cells
    pub total_cols: i32,
    /// Days kept on each side of the focal date in the temporal cache
    pub preload_range: usize,
    /// Table names in auto-assignment preference order
    pub preferred_order: Vec<String>,
    /// Seed layout used when no saved layout exists for a key
    pub base_tables: Vec<Table>,
}

impl Default for FloorConfig {
    fn default() -> Self {
        Self {
            total_rows: 15,
            total_cols: 18,
            preload_range: 5,
            preferred_order: ["T1", "T2", "T3", "T4", "T6", "T7", "T5"]
                .into_iter()
                .map(String::from)
                .collect(),
            base_tables: vec![
                Table::new(1, "T1", 2, 1, 14),
                Table::new(2, "T2", 2, 1, 10),
                Table::new(3, "T3", 2, 1, 6),
                Table::new(4, "T4", 2, 1, 1),
                Table::new(5, "T5", 2, 8, 7),
                Table::new(6, "T6", 2, 6, 1),
                Table::new(7, "T7", 2, 11, 1),
            ],
        }
    }
}

impl FloorConfig {
    /// Default configuration with numeric knobs overridable from the
    /// environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.total_rows = std::env::var("FLOOR_TOTAL_ROWS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(config.total_rows);
        config.total_cols = std::env::var("FLOOR_TOTAL_COLS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(config.total_cols);
        config.preload_range = std::env::var("FLOOR_PRELOAD_RANGE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(config.preload_range);
        config
    }

    /// Config with a custom layout, keeping the default knobs.
    pub fn with_tables(base_tables: Vec<Table>) -> Self {
        let preferred_order = base_tables.iter().map(|t| t.name.clone()).collect();
        Self {
            base_tables,
            preferred_order,
            ..Self::default()
        }
    }
}
