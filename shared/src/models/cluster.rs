//! Merged-table cluster model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{GridRect, Table};
use crate::types::ServiceCategory;

/// A maximal set (≥2) of physically adjacent tables jointly serving one
/// reservation. Built only by the clusterer; the frame is derived geometry
/// for overlay rendering, never authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: Uuid,
    pub reservation_id: Uuid,
    pub table_ids: Vec<i64>,
    pub date: NaiveDate,
    pub category: ServiceCategory,
    pub frame: GridRect,
}

impl Cluster {
    /// Bounding rectangle of a component of tables.
    pub fn frame_of(tables: &[&Table]) -> GridRect {
        let mut iter = tables.iter().map(|t| t.rect());
        let first = iter.next().unwrap_or(GridRect {
            row: 0,
            col: 0,
            width: 0,
            height: 0,
        });
        iter.fold(first, |acc, r| acc.union(&r))
    }
}
