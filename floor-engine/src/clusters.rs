//! Cluster computation and cache
//!
//! A cluster is a connected component (≥2 members) of a reservation's tables
//! under footprint adjacency, found by breadth-first search. Computed sets
//! are cached per layout key together with the layout signature that
//! produced them, so a cached set is served only while the floor geometry it
//! was computed against still holds. The cache is LRU-bounded.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::NaiveDate;
use parking_lot::RwLock;
use shared::models::{Cluster, Reservation, Table};
use shared::types::ServiceCategory;
use shared::util::layout_key;
use uuid::Uuid;

use crate::store::ClusterStore;

const MAX_CACHE_ENTRIES: usize = 100;

struct CacheEntry {
    clusters: Vec<Cluster>,
    signature: String,
    last_accessed: u64,
}

pub struct ClusterManager {
    cache: RwLock<HashMap<String, CacheEntry>>,
    store: Arc<dyn ClusterStore>,
    max_entries: usize,
    access_tick: AtomicU64,
}

impl ClusterManager {
    pub fn new(store: Arc<dyn ClusterStore>) -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            store,
            max_entries: MAX_CACHE_ENTRIES,
            access_tick: AtomicU64::new(0),
        }
    }

    /// Connected components of `table_ids` under adjacency, as index sets
    /// into `tables`.
    fn components(tables: &[&Table]) -> Vec<Vec<usize>> {
        let mut visited = vec![false; tables.len()];
        let mut components = Vec::new();

        for start in 0..tables.len() {
            if visited[start] {
                continue;
            }
            let mut component = Vec::new();
            let mut queue = VecDeque::from([start]);
            visited[start] = true;
            while let Some(i) = queue.pop_front() {
                component.push(i);
                for (j, other) in tables.iter().enumerate() {
                    if !visited[j] && tables[i].is_adjacent(other) {
                        visited[j] = true;
                        queue.push_back(j);
                    }
                }
            }
            components.push(component);
        }
        components
    }

    /// Clusters formed by one reservation's tables. A reservation spanning
    /// two disjoint groups of adjacent tables yields two clusters; isolated
    /// single tables yield none.
    pub fn clusters_for_reservation(
        &self,
        reservation: &Reservation,
        layout: &[Table],
        date: NaiveDate,
        category: ServiceCategory,
    ) -> Vec<Cluster> {
        let held: HashSet<i64> = reservation.tables.iter().map(|t| t.id).collect();
        // Geometry comes from the live layout, not the snapshot the
        // reservation carries
        let members: Vec<&Table> = layout.iter().filter(|t| held.contains(&t.id)).collect();

        Self::components(&members)
            .into_iter()
            .filter(|component| component.len() >= 2)
            .map(|component| {
                let tables: Vec<&Table> = component.iter().map(|&i| members[i]).collect();
                let mut table_ids: Vec<i64> = tables.iter().map(|t| t.id).collect();
                table_ids.sort();
                Cluster {
                    id: Uuid::new_v4(),
                    reservation_id: reservation.id,
                    table_ids,
                    date,
                    category,
                    frame: Cluster::frame_of(&tables),
                }
            })
            .collect()
    }

    /// Compute the full cluster set for a day and category.
    pub fn compute(
        &self,
        reservations: &[Reservation],
        layout: &[Table],
        date: NaiveDate,
        category: ServiceCategory,
    ) -> Vec<Cluster> {
        reservations
            .iter()
            .filter(|r| r.is_indexable() && r.category == category && r.tables.len() >= 2)
            .flat_map(|r| self.clusters_for_reservation(r, layout, date, category))
            .collect()
    }

    /// Signature the cached set for a key was computed against, if cached.
    pub fn cached_signature(&self, date: NaiveDate, category: ServiceCategory) -> Option<String> {
        let key = layout_key(date, category);
        self.cache.read().get(&key).map(|e| e.signature.clone())
    }

    /// Load clusters for a key: exact cache entry → closest prior key of the
    /// same category → persisted set → empty.
    pub fn load_clusters(
        &self,
        date: NaiveDate,
        category: ServiceCategory,
    ) -> shared::error::EngineResult<Vec<Cluster>> {
        let key = layout_key(date, category);

        {
            let mut cache = self.cache.write();
            if let Some(entry) = cache.get_mut(&key) {
                entry.last_accessed = self.access_tick.fetch_add(1, Ordering::Relaxed);
                return Ok(entry.clusters.clone());
            }
            let suffix = format!("-{category}");
            let prior = cache
                .iter()
                .filter(|(k, _)| k.ends_with(&suffix) && k.as_str() < key.as_str())
                .max_by(|(a, _), (b, _)| a.cmp(b))
                .map(|(k, e)| (k.clone(), e.clusters.clone()));
            if let Some((prior_key, clusters)) = prior {
                tracing::debug!(from = %prior_key, to = %key, "Serving clusters from prior key");
                return Ok(clusters);
            }
        }

        let persisted = self.store.load(date, category)?;
        if !persisted.is_empty() {
            tracing::debug!(key = %key, count = persisted.len(), "Loaded persisted clusters");
        }
        Ok(persisted)
    }

    /// Cache and persist a computed cluster set, tagged with the layout
    /// signature it was computed against.
    pub fn save_clusters(
        &self,
        clusters: Vec<Cluster>,
        date: NaiveDate,
        category: ServiceCategory,
        signature: String,
    ) -> shared::error::EngineResult<()> {
        let key = layout_key(date, category);
        self.store.save(&clusters, date, category)?;

        let mut cache = self.cache.write();
        cache.insert(
            key.clone(),
            CacheEntry {
                clusters,
                signature,
                last_accessed: self.access_tick.fetch_add(1, Ordering::Relaxed),
            },
        );
        while cache.len() > self.max_entries {
            let Some(oldest) = cache
                .iter()
                .min_by_key(|(_, e)| e.last_accessed)
                .map(|(k, _)| k.clone())
            else {
                break;
            };
            tracing::debug!(key = %oldest, "Evicting least-recently-used cluster entry");
            cache.remove(&oldest);
        }
        tracing::debug!(key = %key, "Saved clusters");
        Ok(())
    }
}
