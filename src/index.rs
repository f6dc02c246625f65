//! Per-world index of top-level claims.
//!
//! The store consults this index to answer point lookups without scanning
//! every claim; subdivisions are reached by descending from their top-level
//! ancestor, so only top-level claims are indexed here. The synthetic
//! wilderness claim is deliberately not indexed (it would swallow every
//! lookup) and is returned only as the explicit fallback.

use dashmap::DashMap;
use std::collections::BTreeSet;
use uuid::Uuid;

#[derive(Debug, Default)]
pub(crate) struct WorldIndex {
    top_level: DashMap<Uuid, BTreeSet<Uuid>>,
}

impl WorldIndex {
    pub(crate) fn new() -> Self {
        Self {
            top_level: DashMap::new(),
        }
    }

    pub(crate) fn insert(&self, world_id: Uuid, claim_id: Uuid) {
        self.top_level.entry(world_id).or_default().insert(claim_id);
    }

    pub(crate) fn remove(&self, world_id: Uuid, claim_id: &Uuid) {
        if let Some(mut set) = self.top_level.get_mut(&world_id) {
            set.remove(claim_id);
        }
        self.top_level.retain(|_, set| !set.is_empty());
    }

    /// Top-level claim ids in a world, in deterministic order.
    pub(crate) fn top_level_of(&self, world_id: Uuid) -> Vec<Uuid> {
        self.top_level
            .get(&world_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub(crate) fn world_count(&self) -> usize {
        self.top_level.len()
    }
}
