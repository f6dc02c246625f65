//! The claim store: an arena of claims keyed by UUID.
//!
//! Reads (`get`, `claim_at`, snapshots) are safe from any number of
//! concurrent tasks. Mutations are serialized per claim by a per-claim
//! `RwLock` held for the duration of the mutation and released on every
//! exit path. Operations spanning a claim and its subdivisions acquire all
//! involved locks in ascending UUID order so they can never deadlock with
//! each other.
//!
//! Persistence goes through the injected [`ClaimStorage`] collaborator: the
//! store encodes a snapshot, releases the claim lock, awaits the write, and
//! clears the dirty marker only after the collaborator acknowledges
//! success. A failed write leaves the claim dirty; retrying is the external
//! scheduler's job, never the store's.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedRwLockWriteGuard, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::claim::Claim;
use crate::codec;
use crate::error::ClaimError;
use crate::flags;
use crate::index::WorldIndex;
use crate::persistence::ClaimStorage;
use crate::types::{ClaimType, Vec3};

/// Confirmation for deleting a parent claim that still has subdivisions.
///
/// Cascade deletion is intentional, non-silent data loss: it must be asked
/// for explicitly, and every removed child is logged at WARN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cascade {
    /// Refuse the deletion while subdivisions exist.
    Deny,
    /// Delete the claim and every subdivision under it.
    Confirmed,
}

/// Outcome of a startup load. Malformed records are handed back with their
/// raw payload so the caller can quarantine or drop them.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: usize,
    pub failed: Vec<(serde_json::Value, ClaimError)>,
}

/// Outcome of a dirty-claim persistence sweep.
#[derive(Debug, Default)]
pub struct SaveSweep {
    pub saved: usize,
    pub failed: Vec<(Uuid, ClaimError)>,
}

#[derive(Debug, Clone)]
pub struct StoreStats {
    pub total_claims: usize,
    pub total_worlds: usize,
}

pub struct ClaimStore {
    claims: DashMap<Uuid, Arc<RwLock<Claim>>>,
    index: WorldIndex,
    /// world id -> wilderness claim id
    wilderness: DashMap<Uuid, Uuid>,
    /// Serializes claim creation per world so top-level overlap checks and
    /// wilderness bootstrap cannot race.
    world_locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl ClaimStore {
    pub fn new() -> Self {
        Self {
            claims: DashMap::new(),
            index: WorldIndex::new(),
            wilderness: DashMap::new(),
            world_locks: DashMap::new(),
        }
    }

    fn slot(&self, id: Uuid) -> Result<Arc<RwLock<Claim>>, ClaimError> {
        self.claims
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(ClaimError::NotFound(id))
    }

    fn world_lock(&self, world_id: Uuid) -> Arc<Mutex<()>> {
        self.world_locks
            .entry(world_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Write-lock a claim and all of its subdivisions in ascending UUID
    /// order. Membership of the subdivision set only changes under the
    /// parent's write lock, so the snapshot is re-verified after
    /// acquisition and the whole acquisition retried if it raced a change.
    async fn lock_subtree(
        &self,
        root: Uuid,
    ) -> Result<Vec<(Uuid, OwnedRwLockWriteGuard<Claim>)>, ClaimError> {
        loop {
            let children: BTreeSet<Uuid> = {
                let arc = self.slot(root)?;
                let guard = arc.read().await;
                guard.subdivisions().collect()
            };
            let mut ids: Vec<Uuid> = children.iter().copied().collect();
            ids.push(root);
            ids.sort();

            let mut guards = Vec::with_capacity(ids.len());
            let mut vanished = false;
            for id in &ids {
                match self.claims.get(id).map(|entry| entry.value().clone()) {
                    Some(arc) => guards.push((*id, arc.write_owned().await)),
                    None if *id == root => return Err(ClaimError::NotFound(root)),
                    None => {
                        vanished = true;
                        break;
                    }
                }
            }
            if vanished {
                continue;
            }

            let stable = guards
                .iter()
                .find(|(id, _)| *id == root)
                .map(|(_, guard)| guard.subdivisions().collect::<BTreeSet<Uuid>>() == children)
                .unwrap_or(false);
            if stable {
                return Ok(guards);
            }
        }
    }

    /// Create a top-level claim. Corners are accepted in any order; the
    /// stored box is always normalized. Rejects a box overlapping any
    /// existing top-level claim in the world.
    pub async fn create(
        &self,
        owner_id: Option<Uuid>,
        world_id: Uuid,
        corner_a: Vec3,
        corner_b: Vec3,
        claim_type: ClaimType,
    ) -> Result<Claim, ClaimError> {
        match claim_type {
            ClaimType::Subdivision => {
                return Err(ClaimError::InvalidGeometry(
                    "subdivisions are created through create_subdivision".into(),
                ))
            }
            ClaimType::Wilderness => {
                return Err(ClaimError::InvalidGeometry(
                    "the wilderness claim is created on demand, not explicitly".into(),
                ))
            }
            _ => {}
        }

        let world_lock = self.world_lock(world_id);
        let _world_guard = world_lock.lock().await;

        let lesser = corner_a.min(corner_b);
        let greater = corner_a.max(corner_b);
        for other_id in self.index.top_level_of(world_id) {
            let Ok(arc) = self.slot(other_id) else {
                continue;
            };
            let other = arc.read().await;
            if boxes_overlap(
                lesser,
                greater,
                false,
                other.lesser_corner(),
                other.greater_corner(),
                other.is_cuboid(),
            ) {
                return Err(ClaimError::InvalidGeometry(format!(
                    "box overlaps existing claim {other_id}"
                )));
            }
        }

        // Admin claims are server-owned.
        let owner_id = if claim_type == ClaimType::Admin {
            None
        } else {
            owner_id
        };

        let id = Uuid::new_v4();
        let mut claim = Claim::new(id, world_id, owner_id, corner_a, corner_b, claim_type);
        claim.flags = flags::type_defaults(claim_type);
        let snapshot = claim.clone();

        self.claims.insert(id, Arc::new(RwLock::new(claim)));
        self.index.insert(world_id, id);
        debug!(claim_id = %id, world_id = %world_id, claim_type = %claim_type, "created claim");
        Ok(snapshot)
    }

    /// Create a subdivision inside `parent_id`. The child box must lie
    /// entirely within the parent and must not overlap any sibling.
    /// Subdivisions cannot themselves be subdivided.
    pub async fn create_subdivision(
        &self,
        parent_id: Uuid,
        corner_a: Vec3,
        corner_b: Vec3,
        cuboid: bool,
    ) -> Result<Claim, ClaimError> {
        let mut guards = self.lock_subtree(parent_id).await?;

        let lesser = corner_a.min(corner_b);
        let greater = corner_a.max(corner_b);

        {
            let Some((_, parent)) = guards.iter().find(|(id, _)| *id == parent_id) else {
                return Err(ClaimError::NotFound(parent_id));
            };
            if parent.claim_type() == ClaimType::Wilderness {
                return Err(ClaimError::InvalidGeometry(
                    "the wilderness claim cannot be subdivided".into(),
                ));
            }
            if parent.claim_type() == ClaimType::Subdivision {
                return Err(ClaimError::InvalidGeometry(
                    "subdivisions cannot be nested".into(),
                ));
            }
            if !parent.contains_box(lesser, greater) {
                return Err(ClaimError::InvalidGeometry(
                    "subdivision extends outside its parent".into(),
                ));
            }
            for (sibling_id, sibling) in guards.iter().filter(|(id, _)| *id != parent_id) {
                if boxes_overlap(
                    lesser,
                    greater,
                    cuboid,
                    sibling.lesser_corner(),
                    sibling.greater_corner(),
                    sibling.is_cuboid(),
                ) {
                    return Err(ClaimError::InvalidGeometry(format!(
                        "box overlaps sibling subdivision {sibling_id}"
                    )));
                }
            }
        }

        let (parent_world, parent_owner) = {
            let Some((_, parent)) = guards.iter().find(|(id, _)| *id == parent_id) else {
                return Err(ClaimError::NotFound(parent_id));
            };
            (parent.world_id(), parent.owner_id())
        };

        let id = Uuid::new_v4();
        let mut child = Claim::new(
            id,
            parent_world,
            parent_owner,
            corner_a,
            corner_b,
            ClaimType::Subdivision,
        );
        child.set_cuboid(cuboid);
        child.set_parent(Some(parent_id));
        child.flags = flags::type_defaults(ClaimType::Subdivision);
        let snapshot = child.clone();

        self.claims.insert(id, Arc::new(RwLock::new(child)));
        if let Some((_, parent)) = guards.iter_mut().find(|(gid, _)| *gid == parent_id) {
            parent.register_subdivision(id);
        }
        debug!(claim_id = %id, parent_id = %parent_id, "created subdivision");
        Ok(snapshot)
    }

    /// Snapshot of a claim.
    pub async fn get(&self, id: Uuid) -> Result<Claim, ClaimError> {
        let arc = self.slot(id)?;
        let guard = arc.read().await;
        Ok(guard.clone())
    }

    /// Apply a mutation under the claim's write lock. At most one mutation
    /// is in flight per claim identity; the lock is released on every exit
    /// path, including when `f` panics.
    pub async fn mutate<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut Claim) -> R,
    ) -> Result<R, ClaimError> {
        let arc = self.slot(id)?;
        let mut guard = arc.write().await;
        // The claim may have been deleted between lookup and acquisition.
        if !self.claims.contains_key(&id) {
            return Err(ClaimError::NotFound(id));
        }
        Ok(f(&mut guard))
    }

    /// Replace a claim's attributes with the given snapshot.
    ///
    /// Geometry and hierarchy are managed fields: the stored corners,
    /// parent reference and subdivision set are preserved. Use
    /// [`ClaimStore::resize`] to change the box.
    pub async fn update(&self, claim: Claim) -> Result<(), ClaimError> {
        let id = claim.id();
        let arc = self.slot(id)?;
        let mut guard = arc.write().await;
        if !self.claims.contains_key(&id) {
            return Err(ClaimError::NotFound(id));
        }

        let mut incoming = claim;
        incoming.lesser_corner = guard.lesser_corner;
        incoming.greater_corner = guard.greater_corner;
        incoming.cuboid = guard.cuboid;
        incoming.parent = guard.parent;
        incoming.subdivisions = guard.subdivisions.clone();
        incoming.dirty = true;
        incoming.generation = guard.generation.wrapping_add(1);
        *guard = incoming;
        Ok(())
    }

    /// Move a claim's corners. Denied when the claim is not resizable
    /// unless the caller holds elevated rights (authorization itself is the
    /// caller's determination). Containment invariants are re-validated:
    /// a subdivision must stay inside its parent and clear of its siblings,
    /// and a parent must keep covering its subdivisions.
    pub async fn resize(
        &self,
        id: Uuid,
        corner_a: Vec3,
        corner_b: Vec3,
        elevated: bool,
    ) -> Result<Claim, ClaimError> {
        let parent_id = {
            let arc = self.slot(id)?;
            let guard = arc.read().await;
            guard.parent()
        };

        let lesser = corner_a.min(corner_b);
        let greater = corner_a.max(corner_b);

        let root = parent_id.unwrap_or(id);
        let mut guards = self.lock_subtree(root).await?;

        {
            let Some((_, target)) = guards.iter().find(|(gid, _)| *gid == id) else {
                return Err(ClaimError::NotFound(id));
            };
            if !target.is_resizable() && !elevated {
                return Err(ClaimError::PermissionDenied(format!(
                    "claim {id} is not resizable"
                )));
            }

            if let Some(parent_id) = parent_id {
                let Some((_, parent)) = guards.iter().find(|(gid, _)| *gid == parent_id) else {
                    return Err(ClaimError::NotFound(parent_id));
                };
                if !parent.contains_box(lesser, greater) {
                    return Err(ClaimError::InvalidGeometry(
                        "resized subdivision extends outside its parent".into(),
                    ));
                }
                for (sibling_id, sibling) in guards
                    .iter()
                    .filter(|(gid, _)| *gid != id && *gid != parent_id)
                {
                    if boxes_overlap(
                        lesser,
                        greater,
                        target.is_cuboid(),
                        sibling.lesser_corner(),
                        sibling.greater_corner(),
                        sibling.is_cuboid(),
                    ) {
                        return Err(ClaimError::InvalidGeometry(format!(
                            "resized box overlaps sibling subdivision {sibling_id}"
                        )));
                    }
                }
            } else {
                for (child_id, child) in guards.iter().filter(|(gid, _)| *gid != id) {
                    if !box_contains(
                        lesser,
                        greater,
                        target.is_cuboid(),
                        child.lesser_corner(),
                        child.greater_corner(),
                    ) {
                        return Err(ClaimError::InvalidGeometry(format!(
                            "resized box no longer covers subdivision {child_id}"
                        )));
                    }
                }
            }
        }

        let Some((_, target)) = guards.iter_mut().find(|(gid, _)| *gid == id) else {
            return Err(ClaimError::NotFound(id));
        };
        target.set_corners(corner_a, corner_b);
        debug!(claim_id = %id, "resized claim");
        Ok(target.clone())
    }

    /// Delete a claim, returning the ids actually removed (the claim plus
    /// any cascaded subdivisions) so the caller can clear flag overrides.
    ///
    /// Deleting a parent with live subdivisions requires
    /// [`Cascade::Confirmed`]; the cascade is logged loudly because it is
    /// intentional data loss.
    pub async fn delete(&self, id: Uuid, cascade: Cascade) -> Result<Vec<Uuid>, ClaimError> {
        let (world_id, parent_id, claim_type) = {
            let arc = self.slot(id)?;
            let guard = arc.read().await;
            (guard.world_id(), guard.parent(), guard.claim_type())
        };
        if claim_type == ClaimType::Wilderness {
            return Err(ClaimError::PermissionDenied(
                "the wilderness claim cannot be deleted".into(),
            ));
        }

        if let Some(parent_id) = parent_id {
            let mut guards = self.lock_subtree(parent_id).await?;
            if let Some((_, parent)) = guards.iter_mut().find(|(gid, _)| *gid == parent_id) {
                parent.unregister_subdivision(&id);
            }
            self.claims.remove(&id);
            debug!(claim_id = %id, parent_id = %parent_id, "deleted subdivision");
            return Ok(vec![id]);
        }

        let guards = self.lock_subtree(id).await?;
        let child_ids: Vec<Uuid> = guards
            .iter()
            .filter(|(gid, _)| *gid != id)
            .map(|(gid, _)| *gid)
            .collect();

        if !child_ids.is_empty() && cascade == Cascade::Deny {
            return Err(ClaimError::SubdivisionsPresent(id));
        }

        let mut removed = Vec::with_capacity(child_ids.len() + 1);
        for child_id in child_ids {
            warn!(
                claim_id = %child_id,
                parent_id = %id,
                "cascade-deleting subdivision with its parent"
            );
            self.claims.remove(&child_id);
            removed.push(child_id);
        }
        self.claims.remove(&id);
        self.index.remove(world_id, &id);
        removed.push(id);
        debug!(claim_id = %id, removed = removed.len(), "deleted claim");
        Ok(removed)
    }

    /// Snapshots of a claim's subdivisions, in deterministic order.
    pub async fn list_subdivisions(&self, parent_id: Uuid) -> Result<Vec<Claim>, ClaimError> {
        let child_ids: Vec<Uuid> = {
            let arc = self.slot(parent_id)?;
            let guard = arc.read().await;
            guard.subdivisions().collect()
        };
        let mut children = Vec::with_capacity(child_ids.len());
        for child_id in child_ids {
            if let Ok(arc) = self.slot(child_id) {
                let guard = arc.read().await;
                children.push(guard.clone());
            }
        }
        Ok(children)
    }

    // -- persistence ---------------------------------------------------------

    /// Persist a claim if dirty. Returns whether a write was issued.
    ///
    /// The snapshot is encoded under a read lock, the lock released, and
    /// the dirty marker cleared only after the collaborator acknowledges
    /// the write, and only if no newer mutation landed in the meantime.
    pub async fn save(&self, id: Uuid, storage: &dyn ClaimStorage) -> Result<bool, ClaimError> {
        let (record, generation) = {
            let arc = self.slot(id)?;
            let guard = arc.read().await;
            if !guard.is_dirty() {
                return Ok(false);
            }
            (codec::encode(&guard)?, guard.generation())
        };

        if let Err(err) = storage.write_claim_record(id, record).await {
            warn!(claim_id = %id, error = %err, "persistence write failed, claim stays dirty");
            return Err(err);
        }

        let arc = self.slot(id)?;
        let mut guard = arc.write().await;
        guard.mark_clean_if(generation);
        Ok(true)
    }

    /// Persist every dirty claim. Failures leave their claims dirty and are
    /// reported; the external scheduler decides when to retry.
    pub async fn save_dirty(&self, storage: &dyn ClaimStorage) -> SaveSweep {
        let ids: Vec<Uuid> = self.claims.iter().map(|entry| *entry.key()).collect();
        let mut sweep = SaveSweep::default();
        for id in ids {
            match self.save(id, storage).await {
                Ok(true) => sweep.saved += 1,
                Ok(false) => {}
                Err(ClaimError::NotFound(_)) => {}
                Err(err) => sweep.failed.push((id, err)),
            }
        }
        if !sweep.failed.is_empty() {
            warn!(failed = sweep.failed.len(), "persistence sweep had failures");
        }
        sweep
    }

    /// Load every persisted claim of a world at startup. Malformed records
    /// are returned in the report with their raw payload; decoding never
    /// silently defaults.
    pub async fn load_world(
        &self,
        world_id: Uuid,
        storage: &dyn ClaimStorage,
    ) -> Result<LoadReport, ClaimError> {
        let records = storage.read_all_claim_records(world_id).await?;
        let mut report = LoadReport::default();
        let mut loaded: Vec<Claim> = Vec::new();

        for record in records {
            match codec::decode(record.clone()) {
                Ok(claim) => loaded.push(claim),
                Err(err) => report.failed.push((record, err)),
            }
        }

        let loaded_ids: BTreeSet<Uuid> = loaded.iter().map(|c| c.id()).collect();
        for mut claim in loaded {
            let id = claim.id();
            // A child whose parent record is gone becomes top-level rather
            // than unreachable.
            if let Some(parent) = claim.parent() {
                if !loaded_ids.contains(&parent) {
                    warn!(claim_id = %id, parent_id = %parent, "parent record missing, promoting to top-level");
                    claim.parent = None;
                }
            }
            let is_top_level = claim.parent().is_none();
            let claim_type = claim.claim_type();
            let claim_world = claim.world_id();
            self.claims.insert(id, Arc::new(RwLock::new(claim)));
            match claim_type {
                ClaimType::Wilderness => {
                    self.wilderness.insert(claim_world, id);
                }
                _ if is_top_level => self.index.insert(claim_world, id),
                _ => {}
            }
            report.loaded += 1;
        }

        // Reconcile links: make sure every loaded child is registered on
        // its parent, whichever record was written last.
        for id in loaded_ids.iter() {
            let Ok(arc) = self.slot(*id) else { continue };
            let parent = {
                let guard = arc.read().await;
                guard.parent()
            };
            if let Some(parent_id) = parent {
                if let Ok(parent_arc) = self.slot(parent_id) {
                    let mut parent_guard = parent_arc.write().await;
                    if !parent_guard.subdivisions.contains(id) {
                        debug!(claim_id = %id, parent_id = %parent_id, "re-linking subdivision to parent");
                        parent_guard.subdivisions.insert(*id);
                    }
                }
            }
        }

        debug!(
            world_id = %world_id,
            loaded = report.loaded,
            failed = report.failed.len(),
            "loaded world claims"
        );
        Ok(report)
    }

    // -- expiration ----------------------------------------------------------

    /// Claims eligible for expiration: expiration allowed and last active
    /// longer than `threshold` before `now`. Driven by an external
    /// scheduler; the engine only lists candidates.
    pub async fn list_expired_claims(
        &self,
        now: DateTime<Utc>,
        threshold: Duration,
    ) -> Vec<Claim> {
        let ids: Vec<Uuid> = self.claims.iter().map(|entry| *entry.key()).collect();
        let mut expired = Vec::new();
        for id in ids {
            let Ok(arc) = self.slot(id) else { continue };
            let guard = arc.read().await;
            if guard.claim_type() == ClaimType::Wilderness || !guard.allow_expiration() {
                continue;
            }
            if guard.date_last_active() + threshold <= now {
                expired.push(guard.clone());
            }
        }
        expired
    }

    // -- region lookup -------------------------------------------------------

    /// The claim owning a point, with subdivision precedence: a point
    /// inside a subdivision resolves to the subdivision, not its parent.
    /// Returns `None` for unclaimed land.
    pub async fn claim_at(&self, world_id: Uuid, point: Vec3) -> Option<Claim> {
        for id in self.index.top_level_of(world_id) {
            let Ok(arc) = self.slot(id) else { continue };
            let guard = arc.read().await;
            if !guard.contains(point) {
                continue;
            }
            let children: Vec<Uuid> = guard.subdivisions().collect();
            let top = guard.clone();
            drop(guard);

            for child_id in children {
                let Ok(child_arc) = self.slot(child_id) else {
                    continue;
                };
                let child = child_arc.read().await;
                if child.contains(point) {
                    return Some(child.clone());
                }
            }
            return Some(top);
        }
        None
    }

    /// Like [`ClaimStore::claim_at`], but unclaimed land resolves to the
    /// world's synthetic wilderness claim.
    pub async fn claim_or_wilderness(&self, world_id: Uuid, point: Vec3) -> Claim {
        if let Some(claim) = self.claim_at(world_id, point).await {
            return claim;
        }
        self.wilderness(world_id).await
    }

    /// The synthetic wilderness claim for a world, created on first use.
    pub async fn wilderness(&self, world_id: Uuid) -> Claim {
        if let Some(id) = self.wilderness.get(&world_id).map(|entry| *entry) {
            if let Ok(claim) = self.get(id).await {
                return claim;
            }
        }

        let world_lock = self.world_lock(world_id);
        let _world_guard = world_lock.lock().await;
        if let Some(id) = self.wilderness.get(&world_id).map(|entry| *entry) {
            if let Ok(claim) = self.get(id).await {
                return claim;
            }
        }

        let id = Uuid::new_v4();
        let mut claim = Claim::new(
            id,
            world_id,
            None,
            Vec3::new(i32::MIN, i32::MIN, i32::MIN),
            Vec3::new(i32::MAX, i32::MAX, i32::MAX),
            ClaimType::Wilderness,
        );
        claim.flags = flags::type_defaults(ClaimType::Wilderness);
        claim.resizable = false;
        claim.allow_expiration = false;
        claim.mark_clean();
        let snapshot = claim.clone();

        self.claims.insert(id, Arc::new(RwLock::new(claim)));
        self.wilderness.insert(world_id, id);
        debug!(world_id = %world_id, claim_id = %id, "created wilderness claim");
        snapshot
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            total_claims: self.claims.len(),
            total_worlds: self.index.world_count(),
        }
    }
}

impl Default for ClaimStore {
    fn default() -> Self {
        Self::new()
    }
}

fn footprint_contains(outer_l: Vec3, outer_g: Vec3, inner_l: Vec3, inner_g: Vec3) -> bool {
    inner_l.x >= outer_l.x && inner_g.x <= outer_g.x && inner_l.z >= outer_l.z && inner_g.z <= outer_g.z
}

fn box_contains(outer_l: Vec3, outer_g: Vec3, outer_cuboid: bool, inner_l: Vec3, inner_g: Vec3) -> bool {
    if !footprint_contains(outer_l, outer_g, inner_l, inner_g) {
        return false;
    }
    !outer_cuboid || (inner_l.y >= outer_l.y && inner_g.y <= outer_g.y)
}

fn boxes_overlap(
    a_l: Vec3,
    a_g: Vec3,
    a_cuboid: bool,
    b_l: Vec3,
    b_g: Vec3,
    b_cuboid: bool,
) -> bool {
    let footprints = a_l.x <= b_g.x && a_g.x >= b_l.x && a_l.z <= b_g.z && a_g.z >= b_l.z;
    if !(a_cuboid && b_cuboid) {
        return footprints;
    }
    footprints && a_l.y <= b_g.y && a_g.y >= b_l.y
}
