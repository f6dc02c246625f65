//! The claim record: an owned, bounded region of world space.
//!
//! A claim is a pure data record. Every mutating setter marks the claim
//! dirty so the store knows it needs persistence; the dirty marker is
//! cleared only after a persistence write is acknowledged. Geometry is
//! normalized on every corner mutation so the lesser/greater invariant can
//! never be observed broken.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

use crate::types::{ClaimType, Tristate, TrustType, Vec3};

/// Economic attributes embedded in a claim.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EconomyData {
    #[serde(rename = "for-sale", default)]
    pub for_sale: bool,
    #[serde(rename = "sale-price", default)]
    pub sale_price: f64,
}

impl Default for EconomyData {
    fn default() -> Self {
        Self {
            for_sale: false,
            sale_price: 0.0,
        }
    }
}

/// An owned, bounded region of world space with associated permissions.
///
/// Corners are always stored normalized: `lesser_corner <= greater_corner`
/// per axis. Subdivision links are arena-style: the parent holds child ids,
/// the child holds a parent id, and neither owns the other's record.
#[derive(Debug, Clone)]
pub struct Claim {
    pub(crate) id: Uuid,
    pub(crate) world_id: Uuid,
    pub(crate) owner_id: Option<Uuid>,
    pub(crate) claim_type: ClaimType,
    pub(crate) cuboid: bool,
    pub(crate) lesser_corner: Vec3,
    pub(crate) greater_corner: Vec3,
    pub(crate) resizable: bool,
    /// Cached derived flag; recomputed on every read, see
    /// [`Claim::has_size_restrictions`].
    pub(crate) size_restrictions: bool,
    pub(crate) inherit_parent: bool,
    pub(crate) allow_expiration: bool,
    pub(crate) expired: bool,
    pub(crate) deny_messages: bool,
    pub(crate) flag_overrides: bool,
    pub(crate) requires_claim_blocks: bool,
    pub(crate) pvp_override: Tristate,
    pub(crate) date_created: DateTime<Utc>,
    pub(crate) date_last_active: DateTime<Utc>,
    pub(crate) name: Option<String>,
    pub(crate) greeting: Option<String>,
    pub(crate) farewell: Option<String>,
    pub(crate) spawn: Option<Vec3>,
    pub(crate) parent: Option<Uuid>,
    pub(crate) subdivisions: BTreeSet<Uuid>,
    pub(crate) accessors: Vec<Uuid>,
    pub(crate) builders: Vec<Uuid>,
    pub(crate) containers: Vec<Uuid>,
    pub(crate) managers: Vec<Uuid>,
    pub(crate) accessor_groups: Vec<String>,
    pub(crate) builder_groups: Vec<String>,
    pub(crate) container_groups: Vec<String>,
    pub(crate) manager_groups: Vec<String>,
    /// Claim-level default flag values, the third resolution tier.
    pub(crate) flags: BTreeMap<String, Tristate>,
    pub(crate) economy: EconomyData,
    /// Requires-persistence marker. Never serialized.
    pub(crate) dirty: bool,
    /// Bumped on every dirty-marking mutation so a save that raced a
    /// mutation does not clear the newer mutation's dirty state.
    pub(crate) generation: u64,
}

impl Claim {
    /// Create a new claim. Corners are accepted in any order and normalized.
    pub fn new(
        id: Uuid,
        world_id: Uuid,
        owner_id: Option<Uuid>,
        corner_a: Vec3,
        corner_b: Vec3,
        claim_type: ClaimType,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            world_id,
            owner_id,
            claim_type,
            cuboid: false,
            lesser_corner: corner_a.min(corner_b),
            greater_corner: corner_a.max(corner_b),
            resizable: true,
            size_restrictions: !claim_type.exempt_from_size_restrictions(),
            inherit_parent: true,
            allow_expiration: true,
            expired: false,
            deny_messages: true,
            flag_overrides: true,
            requires_claim_blocks: true,
            pvp_override: Tristate::Undefined,
            date_created: now,
            date_last_active: now,
            name: None,
            greeting: None,
            farewell: None,
            spawn: None,
            parent: None,
            subdivisions: BTreeSet::new(),
            accessors: Vec::new(),
            builders: Vec::new(),
            containers: Vec::new(),
            managers: Vec::new(),
            accessor_groups: Vec::new(),
            builder_groups: Vec::new(),
            container_groups: Vec::new(),
            manager_groups: Vec::new(),
            flags: BTreeMap::new(),
            economy: EconomyData::default(),
            dirty: true,
            generation: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn world_id(&self) -> Uuid {
        self.world_id
    }

    pub fn owner_id(&self) -> Option<Uuid> {
        self.owner_id
    }

    pub fn claim_type(&self) -> ClaimType {
        self.claim_type
    }

    pub fn is_cuboid(&self) -> bool {
        self.cuboid
    }

    pub fn lesser_corner(&self) -> Vec3 {
        self.lesser_corner
    }

    pub fn greater_corner(&self) -> Vec3 {
        self.greater_corner
    }

    pub fn is_resizable(&self) -> bool {
        self.resizable
    }

    /// Whether this claim inherits unset flags from its parent.
    ///
    /// Admin claims never inherit, regardless of the stored flag. This is a
    /// hard rule, not a toggle.
    pub fn does_inherit_parent(&self) -> bool {
        if self.claim_type == ClaimType::Admin {
            return false;
        }
        self.inherit_parent
    }

    /// Whether this claim is subject to size restrictions.
    ///
    /// Derived and cached: Admin and Wilderness claims are never
    /// size-restricted, and reading the value refreshes the stored flag so
    /// the exemption is what gets persisted afterwards.
    pub fn has_size_restrictions(&mut self) -> bool {
        if self.claim_type.exempt_from_size_restrictions() {
            self.size_restrictions = false;
            return false;
        }
        self.size_restrictions
    }

    pub fn allow_expiration(&self) -> bool {
        self.allow_expiration
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    pub fn allow_deny_messages(&self) -> bool {
        self.deny_messages
    }

    pub fn allow_flag_overrides(&self) -> bool {
        self.flag_overrides
    }

    pub fn requires_claim_blocks(&self) -> bool {
        self.requires_claim_blocks
    }

    pub fn pvp_override(&self) -> Tristate {
        self.pvp_override
    }

    pub fn date_created(&self) -> DateTime<Utc> {
        self.date_created
    }

    pub fn date_last_active(&self) -> DateTime<Utc> {
        self.date_last_active
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn greeting(&self) -> Option<&str> {
        self.greeting.as_deref()
    }

    pub fn farewell(&self) -> Option<&str> {
        self.farewell.as_deref()
    }

    pub fn spawn(&self) -> Option<Vec3> {
        self.spawn
    }

    /// Weak reference to the parent claim, if this is a subdivision.
    pub fn parent(&self) -> Option<Uuid> {
        self.parent
    }

    /// Ids of child subdivisions, in deterministic order.
    pub fn subdivisions(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.subdivisions.iter().copied()
    }

    pub fn economy(&self) -> &EconomyData {
        &self.economy
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    // -- setters: every mutation marks the claim dirty -----------------------

    fn touch_dirty(&mut self) {
        self.dirty = true;
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn set_owner(&mut self, owner_id: Option<Uuid>) {
        self.touch_dirty();
        self.owner_id = owner_id;
    }

    pub fn set_claim_type(&mut self, claim_type: ClaimType) {
        self.touch_dirty();
        self.claim_type = claim_type;
    }

    pub fn set_cuboid(&mut self, cuboid: bool) {
        self.touch_dirty();
        self.cuboid = cuboid;
    }

    /// Replace both corners. Accepts any order; normalizes instead of
    /// failing. Containment against the parent is the store's concern.
    pub fn set_corners(&mut self, corner_a: Vec3, corner_b: Vec3) {
        self.touch_dirty();
        self.lesser_corner = corner_a.min(corner_b);
        self.greater_corner = corner_a.max(corner_b);
    }

    pub fn set_resizable(&mut self, resizable: bool) {
        self.touch_dirty();
        self.resizable = resizable;
    }

    pub fn set_size_restrictions(&mut self, size_restrictions: bool) {
        self.touch_dirty();
        self.size_restrictions = size_restrictions;
    }

    pub fn set_inherit_parent(&mut self, inherit: bool) {
        self.touch_dirty();
        self.inherit_parent = inherit;
    }

    pub fn set_allow_expiration(&mut self, allow: bool) {
        self.touch_dirty();
        self.allow_expiration = allow;
    }

    pub fn set_expired(&mut self, expired: bool) {
        self.touch_dirty();
        self.expired = expired;
    }

    pub fn set_deny_messages(&mut self, deny_messages: bool) {
        self.touch_dirty();
        self.deny_messages = deny_messages;
    }

    pub fn set_flag_overrides(&mut self, flag_overrides: bool) {
        self.touch_dirty();
        self.flag_overrides = flag_overrides;
    }

    pub fn set_requires_claim_blocks(&mut self, requires: bool) {
        self.touch_dirty();
        self.requires_claim_blocks = requires;
    }

    pub fn set_pvp_override(&mut self, pvp: Tristate) {
        self.touch_dirty();
        self.pvp_override = pvp;
    }

    /// Record activity, feeding the expiration sweep.
    pub fn set_last_active(&mut self, when: DateTime<Utc>) {
        self.touch_dirty();
        self.date_last_active = when;
    }

    pub fn set_name(&mut self, name: Option<String>) {
        self.touch_dirty();
        self.name = name;
    }

    pub fn set_greeting(&mut self, greeting: Option<String>) {
        self.touch_dirty();
        self.greeting = greeting;
    }

    pub fn set_farewell(&mut self, farewell: Option<String>) {
        self.touch_dirty();
        self.farewell = farewell;
    }

    pub fn set_spawn(&mut self, spawn: Option<Vec3>) {
        self.touch_dirty();
        self.spawn = spawn;
    }

    /// Re-point the weak parent reference. Changing it never transfers
    /// ownership of the child record; hierarchy bookkeeping is the store's
    /// job.
    pub fn set_parent(&mut self, parent: Option<Uuid>) {
        self.touch_dirty();
        self.parent = parent;
    }

    pub(crate) fn register_subdivision(&mut self, child: Uuid) {
        self.touch_dirty();
        self.subdivisions.insert(child);
    }

    pub(crate) fn unregister_subdivision(&mut self, child: &Uuid) {
        self.touch_dirty();
        self.subdivisions.remove(child);
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Clear the dirty marker, but only if no mutation happened since the
    /// snapshot at `generation` was taken.
    pub(crate) fn mark_clean_if(&mut self, generation: u64) {
        if self.generation == generation {
            self.dirty = false;
        }
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }

    // -- claim-level flags ---------------------------------------------------

    /// Stored claim-level value for an action, `Undefined` when absent.
    pub fn flag(&self, action: &str) -> Tristate {
        self.flags.get(action).copied().unwrap_or_default()
    }

    /// Set a claim-level flag. `Undefined` removes the entry.
    pub fn set_flag(&mut self, action: &str, value: Tristate) {
        self.touch_dirty();
        if value.is_defined() {
            self.flags.insert(action.to_string(), value);
        } else {
            self.flags.remove(action);
        }
    }

    /// All stored claim-level flags, sorted by action name.
    pub fn flags(&self) -> impl Iterator<Item = (&str, Tristate)> + '_ {
        self.flags.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn set_for_sale(&mut self, for_sale: bool, sale_price: f64) {
        self.touch_dirty();
        self.economy.for_sale = for_sale;
        self.economy.sale_price = sale_price;
    }

    // -- trust ---------------------------------------------------------------

    /// Subjects holding exactly `rank` on this claim.
    pub fn trustees(&self, rank: TrustType) -> &[Uuid] {
        match rank {
            TrustType::Accessor => &self.accessors,
            TrustType::Container => &self.containers,
            TrustType::Builder => &self.builders,
            TrustType::Manager => &self.managers,
        }
    }

    /// Group names holding exactly `rank` on this claim.
    pub fn trustee_groups(&self, rank: TrustType) -> &[String] {
        match rank {
            TrustType::Accessor => &self.accessor_groups,
            TrustType::Container => &self.container_groups,
            TrustType::Builder => &self.builder_groups,
            TrustType::Manager => &self.manager_groups,
        }
    }

    fn trustees_mut(&mut self, rank: TrustType) -> &mut Vec<Uuid> {
        match rank {
            TrustType::Accessor => &mut self.accessors,
            TrustType::Container => &mut self.containers,
            TrustType::Builder => &mut self.builders,
            TrustType::Manager => &mut self.managers,
        }
    }

    fn trustee_groups_mut(&mut self, rank: TrustType) -> &mut Vec<String> {
        match rank {
            TrustType::Accessor => &mut self.accessor_groups,
            TrustType::Container => &mut self.container_groups,
            TrustType::Builder => &mut self.builder_groups,
            TrustType::Manager => &mut self.manager_groups,
        }
    }

    pub fn grant_trust(&mut self, subject: Uuid, rank: TrustType) {
        self.touch_dirty();
        let list = self.trustees_mut(rank);
        if !list.contains(&subject) {
            list.push(subject);
        }
    }

    pub fn revoke_trust(&mut self, subject: &Uuid, rank: TrustType) {
        self.touch_dirty();
        self.trustees_mut(rank).retain(|s| s != subject);
    }

    pub fn grant_group_trust(&mut self, group: &str, rank: TrustType) {
        self.touch_dirty();
        let list = self.trustee_groups_mut(rank);
        if !list.iter().any(|g| g == group) {
            list.push(group.to_string());
        }
    }

    pub fn revoke_group_trust(&mut self, group: &str, rank: TrustType) {
        self.touch_dirty();
        self.trustee_groups_mut(rank).retain(|g| g != group);
    }

    /// Whether `subject` (with the given group memberships) holds at least
    /// `required` trust on this claim. The owner is always trusted.
    pub fn is_trusted(&self, subject: &Uuid, groups: &[String], required: TrustType) -> bool {
        if self.owner_id.as_ref() == Some(subject) {
            return true;
        }
        for rank in TrustType::all() {
            if !rank.implies(required) {
                continue;
            }
            if self.trustees(rank).contains(subject) {
                return true;
            }
            let group_list = self.trustee_groups(rank);
            if groups.iter().any(|g| group_list.contains(g)) {
                return true;
            }
        }
        false
    }

    // -- geometry ------------------------------------------------------------

    /// Whether `point` lies inside this claim.
    ///
    /// Non-cuboid claims cover the full vertical extent: the Y component of
    /// the stored corners is ignored.
    pub fn contains(&self, point: Vec3) -> bool {
        let in_footprint = point.x >= self.lesser_corner.x
            && point.x <= self.greater_corner.x
            && point.z >= self.lesser_corner.z
            && point.z <= self.greater_corner.z;
        if !self.cuboid {
            return in_footprint;
        }
        in_footprint && point.y >= self.lesser_corner.y && point.y <= self.greater_corner.y
    }

    /// Whether the box `lesser..=greater` lies entirely within this claim.
    /// Vertical containment is only required when this claim is cuboid.
    pub fn contains_box(&self, lesser: Vec3, greater: Vec3) -> bool {
        let in_footprint = lesser.x >= self.lesser_corner.x
            && greater.x <= self.greater_corner.x
            && lesser.z >= self.lesser_corner.z
            && greater.z <= self.greater_corner.z;
        if !self.cuboid {
            return in_footprint;
        }
        in_footprint && lesser.y >= self.lesser_corner.y && greater.y <= self.greater_corner.y
    }

    /// Whether this claim's box intersects `other`'s. Vertical separation
    /// only counts when both claims are cuboid.
    pub fn overlaps(&self, other: &Claim) -> bool {
        let footprints_overlap = self.lesser_corner.x <= other.greater_corner.x
            && self.greater_corner.x >= other.lesser_corner.x
            && self.lesser_corner.z <= other.greater_corner.z
            && self.greater_corner.z >= other.lesser_corner.z;
        if !(self.cuboid && other.cuboid) {
            return footprints_overlap;
        }
        footprints_overlap
            && self.lesser_corner.y <= other.greater_corner.y
            && self.greater_corner.y >= other.lesser_corner.y
    }
}

/// Equality over persisted attributes. The dirty marker and the mutation
/// generation are runtime state and excluded, which is what makes the
/// encode/decode round-trip law directly checkable.
impl PartialEq for Claim {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.world_id == other.world_id
            && self.owner_id == other.owner_id
            && self.claim_type == other.claim_type
            && self.cuboid == other.cuboid
            && self.lesser_corner == other.lesser_corner
            && self.greater_corner == other.greater_corner
            && self.resizable == other.resizable
            && self.size_restrictions == other.size_restrictions
            && self.inherit_parent == other.inherit_parent
            && self.allow_expiration == other.allow_expiration
            && self.expired == other.expired
            && self.deny_messages == other.deny_messages
            && self.flag_overrides == other.flag_overrides
            && self.requires_claim_blocks == other.requires_claim_blocks
            && self.pvp_override == other.pvp_override
            && self.date_created == other.date_created
            && self.date_last_active == other.date_last_active
            && self.name == other.name
            && self.greeting == other.greeting
            && self.farewell == other.farewell
            && self.spawn == other.spawn
            && self.parent == other.parent
            && self.subdivisions == other.subdivisions
            && self.accessors == other.accessors
            && self.builders == other.builders
            && self.containers == other.containers
            && self.managers == other.managers
            && self.accessor_groups == other.accessor_groups
            && self.builder_groups == other.builder_groups
            && self.container_groups == other.container_groups
            && self.manager_groups == other.manager_groups
            && self.flags == other.flags
            && self.economy == other.economy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic_claim(corner_a: Vec3, corner_b: Vec3) -> Claim {
        Claim::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Some(Uuid::new_v4()),
            corner_a,
            corner_b,
            ClaimType::Basic,
        )
    }

    #[test]
    fn test_corners_normalized_on_create() {
        let claim = basic_claim(Vec3::new(10, 64, -20), Vec3::new(-5, 3, 40));
        assert_eq!(claim.lesser_corner(), Vec3::new(-5, 3, -20));
        assert_eq!(claim.greater_corner(), Vec3::new(10, 64, 40));
    }

    #[test]
    fn test_corners_normalized_on_mutation() {
        let mut claim = basic_claim(Vec3::new(0, 0, 0), Vec3::new(1, 1, 1));
        claim.set_corners(Vec3::new(9, 9, 9), Vec3::new(2, 2, 2));
        assert_eq!(claim.lesser_corner(), Vec3::new(2, 2, 2));
        assert_eq!(claim.greater_corner(), Vec3::new(9, 9, 9));
    }

    #[test]
    fn test_admin_never_inherits_parent() {
        let mut claim = basic_claim(Vec3::new(0, 0, 0), Vec3::new(8, 8, 8));
        claim.set_claim_type(ClaimType::Admin);
        claim.set_inherit_parent(true);
        assert!(!claim.does_inherit_parent());

        claim.set_claim_type(ClaimType::Basic);
        assert!(claim.does_inherit_parent());
    }

    #[test]
    fn test_size_restrictions_recomputed_on_read() {
        let mut claim = basic_claim(Vec3::new(0, 0, 0), Vec3::new(8, 8, 8));
        claim.set_claim_type(ClaimType::Admin);
        claim.set_size_restrictions(true);
        assert!(claim.size_restrictions);

        // One read both reports false and rewrites the stored flag.
        assert!(!claim.has_size_restrictions());
        assert!(!claim.size_restrictions);
    }

    #[test]
    fn test_setters_mark_dirty() {
        let mut claim = basic_claim(Vec3::new(0, 0, 0), Vec3::new(8, 8, 8));
        claim.mark_clean();
        assert!(!claim.is_dirty());
        claim.set_name(Some("spawn plaza".into()));
        assert!(claim.is_dirty());
    }

    #[test]
    fn test_non_cuboid_ignores_vertical() {
        let mut claim = basic_claim(Vec3::new(0, 60, 0), Vec3::new(16, 70, 16));
        assert!(claim.contains(Vec3::new(8, -40, 8)));
        assert!(claim.contains(Vec3::new(8, 300, 8)));

        claim.set_cuboid(true);
        assert!(!claim.contains(Vec3::new(8, -40, 8)));
        assert!(claim.contains(Vec3::new(8, 65, 8)));
    }

    #[test]
    fn test_trust_rank_satisfaction() {
        let owner = Uuid::new_v4();
        let builder = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let mut claim = Claim::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Some(owner),
            Vec3::new(0, 0, 0),
            Vec3::new(8, 8, 8),
            ClaimType::Basic,
        );
        claim.grant_trust(builder, TrustType::Builder);
        claim.grant_group_trust("citizens", TrustType::Accessor);

        assert!(claim.is_trusted(&owner, &[], TrustType::Manager));
        assert!(claim.is_trusted(&builder, &[], TrustType::Container));
        assert!(!claim.is_trusted(&builder, &[], TrustType::Manager));
        assert!(!claim.is_trusted(&stranger, &[], TrustType::Accessor));
        assert!(claim.is_trusted(&stranger, &["citizens".into()], TrustType::Accessor));
        assert!(!claim.is_trusted(&stranger, &["citizens".into()], TrustType::Builder));
    }

    #[test]
    fn test_revoke_trust() {
        let subject = Uuid::new_v4();
        let mut claim = basic_claim(Vec3::new(0, 0, 0), Vec3::new(8, 8, 8));
        claim.grant_trust(subject, TrustType::Container);
        assert!(claim.is_trusted(&subject, &[], TrustType::Accessor));
        claim.revoke_trust(&subject, TrustType::Container);
        assert!(!claim.is_trusted(&subject, &[], TrustType::Accessor));
    }

    #[test]
    fn test_unset_flag_removes_entry() {
        let mut claim = basic_claim(Vec3::new(0, 0, 0), Vec3::new(8, 8, 8));
        claim.set_flag("block-break", Tristate::Deny);
        assert_eq!(claim.flag("block-break"), Tristate::Deny);
        claim.set_flag("block-break", Tristate::Undefined);
        assert_eq!(claim.flag("block-break"), Tristate::Undefined);
        assert_eq!(claim.flags().count(), 0);
    }
}
