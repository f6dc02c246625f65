//! Flag vocabulary and the override store.
//!
//! A flag is a named permission toggle controlling an action within a claim.
//! This module owns the action name vocabulary, the per-claim-type default
//! tables, and [`FlagStore`], the concurrent store of explicit subject and
//! group overrides consulted by the resolver's two highest tiers.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::types::{ClaimType, Tristate, TrustType};

/// Well-known action names. Flags are open-ended strings; these are the
/// actions the default tables know about.
pub mod actions {
    pub const BLOCK_BREAK: &str = "block-break";
    pub const BLOCK_PLACE: &str = "block-place";
    pub const ENTER_CLAIM: &str = "enter-claim";
    pub const EXIT_CLAIM: &str = "exit-claim";
    pub const ENTITY_DAMAGE: &str = "entity-damage";
    pub const ENTITY_RIDING: &str = "entity-riding";
    pub const ENTITY_SPAWN: &str = "entity-spawn";
    pub const EXPLOSION: &str = "explosion";
    pub const FIRE_SPREAD: &str = "fire-spread";
    pub const INTERACT_BLOCK_PRIMARY: &str = "interact-block-primary";
    pub const INTERACT_BLOCK_SECONDARY: &str = "interact-block-secondary";
    pub const INTERACT_ENTITY_PRIMARY: &str = "interact-entity-primary";
    pub const INTERACT_ENTITY_SECONDARY: &str = "interact-entity-secondary";
    pub const INTERACT_INVENTORY: &str = "interact-inventory";
    pub const ITEM_DROP: &str = "item-drop";
    pub const ITEM_PICKUP: &str = "item-pickup";
    pub const ITEM_USE: &str = "item-use";
    pub const LIQUID_FLOW: &str = "liquid-flow";
    pub const PORTAL_USE: &str = "portal-use";
    pub const PVP: &str = "pvp";
}

/// Actions that modify the world; these fall back to deny when unset at
/// every resolution tier. Seeds [`crate::config::FallbackPolicy`].
pub const DESTRUCTIVE_ACTIONS: &[&str] = &[
    actions::BLOCK_BREAK,
    actions::BLOCK_PLACE,
    actions::ENTITY_DAMAGE,
    actions::EXPLOSION,
    actions::FIRE_SPREAD,
    actions::LIQUID_FLOW,
    actions::PVP,
];

/// Default flag values a claim of the given type starts with.
///
/// Subdivisions start empty so unset actions fall through to the parent via
/// inheritance rather than being pinned at creation time.
pub fn type_defaults(claim_type: ClaimType) -> BTreeMap<String, Tristate> {
    let entries: &[(&str, Tristate)] = match claim_type {
        ClaimType::Basic | ClaimType::Town => &[
            (actions::BLOCK_BREAK, Tristate::Deny),
            (actions::BLOCK_PLACE, Tristate::Deny),
            (actions::ENTITY_DAMAGE, Tristate::Deny),
            (actions::EXPLOSION, Tristate::Deny),
            (actions::FIRE_SPREAD, Tristate::Deny),
            (actions::INTERACT_BLOCK_SECONDARY, Tristate::Deny),
            (actions::INTERACT_INVENTORY, Tristate::Deny),
            (actions::LIQUID_FLOW, Tristate::Deny),
            (actions::ENTER_CLAIM, Tristate::Allow),
            (actions::EXIT_CLAIM, Tristate::Allow),
        ],
        ClaimType::Admin => &[
            (actions::BLOCK_BREAK, Tristate::Deny),
            (actions::BLOCK_PLACE, Tristate::Deny),
            (actions::ENTITY_DAMAGE, Tristate::Deny),
            (actions::EXPLOSION, Tristate::Deny),
            (actions::FIRE_SPREAD, Tristate::Deny),
            (actions::INTERACT_BLOCK_PRIMARY, Tristate::Deny),
            (actions::INTERACT_BLOCK_SECONDARY, Tristate::Deny),
            (actions::INTERACT_INVENTORY, Tristate::Deny),
            (actions::LIQUID_FLOW, Tristate::Deny),
            (actions::PVP, Tristate::Deny),
        ],
        ClaimType::Subdivision => &[],
        ClaimType::Wilderness => &[
            (actions::BLOCK_BREAK, Tristate::Allow),
            (actions::BLOCK_PLACE, Tristate::Allow),
            (actions::ENTITY_DAMAGE, Tristate::Allow),
            (actions::EXPLOSION, Tristate::Allow),
            (actions::FIRE_SPREAD, Tristate::Allow),
            (actions::INTERACT_BLOCK_PRIMARY, Tristate::Allow),
            (actions::INTERACT_BLOCK_SECONDARY, Tristate::Allow),
            (actions::INTERACT_INVENTORY, Tristate::Allow),
            (actions::ITEM_DROP, Tristate::Allow),
            (actions::ITEM_PICKUP, Tristate::Allow),
            (actions::LIQUID_FLOW, Tristate::Allow),
        ],
    };
    entries
        .iter()
        .map(|(action, value)| (action.to_string(), *value))
        .collect()
}

/// Static claim-type default for a single action.
pub fn type_default(claim_type: ClaimType, action: &str) -> Tristate {
    let entries = type_defaults(claim_type);
    entries.get(action).copied().unwrap_or_default()
}

/// Trust rank a subject needs before the flag check is even relevant for
/// actions gated on membership rather than flags. Callers combine this with
/// [`crate::claim::Claim::is_trusted`].
pub fn required_trust(action: &str) -> Option<TrustType> {
    match action {
        actions::BLOCK_BREAK | actions::BLOCK_PLACE => Some(TrustType::Builder),
        actions::INTERACT_INVENTORY => Some(TrustType::Container),
        actions::INTERACT_BLOCK_PRIMARY
        | actions::INTERACT_BLOCK_SECONDARY
        | actions::ITEM_USE
        | actions::PORTAL_USE => Some(TrustType::Accessor),
        _ => None,
    }
}

/// Who an override entry applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagScope {
    /// An individual principal.
    Subject(Uuid),
    /// A named group; membership is supplied by the identity collaborator.
    Group(String),
}

/// An explicit flag override: action plus optional qualifiers mapping to a
/// tri-state value. Source and target narrow the entry to a specific
/// material/entity identifier; context is a free-form qualifier string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionEntry {
    pub action: String,
    pub value: Tristate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl PermissionEntry {
    pub fn new(action: impl Into<String>, value: Tristate) -> Self {
        Self {
            action: action.into(),
            value,
            source: None,
            target: None,
            context: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    fn key(&self) -> String {
        permission_key(
            &self.action,
            self.source.as_deref(),
            self.target.as_deref(),
            self.context.as_deref(),
        )
    }
}

/// Compose the raw permission-key string for an action and its qualifiers.
/// Listing order and lookup determinism both hang off this composition.
pub fn permission_key(
    action: &str,
    source: Option<&str>,
    target: Option<&str>,
    context: Option<&str>,
) -> String {
    let mut key = format!("flag.{action}");
    if let Some(source) = source {
        key.push_str(".source.");
        key.push_str(source);
    }
    if let Some(target) = target {
        key.push_str(".target.");
        key.push_str(target);
    }
    if let Some(context) = context {
        key.push_str(".ctx.");
        key.push_str(context);
    }
    key
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct OverrideKey {
    claim_id: Uuid,
    scope: FlagScope,
}

/// Concurrent store of explicit flag overrides, keyed by (claim, scope).
///
/// Entries within a scope are kept in a sorted map keyed by the raw
/// permission-key string, so listings are deterministic across calls.
#[derive(Debug, Default)]
pub struct FlagStore {
    entries: DashMap<OverrideKey, BTreeMap<String, Tristate>>,
}

/// Qualifier-presence masks tried most-specific first during lookup.
const SPECIFICITY_LADDER: &[(bool, bool, bool)] = &[
    (true, true, true),
    (true, true, false),
    (true, false, true),
    (false, true, true),
    (true, false, false),
    (false, true, false),
    (false, false, true),
    (false, false, false),
];

impl FlagStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Set (or, for `Undefined`, unset) an override on a claim.
    pub fn set(&self, claim_id: Uuid, scope: FlagScope, entry: PermissionEntry) {
        let key = OverrideKey { claim_id, scope };
        let mut map = self.entries.entry(key).or_default();
        if entry.value.is_defined() {
            map.insert(entry.key(), entry.value);
        } else {
            map.remove(&entry.key());
        }
    }

    /// Look up the override value for an action, consulting qualified
    /// entries from most- to least-specific before the bare action key.
    pub fn value(
        &self,
        claim_id: Uuid,
        scope: &FlagScope,
        action: &str,
        source: Option<&str>,
        target: Option<&str>,
        context: Option<&str>,
    ) -> Tristate {
        let key = OverrideKey {
            claim_id,
            scope: scope.clone(),
        };
        let Some(map) = self.entries.get(&key) else {
            return Tristate::Undefined;
        };
        for (use_source, use_target, use_context) in SPECIFICITY_LADDER {
            if (*use_source && source.is_none())
                || (*use_target && target.is_none())
                || (*use_context && context.is_none())
            {
                continue;
            }
            let candidate = permission_key(
                action,
                source.filter(|_| *use_source),
                target.filter(|_| *use_target),
                context.filter(|_| *use_context),
            );
            if let Some(value) = map.get(&candidate) {
                return *value;
            }
        }
        Tristate::Undefined
    }

    /// All overrides for a scope on a claim, ordered by the raw
    /// permission-key string. Deterministic across calls.
    pub fn list(&self, claim_id: Uuid, scope: &FlagScope) -> Vec<(String, Tristate)> {
        let key = OverrideKey {
            claim_id,
            scope: scope.clone(),
        };
        self.entries
            .get(&key)
            .map(|map| map.iter().map(|(k, v)| (k.clone(), *v)).collect())
            .unwrap_or_default()
    }

    /// Drop every override attached to a claim. Called when the claim is
    /// deleted so stale entries cannot leak onto a reused id.
    pub fn clear_claim(&self, claim_id: Uuid) {
        self.entries.retain(|key, _| key.claim_id != claim_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_key_composition() {
        assert_eq!(permission_key("block-break", None, None, None), "flag.block-break");
        assert_eq!(
            permission_key("block-break", Some("minecraft:creeper"), None, None),
            "flag.block-break.source.minecraft:creeper"
        );
        assert_eq!(
            permission_key("entity-damage", Some("a"), Some("b"), Some("c")),
            "flag.entity-damage.source.a.target.b.ctx.c"
        );
    }

    #[test]
    fn test_specific_entry_beats_bare() {
        let store = FlagStore::new();
        let claim_id = Uuid::new_v4();
        let scope = FlagScope::Group("citizens".into());

        store.set(
            claim_id,
            scope.clone(),
            PermissionEntry::new("block-break", Tristate::Deny),
        );
        store.set(
            claim_id,
            scope.clone(),
            PermissionEntry::new("block-break", Tristate::Allow).with_source("minecraft:sand"),
        );

        assert_eq!(
            store.value(claim_id, &scope, "block-break", Some("minecraft:sand"), None, None),
            Tristate::Allow
        );
        assert_eq!(
            store.value(claim_id, &scope, "block-break", Some("minecraft:stone"), None, None),
            Tristate::Deny
        );
        assert_eq!(
            store.value(claim_id, &scope, "block-break", None, None, None),
            Tristate::Deny
        );
    }

    #[test]
    fn test_unset_removes_entry() {
        let store = FlagStore::new();
        let claim_id = Uuid::new_v4();
        let scope = FlagScope::Subject(Uuid::new_v4());

        store.set(
            claim_id,
            scope.clone(),
            PermissionEntry::new("pvp", Tristate::Deny),
        );
        assert_eq!(
            store.value(claim_id, &scope, "pvp", None, None, None),
            Tristate::Deny
        );

        store.set(
            claim_id,
            scope.clone(),
            PermissionEntry::new("pvp", Tristate::Undefined),
        );
        assert_eq!(
            store.value(claim_id, &scope, "pvp", None, None, None),
            Tristate::Undefined
        );
    }

    #[test]
    fn test_listing_sorted_by_raw_key() {
        let store = FlagStore::new();
        let claim_id = Uuid::new_v4();
        let scope = FlagScope::Group("citizens".into());

        for action in ["pvp", "block-break", "item-drop", "explosion"] {
            store.set(
                claim_id,
                scope.clone(),
                PermissionEntry::new(action, Tristate::Deny),
            );
        }

        let listed = store.list(claim_id, &scope);
        let keys: Vec<&str> = listed.iter().map(|(k, _)| k.as_str()).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);

        // Deterministic across calls
        assert_eq!(listed, store.list(claim_id, &scope));
    }

    #[test]
    fn test_clear_claim_drops_all_scopes() {
        let store = FlagStore::new();
        let claim_id = Uuid::new_v4();
        let subject = FlagScope::Subject(Uuid::new_v4());
        let group = FlagScope::Group("citizens".into());

        store.set(claim_id, subject.clone(), PermissionEntry::new("pvp", Tristate::Allow));
        store.set(claim_id, group.clone(), PermissionEntry::new("pvp", Tristate::Deny));
        store.clear_claim(claim_id);

        assert!(store.list(claim_id, &subject).is_empty());
        assert!(store.list(claim_id, &group).is_empty());
    }

    #[test]
    fn test_subdivision_defaults_empty() {
        assert!(type_defaults(ClaimType::Subdivision).is_empty());
        assert!(!type_defaults(ClaimType::Basic).is_empty());
    }
}
