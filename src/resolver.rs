//! Effective-permission resolution.
//!
//! For a (subject, action, claim, qualifiers) tuple the resolver walks a
//! fixed precedence ladder, highest tier first:
//!
//! 1. explicit subject override on the claim
//! 2. explicit group override on the claim (caller-supplied priority order)
//! 3. the claim's own flag, walking to the parent while unset when the
//!    claim inherits (never for Admin claims), then the claim-type default
//! 4. the global per-action default
//! 5. the system-wide fallback (deny destructive, allow otherwise)
//!
//! The first defined value wins; `resolve` therefore always returns a
//! defined tristate.

use tracing::debug;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::ClaimError;
use crate::flags::{self, FlagScope, FlagStore, PermissionEntry};
use crate::store::ClaimStore;
use crate::types::Tristate;

/// Optional qualifiers narrowing a flag lookup to a specific source
/// (material/entity identifier), target, or context string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagQuery {
    pub source: Option<String>,
    pub target: Option<String>,
    pub context: Option<String>,
}

impl FlagQuery {
    pub fn source(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            ..Default::default()
        }
    }
}

pub struct FlagResolver {
    overrides: FlagStore,
    config: EngineConfig,
}

impl FlagResolver {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            overrides: FlagStore::new(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Set (or unset, via `Undefined`) an override for an individual
    /// subject on a claim.
    pub fn set_subject_flag(&self, claim_id: Uuid, subject_id: Uuid, entry: PermissionEntry) {
        self.overrides
            .set(claim_id, FlagScope::Subject(subject_id), entry);
    }

    /// Set (or unset) an override for a named group on a claim.
    pub fn set_group_flag(&self, claim_id: Uuid, group: impl Into<String>, entry: PermissionEntry) {
        self.overrides.set(claim_id, FlagScope::Group(group.into()), entry);
    }

    /// Drop all overrides for a claim. Call with the ids returned from
    /// [`ClaimStore::delete`] so a reused claim id cannot inherit stale
    /// entries.
    pub fn clear_claim(&self, claim_id: Uuid) {
        self.overrides.clear_claim(claim_id);
    }

    /// Effective value for an action within a claim.
    ///
    /// `groups` is the subject's memberships in deterministic priority
    /// order, highest first. The engine never invents membership or
    /// ordering; both come from the identity collaborator.
    pub async fn resolve(
        &self,
        store: &ClaimStore,
        subject_id: Uuid,
        groups: &[String],
        action: &str,
        claim_id: Uuid,
        query: &FlagQuery,
    ) -> Result<Tristate, ClaimError> {
        let source = query.source.as_deref();
        let target = query.target.as_deref();
        let context = query.context.as_deref();

        // Tier 1: individual subject override on this claim.
        let subject_value = self.overrides.value(
            claim_id,
            &FlagScope::Subject(subject_id),
            action,
            source,
            target,
            context,
        );
        if subject_value.is_defined() {
            return Ok(subject_value);
        }

        // Tier 2: group overrides, caller-supplied priority order.
        for group in groups {
            let group_value = self.overrides.value(
                claim_id,
                &FlagScope::Group(group.clone()),
                action,
                source,
                target,
                context,
            );
            if group_value.is_defined() {
                return Ok(group_value);
            }
        }

        // Tier 3: the claim's own flags, walking up while it inherits.
        let origin = store.get(claim_id).await?;
        let mut current = origin.clone();
        loop {
            if action == flags::actions::PVP && current.pvp_override().is_defined() {
                return Ok(current.pvp_override());
            }
            let stored = current.flag(action);
            if stored.is_defined() {
                return Ok(stored);
            }
            match (current.does_inherit_parent(), current.parent()) {
                (true, Some(parent_id)) => current = store.get(parent_id).await?,
                _ => break,
            }
        }
        let type_value = flags::type_default(origin.claim_type(), action);
        if type_value.is_defined() {
            return Ok(type_value);
        }

        // Tier 4: global per-action default.
        if let Some(value) = self.config.global_flag_defaults.get(action) {
            if value.is_defined() {
                return Ok(*value);
            }
        }

        // Tier 5: system-wide fallback.
        let fallback = self.config.fallback.value_for(action);
        debug!(
            claim_id = %claim_id,
            action = %action,
            value = %fallback,
            "flag unset at every tier, using fallback"
        );
        Ok(fallback)
    }

    /// All overrides a group holds on a claim, ordered by the raw
    /// permission-key string. Deterministic across calls; intended for
    /// display by the presentation collaborator.
    pub fn list_flags(&self, group: impl Into<String>, claim_id: Uuid) -> Vec<(String, Tristate)> {
        self.overrides.list(claim_id, &FlagScope::Group(group.into()))
    }

    /// All overrides an individual subject holds on a claim, sorted.
    pub fn list_subject_flags(&self, subject_id: Uuid, claim_id: Uuid) -> Vec<(String, Tristate)> {
        self.overrides
            .list(claim_id, &FlagScope::Subject(subject_id))
    }
}
