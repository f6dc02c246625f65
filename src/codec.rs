//! Durable representation of claims.
//!
//! Records are JSON objects. Two schemas exist: the current one (emitted by
//! [`encode`]) and the legacy flat schema of an earlier storage format.
//! [`decode`] accepts both, dispatching on the schema's distinguishing key
//! (`type` vs `claim-type`), and only ever emits the current schema. The
//! migration path is decode-legacy, encode-current.
//!
//! Positions persist as delimited coordinate strings. The current schema
//! writes `"x,y,z"`; legacy records used `"x;y;z"` and both are parsed. A
//! malformed position string fails the whole record with
//! [`ClaimError::MalformedLocation`]. Records are never silently defaulted;
//! the caller decides whether to quarantine or drop them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::claim::{Claim, EconomyData};
use crate::error::ClaimError;
use crate::types::{ClaimType, Tristate, Vec3};

/// Parse a delimited coordinate string (`"x,y,z"` or legacy `"x;y;z"`).
pub fn parse_position(s: &str) -> Result<Vec3, ClaimError> {
    let delimiter = if s.contains(';') { ';' } else { ',' };
    let parts: Vec<&str> = s.split(delimiter).collect();
    if parts.len() != 3 {
        return Err(ClaimError::MalformedLocation(s.to_string()));
    }
    let mut axes = [0i32; 3];
    for (i, part) in parts.iter().enumerate() {
        axes[i] = part
            .trim()
            .parse::<i32>()
            .map_err(|_| ClaimError::MalformedLocation(s.to_string()))?;
    }
    Ok(Vec3::new(axes[0], axes[1], axes[2]))
}

fn position_to_string(position: Vec3) -> String {
    position.to_string()
}

/// Current on-disk schema. Field names are carried over from the previous
/// storage format where they already existed.
#[derive(Debug, Serialize, Deserialize)]
struct CurrentRecord {
    uuid: Uuid,
    #[serde(rename = "world-uuid")]
    world_uuid: Uuid,
    #[serde(rename = "owner-uuid", default, skip_serializing_if = "Option::is_none")]
    owner_uuid: Option<Uuid>,
    #[serde(rename = "type")]
    claim_type: ClaimType,
    #[serde(default)]
    cuboid: bool,
    #[serde(default = "default_true")]
    resizable: bool,
    #[serde(rename = "size-restrictions", default = "default_true")]
    size_restrictions: bool,
    #[serde(rename = "inherit-parent", default = "default_true")]
    inherit_parent: bool,
    #[serde(rename = "allow-expiration", default = "default_true")]
    allow_expiration: bool,
    #[serde(default)]
    expired: bool,
    #[serde(rename = "deny-messages", default = "default_true")]
    deny_messages: bool,
    #[serde(rename = "flag-overrides", default = "default_true")]
    flag_overrides: bool,
    #[serde(rename = "requires-claim-blocks", default = "default_true")]
    requires_claim_blocks: bool,
    #[serde(default)]
    pvp: Tristate,
    #[serde(rename = "date-created")]
    date_created: DateTime<Utc>,
    #[serde(rename = "date-last-active")]
    date_last_active: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    greeting: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    farewell: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    spawn: Option<String>,
    #[serde(rename = "lesser-corner")]
    lesser_corner: String,
    #[serde(rename = "greater-corner")]
    greater_corner: String,
    #[serde(rename = "parent-uuid", default, skip_serializing_if = "Option::is_none")]
    parent: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    subdivisions: Vec<Uuid>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    accessors: Vec<Uuid>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    builders: Vec<Uuid>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    containers: Vec<Uuid>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    managers: Vec<Uuid>,
    #[serde(rename = "accessor-groups", default, skip_serializing_if = "Vec::is_empty")]
    accessor_groups: Vec<String>,
    #[serde(rename = "builder-groups", default, skip_serializing_if = "Vec::is_empty")]
    builder_groups: Vec<String>,
    #[serde(rename = "container-groups", default, skip_serializing_if = "Vec::is_empty")]
    container_groups: Vec<String>,
    #[serde(rename = "manager-groups", default, skip_serializing_if = "Vec::is_empty")]
    manager_groups: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    flags: BTreeMap<String, Tristate>,
    #[serde(default)]
    economy: EconomyData,
}

/// Legacy flat schema. Only ever decoded.
#[derive(Debug, Deserialize)]
struct LegacyRecord {
    uuid: Uuid,
    #[serde(rename = "world-uuid")]
    world_uuid: Uuid,
    #[serde(rename = "owner-uuid", default)]
    owner_uuid: Option<Uuid>,
    #[serde(rename = "claim-type")]
    claim_type: ClaimType,
    #[serde(default)]
    cuboid: bool,
    // Historical spelling, preserved verbatim.
    #[serde(rename = "resizeable", default = "default_true")]
    resizable: bool,
    #[serde(rename = "inherit-parent", default = "default_true")]
    inherit_parent: bool,
    #[serde(rename = "claim-expiration", default = "default_true")]
    allow_expiration: bool,
    #[serde(rename = "deny-messages", default = "default_true")]
    deny_messages: bool,
    #[serde(rename = "flag-overrides", default = "default_true")]
    flag_overrides: bool,
    #[serde(default)]
    pvp: Tristate,
    #[serde(rename = "date-created", default)]
    date_created: Option<DateTime<Utc>>,
    #[serde(rename = "date-last-active", default)]
    date_last_active: Option<DateTime<Utc>>,
    #[serde(rename = "claim-name", default)]
    name: Option<String>,
    #[serde(rename = "claim-greeting", default)]
    greeting: Option<String>,
    #[serde(rename = "claim-farewell", default)]
    farewell: Option<String>,
    #[serde(rename = "claim-spawn", default)]
    spawn: Option<String>,
    #[serde(rename = "lesser-boundary-corner")]
    lesser_corner: String,
    #[serde(rename = "greater-boundary-corner")]
    greater_corner: String,
    #[serde(rename = "parent", default)]
    parent: Option<Uuid>,
    #[serde(default)]
    accessors: Vec<Uuid>,
    #[serde(default)]
    builders: Vec<Uuid>,
    #[serde(default)]
    containers: Vec<Uuid>,
    #[serde(default)]
    managers: Vec<Uuid>,
    #[serde(rename = "accessor-groups", default)]
    accessor_groups: Vec<String>,
    #[serde(rename = "builder-groups", default)]
    builder_groups: Vec<String>,
    #[serde(rename = "container-groups", default)]
    container_groups: Vec<String>,
    #[serde(rename = "manager-groups", default)]
    manager_groups: Vec<String>,
}

fn default_true() -> bool {
    true
}

/// Encode a claim into the current durable schema.
pub fn encode(claim: &Claim) -> Result<Value, ClaimError> {
    let record = CurrentRecord {
        uuid: claim.id(),
        world_uuid: claim.world_id(),
        owner_uuid: claim.owner_id(),
        claim_type: claim.claim_type(),
        cuboid: claim.is_cuboid(),
        resizable: claim.is_resizable(),
        size_restrictions: claim.size_restrictions,
        inherit_parent: claim.inherit_parent,
        allow_expiration: claim.allow_expiration(),
        expired: claim.is_expired(),
        deny_messages: claim.allow_deny_messages(),
        flag_overrides: claim.allow_flag_overrides(),
        requires_claim_blocks: claim.requires_claim_blocks(),
        pvp: claim.pvp_override(),
        date_created: claim.date_created(),
        date_last_active: claim.date_last_active(),
        name: claim.name().map(str::to_string),
        greeting: claim.greeting().map(str::to_string),
        farewell: claim.farewell().map(str::to_string),
        spawn: claim.spawn().map(position_to_string),
        lesser_corner: position_to_string(claim.lesser_corner()),
        greater_corner: position_to_string(claim.greater_corner()),
        parent: claim.parent(),
        subdivisions: claim.subdivisions().collect(),
        accessors: claim.accessors.clone(),
        builders: claim.builders.clone(),
        containers: claim.containers.clone(),
        managers: claim.managers.clone(),
        accessor_groups: claim.accessor_groups.clone(),
        builder_groups: claim.builder_groups.clone(),
        container_groups: claim.container_groups.clone(),
        manager_groups: claim.manager_groups.clone(),
        flags: claim.flags.clone(),
        economy: claim.economy,
    };
    Ok(serde_json::to_value(record)?)
}

/// Decode a durable record, accepting the current and the legacy schema.
pub fn decode(value: Value) -> Result<Claim, ClaimError> {
    if value.get("type").is_some() {
        let record: CurrentRecord = serde_json::from_value(value)?;
        claim_from_current(record)
    } else if value.get("claim-type").is_some() {
        let record: LegacyRecord = serde_json::from_value(value)?;
        claim_from_legacy(record)
    } else {
        Err(ClaimError::MalformedRecord(
            "record matches neither current nor legacy schema".into(),
        ))
    }
}

fn claim_from_current(record: CurrentRecord) -> Result<Claim, ClaimError> {
    let lesser = parse_position(&record.lesser_corner)?;
    let greater = parse_position(&record.greater_corner)?;
    let spawn = record.spawn.as_deref().map(parse_position).transpose()?;

    Ok(Claim {
        id: record.uuid,
        world_id: record.world_uuid,
        owner_id: record.owner_uuid,
        claim_type: record.claim_type,
        cuboid: record.cuboid,
        // Normalization swaps instead of failing, even for hand-edited
        // records with inverted corners.
        lesser_corner: lesser.min(greater),
        greater_corner: lesser.max(greater),
        resizable: record.resizable,
        size_restrictions: record.size_restrictions,
        inherit_parent: record.inherit_parent,
        allow_expiration: record.allow_expiration,
        expired: record.expired,
        deny_messages: record.deny_messages,
        flag_overrides: record.flag_overrides,
        requires_claim_blocks: record.requires_claim_blocks,
        pvp_override: record.pvp,
        date_created: record.date_created,
        date_last_active: record.date_last_active,
        name: record.name,
        greeting: record.greeting,
        farewell: record.farewell,
        spawn,
        parent: record.parent,
        subdivisions: record.subdivisions.into_iter().collect(),
        accessors: record.accessors,
        builders: record.builders,
        containers: record.containers,
        managers: record.managers,
        accessor_groups: record.accessor_groups,
        builder_groups: record.builder_groups,
        container_groups: record.container_groups,
        manager_groups: record.manager_groups,
        flags: record.flags,
        economy: record.economy,
        dirty: false,
        generation: 0,
    })
}

fn claim_from_legacy(record: LegacyRecord) -> Result<Claim, ClaimError> {
    let lesser = parse_position(&record.lesser_corner)?;
    let greater = parse_position(&record.greater_corner)?;
    let spawn = record.spawn.as_deref().map(parse_position).transpose()?;
    let now = Utc::now();

    Ok(Claim {
        id: record.uuid,
        world_id: record.world_uuid,
        owner_id: record.owner_uuid,
        claim_type: record.claim_type,
        cuboid: record.cuboid,
        lesser_corner: lesser.min(greater),
        greater_corner: lesser.max(greater),
        resizable: record.resizable,
        size_restrictions: !record.claim_type.exempt_from_size_restrictions(),
        inherit_parent: record.inherit_parent,
        allow_expiration: record.allow_expiration,
        expired: false,
        deny_messages: record.deny_messages,
        flag_overrides: record.flag_overrides,
        requires_claim_blocks: true,
        pvp_override: record.pvp,
        date_created: record.date_created.unwrap_or(now),
        date_last_active: record.date_last_active.unwrap_or(now),
        name: record.name,
        greeting: record.greeting,
        farewell: record.farewell,
        spawn,
        parent: record.parent,
        // Legacy records embedded children in the parent; links are
        // reconciled from the children's parent fields at load time.
        subdivisions: Default::default(),
        accessors: record.accessors,
        builders: record.builders,
        containers: record.containers,
        managers: record.managers,
        accessor_groups: record.accessor_groups,
        builder_groups: record.builder_groups,
        container_groups: record.container_groups,
        manager_groups: record.manager_groups,
        flags: BTreeMap::new(),
        economy: EconomyData::default(),
        dirty: false,
        generation: 0,
    })
}
