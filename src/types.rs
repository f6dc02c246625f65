//! Core vocabulary shared across the engine.
//!
//! These types model the three-valued permission logic, the claim taxonomy,
//! trust ranks, and integer lattice positions used by every other module.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Three-valued permission logic.
///
/// `Undefined` is distinguishable from an explicit `Deny` so that an unset
/// flag can fall through to a lower-precedence tier instead of blocking.
///
/// Legacy records spell the variants `TRUE` / `FALSE` / `UNDEFINED`; those
/// spellings are accepted on decode and never emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tristate {
    #[serde(alias = "TRUE")]
    Allow,
    #[serde(alias = "FALSE")]
    Deny,
    #[default]
    #[serde(alias = "UNDEFINED")]
    Undefined,
}

impl Tristate {
    /// Whether this value carries an explicit decision.
    pub fn is_defined(&self) -> bool {
        !matches!(self, Self::Undefined)
    }

    /// Return `self` when defined, otherwise `other`.
    pub fn or(self, other: Tristate) -> Tristate {
        if self.is_defined() {
            self
        } else {
            other
        }
    }

    pub fn from_bool(value: bool) -> Self {
        if value {
            Self::Allow
        } else {
            Self::Deny
        }
    }

    /// `Some(true)` for allow, `Some(false)` for deny, `None` when unset.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Allow => Some(true),
            Self::Deny => Some(false),
            Self::Undefined => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
            Self::Undefined => "undefined",
        }
    }
}

impl fmt::Display for Tristate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The kind of a claim.
///
/// Legacy records spell these `BASIC` / `ADMIN` / ...; accepted on decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimType {
    /// Player-owned claim.
    #[serde(alias = "BASIC")]
    Basic,
    /// Server-owned claim with no owner and no size restrictions.
    #[serde(alias = "ADMIN")]
    Admin,
    /// Child claim nested inside a parent's bounds.
    #[serde(alias = "SUBDIVISION")]
    Subdivision,
    /// Settlement claim, behaves like Basic for resolution purposes.
    #[serde(alias = "TOWN")]
    Town,
    /// The synthetic claim covering unclaimed land.
    #[serde(alias = "WILDERNESS")]
    Wilderness,
}

impl ClaimType {
    /// Admin and Wilderness claims are never size-restricted.
    pub fn exempt_from_size_restrictions(&self) -> bool {
        matches!(self, Self::Admin | Self::Wilderness)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Admin => "admin",
            Self::Subdivision => "subdivision",
            Self::Town => "town",
            Self::Wilderness => "wilderness",
        }
    }
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trust ranks granted on a claim.
///
/// Higher ranks imply every lower rank: a Manager can do anything a Builder
/// can, a Builder anything a Container can, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum TrustType {
    /// May pass through doors, press buttons, use beds.
    Accessor = 1,
    /// May open inventories (chests, furnaces).
    Container = 2,
    /// May place and break blocks.
    Builder = 3,
    /// May manage the claim itself (settings, trust, subdivisions).
    Manager = 4,
}

impl TrustType {
    /// Rank value, higher = more authority.
    pub fn rank(&self) -> u8 {
        *self as u8
    }

    /// Whether holding this rank satisfies a check for `required`.
    pub fn implies(&self, required: TrustType) -> bool {
        self.rank() >= required.rank()
    }

    /// All ranks, lowest first.
    pub fn all() -> [TrustType; 4] {
        [
            Self::Accessor,
            Self::Container,
            Self::Builder,
            Self::Manager,
        ]
    }
}

/// A position on the integer block lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Vec3 {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Component-wise minimum.
    pub fn min(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x.min(other.x),
            y: self.y.min(other.y),
            z: self.z.min(other.z),
        }
    }

    /// Component-wise maximum.
    pub fn max(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x.max(other.x),
            y: self.y.max(other.y),
            z: self.z.max(other.z),
        }
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tristate_or() {
        assert_eq!(Tristate::Allow.or(Tristate::Deny), Tristate::Allow);
        assert_eq!(Tristate::Undefined.or(Tristate::Deny), Tristate::Deny);
        assert_eq!(
            Tristate::Undefined.or(Tristate::Undefined),
            Tristate::Undefined
        );
    }

    #[test]
    fn test_tristate_legacy_spelling() {
        let v: Tristate = serde_json::from_str("\"UNDEFINED\"").unwrap();
        assert_eq!(v, Tristate::Undefined);
        let v: Tristate = serde_json::from_str("\"TRUE\"").unwrap();
        assert_eq!(v, Tristate::Allow);
        // Current spelling emitted
        assert_eq!(serde_json::to_string(&Tristate::Deny).unwrap(), "\"deny\"");
    }

    #[test]
    fn test_trust_hierarchy() {
        assert!(TrustType::Manager.implies(TrustType::Accessor));
        assert!(TrustType::Builder.implies(TrustType::Container));
        assert!(!TrustType::Accessor.implies(TrustType::Builder));
        assert!(TrustType::Container.implies(TrustType::Container));
    }

    #[test]
    fn test_size_restriction_exemption() {
        assert!(ClaimType::Admin.exempt_from_size_restrictions());
        assert!(ClaimType::Wilderness.exempt_from_size_restrictions());
        assert!(!ClaimType::Basic.exempt_from_size_restrictions());
        assert!(!ClaimType::Town.exempt_from_size_restrictions());
    }

    #[test]
    fn test_vec3_component_ordering() {
        let a = Vec3::new(10, 0, -5);
        let b = Vec3::new(-3, 7, 2);
        assert_eq!(a.min(b), Vec3::new(-3, 0, -5));
        assert_eq!(a.max(b), Vec3::new(10, 7, 2));
    }
}
