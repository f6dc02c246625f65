//! Spatial claims & permission engine.
//!
//! Principals claim axis-aligned regions of a shared voxel world; the
//! engine answers "may subject S perform action A at point P" with a
//! tri-state value. It is a pure, embeddable library: persistence,
//! identity/groups, scheduling and presentation are injected collaborators,
//! and the engine exposes only typed return values.
//!
//! # Key Components
//!
//! - [`ClaimStore`]: arena of claims keyed by UUID, with per-claim mutation
//!   locking, subdivision hierarchy, persistence and point lookup
//! - [`FlagResolver`]: effective-permission resolution across subject,
//!   group, claim and global tiers
//! - [`codec`]: durable records, current and legacy schema
//! - [`ClaimStorage`] / [`GroupProvider`]: collaborator interfaces
//!
//! # Example
//!
//! ```ignore
//! use demesne::{ClaimStore, ClaimType, EngineConfig, FlagQuery, FlagResolver, Vec3};
//!
//! let store = ClaimStore::new();
//! let resolver = FlagResolver::new(EngineConfig::default());
//!
//! let claim = store
//!     .create(Some(owner), world, Vec3::new(0, 0, 0), Vec3::new(64, 255, 64), ClaimType::Basic)
//!     .await?;
//! let value = resolver
//!     .resolve(&store, actor, &groups, "block-break", claim.id(), &FlagQuery::default())
//!     .await?;
//! ```

pub mod claim;
pub mod codec;
pub mod config;
pub mod error;
pub mod flags;
pub mod groups;
mod index;
pub mod persistence;
pub mod resolver;
pub mod store;
pub mod types;

// Re-export main types
pub use claim::{Claim, EconomyData};
pub use config::{EngineConfig, FallbackPolicy};
pub use error::ClaimError;
pub use flags::{FlagScope, FlagStore, PermissionEntry};
pub use groups::{GroupProvider, StaticGroupProvider};
pub use persistence::{ClaimStorage, MemoryStorage};
pub use resolver::{FlagQuery, FlagResolver};
pub use store::{Cascade, ClaimStore, LoadReport, SaveSweep, StoreStats};
pub use types::{ClaimType, Tristate, TrustType, Vec3};
