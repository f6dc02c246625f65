//! Error types for the claims engine.

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ClaimError {
    #[error("claim not found: {0}")]
    NotFound(Uuid),

    #[error("malformed location string: {0:?}")]
    MalformedLocation(String),

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("claim {0} has live subdivisions; deletion requires cascade confirmation")]
    SubdivisionsPresent(Uuid),

    #[error("persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("malformed claim record: {0}")]
    MalformedRecord(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
