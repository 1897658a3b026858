use thiserror::Error;

use crate::modules::storage::StoreError;

/// Failure kinds of the enroll and verify flows.
///
/// These stay distinct inside the crate so each path can be tested on its
/// own. At the request/response boundary they all collapse to
/// [`ResponseError::Invalid`](crate::auth::ResponseError).
#[derive(Debug, Error)]
pub enum GateKeeperError {
    /// Structurally invalid handle or token, or a missing buffer
    #[error("malformed input: {0}")]
    Malformed(String),

    /// Wrong password, or the presented handle does not match the stored one
    #[error("invalid credential")]
    InvalidCredential,

    /// The key service returned no key or the signing primitive rejected it
    #[error("signing key unavailable")]
    SigningUnavailable,

    /// The new handle could not be persisted
    #[error("password file storage failed: {0}")]
    Storage(#[from] StoreError),
}

/// Result type for gatekeeper operations.
pub type Result<T> = std::result::Result<T, GateKeeperError>;
