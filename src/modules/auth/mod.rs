mod enroll;
pub mod gatekeeper;
pub mod tokens;
mod verify;

// Re-export the main types and functions
pub use gatekeeper::{
    EnrollRequest, EnrollResponse, GateKeeper, ResponseError, VerifyRequest, VerifyResponse,
};
pub use tokens::{AuthToken, AuthTokenMinter, VerifiedToken, AUTH_TOKEN_LEN};
pub use verify::UNVERIFIED_SECURE_ID;
