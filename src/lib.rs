// First, declare the modules folder itself
mod modules;

// Re-export everything from modules for easier access
pub use modules::{auth, config, error, handle, security, storage, utils};

// Re-export commonly used types
pub use modules::auth::{
    AuthToken, AuthTokenMinter, EnrollRequest, EnrollResponse, GateKeeper, ResponseError,
    VerifiedToken, VerifyRequest, VerifyResponse,
};
pub use modules::config::GateKeeperConfig;
pub use modules::error::{GateKeeperError, Result};
pub use modules::handle::{PasswordHandle, PasswordHandleCodec};
pub use modules::storage::{FilePasswordStore, MemoryPasswordStore, PasswordFileStore, StoreError};

// Constants
pub const HANDLE_VERSION: u8 = 0;
pub const SIGNATURE_LEN: usize = 32;
pub const DEFAULT_PBKDF2_ROUNDS: u32 = 10_000;
pub const KEY_LEN: usize = 32;

// Type aliases
pub type HmacSha256 = hmac::Hmac<sha2::Sha256>;

/// Opaque 64-bit identifier naming a user's credential lineage.
pub type SecureId = u64;

/// Per-enrollment key diversification value.
pub type Salt = u64;

/// Identifier of the platform user a password file belongs to.
pub type UserId = u32;
