use crate::modules::error::{GateKeeperError, Result};
use crate::modules::security::{constant_time_eq, KeyService, SignatureService};
use crate::{SecureId, SIGNATURE_LEN};

/// Bytes covered by the hmac: both ids and the timestamp
const TOKEN_SIGNED_LEN: usize = 8 + 8 + 4;

/// Serialized length of an auth token
pub const AUTH_TOKEN_LEN: usize = TOKEN_SIGNED_LEN + SIGNATURE_LEN;

/// Short-lived signed assertion that a password was verified.
///
/// Serialized as root id, auxiliary id, timestamp, hmac; little-endian.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub root_secure_id: SecureId,
    pub auxiliary_secure_id: SecureId,
    /// Monotonic seconds at mint time
    pub timestamp: u32,
    pub hmac: [u8; SIGNATURE_LEN],
}

impl AuthToken {
    /// Every field ahead of the hmac, in declaration order
    pub fn signed_bytes(&self) -> [u8; TOKEN_SIGNED_LEN] {
        let mut bytes = [0u8; TOKEN_SIGNED_LEN];
        bytes[0..8].copy_from_slice(&self.root_secure_id.to_le_bytes());
        bytes[8..16].copy_from_slice(&self.auxiliary_secure_id.to_le_bytes());
        bytes[16..20].copy_from_slice(&self.timestamp.to_le_bytes());
        bytes
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(AUTH_TOKEN_LEN);
        bytes.extend_from_slice(&self.signed_bytes());
        bytes.extend_from_slice(&self.hmac);
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != AUTH_TOKEN_LEN {
            return Err(GateKeeperError::Malformed(format!(
                "auth token is {} bytes, expected {}",
                bytes.len(),
                AUTH_TOKEN_LEN
            )));
        }

        let mut root = [0u8; 8];
        let mut auxiliary = [0u8; 8];
        let mut timestamp = [0u8; 4];
        let mut hmac = [0u8; SIGNATURE_LEN];
        root.copy_from_slice(&bytes[0..8]);
        auxiliary.copy_from_slice(&bytes[8..16]);
        timestamp.copy_from_slice(&bytes[16..20]);
        hmac.copy_from_slice(&bytes[TOKEN_SIGNED_LEN..]);

        Ok(Self {
            root_secure_id: u64::from_le_bytes(root),
            auxiliary_secure_id: u64::from_le_bytes(auxiliary),
            timestamp: u32::from_le_bytes(timestamp),
            hmac,
        })
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthToken")
            .field("root_secure_id", &format_args!("{:#018x}", self.root_secure_id))
            .field("auxiliary_secure_id", &format_args!("{:#018x}", self.auxiliary_secure_id))
            .field("timestamp", &self.timestamp)
            .field("hmac", &hex::encode(&self.hmac[..4]))
            .finish()
    }
}

/// Result of a successful verification.
///
/// `identity_verified` is false when the presented handle could not be
/// matched against the stored password file. The password itself was still
/// checked, but the token carries identity 0 in both id fields and must not be
/// used to release per-identity keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub token: AuthToken,
    pub identity_verified: bool,
}

/// Builds and signs auth tokens with the auth-token key
pub struct AuthTokenMinter<'a> {
    keys: &'a dyn KeyService,
    signer: &'a dyn SignatureService,
}

impl<'a> AuthTokenMinter<'a> {
    pub fn new(keys: &'a dyn KeyService, signer: &'a dyn SignatureService) -> Self {
        Self { keys, signer }
    }

    pub fn mint(
        &self,
        timestamp: u32,
        secure_id: SecureId,
        authenticator_id: SecureId,
    ) -> Result<AuthToken> {
        let mut token = AuthToken {
            root_secure_id: secure_id,
            auxiliary_secure_id: authenticator_id,
            timestamp,
            hmac: [0u8; SIGNATURE_LEN],
        };
        token.hmac = self.compute_hmac(&token)?;
        Ok(token)
    }

    /// Recompute the hmac of `token` and compare in constant time
    pub fn check(&self, token: &AuthToken) -> Result<bool> {
        let expected = self.compute_hmac(token)?;
        Ok(constant_time_eq(&expected, &token.hmac))
    }

    fn compute_hmac(&self, token: &AuthToken) -> Result<[u8; SIGNATURE_LEN]> {
        let key = self
            .keys
            .auth_token_key()
            .filter(|key| !key.is_empty())
            .ok_or(GateKeeperError::SigningUnavailable)?;

        self.signer
            .compute_signature(key.as_bytes(), &token.signed_bytes())
    }
}
