use hmac::Mac;
use pbkdf2::pbkdf2;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::modules::error::{GateKeeperError, Result};
use crate::{HmacSha256, Salt, DEFAULT_PBKDF2_ROUNDS, SIGNATURE_LEN};

/// Deterministic keyed signature primitive.
///
/// Identical inputs must give identical output, since both flows verify by
/// recomputing and comparing.
pub trait SignatureService: Send + Sync {
    /// Sign a password handle region with a key diversified by `salt`
    fn compute_password_signature(
        &self,
        key: &[u8],
        message: &[u8],
        salt: Salt,
    ) -> Result<[u8; SIGNATURE_LEN]>;

    /// Sign an arbitrary message with `key`
    fn compute_signature(&self, key: &[u8], message: &[u8]) -> Result<[u8; SIGNATURE_LEN]>;
}

/// HMAC-SHA256 signature service.
///
/// Password signatures first stretch the key with PBKDF2 over the salt, then
/// HMAC the message with the derived key.
#[derive(Debug, Clone)]
pub struct HmacSignatureService {
    rounds: u32,
}

impl HmacSignatureService {
    pub fn new(rounds: u32) -> Self {
        Self {
            rounds: rounds.max(1),
        }
    }

    fn derive_password_key(&self, key: &[u8], salt: Salt) -> Zeroizing<[u8; SIGNATURE_LEN]> {
        let mut derived = Zeroizing::new([0u8; SIGNATURE_LEN]);
        pbkdf2::<HmacSha256>(key, &salt.to_le_bytes(), self.rounds, &mut derived[..]);
        derived
    }
}

impl Default for HmacSignatureService {
    fn default() -> Self {
        Self::new(DEFAULT_PBKDF2_ROUNDS)
    }
}

impl SignatureService for HmacSignatureService {
    fn compute_password_signature(
        &self,
        key: &[u8],
        message: &[u8],
        salt: Salt,
    ) -> Result<[u8; SIGNATURE_LEN]> {
        let derived = self.derive_password_key(key, salt);
        self.compute_signature(&derived[..], message)
    }

    fn compute_signature(&self, key: &[u8], message: &[u8]) -> Result<[u8; SIGNATURE_LEN]> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(key)
            .map_err(|_| GateKeeperError::SigningUnavailable)?;
        mac.update(message);

        let mut signature = [0u8; SIGNATURE_LEN];
        signature.copy_from_slice(&mac.finalize().into_bytes());
        Ok(signature)
    }
}

/// Constant-time byte comparison; unequal lengths compare unequal
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}
