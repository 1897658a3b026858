use zeroize::Zeroizing;

use crate::modules::error::{GateKeeperError, Result};
use crate::modules::security::{constant_time_eq, KeyService, SignatureService};
use crate::{Salt, SecureId, HANDLE_VERSION, SIGNATURE_LEN};

/// Bytes covered by the signature, ahead of the password: version + two ids
const METADATA_LEN: usize = 1 + 8 + 8;

/// Serialized length of a password handle
pub const HANDLE_LEN: usize = METADATA_LEN + 8 + SIGNATURE_LEN;

/// Signed record binding a password to a secure identity.
///
/// Layout, little-endian and unpadded:
///
/// | offset | field            | size |
/// |--------|------------------|------|
/// | 0      | version          | 1    |
/// | 1      | secure_id        | 8    |
/// | 9      | authenticator_id | 8    |
/// | 17     | salt             | 8    |
/// | 25     | signature        | 32   |
///
/// The first 17 bytes followed by the password are what gets signed.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHandle {
    pub version: u8,
    pub secure_id: SecureId,
    pub authenticator_id: SecureId,
    pub salt: Salt,
    pub signature: [u8; SIGNATURE_LEN],
}

impl PasswordHandle {
    /// version || secure_id || authenticator_id || password
    pub fn signed_region(&self, password: &[u8]) -> Zeroizing<Vec<u8>> {
        let mut region = Zeroizing::new(Vec::with_capacity(METADATA_LEN + password.len()));
        region.push(self.version);
        region.extend_from_slice(&self.secure_id.to_le_bytes());
        region.extend_from_slice(&self.authenticator_id.to_le_bytes());
        region.extend_from_slice(password);
        region
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HANDLE_LEN);
        bytes.push(self.version);
        bytes.extend_from_slice(&self.secure_id.to_le_bytes());
        bytes.extend_from_slice(&self.authenticator_id.to_le_bytes());
        bytes.extend_from_slice(&self.salt.to_le_bytes());
        bytes.extend_from_slice(&self.signature);
        bytes
    }

    /// Structural parse: exact length, then version. The signature is not checked.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != HANDLE_LEN {
            return Err(GateKeeperError::Malformed(format!(
                "password handle is {} bytes, expected {}",
                bytes.len(),
                HANDLE_LEN
            )));
        }

        let version = bytes[0];
        if version != HANDLE_VERSION {
            return Err(GateKeeperError::Malformed(format!(
                "unsupported password handle version {}",
                version
            )));
        }

        let mut signature = [0u8; SIGNATURE_LEN];
        signature.copy_from_slice(&bytes[25..HANDLE_LEN]);

        Ok(Self {
            version,
            secure_id: read_u64(&bytes[1..9]),
            authenticator_id: read_u64(&bytes[9..17]),
            salt: read_u64(&bytes[17..25]),
            signature,
        })
    }
}

impl std::fmt::Debug for PasswordHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHandle")
            .field("version", &self.version)
            .field("secure_id", &format_args!("{:#018x}", self.secure_id))
            .field("authenticator_id", &format_args!("{:#018x}", self.authenticator_id))
            .field("salt", &format_args!("{:#018x}", self.salt))
            .field("signature", &hex::encode(&self.signature[..4]))
            .finish()
    }
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}

/// Builds, parses and re-checks password handles
pub struct PasswordHandleCodec<'a> {
    keys: &'a dyn KeyService,
    signer: &'a dyn SignatureService,
}

impl<'a> PasswordHandleCodec<'a> {
    pub fn new(keys: &'a dyn KeyService, signer: &'a dyn SignatureService) -> Self {
        Self { keys, signer }
    }

    /// Create a signed handle for `password`
    pub fn encode(
        &self,
        salt: Salt,
        secure_id: SecureId,
        authenticator_id: SecureId,
        password: &[u8],
    ) -> Result<PasswordHandle> {
        let mut handle = PasswordHandle {
            version: HANDLE_VERSION,
            secure_id,
            authenticator_id,
            salt,
            signature: [0u8; SIGNATURE_LEN],
        };

        let key = self
            .keys
            .password_key()
            .filter(|key| !key.is_empty())
            .ok_or(GateKeeperError::SigningUnavailable)?;

        let region = handle.signed_region(password);
        handle.signature = self
            .signer
            .compute_password_signature(key.as_bytes(), &region, salt)?;
        Ok(handle)
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<PasswordHandle> {
        PasswordHandle::from_bytes(bytes)
    }

    /// Re-sign `password` with the handle's own salt and ids and compare
    pub fn verify(&self, expected: &PasswordHandle, password: &[u8]) -> Result<bool> {
        let provided = self.encode(
            expected.salt,
            expected.secure_id,
            expected.authenticator_id,
            password,
        )?;

        Ok(expected.version == provided.version
            && constant_time_eq(&provided.signature, &expected.signature))
    }
}
