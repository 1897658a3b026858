use zeroize::{Zeroize, ZeroizeOnDrop};

use super::random::RandomSource;
use crate::KEY_LEN;

/// Owned key material that is wiped when dropped
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey {
    bytes: Vec<u8>,
}

impl SecretKey {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Draw a fresh key of `KEY_LEN` bytes from the random source
    pub fn generate(random: &dyn RandomSource) -> Self {
        let mut bytes = vec![0u8; KEY_LEN];
        random.fill(&mut bytes);
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretKey")
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Source of the two signing keys used by the flows.
///
/// `None` (or an empty key) means the key is currently unreachable; callers
/// turn that into `GateKeeperError::SigningUnavailable`.
pub trait KeyService: Send + Sync {
    /// Key used to sign password handles
    fn password_key(&self) -> Option<SecretKey>;

    /// Key used to sign auth tokens
    fn auth_token_key(&self) -> Option<SecretKey>;
}

/// Key service holding both keys in memory
pub struct StaticKeyService {
    password_key: Option<SecretKey>,
    auth_token_key: Option<SecretKey>,
}

impl StaticKeyService {
    pub fn new(password_key: SecretKey, auth_token_key: SecretKey) -> Self {
        Self {
            password_key: Some(password_key),
            auth_token_key: Some(auth_token_key),
        }
    }

    /// Generate both keys from the random source
    pub fn generate(random: &dyn RandomSource) -> Self {
        Self::new(SecretKey::generate(random), SecretKey::generate(random))
    }

    /// A key service with no keys at all
    pub fn unavailable() -> Self {
        Self {
            password_key: None,
            auth_token_key: None,
        }
    }

    pub fn without_auth_token_key(mut self) -> Self {
        self.auth_token_key = None;
        self
    }
}

impl KeyService for StaticKeyService {
    fn password_key(&self) -> Option<SecretKey> {
        self.password_key.clone()
    }

    fn auth_token_key(&self) -> Option<SecretKey> {
        self.auth_token_key.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::OsRandom;

    #[test]
    fn test_generated_keys_are_distinct() {
        let keys = StaticKeyService::generate(&OsRandom);
        let password_key = keys.password_key().unwrap();
        let token_key = keys.auth_token_key().unwrap();

        assert_eq!(password_key.len(), KEY_LEN);
        assert_eq!(token_key.len(), KEY_LEN);
        assert_ne!(password_key.as_bytes(), token_key.as_bytes());
    }

    #[test]
    fn test_unavailable_keys() {
        let keys = StaticKeyService::unavailable();
        assert!(keys.password_key().is_none());
        assert!(keys.auth_token_key().is_none());

        let partial = StaticKeyService::generate(&OsRandom).without_auth_token_key();
        assert!(partial.password_key().is_some());
        assert!(partial.auth_token_key().is_none());
    }

    #[test]
    fn test_debug_hides_key_bytes() {
        let key = SecretKey::from_bytes(vec![0xAB; 4]);
        let rendered = format!("{:?}", key);
        assert!(rendered.contains("len: 4"));
        assert!(!rendered.to_lowercase().contains("ab"));
    }
}
