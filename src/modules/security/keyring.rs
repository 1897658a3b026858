use keyring::Entry;
use log::{info, warn};
use std::io;

use super::keys::{KeyService, SecretKey};
use super::random::RandomSource;

const PASSWORD_KEY_ENTRY: &str = "password-key";
const AUTH_TOKEN_KEY_ENTRY: &str = "auth-token-key";

fn keyring_error(e: keyring::Error) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e.to_string())
}

/// Decode a hex-encoded key as stored in the keyring
fn decode_key(encoded: &str) -> io::Result<SecretKey> {
    hex::decode(encoded.trim())
        .map(SecretKey::from_bytes)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
}

/// Classify a keyring read before key generation.
///
/// Only a missing entry means the key was never stored. Any other failure
/// (locked keyring, no storage access, platform error) is returned, since
/// replacing an existing key would invalidate every enrolled handle.
fn entry_missing(read: Result<String, keyring::Error>) -> io::Result<bool> {
    match read {
        Ok(encoded) => {
            drop(zeroize::Zeroizing::new(encoded));
            Ok(false)
        }
        Err(keyring::Error::NoEntry) => Ok(true),
        Err(e) => Err(keyring_error(e)),
    }
}

/// Key service backed by the system keyring.
///
/// Both signing keys live under one service name as hex strings.
pub struct KeyringKeyService {
    password_entry: Entry,
    auth_token_entry: Entry,
}

impl KeyringKeyService {
    pub fn new(service: &str) -> io::Result<Self> {
        Ok(Self {
            password_entry: Entry::new(service, PASSWORD_KEY_ENTRY).map_err(keyring_error)?,
            auth_token_entry: Entry::new(service, AUTH_TOKEN_KEY_ENTRY).map_err(keyring_error)?,
        })
    }

    /// Generate and store any key that does not exist yet
    pub fn initialize_if_needed(&self, random: &dyn RandomSource) -> io::Result<()> {
        for (name, entry) in [
            (PASSWORD_KEY_ENTRY, &self.password_entry),
            (AUTH_TOKEN_KEY_ENTRY, &self.auth_token_entry),
        ] {
            // Generate only when nothing is stored under this name yet
            if entry_missing(entry.get_password())? {
                let key = SecretKey::generate(random);
                let encoded = zeroize::Zeroizing::new(hex::encode(key.as_bytes()));
                entry.set_password(&encoded).map_err(keyring_error)?;
                info!("Generated new {} in system keyring", name);
            }
        }
        Ok(())
    }

    fn load(entry: &Entry, name: &str) -> Option<SecretKey> {
        let encoded = match entry.get_password() {
            Ok(encoded) => zeroize::Zeroizing::new(encoded),
            Err(e) => {
                warn!("Unable to read {} from keyring: {}", name, e);
                return None;
            }
        };

        match decode_key(&encoded) {
            Ok(key) => Some(key),
            Err(e) => {
                warn!("Stored {} is not valid hex: {}", name, e);
                None
            }
        }
    }
}

impl KeyService for KeyringKeyService {
    fn password_key(&self) -> Option<SecretKey> {
        Self::load(&self.password_entry, PASSWORD_KEY_ENTRY)
    }

    fn auth_token_key(&self) -> Option<SecretKey> {
        Self::load(&self.auth_token_entry, AUTH_TOKEN_KEY_ENTRY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_key() {
        let key = decode_key("00ff10\n").unwrap();
        assert_eq!(key.as_bytes(), &[0x00, 0xff, 0x10]);

        let err = decode_key("not-hex").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_only_missing_entry_triggers_generation() {
        assert!(entry_missing(Err(keyring::Error::NoEntry)).unwrap());
        assert!(!entry_missing(Ok("00ff".to_string())).unwrap());

        // Transient failures must never lead to a replaced key
        let locked = entry_missing(Err(keyring::Error::NoStorageAccess("keyring locked".into())));
        assert!(locked.is_err());

        let platform = entry_missing(Err(keyring::Error::PlatformFailure("dbus error".into())));
        assert!(platform.unwrap_err().to_string().contains("dbus error"));
    }

    #[test]
    fn test_empty_entry_decodes_to_empty_key() {
        // An empty key is treated as unavailable by the codec
        let key = decode_key("").unwrap();
        assert!(key.is_empty());
    }
}
