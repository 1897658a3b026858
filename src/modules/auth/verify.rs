use log::warn;

use super::gatekeeper::{GateKeeper, VerifyRequest};
use super::tokens::VerifiedToken;
use crate::modules::error::{GateKeeperError, Result};
use crate::modules::utils::logging::log_auth_event;
use crate::SecureId;

/// Identity embedded in tokens when the handle could not be matched to storage
pub const UNVERIFIED_SECURE_ID: SecureId = 0;

impl GateKeeper {
    /// Verify a password against the presented handle and mint a token.
    ///
    /// If the handle cannot be cross-checked against the stored password file
    /// (storage not yet available, missing, or different) the password is
    /// still verified, but the token is scoped to identity 0 and
    /// `identity_verified` is false.
    pub fn try_verify(&self, request: &VerifyRequest) -> Result<VerifiedToken> {
        let result = self.verify_inner(request);
        match &result {
            Ok(verified) => log_auth_event(
                "verify",
                request.user_id,
                true,
                Some(&format!("identity_verified={}", verified.identity_verified)),
            ),
            Err(e) => log_auth_event("verify", request.user_id, false, Some(&e.to_string())),
        }
        result
    }

    fn verify_inner(&self, request: &VerifyRequest) -> Result<VerifiedToken> {
        // Reject an empty password before touching the handle
        if request.provided_password.is_empty() {
            return Err(GateKeeperError::Malformed("missing password".to_string()));
        }

        // Length and version are checked before any field is trusted
        let codec = self.codec();
        let handle = codec.decode(&request.password_handle)?;

        // Cross-check against the password file to decide which ids to release
        let identity_verified = self.matches_password_file(request.user_id, &request.password_handle);
        let (secure_id, authenticator_id) = if identity_verified {
            (handle.secure_id, handle.authenticator_id)
        } else {
            // Keys must not be released without a validated file, but the
            // password may still be checked before storage is available
            warn!(
                "uid {}: handle not validated against password file, token scoped to identity 0",
                request.user_id
            );
            (UNVERIFIED_SECURE_ID, UNVERIFIED_SECURE_ID)
        };

        // Timestamp is taken before the signature check
        let timestamp = self.clock.now_secs();

        // Recompute the signature over the provided password
        if !codec.verify(&handle, &request.provided_password)? {
            return Err(GateKeeperError::InvalidCredential);
        }

        // Password matches, mint the token
        let token = self.minter().mint(timestamp, secure_id, authenticator_id)?;
        Ok(VerifiedToken {
            token,
            identity_verified,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::auth::EnrollRequest;
    use crate::modules::handle::HANDLE_LEN;
    use crate::modules::storage::PasswordFileStore;
    use crate::modules::testing::{
        memory_gatekeeper, test_keys, test_signer, FailingStore, SwitchableKeys,
    };
    use crate::{MemoryPasswordStore, HANDLE_VERSION};
    use std::sync::Arc;

    #[test]
    fn test_correct_password_mints_token() {
        let (gatekeeper, _store, clock) = memory_gatekeeper();
        let handle = gatekeeper.try_enroll(&EnrollRequest::new(3, "pw")).unwrap();
        clock.advance(42);

        let verified = gatekeeper
            .try_verify(&VerifyRequest::new(3, handle.to_bytes(), "pw"))
            .unwrap();

        assert!(verified.identity_verified);
        assert_eq!(verified.token.root_secure_id, handle.secure_id);
        assert_eq!(verified.token.auxiliary_secure_id, handle.authenticator_id);
        assert_eq!(verified.token.timestamp, 42);
        assert!(gatekeeper.minter().check(&verified.token).unwrap());
    }

    #[test]
    fn test_wrong_password_is_rejected() {
        let (gatekeeper, _store, _clock) = memory_gatekeeper();
        let handle = gatekeeper.try_enroll(&EnrollRequest::new(3, "pw")).unwrap();

        for candidate in ["pW", "pw ", "p", "pwpw"] {
            assert!(matches!(
                gatekeeper.try_verify(&VerifyRequest::new(3, handle.to_bytes(), candidate)),
                Err(GateKeeperError::InvalidCredential)
            ));
        }
    }

    #[test]
    fn test_tampered_handle_is_rejected() {
        let (gatekeeper, store, _clock) = memory_gatekeeper();
        let bytes = gatekeeper
            .try_enroll(&EnrollRequest::new(3, "pw"))
            .unwrap()
            .to_bytes();

        // Every bit of version, both ids and the signature; salt excluded
        let signed_fields = (0..17).chain(25..HANDLE_LEN);
        for byte in signed_fields {
            for bit in 0..8 {
                let mut tampered = bytes.clone();
                tampered[byte] ^= 1u8 << bit;
                // Keep the store in step so the failure comes from the signature
                store.insert(3, tampered.clone()).unwrap();

                let result = gatekeeper.try_verify(&VerifyRequest::new(3, tampered, "pw"));
                assert!(result.is_err(), "byte {} bit {} accepted", byte, bit);
            }
        }
    }

    #[test]
    fn test_version_mismatch_is_malformed() {
        let (gatekeeper, _store, _clock) = memory_gatekeeper();
        let mut bytes = gatekeeper
            .try_enroll(&EnrollRequest::new(3, "pw"))
            .unwrap()
            .to_bytes();
        bytes[0] = HANDLE_VERSION.wrapping_add(1);

        assert!(matches!(
            gatekeeper.try_verify(&VerifyRequest::new(3, bytes, "pw")),
            Err(GateKeeperError::Malformed(_))
        ));
    }

    #[test]
    fn test_store_mismatch_scopes_token_to_identity_zero() {
        let (gatekeeper, store, _clock) = memory_gatekeeper();
        let first = gatekeeper.try_enroll(&EnrollRequest::new(3, "pw")).unwrap();
        let _second = gatekeeper
            .try_enroll(&EnrollRequest::new(3, "pw2").with_current(first.to_bytes(), "pw"))
            .unwrap();
        let writes = store.write_count();

        // The superseded handle still carries a valid signature
        let verified = gatekeeper
            .try_verify(&VerifyRequest::new(3, first.to_bytes(), "pw"))
            .unwrap();

        assert!(!verified.identity_verified);
        assert_eq!(verified.token.root_secure_id, UNVERIFIED_SECURE_ID);
        assert_eq!(verified.token.auxiliary_secure_id, UNVERIFIED_SECURE_ID);
        assert!(gatekeeper.minter().check(&verified.token).unwrap());

        // Verification never writes
        assert_eq!(store.write_count(), writes);
    }

    #[test]
    fn test_unavailable_store_still_checks_password() {
        let (seed, _store, _clock) = memory_gatekeeper();
        let handle = seed.try_enroll(&EnrollRequest::new(5, "pw")).unwrap();

        let gatekeeper = GateKeeper::new(test_keys(), FailingStore).with_signer(test_signer());

        let verified = gatekeeper
            .try_verify(&VerifyRequest::new(5, handle.to_bytes(), "pw"))
            .unwrap();
        assert!(!verified.identity_verified);
        assert_eq!(verified.token.root_secure_id, 0);
        assert_eq!(verified.token.auxiliary_secure_id, 0);

        // The fallback never skips the signature check
        assert!(matches!(
            gatekeeper.try_verify(&VerifyRequest::new(5, handle.to_bytes(), "wrong")),
            Err(GateKeeperError::InvalidCredential)
        ));
    }

    #[test]
    fn test_timestamps_do_not_decrease() {
        let (gatekeeper, _store, clock) = memory_gatekeeper();
        let handle = gatekeeper.try_enroll(&EnrollRequest::new(3, "pw")).unwrap();

        let mut last = 0;
        for step in [0, 1, 0, 30, 5] {
            clock.advance(step);
            let token = gatekeeper
                .try_verify(&VerifyRequest::new(3, handle.to_bytes(), "pw"))
                .unwrap()
                .token;
            assert!(token.timestamp >= last);
            last = token.timestamp;
        }
        assert_eq!(last, 36);
    }

    #[test]
    fn test_missing_token_key_fails_after_password_check() {
        let store = Arc::new(MemoryPasswordStore::new());
        let (seed, _seed_store, _clock) = memory_gatekeeper();
        let handle = seed.try_enroll(&EnrollRequest::new(8, "pw")).unwrap();
        store.write_password_file(8, &handle.to_bytes()).unwrap();

        let gatekeeper = GateKeeper::new(SwitchableKeys::new(true, false), store)
            .with_signer(test_signer());

        assert!(matches!(
            gatekeeper.try_verify(&VerifyRequest::new(8, handle.to_bytes(), "pw")),
            Err(GateKeeperError::SigningUnavailable)
        ));
        assert!(matches!(
            gatekeeper.try_verify(&VerifyRequest::new(8, handle.to_bytes(), "wrong")),
            Err(GateKeeperError::InvalidCredential)
        ));
    }

    #[test]
    fn test_empty_password_is_malformed() {
        let (gatekeeper, _store, _clock) = memory_gatekeeper();
        let handle = gatekeeper.try_enroll(&EnrollRequest::new(3, "pw")).unwrap();

        assert!(matches!(
            gatekeeper.try_verify(&VerifyRequest::new(3, handle.to_bytes(), Vec::<u8>::new())),
            Err(GateKeeperError::Malformed(_))
        ));
    }
}
