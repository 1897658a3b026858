use log::{debug, warn};

use super::gatekeeper::{EnrollRequest, GateKeeper};
use crate::modules::error::{GateKeeperError, Result};
use crate::modules::handle::PasswordHandle;
use crate::modules::security::constant_time_eq;
use crate::modules::utils::logging::{format_secure_id, log_auth_event};
use crate::{SecureId, UserId};

impl GateKeeper {
    /// Enroll a new password, keeping the distinct failure reason.
    ///
    /// With no current handle a new secure identity is drawn. With one, it
    /// must match the stored password file and the enrolled password must
    /// verify against it; the secure identity is then carried forward. Salt and
    /// authenticator id are always fresh. The store is written last, so no
    /// failure leaves a partial update behind.
    pub fn try_enroll(&self, request: &EnrollRequest) -> Result<PasswordHandle> {
        let result = self.enroll_inner(request);
        match &result {
            Ok(handle) => log_auth_event(
                "enroll",
                request.user_id,
                true,
                Some(&format!("secure_id={}", format_secure_id(handle.secure_id))),
            ),
            Err(e) => log_auth_event("enroll", request.user_id, false, Some(&e.to_string())),
        }
        result
    }

    fn enroll_inner(&self, request: &EnrollRequest) -> Result<PasswordHandle> {
        // A new password is always required
        if request.provided_password.is_empty() {
            return Err(GateKeeperError::Malformed("missing new password".to_string()));
        }

        let secure_id = match &request.password_handle {
            None => {
                // No current handle, start a new identity lineage
                debug!("uid {}: no current handle, drawing new secure id", request.user_id);
                self.random.next_u64()
            }
            Some(current) => {
                let enrolled_password = request.enrolled_password.as_ref().ok_or_else(|| {
                    GateKeeperError::Malformed("missing current password".to_string())
                })?;

                // The presented handle must be the one on record for this user
                if !self.matches_password_file(request.user_id, current) {
                    return Err(GateKeeperError::InvalidCredential);
                }

                // Decode and check the current password against it
                let codec = self.codec();
                let current = codec.decode(current)?;
                if !codec.verify(&current, enrolled_password)? {
                    // Incorrect current password
                    return Err(GateKeeperError::InvalidCredential);
                }
                // Same user lineage, keep the secure identity
                current.secure_id
            }
        };

        // Fresh salt and authenticator id on every enrollment
        let salt = self.random.next_u64();
        let authenticator_id: SecureId = self.random.next_u64();

        // Sign the new handle; fails without touching the store if no key
        let handle = self
            .codec()
            .encode(salt, secure_id, authenticator_id, &request.provided_password)?;

        // Persist last, so earlier failures leave the old file in place
        self.store
            .write_password_file(request.user_id, &handle.to_bytes())?;
        Ok(handle)
    }

    /// Byte-for-byte comparison of a presented handle with the stored file.
    ///
    /// Read failures and a missing file count as a mismatch.
    pub(super) fn matches_password_file(&self, uid: UserId, presented: &[u8]) -> bool {
        match self.store.read_password_file(uid) {
            Ok(Some(stored)) => constant_time_eq(&stored, presented),
            Ok(None) => {
                debug!("uid {}: no stored password file", uid);
                false
            }
            Err(e) => {
                warn!("uid {}: unable to read password file: {}", uid, e);
                false
            }
        }
    }
}
