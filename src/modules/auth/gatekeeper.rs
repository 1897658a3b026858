use thiserror::Error;
use zeroize::Zeroizing;

use super::tokens::{AuthTokenMinter, VerifiedToken};
use crate::modules::error::GateKeeperError;
use crate::modules::handle::{PasswordHandle, PasswordHandleCodec};
use crate::modules::security::{
    HmacSignatureService, KeyService, OsRandom, RandomSource, SignatureService,
};
use crate::modules::storage::PasswordFileStore;
use crate::modules::utils::{MonotonicClock, SystemClock};
use crate::UserId;

/// Request to enroll a new password for `user_id`.
///
/// Re-enrollment presents the currently stored handle together with the
/// password it was enrolled with, so the secure identity is carried forward.
pub struct EnrollRequest {
    pub user_id: UserId,
    pub password_handle: Option<Vec<u8>>,
    pub enrolled_password: Option<Zeroizing<Vec<u8>>>,
    pub provided_password: Zeroizing<Vec<u8>>,
}

impl EnrollRequest {
    /// First enrollment, a fresh secure identity will be drawn
    pub fn new(user_id: UserId, provided_password: impl Into<Vec<u8>>) -> Self {
        Self {
            user_id,
            password_handle: None,
            enrolled_password: None,
            provided_password: Zeroizing::new(provided_password.into()),
        }
    }

    /// Attach the current handle and its password
    pub fn with_current(
        mut self,
        password_handle: impl Into<Vec<u8>>,
        enrolled_password: impl Into<Vec<u8>>,
    ) -> Self {
        self.password_handle = Some(password_handle.into());
        self.enrolled_password = Some(Zeroizing::new(enrolled_password.into()));
        self
    }
}

/// Request to verify `provided_password` against a presented handle
pub struct VerifyRequest {
    pub user_id: UserId,
    pub password_handle: Vec<u8>,
    pub provided_password: Zeroizing<Vec<u8>>,
}

impl VerifyRequest {
    pub fn new(
        user_id: UserId,
        password_handle: impl Into<Vec<u8>>,
        provided_password: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            user_id,
            password_handle: password_handle.into(),
            provided_password: Zeroizing::new(provided_password.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollResponse {
    pub enrolled_password_handle: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyResponse {
    pub auth_token: Vec<u8>,
    pub identity_verified: bool,
}

/// The only failure callers see; the reason is logged, not returned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResponseError {
    #[error("invalid request")]
    Invalid,
}

impl From<GateKeeperError> for ResponseError {
    fn from(_: GateKeeperError) -> Self {
        ResponseError::Invalid
    }
}

/// Password enrollment and verification authority.
///
/// Stateless apart from its collaborators, so one instance can serve
/// concurrent requests. Requests for the same user rely on the store's atomic
/// read and overwrite.
pub struct GateKeeper {
    pub(super) random: Box<dyn RandomSource>,
    pub(super) keys: Box<dyn KeyService>,
    pub(super) signer: Box<dyn SignatureService>,
    pub(super) store: Box<dyn PasswordFileStore>,
    pub(super) clock: Box<dyn MonotonicClock>,
}

impl GateKeeper {
    /// Gatekeeper with OS randomness, HMAC-SHA256 signing and the system clock
    pub fn new(keys: impl KeyService + 'static, store: impl PasswordFileStore + 'static) -> Self {
        Self {
            random: Box::new(OsRandom),
            keys: Box::new(keys),
            signer: Box::new(HmacSignatureService::default()),
            store: Box::new(store),
            clock: Box::new(SystemClock),
        }
    }

    pub fn with_random(mut self, random: impl RandomSource + 'static) -> Self {
        self.random = Box::new(random);
        self
    }

    pub fn with_signer(mut self, signer: impl SignatureService + 'static) -> Self {
        self.signer = Box::new(signer);
        self
    }

    pub fn with_clock(mut self, clock: impl MonotonicClock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn codec(&self) -> PasswordHandleCodec<'_> {
        PasswordHandleCodec::new(self.keys.as_ref(), self.signer.as_ref())
    }

    pub fn minter(&self) -> AuthTokenMinter<'_> {
        AuthTokenMinter::new(self.keys.as_ref(), self.signer.as_ref())
    }

    /// Enroll a password; all failures collapse to `ResponseError::Invalid`
    pub fn enroll(&self, request: &EnrollRequest) -> Result<EnrollResponse, ResponseError> {
        let handle: PasswordHandle = self.try_enroll(request)?;
        Ok(EnrollResponse {
            enrolled_password_handle: handle.to_bytes(),
        })
    }

    /// Verify a password; all failures collapse to `ResponseError::Invalid`
    pub fn verify(&self, request: &VerifyRequest) -> Result<VerifyResponse, ResponseError> {
        let VerifiedToken {
            token,
            identity_verified,
        } = self.try_verify(request)?;
        Ok(VerifyResponse {
            auth_token: token.to_bytes(),
            identity_verified,
        })
    }
}
