//! Deterministic collaborators shared by the unit tests.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use crate::modules::auth::GateKeeper;
use crate::modules::security::{
    HmacSignatureService, KeyService, RandomSource, SecretKey, StaticKeyService,
};
use crate::modules::storage::{MemoryPasswordStore, PasswordFileStore, StoreError};
use crate::modules::utils::MonotonicClock;
use crate::UserId;

pub fn test_keys() -> StaticKeyService {
    StaticKeyService::new(
        SecretKey::from_bytes(vec![0x11; 32]),
        SecretKey::from_bytes(vec![0x22; 32]),
    )
}

/// Single PBKDF2 round keeps the tests fast
pub fn test_signer() -> HmacSignatureService {
    HmacSignatureService::new(1)
}

/// Random source handing out an increasing counter
#[derive(Default)]
pub struct SequenceRandom {
    next: AtomicU64,
}

impl SequenceRandom {
    pub fn starting_at(value: u64) -> Self {
        Self {
            next: AtomicU64::new(value),
        }
    }
}

impl RandomSource for SequenceRandom {
    fn fill(&self, buffer: &mut [u8]) {
        for chunk in buffer.chunks_mut(8) {
            let value = self.next.fetch_add(1, Ordering::SeqCst).to_le_bytes();
            chunk.copy_from_slice(&value[..chunk.len()]);
        }
    }
}

/// Clock moved by hand
#[derive(Default)]
pub struct ManualClock {
    now: AtomicU32,
}

impl ManualClock {
    pub fn advance(&self, secs: u32) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl MonotonicClock for ManualClock {
    fn now_secs(&self) -> u32 {
        self.now.load(Ordering::SeqCst)
    }
}

impl MonotonicClock for Arc<ManualClock> {
    fn now_secs(&self) -> u32 {
        (**self).now_secs()
    }
}

/// Store whose every call fails
pub struct FailingStore;

impl PasswordFileStore for FailingStore {
    fn read_password_file(&self, _uid: UserId) -> Result<Option<Vec<u8>>, StoreError> {
        Err(StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "storage not mounted",
        )))
    }

    fn write_password_file(&self, _uid: UserId, _handle: &[u8]) -> Result<(), StoreError> {
        Err(StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "storage not mounted",
        )))
    }
}

/// Key service that can be switched off mid-test
pub struct SwitchableKeys {
    inner: StaticKeyService,
    password_available: bool,
    auth_token_available: bool,
}

impl SwitchableKeys {
    pub fn new(password_available: bool, auth_token_available: bool) -> Self {
        Self {
            inner: test_keys(),
            password_available,
            auth_token_available,
        }
    }
}

impl KeyService for SwitchableKeys {
    fn password_key(&self) -> Option<SecretKey> {
        self.inner.password_key().filter(|_| self.password_available)
    }

    fn auth_token_key(&self) -> Option<SecretKey> {
        self.inner.auth_token_key().filter(|_| self.auth_token_available)
    }
}

/// Gatekeeper over an in-memory store, with handles to the store and clock
pub fn memory_gatekeeper() -> (GateKeeper, Arc<MemoryPasswordStore>, Arc<ManualClock>) {
    let store = Arc::new(MemoryPasswordStore::new());
    let clock = Arc::new(ManualClock::default());
    let gatekeeper = GateKeeper::new(test_keys(), store.clone())
        .with_random(SequenceRandom::starting_at(1000))
        .with_signer(test_signer())
        .with_clock(clock.clone());
    (gatekeeper, store, clock)
}
