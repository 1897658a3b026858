pub mod keyring;
pub mod keys;
pub mod random;
pub mod signing;

pub use self::keyring::KeyringKeyService;
pub use keys::{KeyService, SecretKey, StaticKeyService};
pub use random::{OsRandom, RandomSource};
pub use signing::{constant_time_eq, HmacSignatureService, SignatureService};
