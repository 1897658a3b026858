pub mod codec;

pub use codec::{PasswordHandle, PasswordHandleCodec, HANDLE_LEN};
