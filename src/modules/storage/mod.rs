mod password_file;

pub use password_file::{FilePasswordStore, MemoryPasswordStore, PasswordFileStore, StoreError};
