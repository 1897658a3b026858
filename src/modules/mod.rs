// Declare all modules
pub mod auth;
pub mod config;
pub mod error;
pub mod handle;
pub mod security;
pub mod storage;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

// No re-exports here as they're handled in lib.rs
