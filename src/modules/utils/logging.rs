use env_logger::{Builder, Env, Target, WriteStyle};
use log::{error, info, warn};
use std::fs::OpenOptions;
use std::path::Path;

use crate::{SecureId, UserId};

/// Initialize the logging system.
///
/// `level` is the default filter; `RUST_LOG` still takes precedence. When a
/// log file is given, records are appended to it instead of stderr.
pub fn initialize_logging(level: &str, log_file: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let mut builder = Builder::from_env(Env::default().default_filter_or(level));
    builder
        // Enable timestamps
        .format_timestamp_secs()
        // Enable module path in logs
        .format_module_path(true)
        .write_style(WriteStyle::Auto);

    if let Some(path) = log_file {
        // Create or append to log file
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        builder.target(Target::Pipe(Box::new(file)));
    }

    builder.try_init()?;
    info!("Logging system initialized");
    Ok(())
}

/// Mask a secure id for logging, keeping only its first and last byte
pub fn format_secure_id(id: SecureId) -> String {
    let encoded = hex::encode(id.to_be_bytes());
    format!("{}***{}", &encoded[0..2], &encoded[encoded.len() - 2..])
}

/// Structured logging for enroll and verify events
pub fn log_auth_event(event_type: &str, uid: UserId, success: bool, details: Option<&str>) {
    let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    if success {
        info!(
            "Auth event: type={}, uid={}, success=true, timestamp={}, details={:?}",
            event_type, uid, timestamp, details
        );
    } else {
        warn!(
            "Auth event: type={}, uid={}, success=false, timestamp={}, details={:?}",
            event_type, uid, timestamp, details
        );
    }
}

/// Structured logging for password file operations
pub fn log_store_operation(operation: &str, uid: UserId, success: bool, details: Option<&str>) {
    let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    if success {
        info!(
            "Store operation: op={}, uid={}, success=true, timestamp={}, details={:?}",
            operation, uid, timestamp, details
        );
    } else {
        error!(
            "Store operation: op={}, uid={}, success=false, timestamp={}, details={:?}",
            operation, uid, timestamp, details
        );
    }
}
