//! Small helpers used across the service:
//! - String truncation for logging upstream bodies
//! - Wall-clock seconds for artifact naming
//! - File system validation for the output directory

use chrono::Utc;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Truncate a string for logging purposes.
///
/// Long strings are cut at the last char boundary at or below `max` bytes,
/// with an ellipsis and the number of dropped bytes appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Current Unix time in whole seconds.
pub fn unix_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then writes and removes a probe
/// file.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or is not writable
/// (permission denied, read-only filesystem, etc.).
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error + Send + Sync>> {
    fs::create_dir_all(path).await?;
    let probe_path = path.join("..__probe_write__");
    fs::write(&probe_path, b"").await?;
    let _ = fs::remove_file(&probe_path).await;
    info!("Output directory is writable");
    Ok(())
}
