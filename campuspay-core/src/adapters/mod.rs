//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - DuckDB and in-memory stores for the SessionStore port
//! - reqwest HTTP client for the payment service
//! - Host files for DeviceInfoProvider
//! - Environment and fixed values for IdentityProvider

pub mod device;
pub mod duckdb_store;
pub mod identity;
pub mod memory_store;
pub mod payment_api;

#[cfg(test)]
pub mod payment_mock;

use std::path::Path;

/// Restrict a file to its owner (0600). No-op on non-Unix platforms.
pub fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if path.exists() {
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}
