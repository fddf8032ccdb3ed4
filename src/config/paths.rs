//! Path management for vpn-backup
//!
//! ## Path Resolution Order
//!
//! 1. `VPN_BACKUP_HOME` environment variable (if set)
//! 2. Unix (Linux/macOS): `$XDG_CONFIG_HOME/vpn-backup` or `~/.config/vpn-backup`
//! 3. Windows: `%APPDATA%\vpn-backup`

use std::path::PathBuf;

use crate::error::VpnError;
use crate::storage::file_io::create_private_dir;

/// Environment variable that overrides the base directory
pub const HOME_ENV: &str = "VPN_BACKUP_HOME";

/// Manages all paths used by vpn-backup
#[derive(Debug, Clone)]
pub struct VpnPaths {
    /// Base directory for all vpn-backup data
    base_dir: PathBuf,
}

impl VpnPaths {
    /// Create a new VpnPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, VpnError> {
        let base_dir = match std::env::var(HOME_ENV) {
            Ok(custom) if !custom.is_empty() => PathBuf::from(custom),
            _ => resolve_default_path()?,
        };

        Ok(Self { base_dir })
    }

    /// Create VpnPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.config/vpn-backup/ or equivalent)
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the default live database path
    pub fn database_file(&self) -> PathBuf {
        self.base_dir.join("vpn.db")
    }

    /// Get the default backup directory
    pub fn backup_dir(&self) -> PathBuf {
        self.base_dir.join("backups")
    }

    /// Get the path to the raw 16-byte salt file
    pub fn key_file(&self) -> PathBuf {
        self.base_dir.join("backup.key")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Ensure the base directory exists (owner-only)
    pub fn ensure_directories(&self) -> Result<(), VpnError> {
        create_private_dir(&self.base_dir)
            .map_err(|e| VpnError::Io(format!("Failed to create base directory: {}", e)))
    }
}

/// Resolve the default data directory path based on platform
#[cfg(not(windows))]
fn resolve_default_path() -> Result<PathBuf, VpnError> {
    let config_base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => {
            let home = std::env::var("HOME")
                .map_err(|_| VpnError::Config("Could not determine HOME directory".into()))?;
            PathBuf::from(home).join(".config")
        }
    };
    Ok(config_base.join("vpn-backup"))
}

/// Resolve the default data directory path based on platform
#[cfg(windows)]
fn resolve_default_path() -> Result<PathBuf, VpnError> {
    let appdata = std::env::var("APPDATA")
        .map_err(|_| VpnError::Config("Could not determine APPDATA directory".into()))?;
    Ok(PathBuf::from(appdata).join("vpn-backup"))
}
