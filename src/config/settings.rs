//! User settings for vpn-backup
//!
//! Manages where the database and backups live, whether backups are
//! encrypted by default, key-derivation cost and the restore policy.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::paths::VpnPaths;
use crate::backup::RestorePolicy;
use crate::crypto::KdfParams;
use crate::error::{VpnError, VpnResult};
use crate::storage::file_io::{read_json, write_json_atomic};

/// User settings for vpn-backup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Live database path (defaults to `<base>/vpn.db`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,

    /// Backup directory (defaults to `<base>/backups`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_dir: Option<PathBuf>,

    /// Whether `backup create` encrypts when neither flag is given
    #[serde(default)]
    pub encrypt_by_default: bool,

    /// Behaviour when a configured key can't decrypt a backup
    #[serde(default)]
    pub restore_policy: RestorePolicy,

    /// Key derivation parameters
    #[serde(default)]
    pub kdf: KdfParams,
}

fn default_schema_version() -> u32 {
    1
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            database_path: None,
            backup_dir: None,
            encrypt_by_default: false,
            restore_policy: RestorePolicy::default(),
            kdf: KdfParams::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create and save default settings if the
    /// file doesn't exist
    pub fn load_or_create(paths: &VpnPaths) -> VpnResult<Self> {
        if !paths.settings_file().exists() {
            let settings = Settings::default();
            settings.save(paths)?;
            return Ok(settings);
        }

        let settings: Settings = read_json(paths.settings_file())
            .map_err(|e| VpnError::Config(format!("Failed to load settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to disk
    pub fn save(&self, paths: &VpnPaths) -> VpnResult<()> {
        self.validate()?;
        paths.ensure_directories()?;
        write_json_atomic(paths.settings_file(), self)
    }

    /// Reject settings that would break key derivation
    pub fn validate(&self) -> VpnResult<()> {
        if self.kdf.iterations == 0 {
            return Err(VpnError::Config(
                "kdf.iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolved live database path
    pub fn database_path(&self, paths: &VpnPaths) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| paths.database_file())
    }

    /// Resolved backup directory
    pub fn backup_dir(&self, paths: &VpnPaths) -> PathBuf {
        self.backup_dir.clone().unwrap_or_else(|| paths.backup_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::DEFAULT_ITERATIONS;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.kdf.iterations, DEFAULT_ITERATIONS);
        assert_eq!(settings.restore_policy, RestorePolicy::Lenient);
        assert!(!settings.encrypt_by_default);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = VpnPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.restore_policy = RestorePolicy::Strict;
        settings.encrypt_by_default = true;
        settings.kdf = KdfParams::with_iterations(20_000);
        settings.backup_dir = Some(temp_dir.path().join("elsewhere"));

        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_first_run_writes_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let paths = VpnPaths::with_base_dir(temp_dir.path().join("fresh"));

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded, Settings::default());
        assert!(paths.settings_file().exists());

        let reloaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(reloaded, loaded);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let paths = VpnPaths::with_base_dir(temp_dir.path().to_path_buf());
        std::fs::write(paths.settings_file(), r#"{"restore_policy": "strict"}"#).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.restore_policy, RestorePolicy::Strict);
        assert_eq!(loaded.kdf.iterations, DEFAULT_ITERATIONS);
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let paths = VpnPaths::with_base_dir(temp_dir.path().to_path_buf());
        std::fs::write(paths.settings_file(), r#"{"kdf": {"iterations": 0}}"#).unwrap();

        let err = Settings::load_or_create(&paths).unwrap_err();
        assert!(matches!(err, VpnError::Config(_)));
    }

    #[test]
    fn test_resolved_paths() {
        let temp_dir = TempDir::new().unwrap();
        let paths = VpnPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        assert_eq!(settings.database_path(&paths), paths.database_file());
        assert_eq!(settings.backup_dir(&paths), paths.backup_dir());

        settings.database_path = Some(PathBuf::from("/srv/vpn/vpn.db"));
        assert_eq!(settings.database_path(&paths), PathBuf::from("/srv/vpn/vpn.db"));
    }
}
