//! Backup manager for vpn-backup
//!
//! Packages the live database into timestamped single-entry archives and
//! enumerates or deletes them. The backup directory is the only source of
//! truth: nothing is cached between calls.

use std::fs;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Local, Timelike};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::paths::VpnPaths;
use crate::config::settings::Settings;
use crate::crypto::CipherContext;
use crate::error::{VpnError, VpnResult};
use crate::storage::file_io::create_private_dir;

use super::archive::{self, backup_filename, backup_id, parse_backup_timestamp};
use super::restore::RestorePolicy;

/// Metadata about a backup archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupRecord {
    /// Creation time as 14 digits (`YYYYMMDDHHMMSS`)
    pub id: String,
    /// Archive filename
    pub name: String,
    /// Creation time, second resolution
    pub timestamp: DateTime<Local>,
    /// Archive size in bytes
    pub size: u64,
    /// Lowercase hex SHA-256 of the whole archive file
    pub checksum: String,
    /// Whether the entry was encrypted (only known at creation time)
    pub encrypted: bool,
}

/// Creates, lists and deletes backups of one database file
pub struct BackupManager {
    /// Live database file
    pub(super) database_path: PathBuf,
    /// Directory holding the archives
    pub(super) backup_dir: PathBuf,
    /// Key material, if encryption is configured
    pub(super) cipher: Option<CipherContext>,
    /// What to do when a configured key can't decrypt an entry
    pub(super) restore_policy: RestorePolicy,
}

impl BackupManager {
    /// Create a new BackupManager
    ///
    /// Without a cipher, `create_backup(true)` silently writes plaintext.
    pub fn new(
        database_path: impl Into<PathBuf>,
        backup_dir: impl Into<PathBuf>,
        cipher: Option<CipherContext>,
    ) -> Self {
        Self {
            database_path: database_path.into(),
            backup_dir: backup_dir.into(),
            cipher,
            restore_policy: RestorePolicy::default(),
        }
    }

    /// Create a BackupManager from resolved paths and user settings
    pub fn from_settings(paths: &VpnPaths, settings: &Settings, cipher: Option<CipherContext>) -> Self {
        Self::new(
            settings.database_path(paths),
            settings.backup_dir(paths),
            cipher,
        )
        .with_restore_policy(settings.restore_policy)
    }

    /// Set the policy used by [`BackupManager::restore_backup`]
    pub fn with_restore_policy(mut self, policy: RestorePolicy) -> Self {
        self.restore_policy = policy;
        self
    }

    /// Get the live database path
    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    /// Get backup directory path
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Get the configured cipher, if any
    pub fn cipher(&self) -> Option<&CipherContext> {
        self.cipher.as_ref()
    }

    /// Get the configured restore policy
    pub fn restore_policy(&self) -> RestorePolicy {
        self.restore_policy
    }

    /// Create a backup of the database
    ///
    /// The entry is encrypted only if `encrypt` is set and a cipher is
    /// configured; the returned record says which happened.
    pub fn create_backup(&self, encrypt: bool) -> VpnResult<BackupRecord> {
        create_private_dir(&self.backup_dir)
            .map_err(|e| VpnError::Io(format!("Failed to create backup directory: {}", e)))?;

        let now = Local::now();
        let timestamp = now.with_nanosecond(0).unwrap_or(now);
        let filename = backup_filename(&timestamp);
        let backup_path = self.backup_dir.join(&filename);

        let database = fs::read(&self.database_path)
            .map_err(|e| VpnError::Io(format!("Failed to read database file: {}", e)))?;

        let (payload, encrypted) = match (&self.cipher, encrypt) {
            (Some(cipher), true) => (cipher.encrypt(&database)?, true),
            (None, true) => {
                debug!("encryption requested without a key, writing plaintext backup");
                (database, false)
            }
            (_, false) => (database, false),
        };

        if let Err(e) = archive::write_archive(&backup_path, &payload) {
            let _ = fs::remove_file(&backup_path);
            return Err(e);
        }

        let size = archive::file_size(&backup_path)
            .map_err(|e| VpnError::Io(format!("Failed to get backup file info: {}", e)))?;
        let checksum = archive::file_checksum(&backup_path)
            .map_err(|e| VpnError::Io(format!("Failed to calculate checksum: {}", e)))?;

        info!(name = %filename, size, encrypted, "backup created");

        Ok(BackupRecord {
            id: backup_id(&timestamp),
            name: filename,
            timestamp,
            size,
            checksum,
            encrypted,
        })
    }

    /// List all available backups, newest first
    ///
    /// A missing backup directory yields an empty list. Files whose name
    /// doesn't parse or whose contents can't be hashed are skipped.
    pub fn list_backups(&self) -> VpnResult<Vec<BackupRecord>> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.backup_dir)
            .map_err(|e| VpnError::Io(format!("Failed to read backup directory: {}", e)))?;

        let mut backups = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!(error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };

            let filename = entry.file_name();
            let Some(name) = filename.to_str() else {
                continue;
            };
            if !name.ends_with(archive::FILE_EXTENSION) {
                continue;
            }

            if let Some(record) = scan_record(&entry.path(), name) {
                backups.push(record);
            }
        }

        backups.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| b.name.cmp(&a.name))
        });

        Ok(backups)
    }

    /// Delete a backup by filename
    pub fn delete_backup(&self, name: &str) -> VpnResult<()> {
        let path = self.archive_path(name)?;

        if !path.is_file() {
            return Err(VpnError::backup_not_found(name));
        }

        fs::remove_file(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                VpnError::backup_not_found(name)
            } else {
                VpnError::Io(format!("Failed to delete backup: {}", e))
            }
        })?;

        info!(name, "backup deleted");
        Ok(())
    }

    /// Get a specific backup by filename
    pub fn get_backup(&self, name: &str) -> VpnResult<Option<BackupRecord>> {
        let path = self.archive_path(name)?;
        if path.is_file() {
            Ok(scan_record(&path, name))
        } else {
            Ok(None)
        }
    }

    /// Get the most recent backup
    pub fn latest_backup(&self) -> VpnResult<Option<BackupRecord>> {
        let backups = self.list_backups()?;
        Ok(backups.into_iter().next())
    }

    /// Resolve a backup filename inside the backup directory
    ///
    /// Rejects anything that isn't a single plain path component.
    pub(super) fn archive_path(&self, name: &str) -> VpnResult<PathBuf> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.backup_dir.join(name)),
            _ => Err(VpnError::Validation(format!("Invalid backup name: {:?}", name))),
        }
    }
}

/// Build a listing record for one archive, or `None` if it should be skipped
fn scan_record(path: &Path, name: &str) -> Option<BackupRecord> {
    let Some(timestamp) = parse_backup_timestamp(name) else {
        debug!(name, "skipping file with unparsable backup name");
        return None;
    };

    let metadata = match fs::metadata(path) {
        Ok(metadata) if metadata.is_file() => metadata,
        Ok(_) => return None,
        Err(e) => {
            debug!(name, error = %e, "skipping unreadable backup");
            return None;
        }
    };

    let checksum = match archive::file_checksum(path) {
        Ok(checksum) => checksum,
        Err(e) => {
            debug!(name, error = %e, "skipping backup with checksum error");
            return None;
        }
    };

    Some(BackupRecord {
        id: backup_id(&timestamp),
        name: name.to_string(),
        timestamp,
        size: metadata.len(),
        checksum,
        // Not knowable without opening the archive
        encrypted: false,
    })
}
