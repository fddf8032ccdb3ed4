//! Backup restoration for vpn-backup
//!
//! Handles restoring the live database from a backup archive and
//! inspecting archives without touching the database.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::VpnResult;
use crate::storage::file_io::replace_file;

use super::archive::{self, parse_backup_timestamp};
use super::manager::BackupManager;

/// What a restore does when a configured key fails to decrypt the entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RestorePolicy {
    /// Assume the entry was stored unencrypted and restore the raw bytes.
    ///
    /// This cannot tell a plaintext backup apart from a wrong password or
    /// corrupted ciphertext.
    #[default]
    Lenient,
    /// Abort the restore with the decryption error
    Strict,
}

impl std::fmt::Display for RestorePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lenient => write!(f, "lenient"),
            Self::Strict => write!(f, "strict"),
        }
    }
}

/// How the restored bytes were obtained from the archive entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RestoreOutcome {
    /// No key configured or empty entry; bytes copied as stored
    Plaintext,
    /// Entry decrypted with the configured key
    Decrypted,
    /// Decryption failed and the raw entry was restored instead
    RawFallback,
}

/// Result of a restore operation
#[derive(Debug, Clone, Serialize)]
pub struct RestoreResult {
    /// Archive the database was restored from
    pub name: String,
    /// Size of the restored database
    pub bytes_written: u64,
    /// How the entry was interpreted
    pub outcome: RestoreOutcome,
    /// Whether the rename failed and the database was copied into place
    pub copied: bool,
}

impl RestoreResult {
    /// Get a summary of what was restored
    pub fn summary(&self) -> String {
        let how = match self.outcome {
            RestoreOutcome::Plaintext => "stored unencrypted",
            RestoreOutcome::Decrypted => "decrypted",
            RestoreOutcome::RawFallback => {
                "decryption failed, restored raw entry (wrong password or unencrypted backup)"
            }
        };
        format!(
            "Restored {} bytes from {} ({})",
            self.bytes_written, self.name, how
        )
    }
}

/// Result of inspecting a backup archive
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveInfo {
    /// Archive filename
    pub name: String,
    /// Creation time from the filename, if it follows the naming scheme
    pub timestamp: Option<DateTime<Local>>,
    /// Archive size in bytes
    pub size: u64,
    /// Lowercase hex SHA-256 of the archive file
    pub checksum: String,
    /// Size of the `vpn.db` entry payload
    pub entry_size: u64,
    /// Whether the entry decrypts under the configured key
    ///
    /// `None` when no key is configured. Because the padding check is weak,
    /// `Some(true)` is a strong hint rather than proof.
    pub decrypts: Option<bool>,
}

impl BackupManager {
    /// Restore the database from a backup using the configured policy
    pub fn restore_backup(&self, name: &str) -> VpnResult<RestoreResult> {
        self.restore_backup_with_policy(name, self.restore_policy)
    }

    /// Restore the database from a backup with an explicit policy
    ///
    /// The restored bytes are written beside the live database and renamed
    /// over it, falling back to a copy when the rename fails.
    pub fn restore_backup_with_policy(
        &self,
        name: &str,
        policy: RestorePolicy,
    ) -> VpnResult<RestoreResult> {
        let path = self.archive_path(name)?;
        let entry = archive::read_entry(&path, name)?;

        let (contents, outcome) = self.unseal(name, entry, policy)?;
        let copied = replace_file(&self.database_path, &contents)?;

        info!(name, bytes = contents.len(), ?outcome, "backup restored");

        Ok(RestoreResult {
            name: name.to_string(),
            bytes_written: contents.len() as u64,
            outcome,
            copied,
        })
    }

    /// Inspect a backup without restoring it
    pub fn inspect_backup(&self, name: &str) -> VpnResult<ArchiveInfo> {
        let path = self.archive_path(name)?;
        let entry = archive::read_entry(&path, name)?;

        let size = archive::file_size(&path)?;
        let checksum = archive::file_checksum(&path)?;
        let decrypts = self
            .cipher
            .as_ref()
            .map(|cipher| !entry.is_empty() && cipher.decrypt(&entry).is_ok());

        Ok(ArchiveInfo {
            name: name.to_string(),
            timestamp: parse_backup_timestamp(name),
            size,
            checksum,
            entry_size: entry.len() as u64,
            decrypts,
        })
    }

    fn unseal(
        &self,
        name: &str,
        entry: Vec<u8>,
        policy: RestorePolicy,
    ) -> VpnResult<(Vec<u8>, RestoreOutcome)> {
        let cipher = match &self.cipher {
            Some(cipher) if !entry.is_empty() => cipher,
            _ => return Ok((entry, RestoreOutcome::Plaintext)),
        };

        match cipher.decrypt(&entry) {
            Ok(plaintext) => Ok((plaintext, RestoreOutcome::Decrypted)),
            Err(e) if policy == RestorePolicy::Lenient => {
                warn!(name, error = %e, "decryption failed, restoring entry as stored");
                Ok((entry, RestoreOutcome::RawFallback))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{CipherContext, KdfParams, SALT_LEN};
    use crate::error::VpnError;
    use std::fs;
    use tempfile::TempDir;

    const ORIGINAL: &[u8] = b"Original database content";

    fn cipher(password: &str) -> CipherContext {
        CipherContext::derive_with_salt_and_params(
            password,
            &[3u8; SALT_LEN],
            &KdfParams::with_iterations(64),
        )
    }

    fn create_test_env(cipher: Option<CipherContext>) -> (BackupManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("vpn.db");
        fs::write(&db_path, ORIGINAL).unwrap();

        let manager = BackupManager::new(db_path, temp_dir.path().join("backups"), cipher);
        (manager, temp_dir)
    }

    #[test]
    fn test_restore_plain_backup() {
        let (manager, _temp) = create_test_env(None);
        let record = manager.create_backup(false).unwrap();

        fs::write(manager.database_path(), b"modified").unwrap();
        let result = manager.restore_backup(&record.name).unwrap();

        assert_eq!(fs::read(manager.database_path()).unwrap(), ORIGINAL);
        assert_eq!(result.outcome, RestoreOutcome::Plaintext);
        assert_eq!(result.bytes_written, ORIGINAL.len() as u64);
        assert!(!result.copied);
    }

    #[test]
    fn test_restore_encrypted_backup() {
        let (manager, _temp) = create_test_env(Some(cipher("pw")));
        let record = manager.create_backup(true).unwrap();

        fs::write(manager.database_path(), b"modified").unwrap();
        let result = manager.restore_backup(&record.name).unwrap();

        assert_eq!(fs::read(manager.database_path()).unwrap(), ORIGINAL);
        assert_eq!(result.outcome, RestoreOutcome::Decrypted);
    }

    #[test]
    fn test_restore_leaves_no_temp_file() {
        let (manager, temp) = create_test_env(None);
        let record = manager.create_backup(false).unwrap();

        manager.restore_backup(&record.name).unwrap();
        assert!(!temp.path().join("vpn.db.restore").exists());
    }

    #[test]
    fn test_restore_fails_when_database_cannot_be_replaced() {
        let (manager, temp) = create_test_env(None);
        let record = manager.create_backup(false).unwrap();

        // Neither rename nor copy can put a file over a non-empty directory.
        fs::remove_file(manager.database_path()).unwrap();
        fs::create_dir(manager.database_path()).unwrap();
        fs::write(manager.database_path().join("inner"), b"keep").unwrap();

        let err = manager.restore_backup(&record.name).unwrap_err();

        assert!(matches!(err, VpnError::Io(_)));
        assert!(!temp.path().join("vpn.db.restore").exists());
        assert_eq!(
            fs::read(manager.database_path().join("inner")).unwrap(),
            b"keep"
        );
    }

    #[test]
    fn test_lenient_falls_back_on_plain_backup() {
        let (manager, _temp) = create_test_env(Some(cipher("pw")));
        // 25 bytes: never a valid ciphertext, so decryption always fails
        let record = manager.create_backup(false).unwrap();

        let result = manager.restore_backup(&record.name).unwrap();

        assert_eq!(result.outcome, RestoreOutcome::RawFallback);
        assert_eq!(fs::read(manager.database_path()).unwrap(), ORIGINAL);
    }

    #[test]
    fn test_strict_rejects_plain_backup() {
        let (manager, _temp) = create_test_env(Some(cipher("pw")));
        let record = manager.create_backup(false).unwrap();

        fs::write(manager.database_path(), b"untouched").unwrap();
        let err = manager
            .restore_backup_with_policy(&record.name, RestorePolicy::Strict)
            .unwrap_err();

        assert!(err.is_crypto());
        assert_eq!(fs::read(manager.database_path()).unwrap(), b"untouched");
    }

    #[test]
    fn test_configured_policy_is_used() {
        let (manager, _temp) = create_test_env(Some(cipher("pw")));
        let manager = manager.with_restore_policy(RestorePolicy::Strict);
        let record = manager.create_backup(false).unwrap();

        assert!(manager.restore_backup(&record.name).is_err());
    }

    #[test]
    fn test_wrong_password_never_restores_original() {
        let (writer, temp) = create_test_env(Some(cipher("right")));
        let record = writer.create_backup(true).unwrap();

        let reader = BackupManager::new(
            writer.database_path(),
            writer.backup_dir(),
            Some(cipher("wrong")),
        );
        fs::write(reader.database_path(), b"modified").unwrap();

        // Lenient: either garbage that happened to pass the padding check,
        // or the raw ciphertext. Never the original.
        let result = reader.restore_backup(&record.name).unwrap();
        assert_ne!(result.outcome, RestoreOutcome::Plaintext);
        assert_ne!(fs::read(temp.path().join("vpn.db")).unwrap(), ORIGINAL);
    }

    #[test]
    fn test_restore_missing_backup() {
        let (manager, _temp) = create_test_env(None);
        let err = manager
            .restore_backup("vpn_backup_20000101_000000.zip")
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_restore_corrupt_archive() {
        let (manager, _temp) = create_test_env(None);
        fs::create_dir_all(manager.backup_dir()).unwrap();
        let name = "vpn_backup_20000101_000000.zip";
        fs::write(manager.backup_dir().join(name), b"garbage").unwrap();

        let err = manager.restore_backup(name).unwrap_err();
        assert!(matches!(err, VpnError::Format(_)));
        assert_eq!(fs::read(manager.database_path()).unwrap(), ORIGINAL);
    }

    #[test]
    fn test_restore_empty_entry_skips_decryption() {
        let (manager, _temp) = create_test_env(Some(cipher("pw")));
        fs::write(manager.database_path(), b"").unwrap();
        let record = manager.create_backup(false).unwrap();

        fs::write(manager.database_path(), b"something").unwrap();
        let result = manager
            .restore_backup_with_policy(&record.name, RestorePolicy::Strict)
            .unwrap();

        assert_eq!(result.outcome, RestoreOutcome::Plaintext);
        assert!(fs::read(manager.database_path()).unwrap().is_empty());
    }

    #[test]
    fn test_inspect_backup() {
        let (manager, _temp) = create_test_env(Some(cipher("pw")));
        let encrypted = manager.create_backup(true).unwrap();

        let info = manager.inspect_backup(&encrypted.name).unwrap();
        assert_eq!(info.checksum, encrypted.checksum);
        assert_eq!(info.size, encrypted.size);
        assert_eq!(info.timestamp, Some(encrypted.timestamp));
        assert_eq!(info.decrypts, Some(true));
        assert_eq!(info.entry_size % 16, 0);
    }

    #[test]
    fn test_inspect_without_cipher() {
        let (manager, _temp) = create_test_env(None);
        let record = manager.create_backup(false).unwrap();

        let info = manager.inspect_backup(&record.name).unwrap();
        assert_eq!(info.decrypts, None);
        assert_eq!(info.entry_size, ORIGINAL.len() as u64);
    }

    #[test]
    fn test_restore_result_summary() {
        let result = RestoreResult {
            name: "vpn_backup_20250101_000000.zip".into(),
            bytes_written: 25,
            outcome: RestoreOutcome::RawFallback,
            copied: false,
        };
        assert!(result.summary().contains("25 bytes"));
        assert!(result.summary().contains("decryption failed"));
    }

    #[test]
    fn test_policy_serde() {
        assert_eq!(
            serde_json::to_string(&RestorePolicy::Strict).unwrap(),
            "\"strict\""
        );
        let parsed: RestorePolicy = serde_json::from_str("\"lenient\"").unwrap();
        assert_eq!(parsed, RestorePolicy::Lenient);
    }
}
