//! Single-entry zip archives and their on-disk naming
//!
//! Every backup is `vpn_backup_<YYYYMMDD>_<HHMMSS>.zip` holding exactly one
//! entry, `vpn.db`, whose payload is either the raw database bytes or
//! `IV || ciphertext`.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use sha2::{Digest, Sha256};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{VpnError, VpnResult};
use crate::storage::file_io::create_private_file;

/// Name of the database entry inside every archive
pub const ENTRY_NAME: &str = "vpn.db";

/// Filename prefix shared by all backups
pub const FILE_PREFIX: &str = "vpn_backup_";

/// Filename suffix shared by all backups
pub const FILE_EXTENSION: &str = ".zip";

/// Layout of the timestamp embedded in a backup filename
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Layout of a backup identifier
pub const ID_FORMAT: &str = "%Y%m%d%H%M%S";

/// Build the archive filename for a creation time
pub fn backup_filename(timestamp: &DateTime<Local>) -> String {
    format!(
        "{}{}{}",
        FILE_PREFIX,
        timestamp.format(TIMESTAMP_FORMAT),
        FILE_EXTENSION
    )
}

/// Build the 14-digit identifier for a creation time
pub fn backup_id(timestamp: &DateTime<Local>) -> String {
    timestamp.format(ID_FORMAT).to_string()
}

/// Parse the local creation time embedded in a backup filename
///
/// Returns `None` for names that don't follow the backup grammar.
pub fn parse_backup_timestamp(filename: &str) -> Option<DateTime<Local>> {
    let stamp = filename
        .strip_prefix(FILE_PREFIX)?
        .strip_suffix(FILE_EXTENSION)?;
    let naive = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()?;
    Local.from_local_datetime(&naive).earliest()
}

/// Write a finished single-entry archive to `path`
pub fn write_archive(path: &Path, payload: &[u8]) -> VpnResult<()> {
    let file = create_private_file(path)
        .map_err(|e| VpnError::Io(format!("Failed to create backup file: {}", e)))?;

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o600)
        .large_file(payload.len() as u64 >= u32::MAX as u64);

    let mut writer = ZipWriter::new(file);
    writer
        .start_file(ENTRY_NAME, options)
        .map_err(|e| VpnError::Io(format!("Failed to add {} to archive: {}", ENTRY_NAME, e)))?;
    writer
        .write_all(payload)
        .map_err(|e| VpnError::Io(format!("Failed to copy database to backup: {}", e)))?;

    let file = writer
        .finish()
        .map_err(|e| VpnError::Io(format!("Failed to finalize backup archive: {}", e)))?;
    file.sync_all()
        .map_err(|e| VpnError::Io(format!("Failed to sync backup archive: {}", e)))?;

    Ok(())
}

/// Read the `vpn.db` entry out of the archive at `path`
///
/// `name` is only used in error messages.
pub fn read_entry(path: &Path, name: &str) -> VpnResult<Vec<u8>> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            VpnError::backup_not_found(name)
        } else {
            VpnError::Io(format!("Failed to open backup file: {}", e))
        }
    })?;

    let mut archive = ZipArchive::new(file)
        .map_err(|e| VpnError::Format(format!("Failed to read archive {}: {}", name, e)))?;

    let mut entry = archive.by_name(ENTRY_NAME).map_err(|e| match e {
        zip::result::ZipError::FileNotFound => {
            VpnError::entry_not_found(format!("{} in {}", ENTRY_NAME, name))
        }
        other => VpnError::Format(format!("Failed to open {} in {}: {}", ENTRY_NAME, name, other)),
    })?;

    let mut contents = Vec::with_capacity(entry.size() as usize);
    entry
        .read_to_end(&mut contents)
        .map_err(|e| VpnError::Format(format!("Failed to read {} from {}: {}", ENTRY_NAME, name, e)))?;

    Ok(contents)
}

/// SHA-256 of a whole file, lowercase hex
pub fn file_checksum(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Size of the file at `path` in bytes
pub fn file_size(path: &Path) -> io::Result<u64> {
    Ok(fs::metadata(path)?.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use tempfile::TempDir;

    #[test]
    fn test_filename_and_id() {
        let ts = Local.with_ymd_and_hms(2025, 3, 7, 9, 5, 1).unwrap();
        assert_eq!(backup_filename(&ts), "vpn_backup_20250307_090501.zip");
        assert_eq!(backup_id(&ts), "20250307090501");
    }

    #[test]
    fn test_parse_backup_timestamp() {
        let ts = parse_backup_timestamp("vpn_backup_20251127_143022.zip").unwrap();
        assert_eq!(ts.year(), 2025);
        assert_eq!(ts.month(), 11);
        assert_eq!(ts.day(), 27);
        assert_eq!(ts.hour(), 14);
        assert_eq!(ts.minute(), 30);
        assert_eq!(ts.second(), 22);
    }

    #[test]
    fn test_parse_rejects_other_names() {
        assert!(parse_backup_timestamp("notes.zip").is_none());
        assert!(parse_backup_timestamp("vpn_backup_latest.zip").is_none());
        assert!(parse_backup_timestamp("vpn_backup_20251327_143022.zip").is_none());
        assert!(parse_backup_timestamp("vpn_backup_20251127_143022.tar").is_none());
        assert!(parse_backup_timestamp("vpn_backup_.zip").is_none());
        // Same length as a real backup name, but a different prefix
        assert!(parse_backup_timestamp("abc_backup_20240101_000000.zip").is_none());
        assert!(parse_backup_timestamp("x.zip").is_none());
    }

    #[test]
    fn test_filename_parse_agree() {
        let ts = Local.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(parse_backup_timestamp(&backup_filename(&ts)), Some(ts));
    }

    #[test]
    fn test_write_then_read_entry() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a.zip");

        write_archive(&path, b"payload bytes").unwrap();
        assert_eq!(read_entry(&path, "a.zip").unwrap(), b"payload bytes");
    }

    #[test]
    fn test_empty_payload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.zip");

        write_archive(&path, b"").unwrap();
        assert!(read_entry(&path, "empty.zip").unwrap().is_empty());
    }

    #[test]
    fn test_read_missing_archive() {
        let temp_dir = TempDir::new().unwrap();
        let err = read_entry(&temp_dir.path().join("gone.zip"), "gone.zip").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_read_garbage_archive() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("junk.zip");
        fs::write(&path, b"this is not a zip file").unwrap();

        let err = read_entry(&path, "junk.zip").unwrap_err();
        assert!(matches!(err, VpnError::Format(_)));
    }

    #[test]
    fn test_read_archive_without_entry() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("other.zip");

        let mut writer = ZipWriter::new(File::create(&path).unwrap());
        writer
            .start_file("something_else.txt", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"hi").unwrap();
        writer.finish().unwrap();

        let err = read_entry(&path, "other.zip").unwrap_err();
        assert!(matches!(
            err,
            VpnError::NotFound {
                entity_type: "Archive entry",
                ..
            }
        ));
    }

    #[test]
    fn test_checksum() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("abc");
        fs::write(&path, b"abc").unwrap();

        assert_eq!(
            file_checksum(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
