//! Backup system for vpn-backup
//!
//! Packages the live database into single-entry zip archives, optionally
//! encrypting the entry, and restores it again.
//!
//! # Archive Format
//!
//! - Filename: `vpn_backup_<YYYYMMDD>_<HHMMSS>.zip`, local time
//! - One entry, `vpn.db`, holding either the raw database bytes or
//!   `IV (16 bytes) || AES-256-CBC ciphertext`
//! - Checksum: SHA-256 over the whole archive file, lowercase hex
//!
//! There is no index file; every listing rescans the backup directory and
//! rehashes each archive. Two backups created in the same second share a
//! filename and the later one wins.
//!
//! # Example
//!
//! ```rust,ignore
//! use vpn_backup::backup::{BackupManager, RestorePolicy};
//! use vpn_backup::crypto::CipherContext;
//!
//! let cipher = CipherContext::derive("correct horse battery staple")?;
//! let manager = BackupManager::new("/var/lib/vpn/vpn.db", "/var/lib/vpn/backups", Some(cipher))
//!     .with_restore_policy(RestorePolicy::Strict);
//!
//! let record = manager.create_backup(true)?;
//! println!("{} ({})", record.name, record.checksum);
//!
//! // Later
//! let result = manager.restore_backup(&record.name)?;
//! println!("{}", result.summary());
//! ```

pub mod archive;
mod manager;
mod restore;

pub use manager::{BackupManager, BackupRecord};
pub use restore::{ArchiveInfo, RestoreOutcome, RestorePolicy, RestoreResult};
