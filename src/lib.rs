//! vpn-backup - Encrypted backups for a VPN service database
//!
//! This library packages a single database file into timestamped zip
//! archives, optionally encrypting it with a password-derived key, and
//! restores it again.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `crypto`: Key derivation and AES-256-CBC encryption
//! - `backup`: Archive creation, listing, deletion and restore
//! - `storage`: Owner-only file helpers and atomic writes
//! - `display`: Terminal formatting
//! - `cli`: Command handlers for the `vpn-backup` binary
//!
//! # Example
//!
//! ```rust,ignore
//! use vpn_backup::backup::BackupManager;
//! use vpn_backup::config::{paths::VpnPaths, settings::Settings};
//!
//! let paths = VpnPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let manager = BackupManager::from_settings(&paths, &settings, None);
//! let record = manager.create_backup(false)?;
//! ```

pub mod backup;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod display;
pub mod error;
pub mod logging;
pub mod storage;

pub use error::{VpnError, VpnResult};
