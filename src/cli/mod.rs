//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the backup and crypto layers.

pub mod backup;
pub mod key;

pub use backup::{handle_backup_command, BackupCommands};
pub use key::{handle_key_command, KeyCommands};
