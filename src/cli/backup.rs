//! Backup CLI commands
//!
//! Implements CLI commands for backup management.

use chrono::Local;
use clap::Subcommand;

use super::key::{load_cipher, require_cipher};
use crate::backup::{BackupManager, RestorePolicy};
use crate::config::paths::VpnPaths;
use crate::config::settings::Settings;
use crate::display::{format_archive_details, format_backup_created, format_backup_list};
use crate::error::{VpnError, VpnResult};

/// Keyword that resolves to the newest backup
const LATEST: &str = "latest";

/// Backup subcommands
#[derive(Subcommand)]
pub enum BackupCommands {
    /// Create a new backup of the database
    Create {
        /// Encrypt the backup with the configured key
        #[arg(long, conflicts_with = "plain")]
        encrypt: bool,

        /// Store the database unencrypted
        #[arg(long)]
        plain: bool,
    },

    /// List all available backups
    List {
        /// Print records as JSON
        #[arg(long)]
        json: bool,

        /// Show full checksums
        #[arg(short, long)]
        verbose: bool,
    },

    /// Restore the database from a backup
    Restore {
        /// Backup filename (use 'latest' for most recent)
        backup: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,

        /// Fail instead of restoring raw bytes when decryption fails
        #[arg(long)]
        strict: bool,
    },

    /// Delete a backup
    Delete {
        /// Backup filename
        backup: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Show information about a specific backup
    Info {
        /// Backup filename (use 'latest' for most recent)
        backup: String,
    },
}

/// Handle a backup command
pub fn handle_backup_command(
    paths: &VpnPaths,
    settings: &Settings,
    cmd: BackupCommands,
) -> VpnResult<()> {
    match cmd {
        BackupCommands::Create { encrypt, plain } => {
            let encrypt = !plain && (encrypt || settings.encrypt_by_default);
            let cipher = if encrypt {
                Some(require_cipher(paths, settings)?)
            } else {
                None
            };

            let manager = BackupManager::from_settings(paths, settings, cipher);
            let record = manager.create_backup(encrypt)?;
            print!("{}", format_backup_created(&record));
            println!("Location: {}", manager.backup_dir().join(&record.name).display());
        }

        BackupCommands::List { json, verbose } => {
            let manager = BackupManager::from_settings(paths, settings, None);
            let backups = manager.list_backups()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&backups)?);
                return Ok(());
            }

            println!("{}", format_backup_list(&backups, verbose, Local::now()));
            if backups.is_empty() {
                println!("Create one with: vpn-backup backup create");
            }
        }

        BackupCommands::Restore {
            backup,
            force,
            strict,
        } => {
            let listing = BackupManager::from_settings(paths, settings, None);
            let name = resolve_backup_name(&listing, &backup)?;

            if !force {
                let info = listing.inspect_backup(&name)?;
                print!("{}", format_archive_details(&info));
                println!();
                println!(
                    "WARNING: This will overwrite {}",
                    listing.database_path().display()
                );
                println!("To proceed, run again with --force flag:");
                println!("  vpn-backup backup restore {} --force", backup);
                return Ok(());
            }

            let policy = if strict {
                RestorePolicy::Strict
            } else {
                settings.restore_policy
            };

            let cipher = load_cipher(paths, settings)?;
            let manager = BackupManager::from_settings(paths, settings, cipher);

            println!("Restoring from {} ({} policy)...", name, policy);
            let result = manager.restore_backup_with_policy(&name, policy)?;
            println!("Restore complete!");
            println!("{}", result.summary());
        }

        BackupCommands::Delete { backup, force } => {
            let manager = BackupManager::from_settings(paths, settings, None);

            if !force {
                if manager.get_backup(&backup)?.is_none() {
                    return Err(VpnError::backup_not_found(backup));
                }
                println!("This will permanently delete {}", backup);
                println!("To proceed, run again with --force flag:");
                println!("  vpn-backup backup delete {} --force", backup);
                return Ok(());
            }

            manager.delete_backup(&backup)?;
            println!("Deleted backup: {}", backup);
        }

        BackupCommands::Info { backup } => {
            let cipher = load_cipher(paths, settings)?;
            let manager = BackupManager::from_settings(paths, settings, cipher);
            let name = resolve_backup_name(&manager, &backup)?;

            let info = manager.inspect_backup(&name)?;
            print!("{}", format_archive_details(&info));
        }
    }

    Ok(())
}

/// Resolve a backup argument to a filename in the backup directory
fn resolve_backup_name(manager: &BackupManager, backup: &str) -> VpnResult<String> {
    if backup != LATEST {
        return Ok(backup.to_string());
    }

    manager
        .latest_backup()?
        .map(|record| record.name)
        .ok_or_else(|| VpnError::backup_not_found(LATEST))
}
