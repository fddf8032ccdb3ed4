use anyhow::Result;
use clap::{Parser, Subcommand};

use vpn_backup::cli::{handle_backup_command, handle_key_command, BackupCommands, KeyCommands};
use vpn_backup::config::{paths::VpnPaths, settings::Settings};

#[derive(Parser)]
#[command(
    name = "vpn-backup",
    version,
    about = "Encrypted backups for the VPN service database",
    long_about = "vpn-backup packages the VPN service database into timestamped zip \
                  archives, optionally encrypted with AES-256-CBC under a \
                  password-derived key, and restores it again."
)]
struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Backup management commands
    #[command(subcommand)]
    Backup(BackupCommands),

    /// Key management and direct encryption commands
    #[command(subcommand)]
    Key(KeyCommands),

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    vpn_backup::logging::init(&cli.log_level)?;

    // Initialize paths and settings
    let paths = VpnPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    match cli.command {
        Some(Commands::Backup(cmd)) => {
            handle_backup_command(&paths, &settings, cmd)?;
        }
        Some(Commands::Key(cmd)) => {
            handle_key_command(&paths, &settings, cmd)?;
        }
        Some(Commands::Config) => {
            println!("vpn-backup Configuration");
            println!("========================");
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Settings file:    {}", paths.settings_file().display());
            println!("Key file:         {}", paths.key_file().display());
            println!("Database:         {}", settings.database_path(&paths).display());
            println!("Backup directory: {}", settings.backup_dir(&paths).display());
            println!();
            println!("Settings:");
            println!("  Encrypt by default: {}", settings.encrypt_by_default);
            println!("  Restore policy:     {}", settings.restore_policy);
            println!("  KDF iterations:     {}", settings.kdf.iterations);
            println!(
                "  Key configured:     {}",
                if paths.key_file().exists() { "yes" } else { "no" }
            );
        }
        None => {
            println!("vpn-backup - Encrypted backups for the VPN service database");
            println!();
            println!("Run 'vpn-backup --help' for usage information.");
        }
    }

    Ok(())
}
