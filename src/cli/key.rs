//! Key CLI commands
//!
//! Provides commands for creating the backup key and using it directly on
//! files and text.

use clap::Subcommand;
use std::path::PathBuf;

use crate::config::{paths::VpnPaths, settings::Settings};
use crate::crypto::{load_salt, CipherContext, SecureString};
use crate::error::{VpnError, VpnResult};

/// Environment variable consulted before prompting for a password
pub const PASSWORD_ENV: &str = "VPN_BACKUP_PASSWORD";

const MIN_PASSWORD_LEN: usize = 8;

/// Key management commands
#[derive(Subcommand)]
pub enum KeyCommands {
    /// Derive a fresh key and write its salt to the key file
    Init {
        /// Replace an existing key file
        #[arg(short, long)]
        force: bool,
    },

    /// Show key status
    Status,

    /// Encrypt a file with the configured key
    EncryptFile {
        /// File to encrypt
        input: PathBuf,
        /// Where to write IV and ciphertext
        output: PathBuf,
    },

    /// Decrypt a file produced by encrypt-file
    DecryptFile {
        /// File to decrypt
        input: PathBuf,
        /// Where to write the plaintext
        output: PathBuf,
    },

    /// Encrypt text and print it as base64
    EncryptText {
        /// Text to encrypt
        text: String,
    },

    /// Decrypt base64 text produced by encrypt-text
    DecryptText {
        /// Base64 ciphertext
        encoded: String,
    },
}

/// Handle key commands
pub fn handle_key_command(
    paths: &VpnPaths,
    settings: &Settings,
    cmd: KeyCommands,
) -> VpnResult<()> {
    match cmd {
        KeyCommands::Init { force } => init_key(paths, settings, force),
        KeyCommands::Status => show_status(paths, settings),
        KeyCommands::EncryptFile { input, output } => {
            let cipher = require_cipher(paths, settings)?;
            cipher.encrypt_file(&input, &output)?;
            println!("Encrypted {} -> {}", input.display(), output.display());
            Ok(())
        }
        KeyCommands::DecryptFile { input, output } => {
            let cipher = require_cipher(paths, settings)?;
            cipher.decrypt_file(&input, &output)?;
            println!("Decrypted {} -> {}", input.display(), output.display());
            Ok(())
        }
        KeyCommands::EncryptText { text } => {
            let cipher = require_cipher(paths, settings)?;
            println!("{}", cipher.encrypt_string(&text)?);
            Ok(())
        }
        KeyCommands::DecryptText { encoded } => {
            let cipher = require_cipher(paths, settings)?;
            println!("{}", cipher.decrypt_string(&encoded)?);
            Ok(())
        }
    }
}

/// Create the key file from a new password
fn init_key(paths: &VpnPaths, settings: &Settings, force: bool) -> VpnResult<()> {
    let key_file = paths.key_file();

    if key_file.exists() && !force {
        println!("A key file already exists at {}", key_file.display());
        println!("Backups encrypted with it can only be restored with the same key.");
        println!("To replace it, run again with --force flag:");
        println!("  vpn-backup key init --force");
        return Ok(());
    }

    let password = prompt_new_password()?;

    println!("Deriving backup key...");
    let cipher = CipherContext::derive_with_params(password.as_str(), &settings.kdf)?;
    cipher.save_salt(&key_file)?;

    println!("Key file written: {}", key_file.display());
    println!("Keep your password safe - there is no recovery mechanism!");

    Ok(())
}

/// Show key status
fn show_status(paths: &VpnPaths, settings: &Settings) -> VpnResult<()> {
    let key_file = paths.key_file();

    println!("Key Status");
    println!("==========");
    println!();

    if key_file.exists() {
        let salt = load_salt(&key_file)?;
        println!("Status: CONFIGURED");
        println!("Key file: {}", key_file.display());
        println!("Salt: {}", hex::encode(salt));
        println!();
        println!("Key Derivation Parameters:");
        println!("  Algorithm: PBKDF2-HMAC-SHA256");
        println!("  Iterations: {}", settings.kdf.iterations);
        println!("  Cipher: AES-256-CBC");
    } else {
        println!("Status: NOT CONFIGURED");
        println!();
        println!("Backups are stored unencrypted.");
        println!("Run 'vpn-backup key init' to create a key.");
    }

    Ok(())
}

/// Build the cipher context from the key file, if one exists
///
/// Prompts for the password only when a key file is present.
pub fn load_cipher(paths: &VpnPaths, settings: &Settings) -> VpnResult<Option<CipherContext>> {
    let key_file = paths.key_file();
    if !key_file.exists() {
        return Ok(None);
    }

    let salt = load_salt(&key_file)?;
    let password = read_password("Backup password: ")?;
    Ok(Some(CipherContext::derive_with_salt_and_params(
        password.as_str(),
        &salt,
        &settings.kdf,
    )))
}

/// Like [`load_cipher`], but a missing key file is an error
pub fn require_cipher(paths: &VpnPaths, settings: &Settings) -> VpnResult<CipherContext> {
    load_cipher(paths, settings)?.ok_or_else(|| {
        VpnError::Config("No backup key configured. Run 'vpn-backup key init' first.".into())
    })
}

/// Read the password from the environment or a hidden prompt
pub fn read_password(prompt: &str) -> VpnResult<SecureString> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(SecureString::new(password));
    }

    rpassword::prompt_password(prompt)
        .map(SecureString::new)
        .map_err(|e| VpnError::Io(format!("Failed to read password: {}", e)))
}

/// Prompt for a new password with confirmation
fn prompt_new_password() -> VpnResult<SecureString> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        let password = SecureString::new(password);
        check_new_password(&password)?;
        return Ok(password);
    }

    loop {
        let pass1 = read_password("Enter new password: ")?;

        if let Err(e) = check_new_password(&pass1) {
            println!("{} Please try again.", e);
            continue;
        }

        let pass2 = read_password("Confirm password: ")?;

        if pass1.as_str() != pass2.as_str() {
            println!("Passwords do not match. Please try again.");
            continue;
        }

        return Ok(pass1);
    }
}

/// Reject passwords too short to protect a new key
fn check_new_password(password: &str) -> VpnResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(VpnError::Validation(format!(
            "Password must be at least {} characters.",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}
