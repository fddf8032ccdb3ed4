//! Key derivation using PBKDF2-HMAC-SHA-256
//!
//! Derives a fixed-size AES-256 key from a password and a 16-byte salt.
//! The salt is stored beside the backups so the same key can be
//! reconstructed later from the password alone.

use std::fmt;
use std::fs;
use std::path::Path;

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroize;

use crate::error::{VpnError, VpnResult};
use crate::storage::file_io::{create_private_dir, write_private};

/// Length of the derived key in bytes (AES-256)
pub const KEY_LEN: usize = 32;

/// Length of the key-derivation salt in bytes
pub const SALT_LEN: usize = 16;

/// Default PBKDF2 iteration count
pub const DEFAULT_ITERATIONS: u32 = 10_000;

/// Parameters for key derivation
///
/// Key and salt lengths are fixed; only the work factor is tunable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// PBKDF2 iteration count (default: 10,000)
    #[serde(default = "default_iterations")]
    pub iterations: u32,
}

fn default_iterations() -> u32 {
    DEFAULT_ITERATIONS
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl KdfParams {
    /// Create params with a specific iteration count
    pub fn with_iterations(iterations: u32) -> Self {
        Self { iterations }
    }
}

/// A derived key together with the salt it was derived from
///
/// The key is zeroed when the context is dropped. The type is deliberately
/// not `Clone`; hand out `&CipherContext` instead.
pub struct CipherContext {
    key: [u8; KEY_LEN],
    salt: [u8; SALT_LEN],
}

impl CipherContext {
    /// Derive a key from `password` under a fresh random salt
    pub fn derive(password: &str) -> VpnResult<Self> {
        Self::derive_with_params(password, &KdfParams::default())
    }

    /// Like [`CipherContext::derive`], with a configured work factor
    pub fn derive_with_params(password: &str, params: &KdfParams) -> VpnResult<Self> {
        let salt = generate_salt()?;
        Ok(Self::derive_with_salt_and_params(password, &salt, params))
    }

    /// Reconstruct a context from a known salt
    pub fn derive_with_salt(password: &str, salt: &[u8; SALT_LEN]) -> Self {
        Self::derive_with_salt_and_params(password, salt, &KdfParams::default())
    }

    /// Reconstruct a context from a known salt with a configured work factor
    pub fn derive_with_salt_and_params(
        password: &str,
        salt: &[u8; SALT_LEN],
        params: &KdfParams,
    ) -> Self {
        let mut key = [0u8; KEY_LEN];
        pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, params.iterations, &mut key);
        Self { key, salt: *salt }
    }

    /// Get the key bytes
    pub fn key(&self) -> &[u8; KEY_LEN] {
        &self.key
    }

    /// Get the salt the key was derived from
    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    /// Persist the raw salt to `path` (owner-only), creating parent directories
    pub fn save_salt<P: AsRef<Path>>(&self, path: P) -> VpnResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_private_dir(parent).map_err(|e| {
                VpnError::Io(format!(
                    "Failed to create key directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        write_private(path, &self.salt)
            .map_err(|e| VpnError::Io(format!("Failed to write key file: {}", e)))
    }
}

impl Drop for CipherContext {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

// Never print key material
impl fmt::Debug for CipherContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherContext")
            .field("salt", &hex::encode(self.salt))
            .finish_non_exhaustive()
    }
}

/// Draw a fresh salt from the OS random source
pub fn generate_salt() -> VpnResult<[u8; SALT_LEN]> {
    let mut salt = [0u8; SALT_LEN];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| VpnError::Randomness(format!("Failed to generate salt: {}", e)))?;
    Ok(salt)
}

/// Read a raw 16-byte salt from `path`
pub fn load_salt<P: AsRef<Path>>(path: P) -> VpnResult<[u8; SALT_LEN]> {
    let path = path.as_ref();

    let bytes = fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            VpnError::key_file_not_found(path.display().to_string())
        } else {
            VpnError::Io(format!("Failed to read key file: {}", e))
        }
    })?;

    <[u8; SALT_LEN]>::try_from(bytes.as_slice()).map_err(|_| {
        VpnError::Format(format!(
            "Key file {} holds {} bytes, expected {}",
            path.display(),
            bytes.len(),
            SALT_LEN
        ))
    })
}
