//! Cryptographic functions for vpn-backup
//!
//! Provides AES-256-CBC encryption with PBKDF2-HMAC-SHA-256 key derivation
//! for optional encryption of database backups.

pub mod encryption;
pub mod key_derivation;
pub mod secure_memory;

pub use encryption::BLOCK_SIZE;
pub use key_derivation::{
    generate_salt, load_salt, CipherContext, KdfParams, DEFAULT_ITERATIONS, KEY_LEN, SALT_LEN,
};
pub use secure_memory::SecureString;
