//! Custom error types for vpn-backup
//!
//! This module defines the error hierarchy for the crate using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for vpn-backup operations
#[derive(Error, Debug)]
pub enum VpnError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Unreadable archives, malformed filenames, wrong-sized key files
    #[error("Format error: {0}")]
    Format(String),

    /// Input rejected before any filesystem access
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Malformed base64 or non-UTF-8 text
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// The OS random source could not be read
    #[error("Secure randomness unavailable: {0}")]
    Randomness(String),

    /// The block cipher rejected the key or IV
    #[error("Failed to initialize cipher: {0}")]
    CipherInit(String),

    /// Ciphertext blob shorter than the IV
    #[error("Ciphertext too short: {len} bytes, need at least {min}")]
    ShortInput { len: usize, min: usize },

    /// Declared padding length larger than the decrypted buffer
    #[error("Invalid padding: declared {declared} bytes, only {available} available")]
    InvalidPadding { declared: usize, available: usize },

    /// Ciphertext body that is empty or not block aligned
    #[error("Malformed ciphertext: {0}")]
    MalformedCiphertext(String),
}

impl VpnError {
    /// Create a "not found" error for backup archives
    pub fn backup_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Backup",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for the database entry inside an archive
    pub fn entry_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Archive entry",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for the salt/key file
    pub fn key_file_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Key file",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error came out of the cipher layer
    pub fn is_crypto(&self) -> bool {
        matches!(
            self,
            Self::Randomness(_)
                | Self::CipherInit(_)
                | Self::ShortInput { .. }
                | Self::InvalidPadding { .. }
                | Self::MalformedCiphertext(_)
        )
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for VpnError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for VpnError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<zip::result::ZipError> for VpnError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Self::Io(e.to_string()),
            other => Self::Format(other.to_string()),
        }
    }
}

/// Result type alias for vpn-backup operations
pub type VpnResult<T> = Result<T, VpnError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VpnError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_not_found_error() {
        let err = VpnError::backup_not_found("vpn_backup_20250101_120000.zip");
        assert_eq!(
            err.to_string(),
            "Backup not found: vpn_backup_20250101_120000.zip"
        );
        assert!(err.is_not_found());
        assert!(!err.is_crypto());
    }

    #[test]
    fn test_padding_error_display() {
        let err = VpnError::InvalidPadding {
            declared: 200,
            available: 16,
        };
        assert_eq!(
            err.to_string(),
            "Invalid padding: declared 200 bytes, only 16 available"
        );
        assert!(err.is_crypto());
    }

    #[test]
    fn test_crypto_classification() {
        assert!(VpnError::ShortInput { len: 3, min: 16 }.is_crypto());
        assert!(VpnError::Randomness("x".into()).is_crypto());
        assert!(VpnError::CipherInit("x".into()).is_crypto());
        assert!(VpnError::MalformedCiphertext("x".into()).is_crypto());
        assert!(!VpnError::Encoding("x".into()).is_crypto());
        assert!(!VpnError::Format("x".into()).is_crypto());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: VpnError = io_err.into();
        assert!(matches!(err, VpnError::Io(_)));
    }

    #[test]
    fn test_from_zip_error() {
        let err: VpnError = zip::result::ZipError::FileNotFound.into();
        assert!(matches!(err, VpnError::Format(_)));
    }
}
