//! AES-256-CBC encryption/decryption
//!
//! Output layout is `IV (16 bytes) || ciphertext`, with the plaintext padded
//! by a trailing byte count (1..=16, a full block when already aligned).
//! There is no authentication tag. Decryption only checks that the declared
//! padding length fits inside the buffer, so a wrong key is not reliably
//! detected; see [`CipherContext::decrypt`].

use std::fs;
use std::path::Path;

use aes::Aes256;
use base64::{engine::general_purpose::STANDARD, Engine};
use cbc::cipher::block_padding::{NoPadding, Pkcs7};
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{VpnError, VpnResult};
use crate::storage::file_io::write_private;

use super::CipherContext;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// AES block size, also the IV length
pub const BLOCK_SIZE: usize = 16;

impl CipherContext {
    /// Encrypt `plaintext` under a fresh random IV
    pub fn encrypt(&self, plaintext: &[u8]) -> VpnResult<Vec<u8>> {
        let mut iv = [0u8; BLOCK_SIZE];
        OsRng
            .try_fill_bytes(&mut iv)
            .map_err(|e| VpnError::Randomness(format!("Failed to generate IV: {}", e)))?;

        let cipher = Aes256CbcEnc::new_from_slices(self.key(), &iv)
            .map_err(|e| VpnError::CipherInit(e.to_string()))?;
        let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext);

        let mut out = Vec::with_capacity(BLOCK_SIZE + ciphertext.len());
        out.extend_from_slice(&iv);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Decrypt an `IV || ciphertext` blob produced by [`CipherContext::encrypt`]
    ///
    /// The last plaintext byte is taken as the padding length and that many
    /// bytes are stripped. Only a length larger than the buffer is rejected;
    /// the padding bytes themselves are not compared. Decrypting with the
    /// wrong key therefore fails most of the time but can also return
    /// garbage.
    pub fn decrypt(&self, blob: &[u8]) -> VpnResult<Vec<u8>> {
        if blob.len() < BLOCK_SIZE {
            return Err(VpnError::ShortInput {
                len: blob.len(),
                min: BLOCK_SIZE,
            });
        }

        let (iv, body) = blob.split_at(BLOCK_SIZE);
        if body.is_empty() || body.len() % BLOCK_SIZE != 0 {
            return Err(VpnError::MalformedCiphertext(format!(
                "{} bytes is not a positive multiple of the {}-byte block size",
                body.len(),
                BLOCK_SIZE
            )));
        }

        let cipher = Aes256CbcDec::new_from_slices(self.key(), iv)
            .map_err(|e| VpnError::CipherInit(e.to_string()))?;
        let mut plaintext = cipher
            .decrypt_padded_vec_mut::<NoPadding>(body)
            .map_err(|e| VpnError::MalformedCiphertext(e.to_string()))?;

        let declared = plaintext.last().copied().unwrap_or(0) as usize;
        if declared > plaintext.len() {
            return Err(VpnError::InvalidPadding {
                declared,
                available: plaintext.len(),
            });
        }
        plaintext.truncate(plaintext.len() - declared);

        Ok(plaintext)
    }

    /// Encrypt the file at `input` into `output` (owner-only permissions)
    pub fn encrypt_file<P: AsRef<Path>, Q: AsRef<Path>>(&self, input: P, output: Q) -> VpnResult<()> {
        let plaintext = fs::read(input.as_ref())
            .map_err(|e| VpnError::Io(format!("Failed to read input file: {}", e)))?;

        let ciphertext = self.encrypt(&plaintext)?;

        write_private(output.as_ref(), &ciphertext)
            .map_err(|e| VpnError::Io(format!("Failed to write output file: {}", e)))
    }

    /// Decrypt the file at `input` into `output` (owner-only permissions)
    pub fn decrypt_file<P: AsRef<Path>, Q: AsRef<Path>>(&self, input: P, output: Q) -> VpnResult<()> {
        let ciphertext = fs::read(input.as_ref())
            .map_err(|e| VpnError::Io(format!("Failed to read input file: {}", e)))?;

        let plaintext = self.decrypt(&ciphertext)?;

        write_private(output.as_ref(), &plaintext)
            .map_err(|e| VpnError::Io(format!("Failed to write output file: {}", e)))
    }

    /// Encrypt a string and return standard base64
    pub fn encrypt_string(&self, plaintext: &str) -> VpnResult<String> {
        let ciphertext = self.encrypt(plaintext.as_bytes())?;
        Ok(STANDARD.encode(ciphertext))
    }

    /// Decrypt standard base64 produced by [`CipherContext::encrypt_string`]
    pub fn decrypt_string(&self, encoded: &str) -> VpnResult<String> {
        let ciphertext = STANDARD
            .decode(encoded.trim())
            .map_err(|e| VpnError::Encoding(format!("Invalid base64: {}", e)))?;

        let plaintext = self.decrypt(&ciphertext)?;

        String::from_utf8(plaintext)
            .map_err(|e| VpnError::Encoding(format!("Invalid UTF-8 in decrypted data: {}", e)))
    }
}
