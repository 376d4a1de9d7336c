//! Payload encryption using AES-256-GCM
//!
//! Each call to `encrypt` generates its own `Secret` and its own `Nonce`, so a
//! (key, nonce) pair is never used twice. The tag is returned detached from the
//! ciphertext because the envelope frames them as separate chunks.

use std::fmt;

use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::Aes256Gcm;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of an AES-256 key in bytes (256 bits)
pub const SECRET_SIZE: usize = 32;
/// Size of an AES-GCM nonce in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;
/// Size of an AES-GCM authentication tag in bytes (128 bits)
pub const TAG_SIZE: usize = 16;

/// Errors that can occur during payload encryption/decryption
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("failed to gather randomness: {0}")]
    Rng(String),
    #[error("invalid secret size, expected 32, got {0}")]
    InvalidSize(usize),
    #[error("invalid nonce size, expected 12, got {0}")]
    InvalidNonce(usize),
    #[error("invalid tag size, expected 16, got {0}")]
    InvalidTag(usize),
    #[error("encrypt error")]
    Encrypt,
    #[error("decrypt error")]
    Decrypt,
}

/// A 96-bit AES-GCM nonce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Nonce([u8; NONCE_SIZE]);

impl Nonce {
    /// Generate a fresh nonce from the operating system's CSPRNG
    pub fn generate() -> Result<Self, SecretError> {
        let mut buff = [0u8; NONCE_SIZE];
        getrandom::getrandom(&mut buff).map_err(|e| SecretError::Rng(e.to_string()))?;
        Ok(Nonce(buff))
    }

    pub fn from_slice(data: &[u8]) -> Result<Self, SecretError> {
        let buff: [u8; NONCE_SIZE] = data
            .try_into()
            .map_err(|_| SecretError::InvalidNonce(data.len()))?;
        Ok(Nonce(buff))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Output of [`Secret::seal`]: the nonce it chose, the ciphertext and the detached tag
#[derive(Debug, Clone)]
pub struct Sealed {
    pub nonce: Nonce,
    pub ciphertext: Vec<u8>,
    pub tag: [u8; TAG_SIZE],
}

/// An ephemeral 256-bit symmetric key
///
/// Zeroized on drop. `Debug` never prints key bytes.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Secret([u8; SECRET_SIZE]);

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(..)")
    }
}

impl Secret {
    /// Generate a new random secret using a cryptographically secure RNG
    pub fn generate() -> Result<Self, SecretError> {
        let mut buff = [0u8; SECRET_SIZE];
        getrandom::getrandom(&mut buff).map_err(|e| SecretError::Rng(e.to_string()))?;
        Ok(Secret(buff))
    }

    /// Create a secret from a byte slice
    ///
    /// # Errors
    ///
    /// Returns an error if the slice length is not exactly `SECRET_SIZE` bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, SecretError> {
        if data.len() != SECRET_SIZE {
            return Err(SecretError::InvalidSize(data.len()));
        }
        let mut buff = [0u8; SECRET_SIZE];
        buff.copy_from_slice(data);
        Ok(Secret(buff))
    }

    /// Get a reference to the secret key bytes
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    /// Encrypt `plaintext` under a freshly generated nonce, with no associated data
    pub fn seal(&self, plaintext: &[u8]) -> Result<Sealed, SecretError> {
        let nonce = Nonce::generate()?;
        let mut buffer = plaintext.to_vec();
        let tag = self
            .cipher()
            .encrypt_in_place_detached(GenericArray::from_slice(nonce.bytes()), b"", &mut buffer)
            .map_err(|_| SecretError::Encrypt)?;

        let mut tag_bytes = [0u8; TAG_SIZE];
        tag_bytes.copy_from_slice(tag.as_slice());

        Ok(Sealed {
            nonce,
            ciphertext: buffer,
            tag: tag_bytes,
        })
    }

    /// Decrypt and authenticate a detached (nonce, ciphertext, tag) triple
    ///
    /// # Errors
    ///
    /// Returns an error if the nonce or tag has the wrong size, or if authentication
    /// fails. A failed open never yields partial plaintext.
    pub fn open(&self, nonce: &[u8], ciphertext: &[u8], tag: &[u8]) -> Result<Vec<u8>, SecretError> {
        let nonce = Nonce::from_slice(nonce)?;
        if tag.len() != TAG_SIZE {
            return Err(SecretError::InvalidTag(tag.len()));
        }

        let mut buffer = ciphertext.to_vec();
        self.cipher()
            .decrypt_in_place_detached(
                GenericArray::from_slice(nonce.bytes()),
                b"",
                &mut buffer,
                GenericArray::from_slice(tag),
            )
            .map_err(|_| SecretError::Decrypt)?;
        Ok(buffer)
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(GenericArray::from_slice(&self.0))
    }
}
