//! Hybrid encryption engine
//!
//! Encrypt needs only the recipient's public key bytes. Decrypt needs a
//! [`SecureKeyStore`] holding the matching private key under a known tag; the
//! store performs the unwrap and hands back only the 32-byte payload key.

use crate::crypto::{ecies, PublicKey, Secret};
use crate::envelope::{self, Envelope};
use crate::error::{EncryptionError, EncryptionResult};
use crate::keystore::{SecureKeyStore, WrapAlgorithm};

/// Encrypt `plaintext` to the holder of `recipient`'s private key
///
/// `recipient` is a 65-byte X9.63 uncompressed P-256 point. The result is an
/// encoded [`Envelope`].
pub fn encrypt(plaintext: &[u8], recipient: &[u8]) -> EncryptionResult<Vec<u8>> {
    let secret = Secret::generate().map_err(|e| EncryptionError::EncryptionFailed(e.to_string()))?;
    let sealed = secret
        .seal(plaintext)
        .map_err(|e| EncryptionError::EncryptionFailed(e.to_string()))?;

    let recipient =
        PublicKey::from_x963(recipient).map_err(|e| EncryptionError::InvalidPublicKey(e.to_string()))?;
    let wrapped_key = ecies::seal(&recipient, secret.bytes())
        .map_err(|e| EncryptionError::EncryptionFailed(e.to_string()))?;

    tracing::debug!(
        recipient = %recipient.fingerprint(),
        plaintext_len = plaintext.len(),
        "encrypted payload"
    );
    envelope::encode(
        &wrapped_key,
        sealed.nonce.bytes(),
        &sealed.ciphertext,
        &sealed.tag,
    )
}

/// Encrypts to arbitrary recipients and decrypts with the key stored under `tag`
#[derive(Debug, Clone)]
pub struct HybridCipher<S> {
    store: S,
    tag: String,
}

impl<S: SecureKeyStore> HybridCipher<S> {
    pub fn new(store: S, tag: impl Into<String>) -> Self {
        Self {
            store,
            tag: tag.into(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// See [`encrypt`]; the store is not consulted
    pub fn encrypt(&self, plaintext: &[u8], recipient: &[u8]) -> EncryptionResult<Vec<u8>> {
        encrypt(plaintext, recipient)
    }

    /// Decrypt an envelope addressed to the key stored under this cipher's tag
    ///
    /// # Errors
    ///
    /// - `KeyNotFound` if the store has no key under the tag
    /// - `InvalidFileFormat` if the envelope framing is broken
    /// - `DecryptionFailed` for everything after that: wrong key, any corrupted
    ///   chunk, a bad nonce or tag size. These are deliberately indistinguishable.
    pub fn decrypt(&self, data: &[u8]) -> EncryptionResult<Vec<u8>> {
        let handle = self
            .store
            .find(&self.tag)
            .map_err(EncryptionError::key_not_found)?;
        let envelope = Envelope::decode(data)?;

        let key = self
            .store
            .unwrap_key(
                &handle,
                WrapAlgorithm::EciesCofactorX963Sha256AesGcm,
                &envelope.wrapped_key,
            )
            .map_err(|_| EncryptionError::DecryptionFailed)?;
        let secret = Secret::from_slice(&key).map_err(|_| EncryptionError::DecryptionFailed)?;

        let plaintext = secret
            .open(&envelope.nonce, &envelope.ciphertext, &envelope.tag)
            .map_err(|_| EncryptionError::DecryptionFailed)?;

        tracing::debug!(tag = %self.tag, plaintext_len = plaintext.len(), "decrypted payload");
        Ok(plaintext)
    }
}
