use crate::keystore::KeyStoreError;

/// Errors raised by key generation, export, encryption and decryption.
///
/// Every variant is terminal for the call that produced it; nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum EncryptionError {
    #[error("key creation failed: {0}")]
    KeyCreationFailed(String),
    #[error("failed to create access control object")]
    AccessControlCreationFailed,
    #[error("failed to extract public key")]
    PublicKeyExtractionFailed,
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),
    /// Wrong key, corrupted wrap blob and AEAD tag mismatch all surface here
    /// with the same message.
    #[error("decryption failed")]
    DecryptionFailed,
    #[error("private key not found: status({0})")]
    KeyNotFound(i32),
    #[error("invalid file format: {0}")]
    InvalidFileFormat(String),
    #[error("file write failed: {0}")]
    FileWriteFailed(String),
}

impl EncryptionError {
    /// Maps a failed store lookup onto `KeyNotFound`, keeping the store status.
    pub(crate) fn key_not_found(err: KeyStoreError) -> Self {
        EncryptionError::KeyNotFound(err.code())
    }
}

pub type EncryptionResult<T> = Result<T, EncryptionError>;
