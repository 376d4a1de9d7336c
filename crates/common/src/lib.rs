/**
 * Hybrid encryption engine: encrypt to a P-256
 *  public key, decrypt with a store-held private key.
 */
pub mod cipher;
/**
 * Cryptographic types and operations.
 *  - Public key encoding
 *  - AES-256-GCM payload secrets
 *  - ECIES key wrap
 */
pub mod crypto;
/**
 * Binary framing for encrypted files.
 */
pub mod envelope;
pub mod error;
/**
 * PEM export and parsing of public keys.
 */
pub mod export;
/**
 * Key-pair lifecycle under a fixed application tag.
 */
pub mod key_manager;
/**
 * Capability interface over private-key storage,
 *  plus in-memory and file-backed implementations.
 */
pub mod keystore;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::cipher::{encrypt, HybridCipher};
    pub use crate::crypto::PublicKey;
    pub use crate::envelope::Envelope;
    pub use crate::error::{EncryptionError, EncryptionResult};
    pub use crate::export::{PublicKeyExporter, PUBLIC_KEY_FILE_NAME};
    pub use crate::key_manager::{KeyManager, DEFAULT_KEY_TAG};
    pub use crate::keystore::{
        AccessPolicy, Accessibility, FileKeyStore, KeyStoreError, KeyUsage, MemoryKeyStore,
        SecureKeyStore,
    };
    pub use crate::version::build_info;
}
