//! Secure key storage
//!
//! Private keys live behind the [`SecureKeyStore`] capability. Callers get an
//! opaque [`KeyHandle`] and can only ask the store to *use* the key (unwrap a
//! blob) or to copy out its public half. No method returns private key bytes.
//!
//! Two software backends are provided:
//!
//! - [`MemoryKeyStore`]: in-process vault, used by tests and short-lived tools
//! - [`FileKeyStore`]: one owner-only file per tag under a directory
//!
//! Both honour the [`AccessPolicy`] a key was created with, including the
//! locked / unlocked state of the store.

mod file;
mod memory;
mod policy;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use aes_gcm::aead::OsRng;
use zeroize::Zeroizing;

use crate::crypto::{ecies, PublicKey};

pub use file::FileKeyStore;
pub use memory::MemoryKeyStore;
pub use policy::{AccessPolicy, Accessibility, KeyUsage};

/// Keychain-style status codes reported by [`KeyStoreError::code`]
pub mod status {
    pub const ITEM_NOT_FOUND: i32 = -25300;
    pub const DUPLICATE_ITEM: i32 = -25299;
    pub const INTERACTION_NOT_ALLOWED: i32 = -25308;
    pub const OPERATION_FAILED: i32 = -26276;
    pub const IO: i32 = -36;
    pub const PARAM: i32 = -50;
}

/// Errors raised by a key store backend
#[derive(Debug, thiserror::Error)]
pub enum KeyStoreError {
    #[error("no key stored under tag {0:?}")]
    NotFound(String),
    #[error("a key is already stored under tag {0:?}")]
    DuplicateItem(String),
    #[error("key store is locked")]
    InteractionNotAllowed,
    #[error("handle no longer refers to the key stored under tag {0:?}")]
    StaleHandle(String),
    #[error("invalid access policy: {0}")]
    InvalidPolicy(String),
    #[error("key policy does not permit this operation")]
    UsageNotPermitted,
    #[error("operation failed: {0}")]
    OperationFailed(String),
    #[error("corrupt key record: {0}")]
    Corrupt(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl KeyStoreError {
    /// Numeric status code for diagnostics
    pub fn code(&self) -> i32 {
        match self {
            KeyStoreError::NotFound(_) | KeyStoreError::StaleHandle(_) => status::ITEM_NOT_FOUND,
            KeyStoreError::DuplicateItem(_) => status::DUPLICATE_ITEM,
            KeyStoreError::InteractionNotAllowed => status::INTERACTION_NOT_ALLOWED,
            KeyStoreError::InvalidPolicy(_) | KeyStoreError::UsageNotPermitted => status::PARAM,
            KeyStoreError::OperationFailed(_) | KeyStoreError::Corrupt(_) => {
                status::OPERATION_FAILED
            }
            KeyStoreError::Io(_) => status::IO,
        }
    }
}

/// Algorithms a store can perform with a private key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapAlgorithm {
    /// Cofactor ECDH + X9.63/SHA-256 KDF + AES-GCM, see [`crate::crypto::ecies`]
    EciesCofactorX963Sha256AesGcm,
}

/// Opaque reference to a private key held by a [`SecureKeyStore`]
///
/// Carries the tag and the public point only. A handle goes stale once the key it
/// was issued for is deleted or replaced.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyHandle {
    tag: String,
    public_key: PublicKey,
}

impl fmt::Debug for KeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyHandle")
            .field("tag", &self.tag)
            .field("public_key", &self.public_key.fingerprint())
            .finish()
    }
}

impl KeyHandle {
    pub fn tag(&self) -> &str {
        &self.tag
    }
}

/// Capability interface over hardware-backed or software key storage
///
/// At most one key exists per tag. `generate` refuses to overwrite; replacing a key
/// is delete-then-generate, which the caller must serialise.
pub trait SecureKeyStore: Send + Sync {
    /// Create a new P-256 key under `tag`
    fn generate(&self, tag: &str, policy: &AccessPolicy) -> Result<KeyHandle, KeyStoreError>;

    /// Remove the key under `tag`; succeeds when there is none
    fn delete(&self, tag: &str) -> Result<(), KeyStoreError>;

    /// Look up the key under `tag`
    fn find(&self, tag: &str) -> Result<KeyHandle, KeyStoreError>;

    /// X9.63 uncompressed public point of the key behind `handle`
    fn copy_public_key(&self, handle: &KeyHandle) -> Result<Vec<u8>, KeyStoreError>;

    /// Decrypt a wrapped blob with the private key behind `handle`
    fn unwrap_key(
        &self,
        handle: &KeyHandle,
        algorithm: WrapAlgorithm,
        blob: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, KeyStoreError>;
}

impl<S: SecureKeyStore + ?Sized> SecureKeyStore for Arc<S> {
    fn generate(&self, tag: &str, policy: &AccessPolicy) -> Result<KeyHandle, KeyStoreError> {
        (**self).generate(tag, policy)
    }

    fn delete(&self, tag: &str) -> Result<(), KeyStoreError> {
        (**self).delete(tag)
    }

    fn find(&self, tag: &str) -> Result<KeyHandle, KeyStoreError> {
        (**self).find(tag)
    }

    fn copy_public_key(&self, handle: &KeyHandle) -> Result<Vec<u8>, KeyStoreError> {
        (**self).copy_public_key(handle)
    }

    fn unwrap_key(
        &self,
        handle: &KeyHandle,
        algorithm: WrapAlgorithm,
        blob: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, KeyStoreError> {
        (**self).unwrap_key(handle, algorithm, blob)
    }
}

/// Simulated device lock shared by the software backends
#[derive(Debug)]
pub(crate) struct LockState {
    locked: AtomicBool,
    unlocked_once: AtomicBool,
}

impl Default for LockState {
    fn default() -> Self {
        Self {
            locked: AtomicBool::new(false),
            unlocked_once: AtomicBool::new(true),
        }
    }
}

impl LockState {
    pub(crate) fn lock(&self) {
        self.locked.store(true, Ordering::SeqCst);
    }

    pub(crate) fn unlock(&self) {
        self.locked.store(false, Ordering::SeqCst);
        self.unlocked_once.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_locked(&self) -> bool {
        self.locked.load(Ordering::SeqCst)
    }

    fn permits(&self, accessibility: Accessibility) -> bool {
        match accessibility {
            Accessibility::WhenUnlockedThisDeviceOnly => !self.is_locked(),
            Accessibility::AfterFirstUnlockThisDeviceOnly => {
                self.unlocked_once.load(Ordering::SeqCst)
            }
        }
    }
}

/// A private key together with the policy it was created under
///
/// Never leaves the `keystore` module.
pub(crate) struct StoredKey {
    secret: p256::SecretKey,
    public_key: PublicKey,
    policy: AccessPolicy,
}

impl StoredKey {
    pub(crate) fn generate(policy: &AccessPolicy) -> Self {
        let secret = p256::SecretKey::random(&mut OsRng);
        Self::from_parts(secret, *policy)
    }

    pub(crate) fn from_parts(secret: p256::SecretKey, policy: AccessPolicy) -> Self {
        let public_key = PublicKey::from(secret.public_key());
        Self {
            secret,
            public_key,
            policy,
        }
    }

    pub(crate) fn handle(&self, tag: &str) -> KeyHandle {
        KeyHandle {
            tag: tag.to_string(),
            public_key: self.public_key,
        }
    }

    pub(crate) fn secret(&self) -> &p256::SecretKey {
        &self.secret
    }

    pub(crate) fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Confirm `handle` was issued for this exact key
    pub(crate) fn check(&self, handle: &KeyHandle) -> Result<(), KeyStoreError> {
        if handle.public_key != self.public_key {
            return Err(KeyStoreError::StaleHandle(handle.tag.clone()));
        }
        Ok(())
    }

    pub(crate) fn public_bytes(&self) -> Vec<u8> {
        self.public_key.to_bytes().to_vec()
    }

    pub(crate) fn unwrap_key(
        &self,
        lock: &LockState,
        algorithm: WrapAlgorithm,
        blob: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, KeyStoreError> {
        if !lock.permits(self.policy.accessibility()) {
            return Err(KeyStoreError::InteractionNotAllowed);
        }
        if !self.policy.usage().contains(KeyUsage::PRIVATE_KEY_USAGE) {
            return Err(KeyStoreError::UsageNotPermitted);
        }

        match algorithm {
            WrapAlgorithm::EciesCofactorX963Sha256AesGcm => ecies::open(&self.secret, blob)
                .map(Zeroizing::new)
                .map_err(|e| KeyStoreError::OperationFailed(e.to_string())),
        }
    }
}
