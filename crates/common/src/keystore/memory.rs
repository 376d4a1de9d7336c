use std::collections::HashMap;

use parking_lot::RwLock;
use zeroize::Zeroizing;

use super::{
    AccessPolicy, KeyHandle, KeyStoreError, LockState, SecureKeyStore, StoredKey, WrapAlgorithm,
};

/// In-process key vault
///
/// Keys live only as long as the store. Useful for tests and for tools that
/// never need a key to outlive the process.
#[derive(Default)]
pub struct MemoryKeyStore {
    keys: RwLock<HashMap<String, StoredKey>>,
    lock: LockState,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the device locking; keys created `WhenUnlocked…` become unusable
    pub fn lock(&self) {
        self.lock.lock();
    }

    pub fn unlock(&self) {
        self.lock.unlock();
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }

    pub fn len(&self) -> usize {
        self.keys.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.read().is_empty()
    }
}

impl SecureKeyStore for MemoryKeyStore {
    fn generate(&self, tag: &str, policy: &AccessPolicy) -> Result<KeyHandle, KeyStoreError> {
        let mut keys = self.keys.write();
        if keys.contains_key(tag) {
            return Err(KeyStoreError::DuplicateItem(tag.to_string()));
        }

        let key = StoredKey::generate(policy);
        let handle = key.handle(tag);
        keys.insert(tag.to_string(), key);
        tracing::trace!(tag, "memory key store: generated key");
        Ok(handle)
    }

    fn delete(&self, tag: &str) -> Result<(), KeyStoreError> {
        if self.keys.write().remove(tag).is_some() {
            tracing::trace!(tag, "memory key store: deleted key");
        }
        Ok(())
    }

    fn find(&self, tag: &str) -> Result<KeyHandle, KeyStoreError> {
        self.keys
            .read()
            .get(tag)
            .map(|key| key.handle(tag))
            .ok_or_else(|| KeyStoreError::NotFound(tag.to_string()))
    }

    fn copy_public_key(&self, handle: &KeyHandle) -> Result<Vec<u8>, KeyStoreError> {
        let keys = self.keys.read();
        let key = keys
            .get(handle.tag())
            .ok_or_else(|| KeyStoreError::StaleHandle(handle.tag().to_string()))?;
        key.check(handle)?;
        Ok(key.public_bytes())
    }

    fn unwrap_key(
        &self,
        handle: &KeyHandle,
        algorithm: WrapAlgorithm,
        blob: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, KeyStoreError> {
        let keys = self.keys.read();
        let key = keys
            .get(handle.tag())
            .ok_or_else(|| KeyStoreError::StaleHandle(handle.tag().to_string()))?;
        key.check(handle)?;
        key.unwrap_key(&self.lock, algorithm, blob)
    }
}
