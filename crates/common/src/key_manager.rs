use std::sync::Arc;

use parking_lot::Mutex;

use crate::cipher::HybridCipher;
use crate::crypto::PublicKey;
use crate::error::{EncryptionError, EncryptionResult};
use crate::export::PublicKeyExporter;
use crate::keystore::{
    AccessPolicy, Accessibility, KeyHandle, KeyStoreError, KeyUsage, SecureKeyStore,
};

/// Application tag the key pair lives under unless configured otherwise
pub const DEFAULT_KEY_TAG: &str = "com.behtis.photoLock";

/// Owns the lifecycle of the single key pair stored under `tag`
///
/// There is at most one live key pair per tag. Generating a new one first deletes
/// the old one, which makes every envelope encrypted to the old public key
/// undecryptable.
///
/// Mutations (`generate_key_pair`, `export_public_key`, `delete_key_pair`) are
/// serialised on an internal mutex. Encrypt and decrypt through [`KeyManager::cipher`] take no lock.
pub struct KeyManager<S> {
    store: Arc<S>,
    tag: String,
    exporter: PublicKeyExporter,
    accessibility: Accessibility,
    usage: KeyUsage,
    mutation: Mutex<()>,
}

impl<S: SecureKeyStore> KeyManager<S> {
    pub fn new(store: S, tag: impl Into<String>, exporter: PublicKeyExporter) -> Self {
        Self {
            store: Arc::new(store),
            tag: tag.into(),
            exporter,
            accessibility: Accessibility::WhenUnlockedThisDeviceOnly,
            usage: KeyUsage::PRIVATE_KEY_USAGE,
            mutation: Mutex::new(()),
        }
    }

    /// Override the access policy used for newly generated keys
    pub fn with_policy(mut self, accessibility: Accessibility, usage: KeyUsage) -> Self {
        self.accessibility = accessibility;
        self.usage = usage;
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn exporter(&self) -> &PublicKeyExporter {
        &self.exporter
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Replace the key pair under the tag and export the new public key
    ///
    /// Not atomic: on failure the previous key may already be gone. Callers retry
    /// rather than expect a rollback.
    pub fn generate_key_pair(&self) -> EncryptionResult<PublicKey> {
        let _guard = self.mutation.lock();

        self.store
            .delete(&self.tag)
            .map_err(|e| EncryptionError::KeyCreationFailed(e.to_string()))?;
        self.exporter.remove()?;

        let policy = AccessPolicy::new(self.accessibility, self.usage)
            .map_err(|_| EncryptionError::AccessControlCreationFailed)?;
        let handle = self
            .store
            .generate(&self.tag, &policy)
            .map_err(|e| EncryptionError::KeyCreationFailed(e.to_string()))?;

        let public_key = self
            .extract_public_key(&handle)
            .ok_or(EncryptionError::PublicKeyExtractionFailed)?;
        self.exporter.export(&public_key.to_bytes())?;

        tracing::info!(
            tag = %self.tag,
            fingerprint = %public_key.fingerprint(),
            "generated key pair"
        );
        Ok(public_key)
    }

    /// Rebuild the PEM export from the live key, persist it and return it
    pub fn export_public_key(&self) -> EncryptionResult<String> {
        let _guard = self.mutation.lock();
        let public_key = self.public_key()?;
        self.exporter.export(&public_key.to_bytes())
    }

    /// Public half of the live key pair
    pub fn public_key(&self) -> EncryptionResult<PublicKey> {
        let handle = self
            .store
            .find(&self.tag)
            .map_err(EncryptionError::key_not_found)?;
        self.extract_public_key(&handle)
            .ok_or(EncryptionError::PublicKeyExtractionFailed)
    }

    /// Remove the key pair; succeeds when there is none
    pub fn delete_key_pair(&self) -> Result<(), KeyStoreError> {
        let _guard = self.mutation.lock();
        self.store.delete(&self.tag)?;
        tracing::info!(tag = %self.tag, "deleted key pair");
        Ok(())
    }

    /// Cipher bound to this manager's store and tag
    pub fn cipher(&self) -> HybridCipher<Arc<S>> {
        HybridCipher::new(self.store.clone(), self.tag.clone())
    }

    fn extract_public_key(&self, handle: &KeyHandle) -> Option<PublicKey> {
        let raw = self.store.copy_public_key(handle).ok()?;
        PublicKey::from_x963(&raw).ok()
    }
}
