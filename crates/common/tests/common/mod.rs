//! Shared test utilities for encryption integration tests
#![allow(dead_code)]

use common::export::{PublicKeyExporter, PUBLIC_KEY_FILE_NAME};
use common::key_manager::{KeyManager, DEFAULT_KEY_TAG};
use common::keystore::MemoryKeyStore;
use tempfile::TempDir;

/// A key manager over a fresh in-memory store, exporting into a temp dir
pub fn setup_manager() -> (KeyManager<MemoryKeyStore>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let exporter = PublicKeyExporter::new(temp_dir.path().join(PUBLIC_KEY_FILE_NAME));
    let manager = KeyManager::new(MemoryKeyStore::new(), DEFAULT_KEY_TAG, exporter);
    (manager, temp_dir)
}

/// Same as [`setup_manager`] with a key pair already generated.
/// Returns the raw public key recovered from the PEM export.
pub fn setup_with_key() -> (KeyManager<MemoryKeyStore>, Vec<u8>, TempDir) {
    let (manager, temp_dir) = setup_manager();
    manager.generate_key_pair().unwrap();
    let recipient = manager.exporter().load().unwrap();
    (manager, recipient, temp_dir)
}

/// Flip one bit of `data` at `bit` (counted from the first byte's LSB)
pub fn flip_bit(data: &[u8], bit: usize) -> Vec<u8> {
    let mut out = data.to_vec();
    out[bit / 8] ^= 1 << (bit % 8);
    out
}
