//! Integration tests for key lifecycle: wrong keys, regeneration and PEM export

mod common;

use ::common::cipher::{encrypt, HybridCipher};
use ::common::error::EncryptionError;
use ::common::export::{self, PublicKeyExporter};
use ::common::key_manager::{KeyManager, DEFAULT_KEY_TAG};
use ::common::keystore::{Accessibility, KeyUsage, MemoryKeyStore, SecureKeyStore};

#[test]
fn test_wrong_key_rejected() {
    let (alice, alice_public, _a) = common::setup_with_key();
    let (bob, _bob_public, _b) = common::setup_with_key();

    let sealed = encrypt(b"for alice only", &alice_public).unwrap();
    assert!(matches!(
        bob.cipher().decrypt(&sealed),
        Err(EncryptionError::DecryptionFailed)
    ));
    assert_eq!(alice.cipher().decrypt(&sealed).unwrap(), b"for alice only");
}

#[test]
fn test_regeneration_invalidates_old_envelopes() {
    let (manager, first_public, _temp) = common::setup_with_key();
    let old = encrypt(b"before rotation", &first_public).unwrap();
    assert!(manager.cipher().decrypt(&old).is_ok());

    manager.generate_key_pair().unwrap();
    let second_public = manager.exporter().load().unwrap();
    assert_ne!(first_public, second_public);

    assert!(matches!(
        manager.cipher().decrypt(&old),
        Err(EncryptionError::DecryptionFailed)
    ));

    let new = encrypt(b"after rotation", &second_public).unwrap();
    assert_eq!(manager.cipher().decrypt(&new).unwrap(), b"after rotation");
}

#[test]
fn test_cipher_created_before_rotation_uses_live_key() {
    let (manager, _, _temp) = common::setup_with_key();
    let cipher = manager.cipher();

    manager.generate_key_pair().unwrap();
    let recipient = manager.exporter().load().unwrap();
    let sealed = encrypt(b"x", &recipient).unwrap();
    assert_eq!(cipher.decrypt(&sealed).unwrap(), b"x");
}

#[test]
fn test_decrypt_without_key() {
    let (manager, recipient, _temp) = common::setup_with_key();
    let sealed = encrypt(b"orphan", &recipient).unwrap();
    manager.delete_key_pair().unwrap();

    assert!(matches!(
        manager.cipher().decrypt(&sealed),
        Err(EncryptionError::KeyNotFound(-25300))
    ));
}

#[test]
fn test_pem_roundtrip_of_generated_keys() {
    for _ in 0..8 {
        let (manager, _temp) = common::setup_manager();
        let public_key = manager.generate_key_pair().unwrap();
        let raw = public_key.to_bytes();

        let pem = export::to_pem(&raw);
        assert_eq!(export::parse(&pem).unwrap(), raw);
        assert_eq!(std::fs::read_to_string(manager.exporter().path()).unwrap(), pem);
        assert_eq!(manager.export_public_key().unwrap(), pem);
    }
}

#[test]
fn test_generation_replaces_stale_export() {
    let (manager, _temp) = common::setup_manager();
    std::fs::write(manager.exporter().path(), "stale").unwrap();

    manager.generate_key_pair().unwrap();
    let text = std::fs::read_to_string(manager.exporter().path()).unwrap();
    assert!(text.starts_with("-----BEGIN PUBLIC KEY-----\n"));
}

#[test]
fn test_access_policy_failure() {
    let (manager, _temp) = common::setup_manager();
    let manager = manager.with_policy(Accessibility::AfterFirstUnlockThisDeviceOnly, KeyUsage::empty());

    assert!(matches!(
        manager.generate_key_pair(),
        Err(EncryptionError::AccessControlCreationFailed)
    ));
    assert!(manager.store().is_empty());
}

#[test]
fn test_export_write_failure() {
    let temp = tempfile::TempDir::new().unwrap();
    let blocker = temp.path().join("not-a-dir");
    std::fs::write(&blocker, b"").unwrap();

    let manager = KeyManager::new(
        MemoryKeyStore::new(),
        DEFAULT_KEY_TAG,
        PublicKeyExporter::new(blocker.join("public_key.pem")),
    );
    assert!(matches!(
        manager.generate_key_pair(),
        Err(EncryptionError::FileWriteFailed(_))
    ));
}

#[test]
fn test_cipher_over_shared_store() {
    let (manager, recipient, _temp) = common::setup_with_key();
    let cipher = HybridCipher::new(manager.store().clone(), manager.tag());
    assert!(manager.store().find(DEFAULT_KEY_TAG).is_ok());

    let sealed = encrypt(b"shared", &recipient).unwrap();
    assert_eq!(cipher.decrypt(&sealed).unwrap(), b"shared");
}
