//! Integration tests for envelope decoding robustness

mod common;

use ::common::cipher::encrypt;
use ::common::envelope::decode;
use ::common::error::EncryptionError;
use proptest::prelude::*;

fn is_format_error<T>(result: &Result<T, EncryptionError>) -> bool {
    matches!(result, Err(EncryptionError::InvalidFileFormat(_)))
}

#[test]
fn test_structural_errors_through_decrypt() {
    let (manager, recipient, _temp) = common::setup_with_key();
    let cipher = manager.cipher();
    let sealed = encrypt(b"hello", &recipient).unwrap();

    assert!(is_format_error(&cipher.decrypt(&[])));
    assert!(is_format_error(&cipher.decrypt(&sealed[..2])));
    assert!(is_format_error(&cipher.decrypt(&sealed[..sealed.len() - 3])));

    let mut trailing = sealed.clone();
    trailing.extend_from_slice(b"junk");
    let result = cipher.decrypt(&trailing);
    assert!(
        matches!(&result, Err(EncryptionError::InvalidFileFormat(msg)) if msg == "trailing bytes after final chunk")
    );
}

#[test]
fn test_every_truncation_is_rejected() {
    let (_manager, recipient, _temp) = common::setup_with_key();
    let sealed = encrypt(b"truncate me", &recipient).unwrap();

    for len in 0..sealed.len() {
        assert!(
            is_format_error(&decode(&sealed[..len])),
            "truncation to {} bytes was accepted",
            len
        );
    }
    assert!(decode(&sealed).is_ok());
}

proptest! {
    /// Arbitrary bytes never panic the decoder; they decode or fail structurally
    #[test]
    fn decode_never_panics(data in proptest::collection::vec(any::<u8>(), 0..512)) {
        match decode(&data) {
            Ok(envelope) => {
                let consumed = 16
                    + envelope.wrapped_key.len()
                    + envelope.nonce.len()
                    + envelope.ciphertext.len()
                    + envelope.tag.len();
                prop_assert_eq!(consumed, data.len());
            }
            Err(err) => prop_assert!(matches!(err, EncryptionError::InvalidFileFormat(_))),
        }
    }
}
