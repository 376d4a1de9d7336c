//! ECIES key wrap over P-256
//!
//! Wire-compatible with the platform algorithm
//! `eciesEncryptionCofactorX963SHA256AESGCM`:
//!
//! 1. **Ephemeral key**: generate a P-256 keypair per wrap
//! 2. **Key agreement**: cofactor ECDH with the recipient key (P-256 has cofactor 1,
//!    so this is plain ECDH; the shared secret is the x-coordinate)
//! 3. **Key derivation**: ANSI X9.63 KDF with SHA-256, using the ephemeral public key
//!    as shared info, producing a 128-bit AES key
//! 4. **Encrypt**: AES-128-GCM with a 16-byte all-zero IV and no associated data
//!
//! # Wire Format
//!
//! ```text
//! [ ephemeral_pubkey: 65 bytes ][ ciphertext: len(plaintext) ][ tag: 16 bytes ]
//! ```
//!
//! The zero IV is sound only because every derived key encrypts exactly one message.

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{AeadInPlace, KeyInit, OsRng};
use aes_gcm::aes::Aes128;
use aes_gcm::AesGcm;
use p256::ecdh::EphemeralSecret;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::keys::{PublicKey, PUBLIC_KEY_SIZE};
use super::secret::TAG_SIZE;

/// AES-128-GCM with a 16-byte IV
type WrapCipher = AesGcm<Aes128, U16>;

/// Size of the derived AES key for a 256-bit curve
const WRAP_KEY_SIZE: usize = 16;
/// Fixed IV; every derived key is single-use
const WRAP_IV: [u8; 16] = [0u8; 16];
/// Bytes a wrapped blob adds on top of its plaintext
pub const WRAP_OVERHEAD: usize = PUBLIC_KEY_SIZE + TAG_SIZE;

/// Errors that can occur during key wrap / unwrap
#[derive(Debug, thiserror::Error)]
pub enum EciesError {
    #[error("wrapped blob too short, expected at least 81 bytes, got {0}")]
    TooShort(usize),
    #[error("invalid ephemeral public key")]
    InvalidEphemeralKey,
    #[error("AES-GCM wrap error")]
    Seal,
    #[error("AES-GCM unwrap error")]
    Open,
}

/// ANSI X9.63 key derivation with SHA-256
///
/// `out[i*32..]` is `SHA256(z || counter_be32 || shared_info)` with the counter
/// starting at 1.
pub fn x963_kdf(z: &[u8], shared_info: &[u8], out: &mut [u8]) {
    for (index, block) in out.chunks_mut(32).enumerate() {
        let counter = (index as u32) + 1;
        let digest = Sha256::new()
            .chain_update(z)
            .chain_update(counter.to_be_bytes())
            .chain_update(shared_info)
            .finalize();
        block.copy_from_slice(&digest[..block.len()]);
    }
}

fn derive_wrap_key(z: &[u8], ephemeral: &[u8]) -> Zeroizing<[u8; WRAP_KEY_SIZE]> {
    let mut key = Zeroizing::new([0u8; WRAP_KEY_SIZE]);
    x963_kdf(z, ephemeral, &mut key[..]);
    key
}

/// Encrypt `plaintext` so that only the holder of `recipient`'s private key can read it
pub fn seal(recipient: &PublicKey, plaintext: &[u8]) -> Result<Vec<u8>, EciesError> {
    let ephemeral = EphemeralSecret::random(&mut OsRng);
    let ephemeral_public = PublicKey::from(ephemeral.public_key()).to_bytes();

    let shared = ephemeral.diffie_hellman(recipient.as_inner());
    let key = derive_wrap_key(shared.raw_secret_bytes(), &ephemeral_public);

    let cipher = WrapCipher::new(GenericArray::from_slice(&key[..]));
    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(GenericArray::from_slice(&WRAP_IV), b"", &mut buffer)
        .map_err(|_| EciesError::Seal)?;

    let mut out = Vec::with_capacity(WRAP_OVERHEAD + plaintext.len());
    out.extend_from_slice(&ephemeral_public);
    out.extend_from_slice(&buffer);
    out.extend_from_slice(tag.as_slice());
    Ok(out)
}

/// Reverse [`seal`] with the recipient's private key
///
/// Only key stores call this; private keys never leave them.
pub(crate) fn open(recipient: &p256::SecretKey, blob: &[u8]) -> Result<Vec<u8>, EciesError> {
    if blob.len() < WRAP_OVERHEAD {
        return Err(EciesError::TooShort(blob.len()));
    }

    let (ephemeral_bytes, rest) = blob.split_at(PUBLIC_KEY_SIZE);
    let (ciphertext, tag) = rest.split_at(rest.len() - TAG_SIZE);

    let ephemeral =
        PublicKey::from_x963(ephemeral_bytes).map_err(|_| EciesError::InvalidEphemeralKey)?;
    let shared = p256::ecdh::diffie_hellman(
        recipient.to_nonzero_scalar(),
        ephemeral.as_inner().as_affine(),
    );
    let key = derive_wrap_key(shared.raw_secret_bytes(), ephemeral_bytes);

    let cipher = WrapCipher::new(GenericArray::from_slice(&key[..]));
    let mut buffer = ciphertext.to_vec();
    cipher
        .decrypt_in_place_detached(
            GenericArray::from_slice(&WRAP_IV),
            b"",
            &mut buffer,
            GenericArray::from_slice(tag),
        )
        .map_err(|_| EciesError::Open)?;
    Ok(buffer)
}

#[cfg(test)]
mod test {
    use super::*;

    fn recipient() -> (p256::SecretKey, PublicKey) {
        let secret = p256::SecretKey::random(&mut OsRng);
        let public = PublicKey::from(secret.public_key());
        (secret, public)
    }

    #[test]
    fn test_seal_open() {
        let (secret, public) = recipient();
        let key = [42u8; 32];

        let blob = seal(&public, &key).unwrap();
        assert_eq!(blob.len(), WRAP_OVERHEAD + key.len());
        assert_eq!(blob[0], 0x04);

        let opened = open(&secret, &blob).unwrap();
        assert_eq!(opened, key);
    }

    #[test]
    fn test_wrong_recipient_fails() {
        let (_, alice_public) = recipient();
        let (bob_secret, _) = recipient();

        let blob = seal(&alice_public, &[1u8; 32]).unwrap();
        assert!(matches!(open(&bob_secret, &blob), Err(EciesError::Open)));
    }

    #[test]
    fn test_ephemeral_key_is_fresh() {
        let (_, public) = recipient();
        let a = seal(&public, &[9u8; 32]).unwrap();
        let b = seal(&public, &[9u8; 32]).unwrap();
        assert_ne!(a[..PUBLIC_KEY_SIZE], b[..PUBLIC_KEY_SIZE]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_short_blob_rejected() {
        let (secret, _) = recipient();
        let result = open(&secret, &[0x04; WRAP_OVERHEAD - 1]);
        assert!(matches!(result, Err(EciesError::TooShort(80))));
    }

    #[test]
    fn test_tampered_blob_rejected() {
        let (secret, public) = recipient();
        let blob = seal(&public, &[5u8; 32]).unwrap();

        for index in [PUBLIC_KEY_SIZE, PUBLIC_KEY_SIZE + 31, blob.len() - 1] {
            let mut tampered = blob.clone();
            tampered[index] ^= 0x01;
            assert!(open(&secret, &tampered).is_err());
        }

        // A corrupted ephemeral point is either off-curve or a different point
        let mut tampered = blob.clone();
        tampered[10] ^= 0x01;
        assert!(open(&secret, &tampered).is_err());
    }

    #[test]
    fn test_kdf_blocks() {
        let z = [0xabu8; 32];
        let info = b"shared-info";

        let mut long = [0u8; 48];
        x963_kdf(&z, info, &mut long);

        let first = Sha256::new()
            .chain_update(z)
            .chain_update(1u32.to_be_bytes())
            .chain_update(info)
            .finalize();
        let second = Sha256::new()
            .chain_update(z)
            .chain_update(2u32.to_be_bytes())
            .chain_update(info)
            .finalize();
        assert_eq!(&long[..32], first.as_slice());
        assert_eq!(&long[32..], &second[..16]);

        // Shorter outputs are prefixes of longer ones
        let mut short = [0u8; WRAP_KEY_SIZE];
        x963_kdf(&z, info, &mut short);
        assert_eq!(short, long[..WRAP_KEY_SIZE]);
    }
}
