//! Cryptographic primitives for PhotoLock
//!
//! Two layers make up the hybrid scheme:
//!
//! - **Bulk encryption**: every payload is sealed with a fresh AES-256-GCM [`Secret`]
//!   and a fresh 96-bit nonce. The tag is kept detached so the envelope can carry it
//!   as its own chunk.
//! - **Key wrap**: the 32-byte secret is encrypted to the recipient's P-256 public key
//!   with ECIES (cofactor ECDH, X9.63 KDF over SHA-256, AES-GCM). See [`ecies`].
//!
//! Public keys travel as X9.63 uncompressed points (`0x04 || X || Y`). Private keys
//! never appear here as values; they stay behind a
//! [`SecureKeyStore`](crate::keystore::SecureKeyStore).

pub mod ecies;
mod keys;
mod secret;

pub use ecies::{EciesError, WRAP_OVERHEAD};
pub use keys::{KeyError, PublicKey, PUBLIC_KEY_SIZE};
pub use secret::{Nonce, Sealed, Secret, SecretError, NONCE_SIZE, SECRET_SIZE, TAG_SIZE};
