use std::fmt;

use p256::elliptic_curve::sec1::ToEncodedPoint;
use sha2::{Digest, Sha256};

/// Size of an X9.63 uncompressed P-256 point in bytes
pub const PUBLIC_KEY_SIZE: usize = 65;
/// Leading byte of an uncompressed SEC1 / X9.63 point
const UNCOMPRESSED_POINT_TAG: u8 = 0x04;

/// Errors that can occur while decoding a public key
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("invalid public key size, expected {expected}, got {actual}")]
    InvalidSize { expected: usize, actual: usize },
    #[error("public key is not an uncompressed point")]
    NotUncompressed,
    #[error("public key is not a point on P-256")]
    NotOnCurve,
}

/// A recipient's P-256 public key
///
/// The only external representation is the 65-byte X9.63 uncompressed point, which is
/// what gets PEM-wrapped for export and what `encrypt` accepts.
///
/// # Examples
///
/// ```ignore
/// let key = PublicKey::from_x963(&raw)?;
/// assert_eq!(key.to_bytes().as_slice(), raw.as_slice());
/// ```
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(p256::PublicKey);

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PublicKey").field(&self.fingerprint()).finish()
    }
}

impl From<p256::PublicKey> for PublicKey {
    fn from(key: p256::PublicKey) -> Self {
        PublicKey(key)
    }
}

impl TryFrom<&[u8]> for PublicKey {
    type Error = KeyError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_x963(bytes)
    }
}

impl PublicKey {
    /// Decode a public key from its X9.63 uncompressed encoding
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not 65 bytes, does not start with `0x04`,
    /// or does not describe a point on the curve.
    pub fn from_x963(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != PUBLIC_KEY_SIZE {
            return Err(KeyError::InvalidSize {
                expected: PUBLIC_KEY_SIZE,
                actual: bytes.len(),
            });
        }
        if bytes[0] != UNCOMPRESSED_POINT_TAG {
            return Err(KeyError::NotUncompressed);
        }
        let key = p256::PublicKey::from_sec1_bytes(bytes).map_err(|_| KeyError::NotOnCurve)?;
        Ok(PublicKey(key))
    }

    /// Encode as a 65-byte X9.63 uncompressed point
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        let point = self.0.to_encoded_point(false);
        let mut out = [0u8; PUBLIC_KEY_SIZE];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// Convert public key to hexadecimal string
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Short, stable identifier for logs: the first 8 bytes of SHA-256 over the point
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.to_bytes());
        hex::encode(&digest[..8])
    }

    pub(crate) fn as_inner(&self) -> &p256::PublicKey {
        &self.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use aes_gcm::aead::OsRng;

    fn random_point() -> [u8; PUBLIC_KEY_SIZE] {
        let secret = p256::SecretKey::random(&mut OsRng);
        PublicKey::from(secret.public_key()).to_bytes()
    }

    #[test]
    fn test_x963_roundtrip() {
        let raw = random_point();
        assert_eq!(raw[0], UNCOMPRESSED_POINT_TAG);

        let key = PublicKey::from_x963(&raw).unwrap();
        assert_eq!(key.to_bytes(), raw);

        let hex = key.to_hex();
        assert_eq!(hex.len(), PUBLIC_KEY_SIZE * 2);
    }

    #[test]
    fn test_rejects_wrong_size() {
        let raw = random_point();
        let result = PublicKey::from_x963(&raw[..64]);
        assert!(matches!(
            result,
            Err(KeyError::InvalidSize {
                expected: 65,
                actual: 64
            })
        ));
    }

    #[test]
    fn test_rejects_compressed_tag() {
        let mut raw = random_point();
        raw[0] = 0x02;
        assert!(matches!(
            PublicKey::from_x963(&raw),
            Err(KeyError::NotUncompressed)
        ));
    }

    #[test]
    fn test_rejects_point_off_curve() {
        let mut raw = random_point();
        // Nudging Y moves the point off the curve
        raw[64] ^= 0x01;
        assert!(matches!(
            PublicKey::from_x963(&raw),
            Err(KeyError::NotOnCurve)
        ));
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let key = PublicKey::from_x963(&random_point()).unwrap();
        assert_eq!(key.fingerprint(), key.fingerprint());
        assert_eq!(key.fingerprint().len(), 16);
        assert_ne!(
            key.fingerprint(),
            PublicKey::from_x963(&random_point()).unwrap().fingerprint()
        );
    }
}
