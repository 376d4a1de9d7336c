//! Envelope wire format
//!
//! An envelope is four length-prefixed chunks, in fixed order, big-endian:
//!
//! ```text
//! [u32 len][wrapped key   ]  ECIES blob, 65 + 32 + 16 bytes
//! [u32 len][nonce         ]  12 bytes
//! [u32 len][ciphertext    ]  same length as the plaintext
//! [u32 len][tag           ]  16 bytes
//! ```
//!
//! There is no magic number or version byte. Decoding is strict: the four
//! chunks must account for every input byte. Chunk contents are not validated
//! here; a chunk of the wrong size fails later, at decryption.

use bytes::{Buf, BufMut};

use crate::error::{EncryptionError, EncryptionResult};

/// Width of each chunk's length prefix
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// The four fields of an encrypted file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub wrapped_key: Vec<u8>,
    pub nonce: Vec<u8>,
    pub ciphertext: Vec<u8>,
    pub tag: Vec<u8>,
}

impl Envelope {
    pub fn encode(&self) -> EncryptionResult<Vec<u8>> {
        encode(&self.wrapped_key, &self.nonce, &self.ciphertext, &self.tag)
    }

    pub fn decode(data: &[u8]) -> EncryptionResult<Self> {
        decode(data)
    }
}

/// Frame the four chunks into one buffer
///
/// # Errors
///
/// `EncryptionFailed` if a chunk is too long for a 32-bit length prefix.
pub fn encode(
    wrapped_key: &[u8],
    nonce: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
) -> EncryptionResult<Vec<u8>> {
    let chunks = [wrapped_key, nonce, ciphertext, tag];
    let total = chunks
        .iter()
        .map(|chunk| LENGTH_PREFIX_SIZE + chunk.len())
        .sum();

    let mut out = Vec::with_capacity(total);
    for chunk in chunks {
        let len = u32::try_from(chunk.len()).map_err(|_| {
            EncryptionError::EncryptionFailed(format!(
                "chunk of {} bytes exceeds the envelope size limit",
                chunk.len()
            ))
        })?;
        out.put_u32(len);
        out.put_slice(chunk);
    }
    Ok(out)
}

/// Split an envelope back into its four chunks
pub fn decode(data: &[u8]) -> EncryptionResult<Envelope> {
    let mut buf = data;

    let wrapped_key = read_chunk(&mut buf)?;
    let nonce = read_chunk(&mut buf)?;
    let ciphertext = read_chunk(&mut buf)?;
    let tag = read_chunk(&mut buf)?;

    if buf.has_remaining() {
        return Err(EncryptionError::InvalidFileFormat(
            "trailing bytes after final chunk".to_string(),
        ));
    }

    Ok(Envelope {
        wrapped_key,
        nonce,
        ciphertext,
        tag,
    })
}

fn read_chunk(buf: &mut &[u8]) -> EncryptionResult<Vec<u8>> {
    if buf.remaining() < LENGTH_PREFIX_SIZE {
        return Err(EncryptionError::InvalidFileFormat(
            "missing length header".to_string(),
        ));
    }
    let len = buf.get_u32() as usize;
    if len > buf.remaining() {
        return Err(EncryptionError::InvalidFileFormat(
            "chunk length mismatch".to_string(),
        ));
    }

    let chunk = buf[..len].to_vec();
    buf.advance(len);
    Ok(chunk)
}
