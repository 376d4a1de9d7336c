//! Public-key export in PEM form
//!
//! The PEM container is the only interchange format for recipient keys:
//!
//! ```text
//! -----BEGIN PUBLIC KEY-----
//! <base64 of the 65-byte X9.63 point, 64 chars per line>
//! -----END PUBLIC KEY-----
//! ```

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use pem::{EncodeConfig, LineEnding, Pem};

use crate::error::{EncryptionError, EncryptionResult};

pub const PEM_LABEL: &str = "PUBLIC KEY";
/// Default file name for the export inside the state directory
pub const PUBLIC_KEY_FILE_NAME: &str = "public_key.pem";

/// Encode raw public key bytes as PEM text
pub fn to_pem(raw: &[u8]) -> String {
    let pem = Pem::new(PEM_LABEL, raw.to_vec());
    pem::encode_config(&pem, EncodeConfig::new().set_line_ending(LineEnding::LF))
}

/// Recover raw bytes from PEM text
///
/// Every line starting with `-----` is dropped and the rest is base64-decoded.
/// The label itself is not checked.
pub fn parse(text: &str) -> EncryptionResult<Vec<u8>> {
    let body: String = text
        .lines()
        .filter(|line| !line.starts_with("-----"))
        .map(str::trim)
        .collect();

    let raw = STANDARD
        .decode(body.as_bytes())
        .map_err(|e| EncryptionError::InvalidFileFormat(format!("invalid base64: {}", e)))?;
    if raw.is_empty() {
        return Err(EncryptionError::InvalidFileFormat(
            "PEM contains no key data".to_string(),
        ));
    }
    Ok(raw)
}

/// Persists the PEM export of the current public key at a fixed path
#[derive(Debug, Clone)]
pub struct PublicKeyExporter {
    path: PathBuf,
}

impl PublicKeyExporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the PEM for `raw` and return it
    pub fn export(&self, raw: &[u8]) -> EncryptionResult<String> {
        let text = to_pem(raw);
        self.write(&text)
            .map_err(|e| EncryptionError::FileWriteFailed(format!("{}: {}", self.path.display(), e)))?;
        tracing::debug!(path = %self.path.display(), bytes = raw.len(), "exported public key");
        Ok(text)
    }

    /// Delete a previous export; a missing file is fine
    pub fn remove(&self) -> EncryptionResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(EncryptionError::FileWriteFailed(format!(
                "{}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    /// Read back and parse the persisted export
    pub fn load(&self) -> EncryptionResult<Vec<u8>> {
        let text = fs::read_to_string(&self.path).map_err(|e| {
            EncryptionError::InvalidFileFormat(format!("{}: {}", self.path.display(), e))
        })?;
        parse(&text)
    }

    fn write(&self, text: &str) -> std::io::Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        file.write_all(text.as_bytes())?;
        file.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample_point() -> Vec<u8> {
        let mut raw = vec![0x04u8];
        raw.extend((1..=64u8).collect::<Vec<_>>());
        raw
    }

    #[test]
    fn test_pem_layout() {
        let text = to_pem(&sample_point());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.first(), Some(&"-----BEGIN PUBLIC KEY-----"));
        assert_eq!(lines.last(), Some(&"-----END PUBLIC KEY-----"));
        // 65 bytes -> 88 base64 chars -> 64 + 24
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1].len(), 64);
        assert_eq!(lines[2].len(), 24);
        assert!(!text.contains('\r'));
    }

    #[test]
    fn test_pem_roundtrip() {
        let raw = sample_point();
        assert_eq!(parse(&to_pem(&raw)).unwrap(), raw);
    }

    #[test]
    fn test_parse_tolerates_crlf() {
        let raw = sample_point();
        let text = to_pem(&raw).replace('\n', "\r\n");
        assert_eq!(parse(&text).unwrap(), raw);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            parse("-----BEGIN PUBLIC KEY-----\n!!!not base64!!!\n-----END PUBLIC KEY-----\n"),
            Err(EncryptionError::InvalidFileFormat(_))
        ));
        assert!(matches!(
            parse("-----BEGIN PUBLIC KEY-----\n-----END PUBLIC KEY-----\n"),
            Err(EncryptionError::InvalidFileFormat(_))
        ));
        assert!(matches!(parse(""), Err(EncryptionError::InvalidFileFormat(_))));
    }

    #[test]
    fn test_exporter_write_load_remove() {
        let temp = tempfile::TempDir::new().unwrap();
        let exporter = PublicKeyExporter::new(temp.path().join("nested").join(PUBLIC_KEY_FILE_NAME));
        let raw = sample_point();

        let text = exporter.export(&raw).unwrap();
        assert_eq!(fs::read_to_string(exporter.path()).unwrap(), text);
        assert_eq!(exporter.load().unwrap(), raw);

        exporter.remove().unwrap();
        assert!(!exporter.path().exists());
        exporter.remove().unwrap();
        assert!(matches!(
            exporter.load(),
            Err(EncryptionError::InvalidFileFormat(_))
        ));
    }

    #[test]
    fn test_export_to_unwritable_path_fails() {
        let temp = tempfile::TempDir::new().unwrap();
        // parent is a regular file
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, b"x").unwrap();
        let exporter = PublicKeyExporter::new(blocker.join(PUBLIC_KEY_FILE_NAME));

        assert!(matches!(
            exporter.export(&sample_point()),
            Err(EncryptionError::FileWriteFailed(_))
        ));
    }
}
