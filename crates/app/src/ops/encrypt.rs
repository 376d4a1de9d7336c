use std::path::{Path, PathBuf};

use clap::Args;

use common::error::EncryptionError;

pub const ENCRYPTED_EXTENSION: &str = "enc";

/// Encrypt a file to a recipient's PEM public key
#[derive(Args, Debug, Clone)]
pub struct Encrypt {
    /// File to encrypt
    #[arg(long, short)]
    pub input: PathBuf,

    /// Recipient public key (PEM)
    #[arg(long, short)]
    pub recipient: PathBuf,

    /// Where to write the envelope (defaults to <input>.enc)
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum EncryptError {
    #[error("failed to read {0}: {1}")]
    Read(PathBuf, std::io::Error),
    #[error("failed to write {0}: {1}")]
    Write(PathBuf, std::io::Error),
    #[error(transparent)]
    Encryption(#[from] EncryptionError),
    #[error("encryption task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// `photo.jpg` -> `photo.jpg.enc`
pub fn default_output(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_os_string();
    name.push(".");
    name.push(ENCRYPTED_EXTENSION);
    PathBuf::from(name)
}

#[async_trait::async_trait]
impl crate::op::Op for Encrypt {
    type Error = EncryptError;
    type Output = String;

    async fn execute(&self, _ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let plaintext = tokio::fs::read(&self.input)
            .await
            .map_err(|e| EncryptError::Read(self.input.clone(), e))?;
        let pem = tokio::fs::read_to_string(&self.recipient)
            .await
            .map_err(|e| EncryptError::Read(self.recipient.clone(), e))?;
        let recipient = common::export::parse(&pem)?;

        let plaintext_len = plaintext.len();
        let envelope =
            tokio::task::spawn_blocking(move || common::cipher::encrypt(&plaintext, &recipient))
                .await??;

        let output = self
            .output
            .clone()
            .unwrap_or_else(|| default_output(&self.input));
        tokio::fs::write(&output, &envelope)
            .await
            .map_err(|e| EncryptError::Write(output.clone(), e))?;

        tracing::info!(
            input = %self.input.display(),
            output = %output.display(),
            "encrypted file"
        );
        Ok(format!(
            "Encrypted {} bytes -> {} ({} bytes)",
            plaintext_len,
            output.display(),
            envelope.len()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_appends_extension() {
        assert_eq!(
            default_output(Path::new("/photos/beach.jpg")),
            PathBuf::from("/photos/beach.jpg.enc")
        );
        assert_eq!(default_output(Path::new("notes")), PathBuf::from("notes.enc"));
    }
}
