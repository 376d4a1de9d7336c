use std::path::{Path, PathBuf};

use clap::Args;

use common::error::EncryptionError;

use super::encrypt::ENCRYPTED_EXTENSION;
use crate::state::{AppState, StateError};

const DECRYPTED_EXTENSION: &str = "dec";

/// Decrypt an envelope addressed to the local key pair
#[derive(Args, Debug, Clone)]
pub struct Decrypt {
    /// Envelope to decrypt
    #[arg(long, short)]
    pub input: PathBuf,

    /// Where to write the plaintext (defaults to <input> without `.enc`, or <input>.dec)
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum DecryptError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("failed to read {0}: {1}")]
    Read(PathBuf, std::io::Error),
    #[error("failed to write {0}: {1}")]
    Write(PathBuf, std::io::Error),
    #[error(transparent)]
    Encryption(#[from] EncryptionError),
    #[error("decryption task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// `photo.jpg.enc` -> `photo.jpg`, anything else -> `<input>.dec`
pub fn default_output(input: &Path) -> PathBuf {
    if input.extension().is_some_and(|ext| ext == ENCRYPTED_EXTENSION) {
        return input.with_extension("");
    }
    let mut name = input.as_os_str().to_os_string();
    name.push(".");
    name.push(DECRYPTED_EXTENSION);
    PathBuf::from(name)
}

#[async_trait::async_trait]
impl crate::op::Op for Decrypt {
    type Error = DecryptError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = AppState::load(ctx.config_path.clone())?;
        let cipher = state.key_manager()?.cipher();

        let envelope = tokio::fs::read(&self.input)
            .await
            .map_err(|e| DecryptError::Read(self.input.clone(), e))?;
        let plaintext = tokio::task::spawn_blocking(move || cipher.decrypt(&envelope)).await??;

        let output = self
            .output
            .clone()
            .unwrap_or_else(|| default_output(&self.input));
        tokio::fs::write(&output, &plaintext)
            .await
            .map_err(|e| DecryptError::Write(output.clone(), e))?;

        tracing::info!(
            input = %self.input.display(),
            output = %output.display(),
            "decrypted file"
        );
        Ok(format!(
            "Decrypted {} bytes -> {}",
            plaintext.len(),
            output.display()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_strips_extension() {
        assert_eq!(
            default_output(Path::new("/photos/beach.jpg.enc")),
            PathBuf::from("/photos/beach.jpg")
        );
        assert_eq!(
            default_output(Path::new("/photos/beach.jpg")),
            PathBuf::from("/photos/beach.jpg.dec")
        );
        assert_eq!(default_output(Path::new("blob")), PathBuf::from("blob.dec"));
    }
}
