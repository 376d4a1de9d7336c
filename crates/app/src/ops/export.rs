use std::path::PathBuf;

use clap::Args;

use common::error::EncryptionError;

use crate::state::{AppState, StateError};

/// Re-export the public key of the current key pair
#[derive(Args, Debug, Clone)]
pub struct Export {
    /// Also write the PEM here
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("export failed: {0}")]
    Encryption(#[from] EncryptionError),
    #[error("export task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("failed to write {0}: {1}")]
    Write(PathBuf, std::io::Error),
}

#[async_trait::async_trait]
impl crate::op::Op for Export {
    type Error = ExportError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = AppState::load(ctx.config_path.clone())?;
        let manager = state.key_manager()?;

        let pem = tokio::task::spawn_blocking(move || manager.export_public_key()).await??;

        match &self.output {
            Some(path) => {
                tokio::fs::write(path, &pem)
                    .await
                    .map_err(|e| ExportError::Write(path.clone(), e))?;
                Ok(format!("Public key written to: {}", path.display()))
            }
            None => Ok(pem.trim_end().to_string()),
        }
    }
}
