use clap::Args;

use common::error::EncryptionError;

use crate::state::{AppState, StateError};

/// Replace the key pair and export its public key
#[derive(Args, Debug, Clone)]
pub struct Keygen;

#[derive(Debug, thiserror::Error)]
pub enum KeygenError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("key generation failed: {0}")]
    Encryption(#[from] EncryptionError),
    #[error("key generation task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[async_trait::async_trait]
impl crate::op::Op for Keygen {
    type Error = KeygenError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = AppState::load(ctx.config_path.clone())?;
        let manager = state.key_manager()?;

        let (public_key, pem) = tokio::task::spawn_blocking(move || {
            let public_key = manager.generate_key_pair()?;
            let pem = common::export::to_pem(&public_key.to_bytes());
            Ok::<_, EncryptionError>((public_key, pem))
        })
        .await??;

        Ok(format!(
            "Generated key pair {}\nPublic key written to: {}\n\n{}",
            public_key.fingerprint(),
            state.public_key_path.display(),
            pem.trim_end()
        ))
    }
}
