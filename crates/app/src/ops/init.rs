use clap::Args;

use crate::state::{AppConfig, AppState, KeyStoreConfig};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Tag the key pair is stored under
    #[arg(long, default_value = common::key_manager::DEFAULT_KEY_TAG)]
    pub key_tag: String,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] crate::state::StateError),
}

#[async_trait::async_trait]
impl crate::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = AppConfig {
            key_tag: self.key_tag.clone(),
            ..AppConfig::default()
        };

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;

        let KeyStoreConfig::File { path } = &state.config.keystore;
        let keystore_str = path
            .as_ref()
            .unwrap_or(&state.keys_path)
            .display()
            .to_string();

        let output = format!(
            "Initialized photolock directory at: {}\n\
             - Config: {}\n\
             - Key store: {}\n\
             - Key tag: {}\n\
             - Public key export: {}\n\
             Run 'photolock keygen' to create a key pair",
            state.photolock_dir.display(),
            state.config_path.display(),
            keystore_str,
            state.config.key_tag,
            state.public_key_path.display(),
        );

        Ok(output)
    }
}
