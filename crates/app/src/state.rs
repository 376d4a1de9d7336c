use std::str::FromStr;
use std::sync::Arc;
use std::{fs, path::PathBuf};

use common::prelude::*;
use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "photolock";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const KEYS_DIR_NAME: &str = "keys";

/// Key manager over whichever backend the config selects
pub type AppKeyManager = KeyManager<Arc<dyn SecureKeyStore>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Tag the key pair is stored under
    #[serde(default = "default_key_tag")]
    pub key_tag: String,
    /// File name of the PEM export, relative to the state directory
    #[serde(default = "default_public_key_file")]
    pub public_key_file: String,
    /// Default log level; `RUST_LOG` takes precedence
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Write daily rolling log files here as well as to stderr
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    #[serde(default)]
    pub keystore: KeyStoreConfig,
}

fn default_key_tag() -> String {
    DEFAULT_KEY_TAG.to_string()
}

fn default_public_key_file() -> String {
    PUBLIC_KEY_FILE_NAME.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            key_tag: default_key_tag(),
            public_key_file: default_public_key_file(),
            log_level: default_log_level(),
            log_dir: None,
            keystore: KeyStoreConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn log_level(&self) -> Result<tracing::Level, StateError> {
        tracing::Level::from_str(&self.log_level)
            .map_err(|_| StateError::InvalidConfig(format!("unknown log level {:?}", self.log_level)))
    }
}

/// Where private keys are kept
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KeyStoreConfig {
    /// One owner-only file per key
    File {
        /// Key directory (defaults to <state dir>/keys/)
        path: Option<PathBuf>,
    },
}

impl Default for KeyStoreConfig {
    fn default() -> Self {
        KeyStoreConfig::File { path: None }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the photolock directory (~/.photolock)
    pub photolock_dir: PathBuf,
    /// Path to the default key store directory
    pub keys_path: PathBuf,
    /// Path to the public key export
    pub public_key_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the photolock directory path (custom or default ~/.photolock)
    pub fn photolock_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new photolock state directory
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let photolock_dir = Self::photolock_dir(custom_path)?;

        if photolock_dir.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&photolock_dir)?;

        let keys_path = photolock_dir.join(KEYS_DIR_NAME);
        fs::create_dir_all(&keys_path)?;

        let config = config.unwrap_or_default();
        config.log_level()?;
        let config_path = photolock_dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        let public_key_path = photolock_dir.join(&config.public_key_file);

        Ok(Self {
            photolock_dir,
            keys_path,
            public_key_path,
            config_path,
            config,
        })
    }

    /// Load existing state from the photolock directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let photolock_dir = Self::photolock_dir(custom_path)?;

        if !photolock_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let keys_path = photolock_dir.join(KEYS_DIR_NAME);
        let config_path = photolock_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;
        let public_key_path = photolock_dir.join(&config.public_key_file);

        Ok(Self {
            photolock_dir,
            keys_path,
            public_key_path,
            config_path,
            config,
        })
    }

    /// Open the configured key store and wrap it in a key manager
    pub fn key_manager(&self) -> Result<AppKeyManager, StateError> {
        let store: Arc<dyn SecureKeyStore> = match &self.config.keystore {
            KeyStoreConfig::File { path } => {
                let dir = path.clone().unwrap_or_else(|| self.keys_path.clone());
                Arc::new(FileKeyStore::open(dir)?)
            }
        };

        Ok(KeyManager::new(
            store,
            self.config.key_tag.clone(),
            PublicKeyExporter::new(self.public_key_path.clone()),
        ))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("photolock directory not initialized. Run 'photolock init' first")]
    NotInitialized,

    #[error("photolock directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("key store error: {0}")]
    KeyStore(#[from] KeyStoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_then_load() {
        let temp = tempfile::TempDir::new().unwrap();
        let dir = temp.path().join("state");

        let state = AppState::init(Some(dir.clone()), None).unwrap();
        assert!(state.keys_path.is_dir());
        assert!(state.config_path.is_file());
        assert_eq!(state.public_key_path, dir.join("public_key.pem"));

        let loaded = AppState::load(Some(dir)).unwrap();
        assert_eq!(loaded.config.key_tag, "com.behtis.photoLock");
        assert!(matches!(
            loaded.config.keystore,
            KeyStoreConfig::File { path: None }
        ));
    }

    #[test]
    fn test_init_twice_fails() {
        let temp = tempfile::TempDir::new().unwrap();
        let dir = temp.path().join("state");
        AppState::init(Some(dir.clone()), None).unwrap();
        assert!(matches!(
            AppState::init(Some(dir), None),
            Err(StateError::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_load_uninitialized() {
        let temp = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            AppState::load(Some(temp.path().join("missing"))),
            Err(StateError::NotInitialized)
        ));
        assert!(matches!(
            AppState::load(Some(temp.path().to_path_buf())),
            Err(StateError::MissingFile(_))
        ));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            key_tag = "org.example.test"

            [keystore]
            type = "file"
            "#,
        )
        .unwrap();
        assert_eq!(config.key_tag, "org.example.test");
        assert_eq!(config.public_key_file, "public_key.pem");
        assert_eq!(config.log_level().unwrap(), tracing::Level::INFO);
        assert!(matches!(
            config.keystore,
            KeyStoreConfig::File { path: None }
        ));
    }

    #[test]
    fn test_process_local_keystore_rejected() {
        let parsed = toml::from_str::<AppConfig>(
            r#"
            [keystore]
            type = "memory"
            "#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = AppConfig {
            log_level: "loud".to_string(),
            ..AppConfig::default()
        };
        assert!(matches!(
            AppState::init(Some(temp.path().join("state")), Some(config)),
            Err(StateError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_key_manager_uses_file_store() {
        let temp = tempfile::TempDir::new().unwrap();
        let state = AppState::init(Some(temp.path().join("state")), None).unwrap();

        let manager = state.key_manager().unwrap();
        let public_key = manager.generate_key_pair().unwrap();
        assert!(state.public_key_path.is_file());

        let reopened = AppState::load(Some(state.photolock_dir.clone()))
            .unwrap()
            .key_manager()
            .unwrap();
        assert_eq!(reopened.public_key().unwrap(), public_key);
    }
}
