use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use zeroize::Zeroizing;

use super::{
    AccessPolicy, Accessibility, KeyHandle, KeyStoreError, KeyUsage, LockState, SecureKeyStore,
    StoredKey, WrapAlgorithm,
};

/// PEM label for persisted key records
const RECORD_LABEL: &str = "PHOTOLOCK KEY RECORD";
/// accessibility (1) || usage bits (1) || P-256 scalar (32)
const RECORD_SIZE: usize = 2 + 32;
const RECORD_EXTENSION: &str = "key";

/// Software keychain backed by a directory
///
/// Each tag maps to `<dir>/<hex(tag)>.key`, a PEM record holding the policy and
/// the private scalar. Records are written atomically and, on unix, are readable
/// by the owner only. Nothing outside this module ever sees the scalar.
pub struct FileKeyStore {
    dir: PathBuf,
    io: Mutex<()>,
    lock: LockState,
}

impl FileKeyStore {
    /// Open (creating if needed) a key store rooted at `dir`
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, KeyStoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            io: Mutex::new(()),
            lock: LockState::default(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn lock(&self) {
        self.lock.lock();
    }

    pub fn unlock(&self) {
        self.lock.unlock();
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }

    fn record_path(&self, tag: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", hex::encode(tag.as_bytes()), RECORD_EXTENSION))
    }

    fn read_record(&self, tag: &str) -> Result<StoredKey, KeyStoreError> {
        let text = match fs::read_to_string(self.record_path(tag)) {
            Ok(text) => Zeroizing::new(text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(KeyStoreError::NotFound(tag.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        decode_record(&text)
    }

    /// Fails with `DuplicateItem` if a record for `tag` already exists
    fn write_record(&self, tag: &str, key: &StoredKey) -> Result<(), KeyStoreError> {
        let encoded = encode_record(key);
        let mut file = tempfile::NamedTempFile::new_in(&self.dir)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.as_file()
                .set_permissions(fs::Permissions::from_mode(0o600))?;
        }

        file.write_all(encoded.as_bytes())?;
        file.as_file().sync_all()?;
        match file.persist_noclobber(self.record_path(tag)) {
            Ok(_) => Ok(()),
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                Err(KeyStoreError::DuplicateItem(tag.to_string()))
            }
            Err(e) => Err(KeyStoreError::Io(e.error)),
        }
    }

    fn load_checked(&self, handle: &KeyHandle) -> Result<StoredKey, KeyStoreError> {
        let key = match self.read_record(handle.tag()) {
            Err(KeyStoreError::NotFound(tag)) => return Err(KeyStoreError::StaleHandle(tag)),
            other => other?,
        };
        key.check(handle)?;
        Ok(key)
    }
}

fn encode_record(key: &StoredKey) -> Zeroizing<String> {
    let mut contents = Zeroizing::new(Vec::with_capacity(RECORD_SIZE));
    contents.push(key.policy().accessibility().as_byte());
    contents.push(key.policy().usage().bits());
    contents.extend_from_slice(&key.secret().to_bytes());

    let pem = pem::Pem::new(RECORD_LABEL, contents.to_vec());
    let encoded = Zeroizing::new(pem::encode(&pem));
    drop(Zeroizing::new(pem.into_contents()));
    encoded
}

fn decode_record(text: &str) -> Result<StoredKey, KeyStoreError> {
    let pem = pem::parse(text).map_err(|e| KeyStoreError::Corrupt(e.to_string()))?;
    let label = pem.tag().to_string();
    let contents = Zeroizing::new(pem.into_contents());
    if label != RECORD_LABEL {
        return Err(KeyStoreError::Corrupt(format!(
            "unexpected PEM label {:?}",
            label
        )));
    }

    if contents.len() != RECORD_SIZE {
        return Err(KeyStoreError::Corrupt(format!(
            "expected {} bytes, got {}",
            RECORD_SIZE,
            contents.len()
        )));
    }

    let accessibility = Accessibility::from_byte(contents[0])
        .ok_or_else(|| KeyStoreError::Corrupt("unknown accessibility".to_string()))?;
    let usage = KeyUsage::from_bits(contents[1])
        .ok_or_else(|| KeyStoreError::Corrupt("unknown usage flags".to_string()))?;
    let policy = AccessPolicy::new(accessibility, usage)?;
    let secret = p256::SecretKey::from_slice(&contents[2..])
        .map_err(|_| KeyStoreError::Corrupt("invalid private scalar".to_string()))?;

    Ok(StoredKey::from_parts(secret, policy))
}

impl SecureKeyStore for FileKeyStore {
    fn generate(&self, tag: &str, policy: &AccessPolicy) -> Result<KeyHandle, KeyStoreError> {
        let _io = self.io.lock();
        let key = StoredKey::generate(policy);
        self.write_record(tag, &key)?;
        tracing::trace!(tag, dir = %self.dir.display(), "file key store: generated key");
        Ok(key.handle(tag))
    }

    fn delete(&self, tag: &str) -> Result<(), KeyStoreError> {
        let _io = self.io.lock();
        match fs::remove_file(self.record_path(tag)) {
            Ok(()) => {
                tracing::trace!(tag, "file key store: deleted key");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn find(&self, tag: &str) -> Result<KeyHandle, KeyStoreError> {
        let _io = self.io.lock();
        self.read_record(tag).map(|key| key.handle(tag))
    }

    fn copy_public_key(&self, handle: &KeyHandle) -> Result<Vec<u8>, KeyStoreError> {
        let _io = self.io.lock();
        Ok(self.load_checked(handle)?.public_bytes())
    }

    fn unwrap_key(
        &self,
        handle: &KeyHandle,
        algorithm: WrapAlgorithm,
        blob: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, KeyStoreError> {
        let key = {
            let _io = self.io.lock();
            self.load_checked(handle)?
        };
        key.unwrap_key(&self.lock, algorithm, blob)
    }
}
