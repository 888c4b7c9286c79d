//! Where the settings record lives between calls.

use std::fs::{OpenOptions, create_dir_all};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

use crate::settings::Settings;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("toml decode error: {0}")]
    TomlDecode(#[from] toml::de::Error),
    #[error("toml encode error: {0}")]
    TomlEncode(#[from] toml::ser::Error),
    #[error("invalid settings store: {0}")]
    Invalid(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for schemaward_core::Error {
    fn from(err: StoreError) -> Self {
        schemaward_core::Error::Settings(err.to_string())
    }
}

/// Get/set access to the one settings record.
///
/// `load` returns `None` until something has been saved.
pub trait SettingsStore: Send + Sync {
    fn load(&self) -> StoreResult<Option<Settings>>;
    fn save(&self, settings: &Settings) -> StoreResult<()>;
    fn clear(&self) -> StoreResult<()>;
}

/// Settings persisted as a TOML file, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct TomlSettingsStore {
    path: PathBuf,
}

impl TomlSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for TomlSettingsStore {
    fn load(&self) -> StoreResult<Option<Settings>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(Some(settings.normalized()))
    }

    fn save(&self, settings: &Settings) -> StoreResult<()> {
        let encoded = toml::to_string_pretty(&settings.clone().normalized())?;
        write_bytes_atomic(&self.path, encoded.as_bytes())
    }

    fn clear(&self) -> StoreResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Process-local store, used when no settings path is configured.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    record: Mutex<Option<Settings>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            record: Mutex::new(Some(settings.normalized())),
        }
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, Option<Settings>>> {
        self.record
            .lock()
            .map_err(|_| StoreError::Invalid("settings lock poisoned".to_string()))
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> StoreResult<Option<Settings>> {
        Ok(self.lock()?.clone())
    }

    fn save(&self, settings: &Settings) -> StoreResult<()> {
        *self.lock()? = Some(settings.clone().normalized());
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        *self.lock()? = None;
        Ok(())
    }
}

fn write_bytes_atomic(path: &Path, data: &[u8]) -> StoreResult<()> {
    let parent = path.parent().filter(|parent| !parent.as_os_str().is_empty());
    if let Some(parent) = parent {
        create_dir_all(parent)?;
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| StoreError::Invalid(format!("not a file path: {}", path.display())))?;
    let tmp_path = path.with_file_name(format!("{}.tmp", file_name.to_string_lossy()));

    let mut file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;

    std::fs::rename(&tmp_path, path)?;
    if let Some(parent) = parent {
        OpenOptions::new().read(true).open(parent)?.sync_all()?;
    }
    Ok(())
}
