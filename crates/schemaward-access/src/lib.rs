//! Persisted access settings and the authorization decisions built on them.

pub mod gate;
pub mod settings;
pub mod store;

pub use gate::{AccessGate, Caller, ensure_unlocked};
pub use settings::{Settings, SettingsPatch};
pub use store::{MemorySettingsStore, SettingsStore, StoreError, TomlSettingsStore};
