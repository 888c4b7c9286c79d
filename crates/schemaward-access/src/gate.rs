use std::sync::Arc;

use schemaward_core::{Denial, Error, Identifier, Result};
use schemaward_introspect::{Engine, Introspector};

use crate::settings::{Settings, SettingsPatch};
use crate::store::SettingsStore;

/// Identity of whoever is making a call, as established by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub email: String,
    pub administrator: bool,
}

impl Caller {
    pub fn administrator(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            administrator: true,
        }
    }

    pub fn user(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            administrator: false,
        }
    }
}

/// Authorization decisions and settings mutations.
///
/// The record is re-read from the store on every call and written back whole,
/// so two concurrent writers race and the last save wins.
#[derive(Clone)]
pub struct AccessGate {
    store: Arc<dyn SettingsStore>,
}

impl AccessGate {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    /// Load the record, creating first-use defaults when the store is empty.
    ///
    /// First use locks every table that exists at that moment.
    pub async fn initialize(&self, engine: &dyn Engine) -> Result<Settings> {
        if let Some(settings) = self.store.load()? {
            return Ok(settings);
        }
        let tables = Introspector::new(engine).table_names().await?;
        let settings = Settings::first_use(&tables);
        self.store.save(&settings)?;
        tracing::info!(
            event = "settings_initialized",
            locked_tables = settings.locked_tables.len()
        );
        Ok(settings)
    }

    /// Drop the stored record and start over from first-use defaults.
    pub async fn reset(&self, engine: &dyn Engine) -> Result<Settings> {
        self.store.clear()?;
        tracing::info!(event = "settings_reset");
        self.initialize(engine).await
    }

    pub fn settings(&self) -> Result<Settings> {
        Ok(self.store.load()?.unwrap_or_default())
    }

    pub fn authorize_admin(&self, caller: &Caller) -> Result<()> {
        if caller.administrator {
            Ok(())
        } else {
            Err(deny(caller, Denial::NotAdministrator))
        }
    }

    /// Administrator, then enabled, then whitelisted. An empty whitelist
    /// admits nobody.
    pub fn authorize_view(&self, caller: &Caller) -> Result<Settings> {
        self.authorize_admin(caller)?;
        let settings = self.settings()?;
        if !settings.enabled {
            return Err(deny(caller, Denial::Disabled));
        }
        if !settings.is_viewer(&caller.email) {
            return Err(deny(caller, Denial::NotWhitelisted));
        }
        Ok(settings)
    }

    /// View authorization plus the lock check for `table`.
    pub fn authorize_mutation(&self, caller: &Caller, table: &Identifier) -> Result<Settings> {
        let settings = self.authorize_view(caller)?;
        ensure_unlocked(&settings, table)?;
        Ok(settings)
    }

    pub fn update(&self, patch: SettingsPatch) -> Result<Settings> {
        let settings = patch.apply(self.settings()?);
        self.store.save(&settings)?;
        tracing::info!(event = "settings_updated", enabled = settings.enabled);
        Ok(settings)
    }

    pub fn set_enabled(&self, enabled: bool) -> Result<Settings> {
        self.modify(|settings| {
            let changed = settings.enabled != enabled;
            settings.enabled = enabled;
            changed
        })
    }

    pub fn add_viewer_email(&self, email: &str) -> Result<Settings> {
        if email.trim().is_empty() {
            return Err(Error::Settings("viewer email must not be empty".to_string()));
        }
        self.modify(|settings| settings.add_viewer_email(email))
    }

    pub fn remove_viewer_email(&self, email: &str) -> Result<Settings> {
        self.modify(|settings| settings.remove_viewer_email(email))
    }

    pub fn lock_table(&self, table: &Identifier) -> Result<Settings> {
        self.modify(|settings| settings.lock_table(table.as_str()))
    }

    pub fn unlock_table(&self, table: &Identifier) -> Result<Settings> {
        self.modify(|settings| settings.unlock_table(table.as_str()))
    }

    /// Apply `change` and save only when it reports a difference.
    fn modify(&self, change: impl FnOnce(&mut Settings) -> bool) -> Result<Settings> {
        let mut settings = self.settings()?;
        if change(&mut settings) {
            self.store.save(&settings)?;
        }
        Ok(settings)
    }
}

pub fn ensure_unlocked(settings: &Settings, table: &Identifier) -> Result<()> {
    if settings.is_locked(table.as_str()) {
        tracing::warn!(event = "table_locked", table = %table);
        return Err(Error::Locked {
            table: table.to_string(),
        });
    }
    Ok(())
}

fn deny(caller: &Caller, denial: Denial) -> Error {
    tracing::warn!(event = "access_denied", email = %caller.email, reason = %denial);
    Error::AccessDenied(denial)
}
