use schemaward_access::{Caller, Settings, SettingsPatch};
use schemaward_core::Result;

use crate::context::SchemaManager;

/// Settings operations. Only the administrator check applies here, so a
/// disabled tool can still be switched on.
pub struct SettingsService<'a> {
    manager: &'a SchemaManager,
}

impl<'a> SettingsService<'a> {
    pub fn new(manager: &'a SchemaManager) -> Self {
        Self { manager }
    }

    pub fn get(&self, caller: &Caller) -> Result<Settings> {
        self.manager.gate().authorize_admin(caller)?;
        self.manager.gate().settings()
    }

    pub fn update(&self, caller: &Caller, patch: SettingsPatch) -> Result<Settings> {
        self.manager.gate().authorize_admin(caller)?;
        self.manager.gate().update(patch)
    }

    pub fn activate(&self, caller: &Caller) -> Result<Settings> {
        self.set_enabled(caller, true)
    }

    pub fn deactivate(&self, caller: &Caller) -> Result<Settings> {
        self.set_enabled(caller, false)
    }

    pub fn add_viewer_email(&self, caller: &Caller, email: &str) -> Result<Settings> {
        self.manager.gate().authorize_admin(caller)?;
        let settings = self.manager.gate().add_viewer_email(email)?;
        tracing::info!(event = "viewer_added", email = %email.trim());
        Ok(settings)
    }

    pub fn remove_viewer_email(&self, caller: &Caller, email: &str) -> Result<Settings> {
        self.manager.gate().authorize_admin(caller)?;
        let settings = self.manager.gate().remove_viewer_email(email)?;
        tracing::info!(event = "viewer_removed", email = %email.trim());
        Ok(settings)
    }

    /// Discard the record and recreate first-use defaults, locking every
    /// table that exists now.
    pub async fn reset(&self, caller: &Caller) -> Result<Settings> {
        self.manager.gate().authorize_admin(caller)?;
        self.manager.gate().reset(self.manager.engine()).await
    }

    fn set_enabled(&self, caller: &Caller, enabled: bool) -> Result<Settings> {
        self.manager.gate().authorize_admin(caller)?;
        let settings = self.manager.gate().set_enabled(enabled)?;
        tracing::info!(event = "access_toggled", enabled);
        Ok(settings)
    }
}
