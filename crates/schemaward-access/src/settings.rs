use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use schemaward_core::sanitize;

/// The single access record: enabled flag, viewer whitelist and locked tables.
///
/// Sets are ordered so the persisted form is stable between saves.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Settings {
    pub enabled: bool,
    pub viewer_emails: BTreeSet<String>,
    pub locked_tables: BTreeSet<String>,
}

impl Settings {
    /// Defaults for a store that has never been written: disabled, nobody
    /// whitelisted and every table that already exists locked.
    pub fn first_use<I, S>(existing_tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            enabled: false,
            viewer_emails: BTreeSet::new(),
            locked_tables: existing_tables
                .into_iter()
                .map(|table| table.as_ref().to_string())
                .collect(),
        }
        .normalized()
    }

    /// Trim and lower-case emails, sanitize table names, drop empties.
    pub fn normalized(self) -> Self {
        Self {
            enabled: self.enabled,
            viewer_emails: self
                .viewer_emails
                .iter()
                .filter_map(|email| normalize_email(email))
                .collect(),
            locked_tables: self
                .locked_tables
                .iter()
                .filter_map(|table| normalize_table(table))
                .collect(),
        }
    }

    pub fn is_viewer(&self, email: &str) -> bool {
        normalize_email(email).is_some_and(|email| self.viewer_emails.contains(&email))
    }

    /// Table names compare ASCII case-insensitively, so a server folding
    /// name case cannot reach a locked table through another spelling.
    pub fn is_locked(&self, table: &str) -> bool {
        self.locked_tables
            .iter()
            .any(|locked| locked.eq_ignore_ascii_case(table))
    }

    /// Returns whether the set changed.
    pub fn add_viewer_email(&mut self, email: &str) -> bool {
        match normalize_email(email) {
            Some(email) => self.viewer_emails.insert(email),
            None => false,
        }
    }

    pub fn remove_viewer_email(&mut self, email: &str) -> bool {
        match normalize_email(email) {
            Some(email) => self.viewer_emails.remove(&email),
            None => false,
        }
    }

    pub fn lock_table(&mut self, table: &str) -> bool {
        match normalize_table(table) {
            Some(table) if !self.is_locked(&table) => self.locked_tables.insert(table),
            _ => false,
        }
    }

    /// Removes every spelling of `table` from the locked set.
    pub fn unlock_table(&mut self, table: &str) -> bool {
        let Some(table) = normalize_table(table) else {
            return false;
        };
        let before = self.locked_tables.len();
        self.locked_tables
            .retain(|locked| !locked.eq_ignore_ascii_case(&table));
        self.locked_tables.len() != before
    }
}

pub(crate) fn normalize_email(email: &str) -> Option<String> {
    let email = email.trim().to_lowercase();
    (!email.is_empty()).then_some(email)
}

fn normalize_table(table: &str) -> Option<String> {
    let table = sanitize(table);
    (!table.is_empty()).then_some(table)
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SettingsPatch {
    pub enabled: Option<bool>,
    pub viewer_emails: Option<Vec<String>>,
    pub locked_tables: Option<Vec<String>>,
}

impl SettingsPatch {
    pub fn apply(self, settings: Settings) -> Settings {
        Settings {
            enabled: self.enabled.unwrap_or(settings.enabled),
            viewer_emails: self
                .viewer_emails
                .map(|emails| emails.into_iter().collect())
                .unwrap_or(settings.viewer_emails),
            locked_tables: self
                .locked_tables
                .map(|tables| tables.into_iter().collect())
                .unwrap_or(settings.locked_tables),
        }
        .normalized()
    }
}
