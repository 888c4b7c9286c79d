use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constraints::Index;
use crate::statement::Row;

/// A table as listed by the table service.
///
/// Read from the catalog on demand and never cached beyond a single call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Table {
    pub name: String,
    pub column_count: u64,
    pub row_count: u64,
    /// In the locked set; rejects every schema change.
    pub locked: bool,
    /// Owned by the host application.
    pub protected: bool,
}

/// Single-table view with structure and counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TableDetails {
    pub name: String,
    pub columns: Vec<Column>,
    pub indexes: Vec<Index>,
    pub column_count: u64,
    pub row_count: u64,
    pub locked: bool,
    pub protected: bool,
}

/// Role a column plays in the table's keys, as reported by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum KeyRole {
    #[default]
    None,
    Primary,
    Unique,
    Multiple,
}

impl KeyRole {
    /// Map the catalog's `COLUMN_KEY` marker.
    pub fn from_catalog(marker: &str) -> Self {
        match marker.trim().to_ascii_uppercase().as_str() {
            "PRI" => KeyRole::Primary,
            "UNI" => KeyRole::Unique,
            "MUL" => KeyRole::Multiple,
            _ => KeyRole::None,
        }
    }
}

/// Column metadata; identity is `(table, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Column {
    pub name: String,
    /// Declared type as the engine reports it (e.g. `varchar(255)`).
    pub column_type: String,
    pub nullable: bool,
    pub default: Option<String>,
    /// Extra attributes such as `auto_increment`.
    pub extra: String,
    pub key: KeyRole,
}

impl Column {
    /// Uppercased type without length, precision or modifiers.
    pub fn base_type(&self) -> String {
        self.column_type
            .split(['(', ' '])
            .next()
            .unwrap_or_default()
            .to_ascii_uppercase()
    }

    pub fn is_auto_increment(&self) -> bool {
        self.extra.to_ascii_lowercase().contains("auto_increment")
    }
}

/// A page of table data.
#[derive(Debug, Clone, Serialize)]
pub struct DataPreview {
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    pub total: u64,
}
