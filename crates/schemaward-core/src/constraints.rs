use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{EnumField, Error};

/// Index kinds; `PRIMARY` is reserved for the primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum IndexKind {
    Primary,
    Unique,
    Fulltext,
    Spatial,
    Index,
}

impl IndexKind {
    /// Parse a caller-supplied kind, case-insensitively.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PRIMARY" => Ok(IndexKind::Primary),
            "UNIQUE" => Ok(IndexKind::Unique),
            "FULLTEXT" => Ok(IndexKind::Fulltext),
            "SPATIAL" => Ok(IndexKind::Spatial),
            "INDEX" => Ok(IndexKind::Index),
            _ => Err(Error::InvalidEnum {
                field: EnumField::IndexKind,
                value: raw.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IndexKind::Primary => "PRIMARY",
            IndexKind::Unique => "UNIQUE",
            IndexKind::Fulltext => "FULLTEXT",
            IndexKind::Spatial => "SPATIAL",
            IndexKind::Index => "INDEX",
        }
    }
}

impl FromStr for IndexKind {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw)
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Index definition with member columns in catalog ordinal order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Index {
    pub name: String,
    pub kind: IndexKind,
    pub columns: Vec<String>,
}

/// Referential action applied on delete or update of the referenced row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub enum FkAction {
    #[serde(rename = "CASCADE")]
    Cascade,
    #[serde(rename = "SET NULL")]
    SetNull,
    #[default]
    #[serde(rename = "RESTRICT")]
    Restrict,
    #[serde(rename = "NO ACTION")]
    NoAction,
    #[serde(rename = "SET DEFAULT")]
    SetDefault,
}

impl FkAction {
    /// Parse a caller-supplied action; `field` names the clause it belongs to.
    pub fn parse(raw: &str, field: EnumField) -> Result<Self, Error> {
        let normalized = raw
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase();
        match normalized.as_str() {
            "CASCADE" => Ok(FkAction::Cascade),
            "SET NULL" => Ok(FkAction::SetNull),
            "RESTRICT" => Ok(FkAction::Restrict),
            "NO ACTION" => Ok(FkAction::NoAction),
            "SET DEFAULT" => Ok(FkAction::SetDefault),
            _ => Err(Error::InvalidEnum {
                field,
                value: raw.to_string(),
            }),
        }
    }

    /// Map a catalog rule, falling back to `RESTRICT` for anything unknown.
    pub fn from_catalog(rule: &str) -> Self {
        Self::parse(rule, EnumField::OnDeleteAction).unwrap_or_default()
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            FkAction::Cascade => "CASCADE",
            FkAction::SetNull => "SET NULL",
            FkAction::Restrict => "RESTRICT",
            FkAction::NoAction => "NO ACTION",
            FkAction::SetDefault => "SET DEFAULT",
        }
    }
}

impl fmt::Display for FkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Single-column foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ForeignKey {
    pub name: String,
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
    pub on_delete: FkAction,
    pub on_update: FkAction,
}
