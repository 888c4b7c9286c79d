use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core error type shared across Schemaward crates.
///
/// Every failure surfaces as one of these variants; nothing in the core panics
/// on bad input or on an engine rejection.
#[derive(Debug, Error)]
pub enum Error {
    /// A referenced table, column, index or constraint does not exist.
    #[error("{0} not found")]
    NotFound(Missing),
    /// The object to create is already present.
    #[error("{0} already exists")]
    AlreadyExists(Existing),
    /// The table is in the locked set and rejects schema changes.
    #[error("table `{table}` is locked")]
    Locked { table: String },
    /// The table belongs to the host application and cannot be dropped.
    #[error("table `{table}` is protected and cannot be dropped")]
    Protected { table: String },
    /// The identifier is empty or does not match the identifier pattern after sanitizing.
    #[error("invalid identifier: {identifier:?}")]
    InvalidName { identifier: String },
    /// The column type is not part of the allow-list.
    #[error("unsupported column type: {column_type:?}")]
    InvalidType { column_type: String },
    /// The value is not a member of the expected enumeration.
    #[error("invalid {field}: {value:?}")]
    InvalidEnum { field: EnumField, value: String },
    /// The primary index can only be changed by redefining its column.
    #[error(
        "the PRIMARY index of `{table}` cannot be dropped directly; modify the primary key column instead"
    )]
    PrimaryIndex { table: String },
    /// More than one column of a new table was flagged as primary key.
    #[error("more than one column flagged as primary key: {}", columns.join(", "))]
    MultiplePrimaryKeys { columns: Vec<String> },
    /// A table or index definition lists no columns.
    #[error("{0} needs at least one column")]
    NoColumns(String),
    /// A primary key spanning several columns cannot be rebuilt from one of them.
    #[error(
        "the primary key of `{table}` spans {}; it cannot be changed through a single column",
        columns.join(", ")
    )]
    CompositePrimaryKey { table: String, columns: Vec<String> },
    /// The caller is not allowed to perform the operation.
    #[error("access denied: {0}")]
    AccessDenied(Denial),
    /// The settings record could not be loaded or persisted.
    #[error("settings error: {0}")]
    Settings(String),
    /// The engine rejected the statement; the message is the engine's own text.
    #[error("database error: {message}")]
    EngineFailure { message: String },
}

impl Error {
    /// Wrap an engine error, keeping its message verbatim.
    pub fn engine(err: impl fmt::Display) -> Self {
        Error::EngineFailure {
            message: err.to_string(),
        }
    }

    pub fn invalid_name(identifier: impl Into<String>) -> Self {
        Error::InvalidName {
            identifier: identifier.into(),
        }
    }

    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "not_found",
            Error::AlreadyExists(_) => "already_exists",
            Error::Locked { .. } => "locked",
            Error::Protected { .. } => "protected",
            Error::InvalidName { .. } => "invalid_name",
            Error::InvalidType { .. } => "invalid_type",
            Error::InvalidEnum { .. } => "invalid_enum",
            Error::PrimaryIndex { .. } => "primary_index",
            Error::MultiplePrimaryKeys { .. } => "multiple_primary_keys",
            Error::CompositePrimaryKey { .. } => "composite_primary_key",
            Error::NoColumns(_) => "no_columns",
            Error::AccessDenied(_) => "access_denied",
            Error::Settings(_) => "settings",
            Error::EngineFailure { .. } => "engine_failure",
        }
    }
}

/// The object a `NotFound` error refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Missing {
    Table(String),
    Column { table: String, column: String },
    ReferencedTable(String),
    ReferencedColumn { table: String, column: String },
    Index { table: String, index: String },
    ForeignKey { table: String, name: String },
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Missing::Table(table) => write!(f, "table `{table}`"),
            Missing::Column { table, column } => write!(f, "column `{table}.{column}`"),
            Missing::ReferencedTable(table) => write!(f, "referenced table `{table}`"),
            Missing::ReferencedColumn { table, column } => {
                write!(f, "referenced column `{table}.{column}`")
            }
            Missing::Index { table, index } => write!(f, "index `{index}` on `{table}`"),
            Missing::ForeignKey { table, name } => write!(f, "foreign key `{name}` on `{table}`"),
        }
    }
}

/// The object an `AlreadyExists` error refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Existing {
    Table(String),
    Column { table: String, column: String },
    Index { table: String, index: String },
    ForeignKey { table: String, name: String },
}

impl fmt::Display for Existing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Existing::Table(table) => write!(f, "table `{table}`"),
            Existing::Column { table, column } => write!(f, "column `{table}.{column}`"),
            Existing::Index { table, index } => write!(f, "index `{index}` on `{table}`"),
            Existing::ForeignKey { table, name } => write!(f, "foreign key `{name}` on `{table}`"),
        }
    }
}

/// Enumerated fields validated against a fixed set of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumField {
    IndexKind,
    OnDeleteAction,
    OnUpdateAction,
}

impl fmt::Display for EnumField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EnumField::IndexKind => "index kind",
            EnumField::OnDeleteAction => "on-delete action",
            EnumField::OnUpdateAction => "on-update action",
        };
        f.write_str(label)
    }
}

/// Reason an authorization decision failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Denial {
    /// The caller lacks the host's administrative capability.
    NotAdministrator,
    /// Table management is switched off.
    Disabled,
    /// The caller is not in the viewer whitelist (an empty whitelist admits nobody).
    NotWhitelisted,
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Denial::NotAdministrator => "caller is not an administrator",
            Denial::Disabled => "table management is disabled",
            Denial::NotWhitelisted => "caller is not in the viewer whitelist",
        };
        f.write_str(reason)
    }
}

/// Convenience alias for results returned by Schemaward crates.
pub type Result<T> = std::result::Result<T, Error>;
