//! Core contracts and helpers for Schemaward.
//!
//! This crate defines the schema model, the caller-supplied definitions, the
//! identifier and type validators, and the parameterized statement type shared
//! by the introspector, the DDL builder and the services.

pub mod constraints;
pub mod definitions;
pub mod error;
pub mod schema;
pub mod statement;
pub mod validation;

pub use constraints::{FkAction, ForeignKey, Index, IndexKind};
pub use definitions::{
    ColumnDefinition, ColumnSpec, ForeignKeySpec, IndexDefinition, IndexSpec, RelationDefinition,
};
pub use error::{Denial, EnumField, Error, Existing, Missing, Result};
pub use schema::{Column, DataPreview, KeyRole, Table, TableDetails};
pub use statement::{Identifier, Param, Row, SqlValue, Statement};
pub use validation::{
    ALLOWED_TYPES, ColumnType, DefaultValue, MAX_IDENTIFIER_LEN, escape_default, sanitize,
    validate_name, validate_type,
};

/// Name of the index the engine reserves for the primary key.
pub const PRIMARY_INDEX: &str = "PRIMARY";
