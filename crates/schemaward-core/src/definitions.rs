//! Caller-supplied definitions and their validated counterparts.
//!
//! Definitions arrive as plain strings from the outer layer. `validate`
//! turns them into specs whose fields can be placed in a statement.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constraints::{FkAction, IndexKind};
use crate::error::{EnumField, Error, Result};
use crate::statement::Identifier;
use crate::validation::{
    ColumnType, DefaultValue, MAX_IDENTIFIER_LEN, escape_default, validate_type,
};

fn default_true() -> bool {
    true
}

/// Column definition as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    #[serde(default)]
    pub length: Option<i64>,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub auto_increment: bool,
    /// `None` leaves primary key membership as it is on update; on create
    /// and add it means not primary.
    #[serde(default)]
    pub primary: Option<bool>,
    /// Place the column after this one (add only).
    #[serde(default)]
    pub after: Option<String>,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            length: None,
            nullable: true,
            default: None,
            auto_increment: false,
            primary: None,
            after: None,
        }
    }

    pub fn length(mut self, length: i64) -> Self {
        self.length = Some(length);
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn primary(mut self) -> Self {
        self.primary = Some(true);
        self
    }

    /// Ask for the column to leave the primary key.
    pub fn not_primary(mut self) -> Self {
        self.primary = Some(false);
        self
    }

    pub fn after(mut self, column: impl Into<String>) -> Self {
        self.after = Some(column.into());
        self
    }

    /// Validate the name, type and default.
    pub fn validate(&self) -> Result<ColumnSpec> {
        let name = Identifier::parse(&self.name)?;
        let column_type = validate_type(&self.column_type, self.length)?;
        let after = self.after.as_deref().map(Identifier::parse).transpose()?;
        Ok(ColumnSpec {
            name,
            column_type,
            nullable: self.nullable,
            default: self.default.as_ref().map(escape_default),
            auto_increment: self.auto_increment,
            primary: self.primary.unwrap_or(false),
            after,
        })
    }
}

/// Column definition whose every part is safe to place in a statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub name: Identifier,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub default: Option<DefaultValue>,
    pub auto_increment: bool,
    pub primary: bool,
    pub after: Option<Identifier>,
}

/// Index definition as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub name: String,
    pub kind: String,
    pub columns: Vec<String>,
}

impl IndexDefinition {
    pub fn new<I, S>(name: impl Into<String>, kind: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            kind: kind.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn validate(&self) -> Result<IndexSpec> {
        if self.columns.is_empty() {
            return Err(Error::NoColumns(format!("index `{}`", self.name)));
        }
        Ok(IndexSpec {
            name: Identifier::parse(&self.name)?,
            kind: IndexKind::parse(&self.kind)?,
            columns: self
                .columns
                .iter()
                .map(|column| Identifier::parse(column))
                .collect::<Result<_>>()?,
        })
    }
}

/// Validated index definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: Identifier,
    pub kind: IndexKind,
    pub columns: Vec<Identifier>,
}

/// Foreign key definition as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDefinition {
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub on_delete: Option<String>,
    #[serde(default)]
    pub on_update: Option<String>,
}

impl RelationDefinition {
    pub fn new(
        column: impl Into<String>,
        referenced_table: impl Into<String>,
        referenced_column: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            referenced_table: referenced_table.into(),
            referenced_column: referenced_column.into(),
            name: None,
            on_delete: None,
            on_update: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn on_delete(mut self, action: impl Into<String>) -> Self {
        self.on_delete = Some(action.into());
        self
    }

    pub fn on_update(mut self, action: impl Into<String>) -> Self {
        self.on_update = Some(action.into());
        self
    }

    /// The supplied constraint name, or `fk_<table>_<column>` cut to the
    /// identifier length limit.
    pub fn constraint_name(&self, table: &Identifier, column: &Identifier) -> Result<Identifier> {
        match self.name.as_deref().filter(|name| !name.trim().is_empty()) {
            Some(name) => Identifier::parse(name),
            None => {
                let mut name = format!("fk_{table}_{column}");
                name.truncate(MAX_IDENTIFIER_LEN);
                Identifier::parse(&name)
            }
        }
    }

    /// Validate identifiers and actions. Absent actions default to `RESTRICT`.
    pub fn validate(&self, table: &Identifier) -> Result<ForeignKeySpec> {
        let column = Identifier::parse(&self.column)?;
        let name = self.constraint_name(table, &column)?;
        let on_delete = self
            .on_delete
            .as_deref()
            .map(|raw| FkAction::parse(raw, EnumField::OnDeleteAction))
            .transpose()?
            .unwrap_or_default();
        let on_update = self
            .on_update
            .as_deref()
            .map(|raw| FkAction::parse(raw, EnumField::OnUpdateAction))
            .transpose()?
            .unwrap_or_default();

        Ok(ForeignKeySpec {
            name,
            column,
            referenced_table: Identifier::parse(&self.referenced_table)?,
            referenced_column: Identifier::parse(&self.referenced_column)?,
            on_delete,
            on_update,
        })
    }
}

/// Validated foreign key definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeySpec {
    pub name: Identifier,
    pub column: Identifier,
    pub referenced_table: Identifier,
    pub referenced_column: Identifier,
    pub on_delete: FkAction,
    pub on_update: FkAction,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn column_definition_deserializes_with_defaults() {
        let def: ColumnDefinition =
            serde_json::from_value(json!({ "name": "email", "type": "varchar" })).unwrap();
        assert!(def.nullable);
        assert_eq!(def.primary, None);
        let spec = def.validate().unwrap();
        assert_eq!(spec.column_type.as_str(), "VARCHAR(255)");
        assert_eq!(spec.default, None);
    }

    #[test]
    fn column_definition_sanitizes_names() {
        let spec = ColumnDefinition::new("e-mail", "text")
            .after("user name")
            .validate()
            .unwrap();
        assert_eq!(spec.name.as_str(), "email");
        assert_eq!(spec.after.unwrap().as_str(), "username");
    }

    #[test]
    fn index_definition_rejects_unknown_kind() {
        let err = IndexDefinition::new("idx", "hash", ["a"]).validate().unwrap_err();
        assert!(matches!(err, Error::InvalidEnum { field: EnumField::IndexKind, .. }));
    }

    #[test]
    fn relation_definition_synthesizes_name_and_defaults_actions() {
        let table = Identifier::parse("orders").unwrap();
        let spec = RelationDefinition::new("user_id", "users", "id")
            .validate(&table)
            .unwrap();
        assert_eq!(spec.name.as_str(), "fk_orders_user_id");
        assert_eq!(spec.on_delete, FkAction::Restrict);
        assert_eq!(spec.on_update, FkAction::Restrict);
    }

    #[test]
    fn index_definition_needs_columns() {
        let err = IndexDefinition::new("idx", "index", Vec::<String>::new())
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::NoColumns(target) if target == "index `idx`"));
    }

    #[test]
    fn long_synthesized_relation_name_is_cut_to_the_limit() {
        let table = Identifier::parse(&"t".repeat(40)).unwrap();
        let spec = RelationDefinition::new("c".repeat(40), "users", "id")
            .validate(&table)
            .unwrap();
        assert_eq!(spec.name.as_str().len(), MAX_IDENTIFIER_LEN);
        assert!(spec.name.as_str().starts_with(&format!("fk_{}_c", "t".repeat(40))));
    }

    #[test]
    fn relation_definition_validates_actions() {
        let table = Identifier::parse("orders").unwrap();
        let err = RelationDefinition::new("user_id", "users", "id")
            .on_update("explode")
            .validate(&table)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidEnum { field: EnumField::OnUpdateAction, .. }));
    }
}
