use schemaward_access::{Caller, ensure_unlocked};
use schemaward_core::{
    Column, ColumnDefinition, Error, Existing, Identifier, IndexKind, Missing, Result,
};
use schemaward_ddl::PrimaryKeyChange;

use crate::context::SchemaManager;

pub struct ColumnService<'a> {
    manager: &'a SchemaManager,
}

impl<'a> ColumnService<'a> {
    pub fn new(manager: &'a SchemaManager) -> Self {
        Self { manager }
    }

    pub async fn list(&self, caller: &Caller, table: &str) -> Result<Vec<Column>> {
        self.manager.gate().authorize_view(caller)?;
        let table = Identifier::parse(table)?;
        self.manager.introspector().describe_table(&table).await
    }

    /// Add a column, optionally placed after an existing one.
    pub async fn add(&self, caller: &Caller, table: &str, column: &ColumnDefinition) -> Result<Column> {
        let settings = self.manager.gate().authorize_view(caller)?;
        let table = Identifier::parse(table)?;
        let name = Identifier::parse(&column.name)?;
        let after = column.after.as_deref().map(Identifier::parse).transpose()?;

        let introspector = self.manager.introspector();
        introspector.require_table(&table).await?;
        if introspector.column_exists(&table, &name).await? {
            return Err(Error::AlreadyExists(Existing::Column {
                table: table.to_string(),
                column: name.to_string(),
            }));
        }
        if let Some(after) = &after {
            self.require_column(&table, after).await?;
        }
        ensure_unlocked(&settings, &table)?;

        let spec = column.validate()?;
        self.manager.ddl().add_column(&table, &spec).await?;
        tracing::info!(event = "column_added", table = %table, column = %name, column_type = %spec.column_type);

        self.describe_one(&table, &name).await
    }

    /// Redefine `current`. A different name in `column` renames it.
    pub async fn update(
        &self,
        caller: &Caller,
        table: &str,
        current: &str,
        column: &ColumnDefinition,
    ) -> Result<Column> {
        let settings = self.manager.gate().authorize_view(caller)?;
        let table = Identifier::parse(table)?;
        let current = Identifier::parse(current)?;
        let name = Identifier::parse(&column.name)?;

        let introspector = self.manager.introspector();
        introspector.require_table(&table).await?;
        self.require_column(&table, &current).await?;
        let renamed = !name.as_str().eq_ignore_ascii_case(current.as_str());
        if renamed && introspector.column_exists(&table, &name).await? {
            return Err(Error::AlreadyExists(Existing::Column {
                table: table.to_string(),
                column: name.to_string(),
            }));
        }
        ensure_unlocked(&settings, &table)?;

        let spec = column.validate()?;
        let primary = self.primary_change(&table, &current, column.primary).await?;
        self.manager
            .ddl()
            .modify_column(&table, &current, &spec, primary)
            .await?;
        tracing::info!(
            event = "column_modified",
            table = %table,
            column = %current,
            new_name = %name,
            primary = ?primary
        );

        self.describe_one(&table, &name).await
    }

    pub async fn delete(&self, caller: &Caller, table: &str, column: &str) -> Result<()> {
        let settings = self.manager.gate().authorize_view(caller)?;
        let table = Identifier::parse(table)?;
        let column = Identifier::parse(column)?;

        self.manager.introspector().require_table(&table).await?;
        self.require_column(&table, &column).await?;
        ensure_unlocked(&settings, &table)?;

        self.manager.ddl().drop_column(&table, &column).await?;
        tracing::info!(event = "column_dropped", table = %table, column = %column);
        Ok(())
    }

    async fn require_column(&self, table: &Identifier, column: &Identifier) -> Result<()> {
        if self.manager.introspector().column_exists(table, column).await? {
            Ok(())
        } else {
            Err(Error::NotFound(Missing::Column {
                table: table.to_string(),
                column: column.to_string(),
            }))
        }
    }

    /// Work out what the redefinition does to the primary key. Without an
    /// explicit flag the key is left alone.
    async fn primary_change(
        &self,
        table: &Identifier,
        current: &Identifier,
        wants_primary: Option<bool>,
    ) -> Result<PrimaryKeyChange> {
        let Some(wants_primary) = wants_primary else {
            return Ok(PrimaryKeyChange::Keep);
        };
        let primary = self
            .manager
            .introspector()
            .list_indexes(table)
            .await?
            .into_iter()
            .find(|index| index.kind == IndexKind::Primary);
        let is_member = primary.as_ref().is_some_and(|index| {
            index
                .columns
                .iter()
                .any(|column| column.eq_ignore_ascii_case(current.as_str()))
        });

        let change = match (wants_primary, is_member, primary.is_some()) {
            (true, true, _) | (false, false, _) => PrimaryKeyChange::Keep,
            (true, false, true) => PrimaryKeyChange::Replace,
            (true, false, false) => PrimaryKeyChange::Add,
            (false, true, _) => PrimaryKeyChange::Drop,
        };
        if let Some(index) = primary
            .filter(|index| index.columns.len() > 1)
            .filter(|_| matches!(change, PrimaryKeyChange::Drop | PrimaryKeyChange::Replace))
        {
            return Err(Error::CompositePrimaryKey {
                table: table.to_string(),
                columns: index.columns,
            });
        }
        Ok(change)
    }

    async fn describe_one(&self, table: &Identifier, name: &Identifier) -> Result<Column> {
        self.manager
            .introspector()
            .describe_table(table)
            .await?
            .into_iter()
            .find(|column| column.name.eq_ignore_ascii_case(name.as_str()))
            .ok_or_else(|| {
                Error::NotFound(Missing::Column {
                    table: table.to_string(),
                    column: name.to_string(),
                })
            })
    }
}
