use schemaward_access::{Caller, ensure_unlocked};
use schemaward_core::{
    Error, Existing, ForeignKey, Identifier, Missing, RelationDefinition, Result,
};

use crate::context::SchemaManager;

pub struct RelationService<'a> {
    manager: &'a SchemaManager,
}

impl<'a> RelationService<'a> {
    pub fn new(manager: &'a SchemaManager) -> Self {
        Self { manager }
    }

    pub async fn list(&self, caller: &Caller, table: &str) -> Result<Vec<ForeignKey>> {
        self.manager.gate().authorize_view(caller)?;
        let table = Identifier::parse(table)?;
        self.manager.introspector().list_foreign_keys(&table).await
    }

    /// Add a foreign key from `table` to the referenced table and column.
    pub async fn add(
        &self,
        caller: &Caller,
        table: &str,
        relation: &RelationDefinition,
    ) -> Result<ForeignKey> {
        let settings = self.manager.gate().authorize_view(caller)?;
        let table = Identifier::parse(table)?;
        let column = Identifier::parse(&relation.column)?;
        let referenced_table = Identifier::parse(&relation.referenced_table)?;
        let referenced_column = Identifier::parse(&relation.referenced_column)?;
        let name = relation.constraint_name(&table, &column)?;

        let introspector = self.manager.introspector();
        introspector.require_table(&table).await?;
        if !introspector.column_exists(&table, &column).await? {
            return Err(Error::NotFound(Missing::Column {
                table: table.to_string(),
                column: column.to_string(),
            }));
        }
        if !introspector.table_exists(&referenced_table).await? {
            return Err(Error::NotFound(Missing::ReferencedTable(
                referenced_table.to_string(),
            )));
        }
        if !introspector
            .column_exists(&referenced_table, &referenced_column)
            .await?
        {
            return Err(Error::NotFound(Missing::ReferencedColumn {
                table: referenced_table.to_string(),
                column: referenced_column.to_string(),
            }));
        }
        if introspector.foreign_key_exists(&table, name.as_str()).await? {
            return Err(Error::AlreadyExists(Existing::ForeignKey {
                table: table.to_string(),
                name: name.to_string(),
            }));
        }
        ensure_unlocked(&settings, &table)?;

        let spec = relation.validate(&table)?;
        self.manager.ddl().add_foreign_key(&table, &spec).await?;
        tracing::info!(
            event = "relation_added",
            table = %table,
            name = %spec.name,
            references = %spec.referenced_table,
            on_delete = %spec.on_delete,
            on_update = %spec.on_update
        );

        introspector
            .find_foreign_key(&table, spec.name.as_str())
            .await?
            .ok_or_else(|| {
                Error::NotFound(Missing::ForeignKey {
                    table: table.to_string(),
                    name: spec.name.to_string(),
                })
            })
    }

    pub async fn delete(&self, caller: &Caller, table: &str, name: &str) -> Result<()> {
        let settings = self.manager.gate().authorize_view(caller)?;
        let table = Identifier::parse(table)?;
        let name = Identifier::parse(name)?;

        let introspector = self.manager.introspector();
        introspector.require_table(&table).await?;
        if !introspector.foreign_key_exists(&table, name.as_str()).await? {
            return Err(Error::NotFound(Missing::ForeignKey {
                table: table.to_string(),
                name: name.to_string(),
            }));
        }
        ensure_unlocked(&settings, &table)?;

        self.manager.ddl().drop_foreign_key(&table, &name).await?;
        tracing::info!(event = "relation_dropped", table = %table, name = %name);
        Ok(())
    }
}
