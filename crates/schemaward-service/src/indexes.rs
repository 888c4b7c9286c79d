use schemaward_access::{Caller, ensure_unlocked};
use schemaward_core::{
    Error, Existing, Identifier, Index, IndexDefinition, IndexKind, Missing, PRIMARY_INDEX,
    Result,
};

use crate::context::SchemaManager;

pub struct IndexService<'a> {
    manager: &'a SchemaManager,
}

impl<'a> IndexService<'a> {
    pub fn new(manager: &'a SchemaManager) -> Self {
        Self { manager }
    }

    pub async fn list(&self, caller: &Caller, table: &str) -> Result<Vec<Index>> {
        self.manager.gate().authorize_view(caller)?;
        let table = Identifier::parse(table)?;
        self.manager.introspector().list_indexes(&table).await
    }

    pub async fn add(&self, caller: &Caller, table: &str, index: &IndexDefinition) -> Result<Index> {
        let settings = self.manager.gate().authorize_view(caller)?;
        let table = Identifier::parse(table)?;
        let name = Identifier::parse(&index.name)?;
        let columns = index
            .columns
            .iter()
            .map(|column| Identifier::parse(column))
            .collect::<Result<Vec<_>>>()?;

        let introspector = self.manager.introspector();
        introspector.require_table(&table).await?;
        for column in &columns {
            if !introspector.column_exists(&table, column).await? {
                return Err(Error::NotFound(Missing::Column {
                    table: table.to_string(),
                    column: column.to_string(),
                }));
            }
        }
        // The primary key is always named PRIMARY whatever the caller asked for.
        let stored_name = if index.kind.trim().eq_ignore_ascii_case(IndexKind::Primary.as_str()) {
            PRIMARY_INDEX
        } else {
            name.as_str()
        };
        if introspector.index_exists(&table, stored_name).await? {
            return Err(Error::AlreadyExists(Existing::Index {
                table: table.to_string(),
                index: stored_name.to_string(),
            }));
        }
        ensure_unlocked(&settings, &table)?;

        let spec = index.validate()?;
        self.manager.ddl().add_index(&table, &spec).await?;
        tracing::info!(event = "index_added", table = %table, index = %stored_name, kind = %spec.kind);

        introspector
            .find_index(&table, stored_name)
            .await?
            .ok_or_else(|| {
                Error::NotFound(Missing::Index {
                    table: table.to_string(),
                    index: stored_name.to_string(),
                })
            })
    }

    /// Drop a named index. `PRIMARY` is always refused; change the key
    /// through the column instead.
    pub async fn delete(&self, caller: &Caller, table: &str, name: &str) -> Result<()> {
        let settings = self.manager.gate().authorize_view(caller)?;
        let table = Identifier::parse(table)?;
        let name = Identifier::parse(name)?;
        if name.as_str().eq_ignore_ascii_case(PRIMARY_INDEX) {
            tracing::warn!(event = "primary_index_drop_refused", table = %table);
            return Err(Error::PrimaryIndex {
                table: table.to_string(),
            });
        }

        let introspector = self.manager.introspector();
        introspector.require_table(&table).await?;
        if !introspector.index_exists(&table, name.as_str()).await? {
            return Err(Error::NotFound(Missing::Index {
                table: table.to_string(),
                index: name.to_string(),
            }));
        }
        ensure_unlocked(&settings, &table)?;

        self.manager.ddl().drop_index(&table, &name).await?;
        tracing::info!(event = "index_dropped", table = %table, index = %name);
        Ok(())
    }
}
