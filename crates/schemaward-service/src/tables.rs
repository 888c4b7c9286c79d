use schemaward_access::{Caller, ensure_unlocked};
use schemaward_core::{
    ColumnDefinition, ColumnSpec, Error, Existing, Identifier, Result, Table, TableDetails,
};

use crate::context::SchemaManager;

pub struct TableService<'a> {
    manager: &'a SchemaManager,
}

impl<'a> TableService<'a> {
    pub fn new(manager: &'a SchemaManager) -> Self {
        Self { manager }
    }

    /// Every base table with its counts, lock and protection flags.
    pub async fn list(&self, caller: &Caller) -> Result<Vec<Table>> {
        let settings = self.manager.gate().authorize_view(caller)?;
        let mut tables = self.manager.introspector().list_tables().await?;
        for table in &mut tables {
            table.locked = settings.is_locked(&table.name);
            table.protected = self.manager.is_protected(&table.name);
        }
        Ok(tables)
    }

    pub async fn get(&self, caller: &Caller, name: &str) -> Result<TableDetails> {
        let settings = self.manager.gate().authorize_view(caller)?;
        let table = Identifier::parse(name)?;
        let introspector = self.manager.introspector();

        let columns = introspector.describe_table(&table).await?;
        let indexes = introspector.list_indexes(&table).await?;
        let row_count = introspector.row_count(&table).await?;
        Ok(TableDetails {
            column_count: columns.len() as u64,
            locked: settings.is_locked(table.as_str()),
            protected: self.manager.is_protected(table.as_str()),
            name: table.into_string(),
            columns,
            indexes,
            row_count,
        })
    }

    pub async fn create(
        &self,
        caller: &Caller,
        name: &str,
        columns: &[ColumnDefinition],
    ) -> Result<TableDetails> {
        let settings = self.manager.gate().authorize_view(caller)?;
        let table = Identifier::parse(name)?;
        let column_names = columns
            .iter()
            .map(|column| Identifier::parse(&column.name))
            .collect::<Result<Vec<_>>>()?;

        if self.manager.introspector().table_exists(&table).await? {
            return Err(Error::AlreadyExists(Existing::Table(table.to_string())));
        }
        ensure_unlocked(&settings, &table)?;
        if columns.is_empty() {
            return Err(Error::NoColumns(format!("table `{table}`")));
        }
        if let Some(duplicate) = first_duplicate(&column_names) {
            return Err(Error::AlreadyExists(Existing::Column {
                table: table.to_string(),
                column: duplicate.to_string(),
            }));
        }

        let specs = columns
            .iter()
            .map(ColumnDefinition::validate)
            .collect::<Result<Vec<ColumnSpec>>>()?;
        self.manager.ddl().create_table(&table, &specs).await?;
        tracing::info!(event = "table_created", table = %table, columns = specs.len());

        self.get(caller, table.as_str()).await
    }

    /// Drop a table. Locked and protected tables are refused.
    pub async fn delete(&self, caller: &Caller, name: &str) -> Result<()> {
        let settings = self.manager.gate().authorize_view(caller)?;
        let table = Identifier::parse(name)?;
        self.manager.introspector().require_table(&table).await?;
        ensure_unlocked(&settings, &table)?;
        if self.manager.is_protected(table.as_str()) {
            return Err(Error::Protected {
                table: table.to_string(),
            });
        }

        self.manager.ddl().drop_table(&table).await?;
        tracing::info!(event = "table_dropped", table = %table);
        Ok(())
    }

    pub async fn lock(&self, caller: &Caller, name: &str) -> Result<()> {
        self.manager.gate().authorize_view(caller)?;
        let table = Identifier::parse(name)?;
        self.manager.introspector().require_table(&table).await?;
        self.manager.gate().lock_table(&table)?;
        tracing::info!(event = "table_lock_set", table = %table);
        Ok(())
    }

    /// Unlocking a table that no longer exists is allowed so stale entries can be cleared.
    pub async fn unlock(&self, caller: &Caller, name: &str) -> Result<()> {
        self.manager.gate().authorize_view(caller)?;
        let table = Identifier::parse(name)?;
        self.manager.gate().unlock_table(&table)?;
        tracing::info!(event = "table_lock_cleared", table = %table);
        Ok(())
    }
}

fn first_duplicate(names: &[Identifier]) -> Option<&Identifier> {
    names.iter().enumerate().find_map(|(position, name)| {
        names[..position]
            .iter()
            .any(|earlier| earlier.as_str().eq_ignore_ascii_case(name.as_str()))
            .then_some(name)
    })
}
