use schemaward_core::{
    Column, DataPreview, Error, ForeignKey, Identifier, Index, Missing, Result, Table,
};

use crate::adapter::Engine;
use crate::mysql::{mapper, queries};

/// Rows returned by a preview when the caller gives no limit.
pub const DEFAULT_PREVIEW_LIMIT: u64 = 50;
/// Upper bound on rows returned by a single preview.
pub const MAX_PREVIEW_LIMIT: u64 = 1000;

/// Read-only view of the live schema.
///
/// Each call that targets a table re-checks that it exists, since nothing
/// spans the check and the read.
#[derive(Clone, Copy)]
pub struct Introspector<'a> {
    engine: &'a dyn Engine,
}

impl<'a> Introspector<'a> {
    pub fn new(engine: &'a dyn Engine) -> Self {
        Self { engine }
    }

    /// Tables with column and row counts. Lock and protection flags are left
    /// unset for the caller to layer on.
    pub async fn list_tables(&self) -> Result<Vec<Table>> {
        let mut tables = mapper::map_tables(queries::list_tables(self.engine).await?);
        for table in &mut tables {
            match Identifier::exact(&table.name) {
                Ok(ident) => table.row_count = queries::row_count(self.engine, &ident).await?,
                Err(_) => {
                    tracing::warn!(event = "table_not_addressable", table = %table.name);
                }
            }
        }
        Ok(tables)
    }

    /// Names of every base table.
    pub async fn table_names(&self) -> Result<Vec<String>> {
        Ok(queries::list_tables(self.engine)
            .await?
            .into_iter()
            .map(|table| table.name)
            .collect())
    }

    pub async fn table_exists(&self, table: &Identifier) -> Result<bool> {
        queries::table_exists(self.engine, table).await
    }

    /// Fail with `NotFound` unless the table exists.
    pub async fn require_table(&self, table: &Identifier) -> Result<()> {
        if self.table_exists(table).await? {
            Ok(())
        } else {
            Err(Error::NotFound(Missing::Table(table.to_string())))
        }
    }

    pub async fn describe_table(&self, table: &Identifier) -> Result<Vec<Column>> {
        self.require_table(table).await?;
        Ok(mapper::map_columns(
            queries::list_columns(self.engine, table).await?,
        ))
    }

    pub async fn column_exists(&self, table: &Identifier, column: &Identifier) -> Result<bool> {
        queries::column_exists(self.engine, table, column).await
    }

    pub async fn column_count(&self, table: &Identifier) -> Result<u64> {
        self.require_table(table).await?;
        queries::column_count(self.engine, table).await
    }

    pub async fn list_indexes(&self, table: &Identifier) -> Result<Vec<Index>> {
        self.require_table(table).await?;
        Ok(mapper::map_indexes(
            queries::list_indexes(self.engine, table).await?,
        ))
    }

    /// Find an index by name, ignoring ASCII case as the engine does.
    pub async fn find_index(&self, table: &Identifier, name: &str) -> Result<Option<Index>> {
        Ok(self
            .list_indexes(table)
            .await?
            .into_iter()
            .find(|index| index.name.eq_ignore_ascii_case(name)))
    }

    pub async fn index_exists(&self, table: &Identifier, name: &str) -> Result<bool> {
        Ok(self.find_index(table, name).await?.is_some())
    }

    pub async fn list_foreign_keys(&self, table: &Identifier) -> Result<Vec<ForeignKey>> {
        self.require_table(table).await?;
        let keys = queries::list_foreign_keys(self.engine, table).await?;
        let rules = queries::list_referential_rules(self.engine, table).await?;
        Ok(mapper::map_foreign_keys(keys, rules))
    }

    pub async fn find_foreign_key(&self, table: &Identifier, name: &str) -> Result<Option<ForeignKey>> {
        Ok(self
            .list_foreign_keys(table)
            .await?
            .into_iter()
            .find(|fk| fk.name.eq_ignore_ascii_case(name)))
    }

    pub async fn foreign_key_exists(&self, table: &Identifier, name: &str) -> Result<bool> {
        Ok(self.find_foreign_key(table, name).await?.is_some())
    }

    pub async fn row_count(&self, table: &Identifier) -> Result<u64> {
        self.require_table(table).await?;
        queries::row_count(self.engine, table).await
    }

    /// A page of rows plus the column list and total row count.
    ///
    /// `limit` is clamped to `1..=MAX_PREVIEW_LIMIT`; zero means the default.
    pub async fn data_preview(&self, table: &Identifier, limit: u64, offset: u64) -> Result<DataPreview> {
        let limit = match limit {
            0 => DEFAULT_PREVIEW_LIMIT,
            other => other.min(MAX_PREVIEW_LIMIT),
        };
        let columns = self.describe_table(table).await?;
        let total = queries::row_count(self.engine, table).await?;
        let rows = queries::preview_rows(self.engine, table, limit, offset).await?;
        Ok(DataPreview {
            columns,
            rows,
            total,
        })
    }
}
