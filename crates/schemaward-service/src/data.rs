use schemaward_access::Caller;
use schemaward_core::{DataPreview, Identifier, Result};

use crate::context::SchemaManager;

pub struct DataService<'a> {
    manager: &'a SchemaManager,
}

impl<'a> DataService<'a> {
    pub fn new(manager: &'a SchemaManager) -> Self {
        Self { manager }
    }

    /// A page of rows. Zero `limit` means the default page size.
    pub async fn preview(
        &self,
        caller: &Caller,
        table: &str,
        limit: u64,
        offset: u64,
    ) -> Result<DataPreview> {
        self.manager.gate().authorize_view(caller)?;
        let table = Identifier::parse(table)?;
        let preview = self
            .manager
            .introspector()
            .data_preview(&table, limit, offset)
            .await?;
        tracing::debug!(
            event = "data_previewed",
            table = %table,
            rows = preview.rows.len(),
            total = preview.total
        );
        Ok(preview)
    }
}
