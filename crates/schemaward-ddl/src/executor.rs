use schemaward_core::{ColumnSpec, ForeignKeySpec, Identifier, IndexSpec, Result, Statement};
use schemaward_introspect::Engine;

use crate::statements::{self, PrimaryKeyChange};

/// Builds schema statements and runs each through `Engine::execute`.
///
/// Every method issues exactly one statement. Nothing is wrapped in a
/// transaction, so a caller chaining several methods sees each succeed or
/// fail on its own.
#[derive(Clone, Copy)]
pub struct DdlExecutor<'a> {
    engine: &'a dyn Engine,
}

impl<'a> DdlExecutor<'a> {
    pub fn new(engine: &'a dyn Engine) -> Self {
        Self { engine }
    }

    /// Execute an already-built statement.
    pub async fn run(&self, statement: &Statement) -> Result<u64> {
        tracing::debug!(event = "ddl_execute", engine = self.engine.engine(), sql = %statement);
        match self.engine.execute(statement).await {
            Ok(affected) => Ok(affected),
            Err(err) => {
                tracing::warn!(event = "ddl_failed", sql = %statement, error = %err);
                Err(err)
            }
        }
    }

    pub async fn create_table(&self, table: &Identifier, columns: &[ColumnSpec]) -> Result<()> {
        self.run(&statements::create_table(table, columns)?).await?;
        Ok(())
    }

    pub async fn add_column(&self, table: &Identifier, column: &ColumnSpec) -> Result<()> {
        self.run(&statements::add_column(table, column)).await?;
        Ok(())
    }

    pub async fn modify_column(
        &self,
        table: &Identifier,
        current: &Identifier,
        column: &ColumnSpec,
        primary: PrimaryKeyChange,
    ) -> Result<()> {
        self.run(&statements::modify_column(table, current, column, primary))
            .await?;
        Ok(())
    }

    pub async fn drop_column(&self, table: &Identifier, column: &Identifier) -> Result<()> {
        self.run(&statements::drop_column(table, column)).await?;
        Ok(())
    }

    pub async fn add_index(&self, table: &Identifier, index: &IndexSpec) -> Result<()> {
        self.run(&statements::add_index(table, index)).await?;
        Ok(())
    }

    /// Refuses `PRIMARY` before anything reaches the engine.
    pub async fn drop_index(&self, table: &Identifier, index: &Identifier) -> Result<()> {
        self.run(&statements::drop_index(table, index)?).await?;
        Ok(())
    }

    pub async fn add_foreign_key(&self, table: &Identifier, fk: &ForeignKeySpec) -> Result<()> {
        self.run(&statements::add_foreign_key(table, fk)).await?;
        Ok(())
    }

    pub async fn drop_foreign_key(&self, table: &Identifier, name: &Identifier) -> Result<()> {
        self.run(&statements::drop_foreign_key(table, name)).await?;
        Ok(())
    }

    pub async fn drop_table(&self, table: &Identifier) -> Result<()> {
        self.run(&statements::drop_table(table)).await?;
        Ok(())
    }
}
