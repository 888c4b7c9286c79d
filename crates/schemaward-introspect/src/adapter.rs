use std::sync::Arc;

use async_trait::async_trait;

use schemaward_core::{Result, Row, Statement};

/// Trait implemented by relational engines the services talk to.
///
/// Every statement goes through one of these two entry points; identifiers
/// and values travel as statement parameters.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Returns the engine identifier (e.g. `mysql`).
    fn engine(&self) -> &'static str;

    /// Run a read statement and return its rows.
    async fn query(&self, statement: &Statement) -> Result<Vec<Row>>;

    /// Run a schema-changing statement and return the affected-row count.
    async fn execute(&self, statement: &Statement) -> Result<u64>;
}

#[async_trait]
impl<E: Engine + ?Sized> Engine for Arc<E> {
    fn engine(&self) -> &'static str {
        (**self).engine()
    }

    async fn query(&self, statement: &Statement) -> Result<Vec<Row>> {
        (**self).query(statement).await
    }

    async fn execute(&self, statement: &Statement) -> Result<u64> {
        (**self).execute(statement).await
    }
}
