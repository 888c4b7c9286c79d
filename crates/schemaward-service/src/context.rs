use std::collections::BTreeSet;
use std::sync::Arc;

use schemaward_access::{AccessGate, SettingsStore};
use schemaward_core::Result;
use schemaward_ddl::DdlExecutor;
use schemaward_introspect::{Engine, Introspector};

use crate::{
    ColumnService, DataService, IndexService, RelationService, SettingsService, TableService,
};

/// Host-supplied knobs that are not part of the persisted settings.
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    /// Tables owned by the host application. Listed as protected and never dropped.
    pub protected_tables: BTreeSet<String>,
}

impl ServiceConfig {
    pub fn with_protected<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.protected_tables.extend(tables.into_iter().map(Into::into));
        self
    }
}

/// Entry point for every entity service, built once at start-up and shared.
#[derive(Clone)]
pub struct SchemaManager {
    engine: Arc<dyn Engine>,
    gate: AccessGate,
    config: ServiceConfig,
}

impl SchemaManager {
    pub fn new(engine: Arc<dyn Engine>, gate: AccessGate, config: ServiceConfig) -> Self {
        Self {
            engine,
            gate,
            config,
        }
    }

    /// Build the manager and make sure a settings record exists.
    pub async fn bootstrap(
        engine: Arc<dyn Engine>,
        store: Arc<dyn SettingsStore>,
        config: ServiceConfig,
    ) -> Result<Self> {
        let gate = AccessGate::new(store);
        gate.initialize(engine.as_ref()).await?;
        tracing::info!(
            event = "schema_manager_ready",
            engine = engine.engine(),
            protected_tables = config.protected_tables.len()
        );
        Ok(Self::new(engine, gate, config))
    }

    pub fn engine(&self) -> &dyn Engine {
        self.engine.as_ref()
    }

    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn introspector(&self) -> Introspector<'_> {
        Introspector::new(self.engine.as_ref())
    }

    pub fn ddl(&self) -> DdlExecutor<'_> {
        DdlExecutor::new(self.engine.as_ref())
    }

    pub fn is_protected(&self, table: &str) -> bool {
        self.config
            .protected_tables
            .iter()
            .any(|protected| protected.eq_ignore_ascii_case(table))
    }

    pub fn tables(&self) -> TableService<'_> {
        TableService::new(self)
    }

    pub fn columns(&self) -> ColumnService<'_> {
        ColumnService::new(self)
    }

    pub fn indexes(&self) -> IndexService<'_> {
        IndexService::new(self)
    }

    pub fn relations(&self) -> RelationService<'_> {
        RelationService::new(self)
    }

    pub fn data(&self) -> DataService<'_> {
        DataService::new(self)
    }

    pub fn settings(&self) -> SettingsService<'_> {
        SettingsService::new(self)
    }
}
