//! Entity services: authorization, existence and lock checks in front of
//! every introspection and schema change.

pub mod columns;
pub mod context;
pub mod data;
pub mod indexes;
pub mod relations;
pub mod settings;
pub mod tables;

pub use columns::ColumnService;
pub use context::{SchemaManager, ServiceConfig};
pub use data::DataService;
pub use indexes::IndexService;
pub use relations::RelationService;
pub use settings::SettingsService;
pub use tables::TableService;
