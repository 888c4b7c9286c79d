//! Engine seam and read-only schema introspection.

pub mod adapter;
pub mod introspector;
pub mod mysql;

pub use adapter::Engine;
pub use introspector::{DEFAULT_PREVIEW_LIMIT, Introspector, MAX_PREVIEW_LIMIT};
pub use mysql::{MySqlEngine, queries};
