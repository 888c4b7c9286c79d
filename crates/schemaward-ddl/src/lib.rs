//! Schema-changing statements: builders and the executor that runs them.

pub mod executor;
pub mod statements;

pub use executor::DdlExecutor;
pub use statements::PrimaryKeyChange;
