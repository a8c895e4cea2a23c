// Public modules
pub mod cache;
pub mod config;
pub mod confirm;
pub mod enumerator;
pub mod error;
pub mod executor;
pub mod filter;
pub mod interrupt;
pub mod lister;
pub mod record;
pub mod report;
pub mod session;
pub mod targets;
pub mod tools;
pub mod transport;
pub mod workflow;

// Internal modules - not part of public API
pub(crate) mod paths;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
pub use record::ResourceRecord;
pub use report::{ExecutionResult, Outcome, RunReport, RunStatus};
