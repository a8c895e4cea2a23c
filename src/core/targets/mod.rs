//! External systems the workflow can clean up.
//!
//! A [`Target`] knows how to phrase listing, delete and session-check
//! invocations for its tool and how to read the responses. The workflow in
//! [`crate::workflow`] is written against this trait only.

pub mod indices;
pub mod registry;

pub use indices::IndexTarget;
pub use registry::RegistryTarget;

use crate::error::Result;
use crate::executor::DeleteCommand;
use crate::record::ResourceRecord;
use crate::tools::Tool;
use crate::transport::{CommandOutput, Invocation};

pub trait Target {
    /// Short name used in reports and logs.
    fn kind(&self) -> &'static str;

    /// Tool that must be installed before anything runs.
    fn tool(&self) -> Tool;

    /// Pre-flight query proving an authenticated session exists.
    fn session_check(&self) -> Invocation;

    /// `Some(reason)` when the session check output means "not logged in".
    fn session_failure(&self, output: &CommandOutput) -> Option<String>;

    /// Operator guidance when the session check fails.
    fn session_hint(&self) -> String;

    /// Listing query, scoped to `group` for multi-group systems.
    fn listing(&self, group: Option<&str>) -> Result<Invocation>;

    fn parse_listing(&self, raw: &str) -> Result<Vec<ResourceRecord>>;

    fn delete(&self, command: &DeleteCommand) -> Result<Invocation>;

    /// `Some(detail)` when a delete that exited cleanly still reports failure.
    fn delete_failure(&self, output: &CommandOutput) -> Option<String>;
}

/// A target whose resources live in enumerable groups.
pub trait GroupedTarget: Target {
    fn group_listing(&self) -> Invocation;

    fn parse_groups(&self, raw: &str) -> Result<Vec<String>>;
}
