//! Per-candidate delete execution.
//!
//! Deletes run one at a time in candidate order. A failed delete is
//! recorded and the loop moves on; nothing is retried.

use serde::Serialize;

use crate::interrupt::{self, CancelToken};
use crate::record::ResourceRecord;
use crate::report::{ExecutionResult, Outcome};
use crate::targets::Target;
use crate::transport::Transport;

/// One delete, addressed by resource id and (for multi-group systems) group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCommand {
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
}

impl DeleteCommand {
    pub fn for_record(record: &ResourceRecord, group: Option<&str>) -> Self {
        Self {
            target: record.id.clone(),
            group_id: group.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Execution {
    pub results: Vec<ExecutionResult>,
    /// Set when the cancel token stopped the loop before every candidate ran.
    pub interrupted: bool,
}

/// Issue one delete per candidate, isolating failures.
///
/// Produces exactly one result per candidate attempted. The cancel token
/// is checked before each delete; once raised, remaining candidates are
/// left untouched.
pub fn execute(
    target: &dyn Target,
    transport: &dyn Transport,
    candidates: &[ResourceRecord],
    group: Option<&str>,
    cancel: &CancelToken,
) -> Execution {
    let mut execution = Execution::default();

    for (index, record) in candidates.iter().enumerate() {
        if cancel.is_cancelled() {
            tracing::warn!(
                remaining = candidates.len() - index,
                "interrupted, skipping remaining deletes"
            );
            execution.interrupted = true;
            break;
        }

        let command = DeleteCommand::for_record(record, group);
        log_status!("delete", "Deleting {} ({}/{})", command.target, index + 1, candidates.len());
        execution.results.push(delete_one(target, transport, command));
    }

    execution
}

fn delete_one(target: &dyn Target, transport: &dyn Transport, command: DeleteCommand) -> ExecutionResult {
    let outcome = target.delete(&command).and_then(|invocation| {
        interrupt::note_delete_issued();
        transport.run(&invocation).map(|output| (invocation, output))
    });

    let failure = match outcome {
        Err(err) => Some(err.summary()),
        Ok((invocation, output)) => match output.status() {
            Err(failure) => {
                tracing::debug!(command = %invocation.display(), "delete exited non-zero");
                Some(if failure.message.is_empty() {
                    format!("exit code {}", failure.code)
                } else {
                    format!("exit code {}: {}", failure.code, failure.message)
                })
            }
            Ok(_) => target.delete_failure(&output),
        },
    };

    match failure {
        None => ExecutionResult {
            target: command.target,
            group: command.group_id,
            outcome: Outcome::Success,
            detail: String::new(),
        },
        Some(detail) => {
            tracing::warn!(
                target_id = %command.target,
                group = command.group_id.as_deref().unwrap_or(""),
                %detail,
                "delete failed"
            );
            ExecutionResult {
                target: command.target,
                group: command.group_id,
                outcome: Outcome::Failure,
                detail,
            }
        }
    }
}
