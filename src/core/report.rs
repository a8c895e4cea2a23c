//! Run reports.
//!
//! A [`RunReport`] is the only thing a run hands back: every delete result
//! in order, per-group outcomes for multi-group runs, and the counters the
//! summary is built from.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure,
}

/// Result of one delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    /// Listed; candidates (if any) were executed.
    Processed,
    /// Listing failed; nothing in the group was touched.
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupReport {
    pub group: String,
    pub status: GroupStatus,
    pub candidates: usize,
    pub succeeded: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Still running; never present in a returned report.
    Pending,
    Completed,
    NoCandidates,
    Aborted,
    Interrupted,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: Uuid,
    pub target: String,
    pub status: RunStatus,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub groups_skipped: usize,
    pub results: Vec<ExecutionResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupReport>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunReport {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            target: target.into(),
            status: RunStatus::Pending,
            processed: 0,
            succeeded: 0,
            failed: 0,
            groups_skipped: 0,
            results: Vec::new(),
            groups: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn record_result(&mut self, result: ExecutionResult) {
        self.processed += 1;
        match result.outcome {
            Outcome::Success => self.succeeded += 1,
            Outcome::Failure => self.failed += 1,
        }
        self.results.push(result);
    }

    /// Record a group whose listing failed. It contributes nothing to `processed`.
    pub fn record_group_skipped(&mut self, group: String, error: String) {
        self.groups_skipped += 1;
        self.groups.push(GroupReport {
            group,
            status: GroupStatus::Skipped,
            candidates: 0,
            succeeded: 0,
            failed: 0,
            error: Some(error),
        });
    }

    /// Record a listed group, counting the results produced since `first_result`.
    pub fn record_group_processed(&mut self, group: String, first_result: usize) {
        let results = &self.results[first_result.min(self.results.len())..];
        let succeeded = results.iter().filter(|r| r.outcome == Outcome::Success).count();
        let failed = results.len() - succeeded;

        self.groups.push(GroupReport {
            group,
            status: GroupStatus::Processed,
            candidates: results.len(),
            succeeded,
            failed,
            error: None,
        });
    }

    pub fn finish(&mut self, status: RunStatus) {
        self.status = status;
        self.finished_at = Some(Utc::now());
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// Human-readable end-of-run summary.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();

        match self.status {
            RunStatus::NoCandidates => {
                lines.push(format!("No {} found matching the pattern.", self.target));
                return lines;
            }
            RunStatus::Aborted => {
                lines.push("Aborted by operator. Nothing was deleted.".to_string());
                return lines;
            }
            RunStatus::Interrupted => {
                lines.push("Interrupted. No further deletes were issued.".to_string());
            }
            RunStatus::Pending | RunStatus::Completed => {}
        }

        lines.push(format!("Candidates processed: {}", self.processed));
        lines.push(format!("Deleted: {}", self.succeeded));
        lines.push(format!("Failed: {}", self.failed));

        if !self.groups.is_empty() {
            lines.push(format!(
                "Groups processed: {}, skipped (listing error): {}",
                self.groups.len() - self.groups_skipped,
                self.groups_skipped
            ));
        }

        for result in self.results.iter().filter(|r| r.outcome == Outcome::Failure) {
            match &result.group {
                Some(group) => lines.push(format!("  failed {} in {}: {}", result.target, group, result.detail)),
                None => lines.push(format!("  failed {}: {}", result.target, result.detail)),
            }
        }

        for group in self.groups.iter().filter(|g| g.status == GroupStatus::Skipped) {
            lines.push(format!(
                "  skipped group {}: {}",
                group.group,
                group.error.as_deref().unwrap_or("listing failed")
            ));
        }

        lines
    }
}
