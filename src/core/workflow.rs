//! The confirmed batch-delete workflow.
//!
//! ```text
//! single:  Init -> Listing -> Filtering -> AwaitingConfirmation -> Executing -> Reporting -> Done
//! one:     Init -> AwaitingConfirmation -> Executing -> Reporting -> Done
//! grouped: Init -> AwaitingConfirmation -> Enumerating -> (Listing -> Filtering -> Executing)* -> Reporting -> Done
//! ```
//!
//! Declining the prompt goes `AwaitingConfirmation -> Aborted -> Reporting`.
//! An empty candidate set goes straight to `Reporting` without a prompt.
//! Every run owns a fresh [`RunContext`]; nothing carries over between runs.

use crate::cache::ListingCache;
use crate::confirm::{self, ConfirmationRequest, Confirmer, Decision};
use crate::enumerator;
use crate::error::{Error, Result};
use crate::executor;
use crate::filter;
use crate::interrupt::{CancelToken, ExecutingGuard};
use crate::lister;
use crate::record::ResourceRecord;
use crate::report::{RunReport, RunStatus};
use crate::targets::{GroupedTarget, Target};
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Enumerating,
    Listing,
    Filtering,
    AwaitingConfirmation,
    Aborted,
    Executing,
    Reporting,
    Done,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Init => "init",
            Phase::Enumerating => "enumerating",
            Phase::Listing => "listing",
            Phase::Filtering => "filtering",
            Phase::AwaitingConfirmation => "awaiting_confirmation",
            Phase::Aborted => "aborted",
            Phase::Executing => "executing",
            Phase::Reporting => "reporting",
            Phase::Done => "done",
        }
    }

    pub fn can_advance_to(&self, next: Phase) -> bool {
        use Phase::*;
        matches!(
            (self, next),
            (Init, Listing)
                | (Init, AwaitingConfirmation)
                | (AwaitingConfirmation, Aborted)
                | (AwaitingConfirmation, Executing)
                | (AwaitingConfirmation, Enumerating)
                | (Enumerating, Listing)
                | (Enumerating, Reporting)
                | (Listing, Filtering)
                | (Listing, Listing)
                | (Listing, Reporting)
                | (Filtering, AwaitingConfirmation)
                | (Filtering, Executing)
                | (Filtering, Listing)
                | (Filtering, Reporting)
                | (Executing, Listing)
                | (Executing, Reporting)
                | (Aborted, Reporting)
                | (Reporting, Done)
        )
    }
}

/// Run-scoped state: the current phase and the report being accumulated.
#[derive(Debug)]
pub struct RunContext {
    phase: Phase,
    report: RunReport,
}

impl RunContext {
    pub fn new(target_kind: &str) -> Self {
        Self {
            phase: Phase::Init,
            report: RunReport::new(target_kind),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn report(&self) -> &RunReport {
        &self.report
    }

    pub fn advance(&mut self, next: Phase) -> Result<()> {
        if !self.phase.can_advance_to(next) {
            return Err(Error::workflow_invalid_transition(
                self.phase.as_str(),
                next.as_str(),
            ));
        }
        tracing::debug!(from = self.phase.as_str(), to = next.as_str(), "phase");
        self.phase = next;
        Ok(())
    }

    /// Close the run with `status` and hand back the report.
    fn finish(mut self, status: RunStatus) -> Result<RunReport> {
        if self.phase != Phase::Reporting {
            self.advance(Phase::Reporting)?;
        }
        self.report.finish(status);
        self.advance(Phase::Done)?;
        Ok(self.report)
    }
}

/// Inputs shared by both workflow variants.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions<'a> {
    pub pattern: &'a str,
    pub cache: &'a ListingCache,
    pub cancel: &'a CancelToken,
}

/// List, cache, filter and confirm, then delete every candidate.
///
/// `group` scopes the listing for grouped targets (a single repository).
/// Fatal listing errors propagate; per-item delete failures are recorded.
pub fn run_single(
    target: &dyn Target,
    transport: &dyn Transport,
    confirmer: &mut dyn Confirmer,
    options: RunOptions<'_>,
    group: Option<&str>,
) -> Result<RunReport> {
    let mut ctx = RunContext::new(target.kind());

    ctx.advance(Phase::Listing)?;
    let raw = lister::fetch(target, transport, group)?;
    options.cache.store(&raw)?;

    ctx.advance(Phase::Filtering)?;
    let candidates = load_candidates(target, options)?;
    if candidates.is_empty() {
        tracing::info!(pattern = options.pattern, "no candidates");
        return ctx.finish(RunStatus::NoCandidates);
    }

    ctx.advance(Phase::AwaitingConfirmation)?;
    let request = ConfirmationRequest::Candidates {
        target_kind: target.kind(),
        group,
        candidates: &candidates,
    };
    if confirm::gate(confirmer, &request)? == Decision::Abort {
        ctx.advance(Phase::Aborted)?;
        return ctx.finish(RunStatus::Aborted);
    }

    execute_and_finish(ctx, target, transport, &candidates, group, options.cancel)
}

/// Confirm and delete one resource the operator named exactly.
///
/// Nothing is listed or filtered; the prompt shows `candidate` as given and
/// the target reports whether it existed.
pub fn run_one(
    target: &dyn Target,
    transport: &dyn Transport,
    confirmer: &mut dyn Confirmer,
    candidate: ResourceRecord,
    group: Option<&str>,
    cancel: &CancelToken,
) -> Result<RunReport> {
    let mut ctx = RunContext::new(target.kind());
    let candidates = [candidate];

    ctx.advance(Phase::AwaitingConfirmation)?;
    let request = ConfirmationRequest::Candidates {
        target_kind: target.kind(),
        group,
        candidates: &candidates,
    };
    if confirm::gate(confirmer, &request)? == Decision::Abort {
        ctx.advance(Phase::Aborted)?;
        return ctx.finish(RunStatus::Aborted);
    }

    execute_and_finish(ctx, target, transport, &candidates, group, cancel)
}

fn execute_and_finish(
    mut ctx: RunContext,
    target: &dyn Target,
    transport: &dyn Transport,
    candidates: &[ResourceRecord],
    group: Option<&str>,
    cancel: &CancelToken,
) -> Result<RunReport> {
    ctx.advance(Phase::Executing)?;
    let execution = {
        let _guard = ExecutingGuard::enter();
        executor::execute(target, transport, candidates, group, cancel)
    };
    for result in execution.results {
        ctx.report.record_result(result);
    }

    let status = if execution.interrupted {
        RunStatus::Interrupted
    } else {
        RunStatus::Completed
    };
    ctx.finish(status)
}

/// Confirm once, then purge matching resources in every group whose name
/// contains `marker`.
///
/// A group whose listing fails, cannot be parsed or cannot be cached is
/// recorded as skipped and the run moves on to the next group. No further
/// prompt is shown per group. Only a failed enumeration, which happens
/// before any delete, is returned as an error.
pub fn run_grouped<T: GroupedTarget>(
    target: &T,
    transport: &dyn Transport,
    confirmer: &mut dyn Confirmer,
    options: RunOptions<'_>,
    marker: &str,
) -> Result<RunReport> {
    let mut ctx = RunContext::new(target.kind());

    ctx.advance(Phase::AwaitingConfirmation)?;
    let description = format!(
        "Delete every {} entry matching '{}' in all groups whose name contains '{}'",
        target.kind(),
        options.pattern,
        marker
    );
    let request = ConfirmationRequest::Operation {
        description: &description,
    };
    if confirm::gate(confirmer, &request)? == Decision::Abort {
        ctx.advance(Phase::Aborted)?;
        return ctx.finish(RunStatus::Aborted);
    }

    // Deletes may happen from here on; Ctrl-C only stops the loop.
    let _guard = ExecutingGuard::enter();

    ctx.advance(Phase::Enumerating)?;
    let groups = enumerator::enumerate(target, transport, marker)?;
    let mut interrupted = false;

    for group in &groups {
        if options.cancel.is_cancelled() {
            interrupted = true;
            break;
        }

        ctx.advance(Phase::Listing)?;
        log_status!("group", "Listing {}", group);
        let raw = match lister::fetch(target, transport, Some(group.as_str())) {
            Ok(raw) => raw,
            Err(err) => {
                skip_group(&mut ctx, group, &err);
                continue;
            }
        };
        if let Err(err) = options.cache.store(&raw) {
            skip_group(&mut ctx, group, &err);
            continue;
        }

        ctx.advance(Phase::Filtering)?;
        let candidates = match load_candidates(target, options) {
            Ok(candidates) => candidates,
            Err(err) => {
                skip_group(&mut ctx, group, &err);
                continue;
            }
        };

        let first = ctx.report.results.len();
        if !candidates.is_empty() {
            ctx.advance(Phase::Executing)?;
            let execution =
                executor::execute(target, transport, &candidates, Some(group.as_str()), options.cancel);
            for result in execution.results {
                ctx.report.record_result(result);
            }
            interrupted = execution.interrupted;
        }
        ctx.report.record_group_processed(group.clone(), first);

        if interrupted {
            break;
        }
    }

    let status = if interrupted {
        RunStatus::Interrupted
    } else if ctx.report.processed == 0 && ctx.report.groups_skipped == 0 {
        RunStatus::NoCandidates
    } else {
        RunStatus::Completed
    };
    ctx.finish(status)
}

/// Read the cached listing back and apply the pattern.
fn load_candidates(target: &dyn Target, options: RunOptions<'_>) -> Result<Vec<ResourceRecord>> {
    let raw = options.cache.load()?;
    let records = target.parse_listing(&raw)?;
    let candidates = filter::filter(&records, options.pattern);
    tracing::debug!(listed = records.len(), candidates = candidates.len(), "filtered");
    Ok(candidates)
}

fn skip_group(ctx: &mut RunContext, group: &str, err: &Error) {
    let reason = err.summary();

    tracing::warn!(group, code = err.code.as_str(), %reason, "skipping group");
    log_status!("group", "Skipping {}: {}", group, reason);
    ctx.report.record_group_skipped(group.to_string(), reason);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndicesConfig;
    use crate::confirm::FixedAnswer;
    use crate::report::Outcome;
    use crate::targets::{IndexTarget, RegistryTarget};
    use crate::transport::{CommandOutput, Invocation};
    use std::cell::RefCell;

    /// Answers by matching the invocation's argument list.
    struct Scripted {
        responses: Vec<(&'static str, CommandOutput)>,
        seen: RefCell<Vec<Invocation>>,
    }

    impl Scripted {
        fn new(responses: Vec<(&'static str, CommandOutput)>) -> Self {
            Self {
                responses,
                seen: RefCell::new(Vec::new()),
            }
        }

        fn deletes(&self) -> usize {
            self.seen
                .borrow()
                .iter()
                .filter(|i| i.args.iter().any(|a| a == "DELETE" || a == "batch-delete-image"))
                .count()
        }
    }

    impl Transport for Scripted {
        fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
            self.seen.borrow_mut().push(invocation.clone());
            let joined = invocation.args.join(" ");
            for (needle, output) in &self.responses {
                if joined.contains(needle) {
                    return Ok(output.clone());
                }
            }
            Ok(CommandOutput::ok(""))
        }
    }

    const LISTING: &str = "app-write-2024.01.01 2024-01-01T00:00:00Z 1gb\n\
                           infra-2024.02.01 2024-02-01T00:00:00Z 2gb\n\
                           audit-2024.01.15 2024-01-15T00:00:00Z 3gb\n";

    fn index_target() -> IndexTarget {
        IndexTarget::new("es-0", &IndicesConfig::default())
    }

    fn cache() -> (tempfile::TempDir, ListingCache) {
        let dir = tempfile::tempdir().unwrap();
        let cache = ListingCache::new(dir.path().join("listing.txt"));
        (dir, cache)
    }

    #[test]
    fn transitions_are_checked() {
        let mut ctx = RunContext::new("indices");
        let err = ctx.advance(Phase::Executing).unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::WorkflowInvalidTransition);
        assert_eq!(ctx.phase(), Phase::Init);

        ctx.advance(Phase::Listing).unwrap();
        ctx.advance(Phase::Filtering).unwrap();
        assert!(!Phase::Aborted.can_advance_to(Phase::Executing));
        assert!(!Phase::Done.can_advance_to(Phase::Listing));
    }

    #[test]
    fn confirmed_run_deletes_each_candidate() {
        let transport = Scripted::new(vec![
            ("_cat/indices", CommandOutput::ok(LISTING)),
            ("-X DELETE", CommandOutput::ok("{\"acknowledged\":true}")),
        ]);
        let (_dir, cache) = cache();
        let cancel = CancelToken::new();
        let mut confirmer = FixedAnswer::new(Some("y"));
        let options = RunOptions {
            pattern: "2024.01",
            cache: &cache,
            cancel: &cancel,
        };

        let report = run_single(&index_target(), &transport, &mut confirmer, options, None).unwrap();

        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(report.processed, 2);
        assert_eq!(report.succeeded, 2);
        assert_eq!(transport.deletes(), 2);
        let ids: Vec<&str> = report.results.iter().map(|r| r.target.as_str()).collect();
        assert_eq!(ids, vec!["app-write-2024.01.01", "audit-2024.01.15"]);
        assert_eq!(cache.load().unwrap(), LISTING);
    }

    #[test]
    fn declining_deletes_nothing() {
        let transport = Scripted::new(vec![("_cat/indices", CommandOutput::ok(LISTING))]);
        let (_dir, cache) = cache();
        let cancel = CancelToken::new();
        let mut confirmer = FixedAnswer::new(Some("n"));
        let options = RunOptions {
            pattern: "2024",
            cache: &cache,
            cancel: &cancel,
        };

        let report = run_single(&index_target(), &transport, &mut confirmer, options, None).unwrap();

        assert_eq!(report.status, RunStatus::Aborted);
        assert_eq!(report.processed, 0);
        assert_eq!(transport.deletes(), 0);
    }

    #[test]
    fn no_match_skips_prompt() {
        let transport = Scripted::new(vec![("_cat/indices", CommandOutput::ok(LISTING))]);
        let (_dir, cache) = cache();
        let cancel = CancelToken::new();
        let mut confirmer = FixedAnswer::new(Some("y"));
        let options = RunOptions {
            pattern: "nomatch",
            cache: &cache,
            cancel: &cancel,
        };

        let report = run_single(&index_target(), &transport, &mut confirmer, options, None).unwrap();

        assert_eq!(report.status, RunStatus::NoCandidates);
        assert_eq!(confirmer.asked, 0);
    }

    #[test]
    fn listing_failure_is_fatal_for_single_runs() {
        let transport = Scripted::new(vec![("_cat/indices", CommandOutput::failed(1, "forbidden"))]);
        let (_dir, cache) = cache();
        let cancel = CancelToken::new();
        let mut confirmer = FixedAnswer::new(Some("y"));
        let options = RunOptions {
            pattern: "",
            cache: &cache,
            cancel: &cancel,
        };

        let err = run_single(&index_target(), &transport, &mut confirmer, options, None).unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::ListingFailed);
        assert_eq!(confirmer.asked, 0);
    }

    #[test]
    fn grouped_run_skips_failed_groups_and_continues() {
        let transport = Scripted::new(vec![
            (
                "describe-repositories",
                CommandOutput::ok(
                    r#"{"repositories":[{"repositoryName":"a-snapshot"},{"repositoryName":"b-release"},{"repositoryName":"c-snapshot"}]}"#,
                ),
            ),
            ("--repository-name a-snapshot --filter", CommandOutput::failed(255, "AccessDeniedException")),
            (
                "--repository-name c-snapshot --filter",
                CommandOutput::ok(r#"{"imageIds":[{"imageDigest":"sha256:c1"},{"imageDigest":"sha256:c2"}]}"#),
            ),
            ("batch-delete-image", CommandOutput::ok(r#"{"imageIds":[],"failures":[]}"#)),
        ]);
        let (_dir, cache) = cache();
        let cancel = CancelToken::new();
        let mut confirmer = FixedAnswer::new(Some("Y"));
        let options = RunOptions {
            pattern: "",
            cache: &cache,
            cancel: &cancel,
        };

        let report = run_grouped(
            &RegistryTarget::untagged("dev"),
            &transport,
            &mut confirmer,
            options,
            "snapshot",
        )
        .unwrap();

        assert_eq!(confirmer.asked, 1);
        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(report.groups_skipped, 1);
        assert_eq!(report.processed, 2);
        assert!(report.results.iter().all(|r| r.outcome == Outcome::Success));
        assert!(report.results.iter().all(|r| r.group.as_deref() == Some("c-snapshot")));
        assert!(!transport
            .seen
            .borrow()
            .iter()
            .any(|i| i.args.iter().any(|a| a == "b-release")));
    }

    #[test]
    fn grouped_run_keeps_report_when_cache_breaks_midway() {
        /// Replaces the cache directory with a plain file after the first delete.
        struct BreaksCache {
            inner: Scripted,
            cache_dir: std::path::PathBuf,
        }

        impl Transport for BreaksCache {
            fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
                let output = self.inner.run(invocation)?;
                if invocation.args.iter().any(|a| a == "batch-delete-image") {
                    std::fs::remove_dir_all(&self.cache_dir).ok();
                    std::fs::write(&self.cache_dir, "not a directory").unwrap();
                }
                Ok(output)
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let cache_dir = dir.path().join("cache");
        let cache = ListingCache::new(cache_dir.join("listing.txt"));
        let transport = BreaksCache {
            inner: Scripted::new(vec![
                (
                    "describe-repositories",
                    CommandOutput::ok(
                        r#"{"repositories":[{"repositoryName":"a-snapshot"},{"repositoryName":"b-snapshot"}]}"#,
                    ),
                ),
                ("list-images", CommandOutput::ok(r#"{"imageIds":[{"imageDigest":"sha256:1"}]}"#)),
                ("batch-delete-image", CommandOutput::ok(r#"{"imageIds":[],"failures":[]}"#)),
            ]),
            cache_dir,
        };
        let cancel = CancelToken::new();
        let mut confirmer = FixedAnswer::new(Some("y"));
        let options = RunOptions {
            pattern: "",
            cache: &cache,
            cancel: &cancel,
        };

        let report = run_grouped(
            &RegistryTarget::untagged("dev"),
            &transport,
            &mut confirmer,
            options,
            "snapshot",
        )
        .unwrap();

        assert_eq!(transport.inner.deletes(), 1);
        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(report.processed, 1);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.groups_skipped, 1);
        let skipped = report.groups.iter().find(|g| g.group == "b-snapshot").unwrap();
        assert!(skipped.error.is_some());
    }

    #[test]
    fn single_tag_delete_lists_nothing() {
        let transport = Scripted::new(vec![(
            "batch-delete-image",
            CommandOutput::ok(r#"{"imageIds":[{"imageTag":"1.4.0"}],"failures":[]}"#),
        )]);
        let cancel = CancelToken::new();
        let mut confirmer = FixedAnswer::new(Some("y"));

        let report = run_one(
            &RegistryTarget::by_tag("dev"),
            &transport,
            &mut confirmer,
            ResourceRecord::new("1.4.0"),
            Some("team/app"),
            &cancel,
        )
        .unwrap();

        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(report.succeeded, 1);
        let seen = transport.seen.borrow();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].args.contains(&"imageTag=1.4.0".to_string()));
    }

    #[test]
    fn single_tag_delete_reports_missing_tag() {
        let transport = Scripted::new(vec![(
            "batch-delete-image",
            CommandOutput::ok(
                r#"{"imageIds":[],"failures":[{"imageId":{"imageTag":"9.9.9"},"failureCode":"ImageNotFound","failureReason":"Requested image not found"}]}"#,
            ),
        )]);
        let cancel = CancelToken::new();
        let mut confirmer = FixedAnswer::new(Some("y"));

        let report = run_one(
            &RegistryTarget::by_tag("dev"),
            &transport,
            &mut confirmer,
            ResourceRecord::new("9.9.9"),
            Some("team/app"),
            &cancel,
        )
        .unwrap();

        assert_eq!(report.failed, 1);
        assert!(report.results[0].detail.starts_with("ImageNotFound"));
    }

    #[test]
    fn single_tag_delete_declined_sends_nothing() {
        let transport = Scripted::new(vec![]);
        let cancel = CancelToken::new();
        let mut confirmer = FixedAnswer::new(Some("yes"));

        let report = run_one(
            &RegistryTarget::by_tag("dev"),
            &transport,
            &mut confirmer,
            ResourceRecord::new("1.4.0"),
            Some("team/app"),
            &cancel,
        )
        .unwrap();

        assert_eq!(report.status, RunStatus::Aborted);
        assert!(transport.seen.borrow().is_empty());
    }

    #[test]
    fn grouped_run_declined_never_enumerates() {
        let transport = Scripted::new(vec![]);
        let (_dir, cache) = cache();
        let cancel = CancelToken::new();
        let mut confirmer = FixedAnswer::new(None);
        let options = RunOptions {
            pattern: "",
            cache: &cache,
            cancel: &cancel,
        };

        let report = run_grouped(
            &RegistryTarget::untagged("dev"),
            &transport,
            &mut confirmer,
            options,
            "snapshot",
        )
        .unwrap();

        assert_eq!(report.status, RunStatus::Aborted);
        assert!(transport.seen.borrow().is_empty());
    }
}
