use clap::Args;
use serde::Serialize;

use sweep::cache::ListingCache;
use sweep::config;
use sweep::confirm::{self, Decision};
use sweep::interrupt;
use sweep::session;
use sweep::targets::IndexTarget;
use sweep::transport::ProcessTransport;
use sweep::workflow::{self, RunOptions};
use sweep::{RunReport, RunStatus};

use super::{CmdResult, GlobalArgs};
use crate::output::CliError;
use crate::tty::{self, TtyConfirmer};

#[derive(Args)]
pub struct IndicesArgs {
    /// Elasticsearch pod to exec into (prompted for when omitted)
    #[arg(long)]
    pub pod: Option<String>,

    /// Substring matched against index name, creation date and size (prompted for when omitted)
    #[arg(long)]
    pub pattern: Option<String>,

    /// Namespace of the logging stack (overrides indices.namespace)
    #[arg(long)]
    pub namespace: Option<String>,

    /// Container running es_util (overrides indices.container)
    #[arg(long)]
    pub container: Option<String>,

    /// Offer another cleanup after each run
    #[arg(long)]
    pub repeat: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicesOutput {
    command: String,
    pod: String,
    namespace: String,
    runs: Vec<RunReport>,
    /// Why the repeat loop stopped early, after at least one run finished.
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<CliError>,
}

pub fn run(args: IndicesArgs, global: &GlobalArgs) -> CmdResult<IndicesOutput> {
    let config = config::load_config();
    let mut settings = config.indices.clone();
    if let Some(namespace) = args.namespace {
        settings.namespace = namespace;
    }
    if let Some(container) = args.container {
        settings.container = container;
    }

    let pod = match args.pod {
        Some(pod) => pod,
        None => tty::prompt("Elasticsearch pod name: ")?,
    };
    if pod.trim().is_empty() {
        return Err(sweep::Error::validation_missing_argument(vec!["pod".to_string()]));
    }

    let target = IndexTarget::new(pod.trim(), &settings);
    let transport = ProcessTransport;
    session::preflight(&target, &transport)?;

    let cache = ListingCache::new(config.cache.resolve_path()?);
    let mut confirmer = TtyConfirmer;
    let mut pattern = args.pattern;
    let repeat = args.repeat;

    let outcome = repeat_runs(
        || cleanup(&target, &transport, &mut confirmer, &cache, global, pattern.take()),
        || {
            if !repeat || !tty::is_stdin_tty() {
                return Ok(false);
            }
            let answer = tty::read_answer("Run another cleanup? [y/N]: ")?;
            Ok(confirm::evaluate(answer.as_deref()) == Decision::Proceed)
        },
        |runs| remember(&target, runs),
    );
    interrupt::set_pending_output(None);
    let (runs, stopped) = outcome?;

    let exit_code = match &stopped {
        Some(err) => {
            tracing::error!(code = err.code.as_str(), runs = runs.len(), "repeat loop stopped");
            eprintln!("Stopped after {} run(s): {}", runs.len(), err.summary());
            crate::output::exit_code_for_error(err.code)
        }
        None => super::exit_code_for_reports(&runs),
    };

    Ok((
        IndicesOutput {
            command: "indices".to_string(),
            pod: target.pod,
            namespace: target.namespace,
            runs,
            error: stopped.as_ref().map(CliError::from),
        },
        exit_code,
    ))
}

/// Run cleanups until `another` says stop or a run is interrupted.
///
/// An error before the first run finishes is returned as is. A later
/// error ends the loop and comes back next to the runs that completed.
fn repeat_runs(
    mut run_once: impl FnMut() -> sweep::Result<RunReport>,
    mut another: impl FnMut() -> sweep::Result<bool>,
    mut on_run: impl FnMut(&[RunReport]),
) -> sweep::Result<(Vec<RunReport>, Option<sweep::Error>)> {
    let mut runs = Vec::new();

    loop {
        let report = match run_once() {
            Ok(report) => report,
            Err(err) if runs.is_empty() => return Err(err),
            Err(err) => return Ok((runs, Some(err))),
        };
        super::print_summary(&report);

        let interrupted = report.status == RunStatus::Interrupted;
        runs.push(report);
        on_run(&runs);

        if interrupted {
            return Ok((runs, None));
        }
        match another() {
            Ok(true) => {}
            Ok(false) => return Ok((runs, None)),
            Err(err) => return Ok((runs, Some(err))),
        }
    }
}

/// One prompt-list-filter-confirm-delete pass.
fn cleanup(
    target: &IndexTarget,
    transport: &ProcessTransport,
    confirmer: &mut TtyConfirmer,
    cache: &ListingCache,
    global: &GlobalArgs,
    pattern: Option<String>,
) -> sweep::Result<RunReport> {
    let pattern = match pattern {
        Some(p) => p,
        None => tty::prompt_line("Pattern to match (index name, date or size): ")?,
    };
    if pattern.is_empty() {
        tracing::warn!("empty pattern matches every index");
        eprintln!("Warning: an empty pattern matches every index.");
    }

    let options = RunOptions {
        pattern: &pattern,
        cache,
        cancel: &global.cancel,
    };
    workflow::run_single(target, transport, confirmer, options, None)
}

/// Keep the finished runs ready for printing if Ctrl-C ends the process.
fn remember(target: &IndexTarget, runs: &[RunReport]) {
    let output = IndicesOutput {
        command: "indices".to_string(),
        pod: target.pod.clone(),
        namespace: target.namespace.clone(),
        runs: runs.to_vec(),
        error: None,
    };
    match crate::output::render_success(&output) {
        Ok(json) => interrupt::set_pending_output(Some(json)),
        Err(err) => tracing::debug!(code = err.code.as_str(), "could not render interim output"),
    }
}
