use sweep::interrupt::{CancelToken, INTERRUPTED_EXIT_CODE};
use sweep::{RunReport, RunStatus};

pub type CmdResult<T> = sweep::Result<(T, i32)>;

/// Process-wide state handed to every command.
pub(crate) struct GlobalArgs {
    pub cancel: CancelToken,
}

pub mod config;
pub mod doctor;
pub mod images;
pub mod indices;

/// Exit code for a sequence of runs: 130 if any was interrupted, 1 if any
/// delete failed, 0 otherwise (including aborted and empty runs).
pub(crate) fn exit_code_for_reports(reports: &[RunReport]) -> i32 {
    if reports.iter().any(|r| r.status == RunStatus::Interrupted) {
        INTERRUPTED_EXIT_CODE
    } else if reports.iter().any(RunReport::has_failures) {
        1
    } else {
        0
    }
}

/// Print the human summary of a run to stderr.
pub(crate) fn print_summary(report: &RunReport) {
    for line in report.summary_lines() {
        eprintln!("{}", line);
    }
}

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args))
    };
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (sweep::Result<serde_json::Value>, i32) {
    match command {
        // Commands without global context
        crate::Commands::Doctor(args) => dispatch!(args, doctor),
        crate::Commands::Config(args) => dispatch!(args, config),

        // Commands with global context
        crate::Commands::Indices(args) => dispatch!(args, global, indices),
        crate::Commands::Images(args) => dispatch!(args, global, images),
    }
}
