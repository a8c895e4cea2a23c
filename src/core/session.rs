//! Pre-flight session check.
//!
//! Runs before any listing. The workflow never logs in itself; it only
//! refuses to start without a session.

use crate::error::{CommandFailedDetails, Error, Result};
use crate::targets::Target;
use crate::tools;
use crate::transport::Transport;

/// Verify the tool is installed and an authenticated session exists.
pub fn preflight(target: &dyn Target, transport: &dyn Transport) -> Result<()> {
    tools::require_installed(target.tool())?;
    check(target, transport)
}

/// Run the target's session check through `transport`.
///
/// A check that cannot even be started counts as no session.
pub fn check(target: &dyn Target, transport: &dyn Transport) -> Result<()> {
    let invocation = target.session_check();
    let output = transport.run(&invocation).map_err(|err| {
        tracing::warn!(target_kind = target.kind(), code = err.code.as_str(), "session check did not run");
        Error::auth_session_invalid(
            CommandFailedDetails {
                command: invocation.display(),
                exit_code: -1,
                stdout: String::new(),
                stderr: err.summary(),
                group: None,
            },
            target.session_hint(),
        )
    })?;

    if let Some(reason) = target.session_failure(&output) {
        tracing::warn!(target_kind = target.kind(), %reason, "session check failed");
        let mut details = output.failure_details(&invocation, None);
        if details.stderr.is_empty() {
            details.stderr = reason;
        }
        return Err(Error::auth_session_invalid(details, target.session_hint()));
    }

    log_status!("session", "Session check passed for {}", target.kind());
    Ok(())
}
