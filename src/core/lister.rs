//! Inventory listing.

use crate::error::{Error, Result};
use crate::targets::Target;
use crate::transport::{Invocation, Transport};

/// Run a listing query and return its raw response.
///
/// A command that fails to spawn, exits non-zero or writes anything to its
/// error channel is a `listing.failed` error. Empty output is an empty
/// listing.
pub fn fetch(target: &dyn Target, transport: &dyn Transport, group: Option<&str>) -> Result<String> {
    let invocation = target.listing(group)?;
    run_listing(&invocation, transport, group)
}

/// Shared by resource and group listings.
pub(crate) fn run_listing(
    invocation: &Invocation,
    transport: &dyn Transport,
    group: Option<&str>,
) -> Result<String> {
    let output = transport.run(invocation).map_err(|err| {
        let mut details = crate::transport::CommandOutput::failed(-1, err.to_string())
            .failure_details(invocation, group);
        if let Some(context) = err.details.get("error").and_then(|v| v.as_str()) {
            details.stderr = context.to_string();
        }
        Error::listing_failed(details)
    })?;

    match output.strict_status() {
        Ok(stdout) => Ok(stdout.to_string()),
        Err(failure) => {
            tracing::debug!(code = failure.code, message = %failure.message, "listing failed");
            Err(Error::listing_failed(output.failure_details(invocation, group)))
        }
    }
}
