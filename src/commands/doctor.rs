use clap::Args;
use serde::Serialize;

use sweep::config;
use sweep::tools::{self, Tool, ToolStatus};
use sweep::transport::ProcessTransport;

use super::CmdResult;

#[derive(Args)]
pub struct DoctorArgs {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorOutput {
    command: String,
    tools: Vec<ToolStatus>,
    config_path: String,
    config_exists: bool,
    cache_path: String,
}

/// Report installation and version status of every external tool.
/// Exits 1 when any tool is missing or older than supported.
pub fn run(_args: DoctorArgs) -> CmdResult<DoctorOutput> {
    crate::tty::status("Checking required tools...");

    let statuses: Vec<ToolStatus> = Tool::all()
        .iter()
        .map(|tool| tools::inspect(*tool, &ProcessTransport))
        .collect();

    for status in &statuses {
        match (&status.path, &status.version) {
            (None, _) => eprintln!("{:<4} not installed", status.tool.program()),
            (Some(path), Some(version)) => eprintln!(
                "{:<4} {} ({}){}",
                status.tool.program(),
                version,
                path,
                if status.supported { "" } else { " below minimum" }
            ),
            (Some(path), None) => eprintln!("{:<4} unknown version ({})", status.tool.program(), path),
        }
    }

    let exit_code = if statuses.iter().all(|s| s.installed && s.supported) {
        0
    } else {
        1
    };

    let cache_path = config::load_config().cache.resolve_path()?;

    Ok((
        DoctorOutput {
            command: "doctor".to_string(),
            tools: statuses,
            config_path: config::config_path()?,
            config_exists: config::config_exists(),
            cache_path: cache_path.display().to_string(),
        },
        exit_code,
    ))
}
