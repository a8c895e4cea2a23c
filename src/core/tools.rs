//! Installation and version checks for the external CLIs.

use std::path::PathBuf;

use regex::Regex;
use semver::Version;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::transport::{Invocation, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Oc,
    Aws,
}

impl Tool {
    pub fn all() -> &'static [Tool] {
        &[Tool::Oc, Tool::Aws]
    }

    pub fn program(&self) -> &'static str {
        match self {
            Tool::Oc => "oc",
            Tool::Aws => "aws",
        }
    }

    fn version_invocation(&self) -> Invocation {
        match self {
            Tool::Oc => Invocation::new(self.program()).args(["version", "--client"]),
            Tool::Aws => Invocation::new(self.program()).arg("--version"),
        }
    }

    /// Oldest version the invocations in this crate were written against.
    pub fn minimum_version(&self) -> Version {
        match self {
            Tool::Oc => Version::new(4, 0, 0),
            Tool::Aws => Version::new(2, 0, 0),
        }
    }
}

/// Absolute path of the tool, if it is on PATH.
pub fn locate(tool: Tool) -> Option<PathBuf> {
    which::which(tool.program()).ok()
}

pub fn require_installed(tool: Tool) -> Result<PathBuf> {
    locate(tool).ok_or_else(|| Error::tool_not_installed(tool.program()))
}

/// Extract a semantic version from `--version` style output.
///
/// Understands `aws-cli/2.15.30 Python/3.11.8 ...` and
/// `Client Version: 4.14.0` (optionally `v`-prefixed, possibly with a
/// build suffix).
pub fn parse_version(output: &str) -> Option<Version> {
    let pattern = Regex::new(r"(?:aws-cli/|Client Version:\s*v?)(\d+)\.(\d+)(?:\.(\d+))?").ok()?;
    let caps = pattern.captures(output)?;

    let part = |i: usize| -> Option<u64> {
        match caps.get(i) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(0),
        }
    };

    Some(Version::new(part(1)?, part(2)?, part(3)?))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolStatus {
    pub tool: Tool,
    pub installed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub minimum_version: String,
    pub supported: bool,
}

/// Inspect one tool: location, reported version, minimum satisfied.
pub fn inspect(tool: Tool, transport: &dyn Transport) -> ToolStatus {
    let path = locate(tool);

    let version = path.as_ref().and_then(|_| {
        let output = transport.run(&tool.version_invocation()).ok()?;
        // aws v1 printed its version on stderr
        parse_version(&output.stdout).or_else(|| parse_version(&output.stderr))
    });

    let minimum = tool.minimum_version();
    let supported = version.as_ref().is_some_and(|v| *v >= minimum);

    ToolStatus {
        tool,
        installed: path.is_some(),
        path: path.map(|p| p.display().to_string()),
        version: version.map(|v| v.to_string()),
        minimum_version: minimum.to_string(),
        supported,
    }
}
