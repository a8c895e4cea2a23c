use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigInvalidJson,

    ValidationMissingArgument,
    ValidationInvalidArgument,

    ToolNotInstalled,
    AuthSessionInvalid,

    ListingFailed,
    ListingUnparseable,
    CacheMissing,

    WorkflowInvalidTransition,

    InternalIoError,
    InternalJsonError,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigInvalidJson => "config.invalid_json",

            ErrorCode::ValidationMissingArgument => "validation.missing_argument",
            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",

            ErrorCode::ToolNotInstalled => "tool.not_installed",
            ErrorCode::AuthSessionInvalid => "auth.session_invalid",

            ErrorCode::ListingFailed => "listing.failed",
            ErrorCode::ListingUnparseable => "listing.unparseable",
            ErrorCode::CacheMissing => "cache.missing",

            ErrorCode::WorkflowInvalidTransition => "workflow.invalid_transition",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingArgumentDetails {
    pub args: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalIoErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// What an external command reported when it failed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandFailedDetails {
    pub command: String,
    pub exit_code: i32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stderr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolNotInstalledDetails {
    pub tool: String,
}

fn to_details<T: Serialize>(details: T) -> Value {
    serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
        }
    }

    pub fn validation_missing_argument(args: Vec<String>) -> Self {
        Self::new(
            ErrorCode::ValidationMissingArgument,
            "Missing required argument",
            to_details(MissingArgumentDetails { args }),
        )
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
    ) -> Self {
        Self::new(
            ErrorCode::ValidationInvalidArgument,
            "Invalid argument",
            to_details(InvalidArgumentDetails {
                field: field.into(),
                problem: problem.into(),
            }),
        )
    }

    pub fn config_invalid_json(path: impl Into<String>, err: serde_json::Error) -> Self {
        let details = serde_json::json!({
            "path": path.into(),
            "error": err.to_string(),
        });

        Self::new(
            ErrorCode::ConfigInvalidJson,
            "Invalid JSON in configuration",
            details,
        )
    }

    pub fn tool_not_installed(tool: impl Into<String>) -> Self {
        let tool = tool.into();
        Self::new(
            ErrorCode::ToolNotInstalled,
            format!("'{}' was not found on PATH", tool),
            to_details(ToolNotInstalledDetails { tool: tool.clone() }),
        )
        .with_hint(format!("Install '{}' and make sure it is on PATH", tool))
        .with_hint("Run 'sweep doctor' to check required tools")
    }

    pub fn auth_session_invalid(details: CommandFailedDetails, hint: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::AuthSessionInvalid,
            "No valid session for the target system",
            to_details(details),
        )
        .with_hint(hint)
    }

    pub fn listing_failed(details: CommandFailedDetails) -> Self {
        Self::new(
            ErrorCode::ListingFailed,
            "Listing query failed",
            to_details(details),
        )
    }

    pub fn listing_unparseable(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::ListingUnparseable,
            "Listing response could not be parsed",
            to_details(InternalIoErrorDetails {
                error: error.into(),
                context,
            }),
        )
    }

    pub fn cache_missing(path: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::CacheMissing,
            "Listing cache not found",
            serde_json::json!({ "path": path.into() }),
        )
        .with_hint("The filter phase only reads a listing written by the same run")
    }

    pub fn workflow_invalid_transition(from: &str, to: &str) -> Self {
        Self::new(
            ErrorCode::WorkflowInvalidTransition,
            format!("Illegal workflow transition {} -> {}", from, to),
            serde_json::json!({ "from": from, "to": to }),
        )
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalIoError,
            "IO error",
            to_details(InternalIoErrorDetails {
                error: error.into(),
                context,
            }),
        )
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        Self::new(
            ErrorCode::InternalJsonError,
            "JSON error",
            serde_json::json!({ "error": error.into(), "context": context }),
        )
    }

    pub fn internal_unexpected(error: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InternalUnexpected,
            "Unexpected error",
            serde_json::json!({ "error": error.into() }),
        )
    }

    /// Message plus the most specific detail field, for one-line reports.
    pub fn summary(&self) -> String {
        let detail = ["stderr", "error", "problem"].iter().find_map(|key| {
            self.details
                .get(*key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
        });

        match detail {
            Some(detail) => format!("{}: {}", self.message, detail),
            None => self.message.clone(),
        }
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_failed_carries_command_details() {
        let err = Error::listing_failed(CommandFailedDetails {
            command: "aws ecr describe-repositories".to_string(),
            exit_code: 255,
            stdout: String::new(),
            stderr: "AccessDenied".to_string(),
            group: None,
        });

        assert_eq!(err.code.as_str(), "listing.failed");
        assert_eq!(err.details["exitCode"], 255);
        assert_eq!(err.details["stderr"], "AccessDenied");
        assert!(err.details.get("stdout").is_none());
    }

    #[test]
    fn tool_not_installed_has_hints() {
        let err = Error::tool_not_installed("oc");
        assert_eq!(err.code, ErrorCode::ToolNotInstalled);
        assert_eq!(err.hints.len(), 2);
        assert!(err.message.contains("oc"));
    }

    #[test]
    fn summary_prefers_stderr_detail() {
        let err = Error::listing_failed(CommandFailedDetails {
            command: "aws ecr list-images".to_string(),
            exit_code: 255,
            stdout: String::new(),
            stderr: "AccessDeniedException".to_string(),
            group: None,
        });
        assert_eq!(err.summary(), "Listing query failed: AccessDeniedException");
        assert_eq!(Error::cache_missing("/tmp/x").summary(), "Listing cache not found");
    }
}
