//! Elasticsearch indices reached through `oc exec ... es_util`.

use serde_json::Value;

use super::Target;
use crate::config::IndicesConfig;
use crate::error::{Error, Result};
use crate::executor::DeleteCommand;
use crate::record::{self, ResourceRecord};
use crate::tools::Tool;
use crate::transport::{CommandOutput, Invocation};

#[derive(Debug, Clone)]
pub struct IndexTarget {
    pub pod: String,
    pub namespace: String,
    pub container: String,
    pub columns: Vec<String>,
}

impl IndexTarget {
    pub fn new(pod: impl Into<String>, config: &IndicesConfig) -> Self {
        Self {
            pod: pod.into(),
            namespace: config.namespace.clone(),
            container: config.container.clone(),
            columns: config.columns.clone(),
        }
    }

    /// `oc exec <pod> --container <c> -n <ns> -- es_util <query...>`
    fn es_util(&self, query: &[String]) -> Invocation {
        Invocation::new(Tool::Oc.program())
            .args(["exec", self.pod.as_str(), "--container", self.container.as_str()])
            .args(["-n", self.namespace.as_str(), "--", "es_util"])
            .args(query.iter().cloned())
    }

    fn cat_query(&self) -> String {
        let mut columns = vec!["index".to_string()];
        columns.extend(self.columns.iter().cloned());
        format!("--query=_cat/indices?h={}", columns.join(","))
    }
}

impl Target for IndexTarget {
    fn kind(&self) -> &'static str {
        "indices"
    }

    fn tool(&self) -> Tool {
        Tool::Oc
    }

    fn session_check(&self) -> Invocation {
        Invocation::new(Tool::Oc.program()).arg("whoami")
    }

    fn session_failure(&self, output: &CommandOutput) -> Option<String> {
        let mentions_error = output.stdout.to_lowercase().contains("error")
            || output.stderr.to_lowercase().contains("error");

        if !output.success || mentions_error {
            Some(output.error_text())
        } else {
            None
        }
    }

    fn session_hint(&self) -> String {
        "Log in to the cluster as an admin with 'oc login' and retry".to_string()
    }

    fn listing(&self, _group: Option<&str>) -> Result<Invocation> {
        Ok(self.es_util(&[self.cat_query()]))
    }

    fn parse_listing(&self, raw: &str) -> Result<Vec<ResourceRecord>> {
        Ok(record::parse_columns(raw, &self.columns))
    }

    fn delete(&self, command: &DeleteCommand) -> Result<Invocation> {
        if command.target.is_empty() || command.target.starts_with('_') {
            return Err(Error::validation_invalid_argument(
                "index",
                format!("'{}' is not a deletable index name", command.target),
            ));
        }

        Ok(self.es_util(&[
            format!("--query={}", command.target),
            "-X".to_string(),
            "DELETE".to_string(),
        ]))
    }

    fn delete_failure(&self, output: &CommandOutput) -> Option<String> {
        let body: Value = serde_json::from_str(output.stdout.trim()).ok()?;
        let error = body.get("error")?;

        let reason = error
            .get("reason")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());

        match body.get("status").and_then(Value::as_i64) {
            Some(status) => Some(format!("{} (status {})", reason, status)),
            None => Some(reason),
        }
    }
}
