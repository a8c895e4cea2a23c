//! AWS ECR repositories and images reached through the `aws` CLI.

use serde::Deserialize;

use super::{GroupedTarget, Target};
use crate::error::{Error, Result};
use crate::executor::DeleteCommand;
use crate::record::ResourceRecord;
use crate::tools::Tool;
use crate::transport::{CommandOutput, Invocation};

pub const UNTAGGED: &str = "UNTAGGED";

/// How a delete names the image it removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageAddress {
    Digest,
    Tag,
}

impl ImageAddress {
    fn image_id(&self, value: &str) -> String {
        match self {
            ImageAddress::Digest => format!("imageDigest={}", value),
            ImageAddress::Tag => format!("imageTag={}", value),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegistryTarget {
    pub profile: String,
    /// `Some("UNTAGGED")` restricts listings to untagged images.
    pub tag_status: Option<String>,
    pub address: ImageAddress,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListImagesResponse {
    #[serde(default)]
    image_ids: Vec<ImageId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageId {
    image_digest: Option<String>,
    image_tag: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DescribeRepositoriesResponse {
    #[serde(default)]
    repositories: Vec<Repository>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Repository {
    repository_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchDeleteResponse {
    #[serde(default)]
    failures: Vec<BatchDeleteFailure>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchDeleteFailure {
    failure_code: Option<String>,
    failure_reason: Option<String>,
}

impl RegistryTarget {
    /// Target for purging untagged images.
    pub fn untagged(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
            tag_status: Some(UNTAGGED.to_string()),
            address: ImageAddress::Digest,
        }
    }

    /// Target listing every image regardless of tag status.
    pub fn all_images(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
            tag_status: None,
            address: ImageAddress::Digest,
        }
    }

    /// Target whose deletes name images by exact tag.
    pub fn by_tag(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
            tag_status: None,
            address: ImageAddress::Tag,
        }
    }

    fn ecr(&self, operation: &str) -> Invocation {
        Invocation::new(Tool::Aws.program())
            .args(["ecr", operation])
            .args(["--profile", self.profile.as_str()])
    }
}

impl Target for RegistryTarget {
    fn kind(&self) -> &'static str {
        "images"
    }

    fn tool(&self) -> Tool {
        Tool::Aws
    }

    fn session_check(&self) -> Invocation {
        Invocation::new(Tool::Aws.program())
            .args(["configure", "get", "aws_access_key_id"])
            .args(["--profile", self.profile.as_str()])
    }

    fn session_failure(&self, output: &CommandOutput) -> Option<String> {
        if !output.success {
            return Some(output.error_text());
        }
        if output.stdout.trim().is_empty() {
            return Some(format!("profile '{}' has no access key configured", self.profile));
        }
        None
    }

    fn session_hint(&self) -> String {
        format!(
            "Configure the '{}' profile with 'aws configure --profile {}'",
            self.profile, self.profile
        )
    }

    fn listing(&self, group: Option<&str>) -> Result<Invocation> {
        let repository = group.ok_or_else(|| {
            Error::validation_missing_argument(vec!["repository".to_string()])
        })?;

        let mut invocation = self
            .ecr("list-images")
            .args(["--repository-name", repository]);

        if let Some(status) = &self.tag_status {
            invocation = invocation.args(["--filter".to_string(), format!("tagStatus={}", status)]);
        }

        Ok(invocation.args(["--output", "json"]))
    }

    fn parse_listing(&self, raw: &str) -> Result<Vec<ResourceRecord>> {
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        let response: ListImagesResponse = serde_json::from_str(raw)
            .map_err(|e| Error::listing_unparseable(e.to_string(), Some("list-images".to_string())))?;

        let records = response
            .image_ids
            .into_iter()
            .filter_map(|image| {
                let digest = image.image_digest?;
                let record = match image.image_tag {
                    Some(tag) => ResourceRecord::new(digest)
                        .with_attribute("tag_status", "TAGGED")
                        .with_attribute("tag", tag),
                    None => ResourceRecord::new(digest).with_attribute("tag_status", UNTAGGED),
                };
                Some(record)
            })
            .collect();

        Ok(records)
    }

    fn delete(&self, command: &DeleteCommand) -> Result<Invocation> {
        let repository = command.group_id.as_deref().ok_or_else(|| {
            Error::validation_missing_argument(vec!["repository".to_string()])
        })?;

        Ok(self
            .ecr("batch-delete-image")
            .args(["--repository-name", repository])
            .args(["--image-ids".to_string(), self.address.image_id(&command.target)])
            .args(["--output", "json"]))
    }

    fn delete_failure(&self, output: &CommandOutput) -> Option<String> {
        let response: BatchDeleteResponse = match serde_json::from_str(output.stdout.trim()) {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!(error = %err, "batch-delete-image output is not JSON");
                return Some("unparseable delete response".to_string());
            }
        };
        let failure = response.failures.into_iter().next()?;

        Some(format!(
            "{}: {}",
            failure.failure_code.as_deref().unwrap_or("Unknown"),
            failure.failure_reason.as_deref().unwrap_or("no reason given")
        ))
    }
}

impl GroupedTarget for RegistryTarget {
    fn group_listing(&self) -> Invocation {
        self.ecr("describe-repositories").args(["--output", "json"])
    }

    fn parse_groups(&self, raw: &str) -> Result<Vec<String>> {
        let response: DescribeRepositoriesResponse = serde_json::from_str(raw).map_err(|e| {
            Error::listing_unparseable(e.to_string(), Some("describe-repositories".to_string()))
        })?;

        Ok(response
            .repositories
            .into_iter()
            .map(|r| r.repository_name)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIGEST: &str = "sha256:9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08";

    #[test]
    fn untagged_listing_filters_by_tag_status() {
        let inv = RegistryTarget::untagged("ops").listing(Some("team/app-snapshot")).unwrap();
        assert_eq!(
            inv.args,
            vec![
                "ecr",
                "list-images",
                "--profile",
                "ops",
                "--repository-name",
                "team/app-snapshot",
                "--filter",
                "tagStatus=UNTAGGED",
                "--output",
                "json",
            ]
        );
    }

    #[test]
    fn listing_requires_repository() {
        let err = RegistryTarget::untagged("ops").listing(None).unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::ValidationMissingArgument);
    }

    #[test]
    fn parses_untagged_and_tagged_images() {
        let raw = format!(
            r#"{{"imageIds":[{{"imageDigest":"{}"}},{{"imageDigest":"sha256:abc","imageTag":"1.4.0"}}]}}"#,
            DIGEST
        );
        let records = RegistryTarget::all_images("ops").parse_listing(&raw).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, DIGEST);
        assert_eq!(records[0].attribute("tag_status"), Some("UNTAGGED"));
        assert_eq!(records[1].attribute("tag"), Some("1.4.0"));
    }

    #[test]
    fn empty_listing_is_not_an_error() {
        let target = RegistryTarget::untagged("ops");
        assert!(target.parse_listing("").unwrap().is_empty());
        assert!(target.parse_listing(r#"{"imageIds":[]}"#).unwrap().is_empty());
    }

    #[test]
    fn malformed_listing_is_unparseable() {
        let err = RegistryTarget::untagged("ops").parse_listing("<html>").unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::ListingUnparseable);
    }

    #[test]
    fn delete_uses_digest_and_repository() {
        let inv = RegistryTarget::untagged("ops")
            .delete(&DeleteCommand {
                target: DIGEST.to_string(),
                group_id: Some("team/app-snapshot".to_string()),
            })
            .unwrap();
        assert_eq!(inv.args[1], "batch-delete-image");
        assert_eq!(
            &inv.args[inv.args.len() - 3..],
            &[format!("imageDigest={}", DIGEST), "--output".to_string(), "json".to_string()]
        );
    }

    #[test]
    fn tag_delete_names_the_exact_tag() {
        let inv = RegistryTarget::by_tag("ops")
            .delete(&DeleteCommand {
                target: "1.4.0".to_string(),
                group_id: Some("team/app".to_string()),
            })
            .unwrap();
        assert!(inv.args.contains(&"imageTag=1.4.0".to_string()));
        assert!(!inv.args.iter().any(|a| a.starts_with("imageDigest=")));
    }

    #[test]
    fn non_json_delete_response_is_a_failure() {
        let target = RegistryTarget::untagged("ops");
        let text = CommandOutput::ok("FAILURES\tImageNotFound\tRequested image not found\n");
        assert_eq!(
            target.delete_failure(&text).as_deref(),
            Some("unparseable delete response")
        );
        assert!(target.delete_failure(&CommandOutput::ok("")).is_some());
    }

    #[test]
    fn delete_failure_reads_failures_array() {
        let target = RegistryTarget::untagged("ops");
        let failed = CommandOutput::ok(
            r#"{"imageIds":[],"failures":[{"imageId":{},"failureCode":"ImageNotFound","failureReason":"Requested image not found"}]}"#,
        );
        assert_eq!(
            target.delete_failure(&failed).as_deref(),
            Some("ImageNotFound: Requested image not found")
        );

        let ok = CommandOutput::ok(r#"{"imageIds":[{"imageDigest":"sha256:abc"}],"failures":[]}"#);
        assert!(target.delete_failure(&ok).is_none());
    }

    #[test]
    fn parses_repository_names_in_order() {
        let raw = r#"{"repositories":[{"repositoryName":"a/app"},{"repositoryName":"a/app-snapshot"}]}"#;
        let groups = RegistryTarget::untagged("ops").parse_groups(raw).unwrap();
        assert_eq!(groups, vec!["a/app", "a/app-snapshot"]);
    }

    #[test]
    fn session_requires_access_key() {
        let target = RegistryTarget::untagged("ops");
        assert!(target.session_failure(&CommandOutput::ok("AKIA123\n")).is_none());
        assert!(target.session_failure(&CommandOutput::ok("\n")).is_some());
        assert!(target.session_failure(&CommandOutput::failed(1, "")).is_some());
    }
}
