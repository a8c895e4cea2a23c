//! Group enumeration for multi-group targets.

use crate::error::Result;
use crate::lister::run_listing;
use crate::targets::GroupedTarget;
use crate::transport::Transport;

/// List every group and keep those whose name contains `marker`,
/// compared case-insensitively, in the order the system returned them.
///
/// A failed group listing is fatal: without it there is nothing to iterate.
pub fn enumerate(target: &dyn GroupedTarget, transport: &dyn Transport, marker: &str) -> Result<Vec<String>> {
    let raw = run_listing(&target.group_listing(), transport, None)?;
    let groups = target.parse_groups(&raw)?;
    let total = groups.len();

    let selected = select(groups, marker);
    tracing::info!(total, selected = selected.len(), marker, "enumerated groups");

    Ok(selected)
}

pub fn select(groups: Vec<String>, marker: &str) -> Vec<String> {
    let marker = marker.to_lowercase();
    groups
        .into_iter()
        .filter(|g| g.to_lowercase().contains(&marker))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::targets::RegistryTarget;
    use crate::transport::{CommandOutput, Invocation};

    struct Canned(CommandOutput);

    impl Transport for Canned {
        fn run(&self, _invocation: &Invocation) -> Result<CommandOutput> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn selects_marker_groups_in_order() {
        let groups = vec![
            "web-snapshot".to_string(),
            "web-release".to_string(),
            "api-SNAPSHOT".to_string(),
        ];
        assert_eq!(select(groups, "snapshot"), vec!["web-snapshot", "api-SNAPSHOT"]);
    }

    #[test]
    fn enumerates_from_describe_repositories() {
        let transport = Canned(CommandOutput::ok(
            r#"{"repositories":[{"repositoryName":"a-snapshot"},{"repositoryName":"b"},{"repositoryName":"c-snapshot"}]}"#,
        ));
        let groups = enumerate(&RegistryTarget::untagged("dev"), &transport, "snapshot").unwrap();
        assert_eq!(groups, vec!["a-snapshot", "c-snapshot"]);
    }

    #[test]
    fn failed_group_listing_is_fatal() {
        let transport = Canned(CommandOutput::failed(255, "AccessDeniedException"));
        let err = enumerate(&RegistryTarget::untagged("dev"), &transport, "snapshot").unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::ListingFailed);
    }
}
