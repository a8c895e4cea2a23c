use clap::{Args, Subcommand};
use serde::Serialize;

use sweep::cache::ListingCache;
use sweep::config::{self, SweepConfig};
use sweep::lister;
use sweep::log_status;
use sweep::session;
use sweep::targets::{RegistryTarget, Target};
use sweep::transport::ProcessTransport;
use sweep::workflow::{self, RunOptions};
use sweep::{ResourceRecord, RunReport};

use super::{CmdResult, GlobalArgs};
use crate::tty::TtyConfirmer;

#[derive(Args)]
pub struct ImagesArgs {
    #[command(subcommand)]
    command: ImagesCommand,
}

#[derive(Subcommand)]
enum ImagesCommand {
    /// Delete untagged images from one repository
    Purge {
        /// Repository to purge
        #[arg(long)]
        repository: String,
        /// AWS CLI profile (defaults to registry.profile)
        #[arg(long)]
        profile: Option<String>,
        /// Substring matched against digest and tag status joined together
        #[arg(long, default_value = "")]
        pattern: String,
    },
    /// Delete untagged images from every repository whose name contains the group marker
    PurgeAll {
        /// AWS CLI profile (defaults to registry.profile)
        #[arg(long)]
        profile: Option<String>,
        /// Repository name marker (defaults to registry.groupMarker)
        #[arg(long)]
        marker: Option<String>,
        /// Substring matched against digest and tag status joined together
        #[arg(long, default_value = "")]
        pattern: String,
    },
    /// Delete one image by its exact tag
    Delete {
        #[arg(long)]
        repository: String,
        /// Tag to delete; matched exactly, never as a pattern
        #[arg(long)]
        tag: String,
        /// AWS CLI profile (defaults to registry.profile)
        #[arg(long)]
        profile: Option<String>,
    },
    /// List images in a repository without deleting anything
    List {
        #[arg(long)]
        repository: String,
        /// AWS CLI profile (defaults to registry.profile)
        #[arg(long)]
        profile: Option<String>,
        /// Include tagged images
        #[arg(long)]
        all: bool,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagesOutput {
    command: String,
    profile: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    repository: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    marker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<RunReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    images: Option<Vec<ResourceRecord>>,
}

pub fn run(args: ImagesArgs, global: &GlobalArgs) -> CmdResult<ImagesOutput> {
    let config = config::load_config();

    match args.command {
        ImagesCommand::Purge {
            repository,
            profile,
            pattern,
        } => purge(&config, global, repository, profile, &pattern),
        ImagesCommand::PurgeAll {
            profile,
            marker,
            pattern,
        } => purge_all(&config, global, profile, marker, &pattern),
        ImagesCommand::Delete {
            repository,
            tag,
            profile,
        } => delete_tag(&config, global, repository, tag, profile),
        ImagesCommand::List {
            repository,
            profile,
            all,
        } => list(&config, repository, profile, all),
    }
}

fn resolve_profile(config: &SweepConfig, profile: Option<String>) -> sweep::Result<String> {
    profile
        .or_else(|| config.registry.profile.clone())
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| {
            sweep::Error::validation_missing_argument(vec!["profile".to_string()])
                .with_hint("Pass --profile or set registry.profile in sweep.json")
        })
}

fn purge(
    config: &SweepConfig,
    global: &GlobalArgs,
    repository: String,
    profile: Option<String>,
    pattern: &str,
) -> CmdResult<ImagesOutput> {
    let profile = resolve_profile(config, profile)?;
    let target = RegistryTarget::untagged(profile.as_str());
    let transport = ProcessTransport;
    session::preflight(&target, &transport)?;

    let cache = ListingCache::new(config.cache.resolve_path()?);
    let options = RunOptions {
        pattern,
        cache: &cache,
        cancel: &global.cancel,
    };
    let report = workflow::run_single(
        &target,
        &transport,
        &mut TtyConfirmer,
        options,
        Some(repository.as_str()),
    )?;
    super::print_summary(&report);

    let exit_code = super::exit_code_for_reports(std::slice::from_ref(&report));
    Ok((
        ImagesOutput {
            command: "images.purge".to_string(),
            profile,
            repository: Some(repository),
            marker: None,
            report: Some(report),
            images: None,
        },
        exit_code,
    ))
}

fn purge_all(
    config: &SweepConfig,
    global: &GlobalArgs,
    profile: Option<String>,
    marker: Option<String>,
    pattern: &str,
) -> CmdResult<ImagesOutput> {
    let profile = resolve_profile(config, profile)?;
    let marker = marker.unwrap_or_else(|| config.registry.group_marker.clone());
    if marker.trim().is_empty() {
        return Err(sweep::Error::validation_invalid_argument(
            "marker",
            "an empty marker would select every repository",
        ));
    }

    let target = RegistryTarget::untagged(profile.as_str());
    let transport = ProcessTransport;
    session::preflight(&target, &transport)?;

    let cache = ListingCache::new(config.cache.resolve_path()?);
    let options = RunOptions {
        pattern,
        cache: &cache,
        cancel: &global.cancel,
    };
    let report = workflow::run_grouped(&target, &transport, &mut TtyConfirmer, options, &marker)?;
    super::print_summary(&report);

    let exit_code = super::exit_code_for_reports(std::slice::from_ref(&report));
    Ok((
        ImagesOutput {
            command: "images.purge_all".to_string(),
            profile,
            repository: None,
            marker: Some(marker),
            report: Some(report),
            images: None,
        },
        exit_code,
    ))
}

fn delete_tag(
    config: &SweepConfig,
    global: &GlobalArgs,
    repository: String,
    tag: String,
    profile: Option<String>,
) -> CmdResult<ImagesOutput> {
    let tag = tag.trim().to_string();
    if tag.is_empty() {
        return Err(sweep::Error::validation_missing_argument(vec!["tag".to_string()]));
    }

    let profile = resolve_profile(config, profile)?;
    let target = RegistryTarget::by_tag(profile.as_str());
    let transport = ProcessTransport;
    session::preflight(&target, &transport)?;

    let candidate = ResourceRecord::new(tag).with_attribute("repository", repository.as_str());
    let report = workflow::run_one(
        &target,
        &transport,
        &mut TtyConfirmer,
        candidate,
        Some(repository.as_str()),
        &global.cancel,
    )?;
    super::print_summary(&report);

    let exit_code = super::exit_code_for_reports(std::slice::from_ref(&report));
    Ok((
        ImagesOutput {
            command: "images.delete".to_string(),
            profile,
            repository: Some(repository),
            marker: None,
            report: Some(report),
            images: None,
        },
        exit_code,
    ))
}

fn list(
    config: &SweepConfig,
    repository: String,
    profile: Option<String>,
    all: bool,
) -> CmdResult<ImagesOutput> {
    let profile = resolve_profile(config, profile)?;
    let target = if all {
        RegistryTarget::all_images(profile.as_str())
    } else {
        RegistryTarget::untagged(profile.as_str())
    };
    let transport = ProcessTransport;
    session::preflight(&target, &transport)?;

    let raw = lister::fetch(&target, &transport, Some(repository.as_str()))?;
    let images = target.parse_listing(&raw)?;
    log_status!("images", "{} image(s) in {}", images.len(), repository);

    Ok((
        ImagesOutput {
            command: "images.list".to_string(),
            profile,
            repository: Some(repository),
            marker: None,
            report: None,
            images: Some(images),
        },
        0,
    ))
}
