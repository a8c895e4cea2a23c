use clap::{Args, Subcommand};
use serde::Serialize;

use sweep::config::{self, SweepConfig};

use super::CmdResult;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Display configuration (defaults merged with sweep.json)
    Show {
        /// Show only built-in defaults (ignore sweep.json)
        #[arg(long)]
        builtin: bool,
    },
    /// Write sweep.json with built-in defaults if it does not exist
    Init,
    /// Reset configuration to built-in defaults (deletes sweep.json)
    Reset,
    /// Show the path to sweep.json
    Path,
}

#[derive(Debug, Serialize)]
pub struct ConfigOutput {
    command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<SweepConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exists: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    created: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deleted: Option<bool>,
}

impl ConfigOutput {
    fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            config: None,
            path: None,
            exists: None,
            created: None,
            deleted: None,
        }
    }
}

pub fn run(args: ConfigArgs) -> CmdResult<ConfigOutput> {
    match args.command {
        ConfigCommand::Show { builtin } => show(builtin),
        ConfigCommand::Init => init(),
        ConfigCommand::Reset => reset(),
        ConfigCommand::Path => path(),
    }
}

fn show(builtin: bool) -> CmdResult<ConfigOutput> {
    let config = if builtin {
        SweepConfig::default()
    } else {
        config::load_config()
    };

    Ok((
        ConfigOutput {
            config: Some(config),
            ..ConfigOutput::new("config.show")
        },
        0,
    ))
}

fn init() -> CmdResult<ConfigOutput> {
    let created = !config::config_exists();
    if created {
        config::save_config(&SweepConfig::default())?;
    }

    Ok((
        ConfigOutput {
            config: Some(config::load_config()),
            path: Some(config::config_path()?),
            created: Some(created),
            ..ConfigOutput::new("config.init")
        },
        0,
    ))
}

fn reset() -> CmdResult<ConfigOutput> {
    let deleted = config::reset_config()?;

    Ok((
        ConfigOutput {
            path: Some(config::config_path()?),
            deleted: Some(deleted),
            ..ConfigOutput::new("config.reset")
        },
        0,
    ))
}

fn path() -> CmdResult<ConfigOutput> {
    Ok((
        ConfigOutput {
            path: Some(config::config_path()?),
            exists: Some(config::config_exists()),
            ..ConfigOutput::new("config.path")
        },
        0,
    ))
}
