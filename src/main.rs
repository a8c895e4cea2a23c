use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;
mod tty;

use commands::{config, doctor, images, indices, GlobalArgs};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "sweep")]
#[command(version = VERSION)]
#[command(about = "Confirmed, pattern-based cleanup of Elasticsearch indices and ECR images")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Delete Elasticsearch indices matching a pattern
    Indices(indices::IndicesArgs),
    /// Purge untagged ECR images or delete one by tag
    Images(images::ImagesArgs),
    /// Check that oc and aws are installed and recent enough
    Doctor(doctor::DoctorArgs),
    /// Manage sweep configuration
    Config(config::ConfigArgs),
}

/// Diagnostics go to stderr, filtered by `SWEEP_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_env("SWEEP_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> std::process::ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let global = GlobalArgs {
        cancel: sweep::interrupt::install(),
    };

    let (json_result, exit_code) = commands::run_json(cli.command, &global);
    if let Err(err) = output::print_json_result(json_result) {
        tracing::error!(code = err.code.as_str(), "failed to write response");
    }

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
