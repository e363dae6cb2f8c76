// ABOUTME: Entry point for the sshprobe CLI application.
// ABOUTME: Parses arguments, runs the probe and maps the failing stage to the exit status.

mod cli;

use clap::Parser;
use cli::{Cli, Commands, RunArgs};
use sshprobe::config::{self, CONFIG_FILENAME, Config};
use sshprobe::diagnostics::Diagnostics;
use sshprobe::error::{Error, Result};
use sshprobe::output::{Output, OutputMode};
use sshprobe::run::Orchestrator;
use sshprobe::ssh::{HostTrustVerifier, SshConnector};
use std::env;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let (result, output) = match cli.command {
        Commands::Init { force } => {
            let output = Output::new(OutputMode::Normal);
            let result = init(force, &output);
            (result, output)
        }
        Commands::Run(args) => {
            let mut output = Output::new(args.output);
            let result = run(args, &mut output).await;
            (result, output)
        }
    };

    if let Err(e) = result {
        output.error(&format!("[{}] {e}", e.stage()));
        std::process::exit(e.exit_code());
    }
}

fn init(force: bool, output: &Output) -> Result<()> {
    let cwd = env::current_dir()?;
    config::init_config(&cwd, force)?;
    output.success(&format!("Created {CONFIG_FILENAME}"));
    Ok(())
}

async fn run(args: RunArgs, output: &mut Output) -> Result<()> {
    let (config_path, _, overrides) = args.into_parts();
    let cwd = env::current_dir()?;
    let (config, base_dir) = load_config(config_path, cwd)?;

    let resolved = config.resolve(overrides, &base_dir)?;
    let settings = resolved.settings;
    let commands = resolved.commands;

    output.start_timer();
    output.progress(&format!(
        "Running {} command(s) on {}@{}",
        commands.len(),
        settings.user,
        settings.endpoint
    ));

    let verifier = HostTrustVerifier::new(resolved.known_hosts, resolved.trust);
    let orchestrator = Orchestrator::new(SshConnector::new(), verifier, settings);

    let mut diag = Diagnostics::default();
    let result = orchestrator.run(&commands, &mut diag).await;

    if let Ok(report) = &result {
        output.report(report);
    }

    // Emit collected warnings
    for warning in diag.warnings() {
        output.warning(&warning.message);
    }

    let report = result?;
    let failed = report.failures().count();
    if failed == 0 {
        output.success(&format!("Ran {} command(s)", report.results.len()));
    } else {
        output.success(&format!(
            "Ran {} command(s), {} failed",
            report.results.len(),
            failed
        ));
    }

    Ok(())
}

/// Load `--config`, or discover a config file in `cwd`. Having none is fine.
///
/// Returns the directory that relative paths in the file are resolved against.
fn load_config(explicit: Option<PathBuf>, cwd: PathBuf) -> Result<(Config, PathBuf)> {
    match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(Error::ConfigNotFound(path));
            }
            let config = Config::load(&path)?;
            let base_dir = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or(cwd);
            Ok((config, base_dir))
        }
        None => match Config::discover(&cwd) {
            Ok((config, path)) => {
                tracing::debug!("using config {}", path.display());
                Ok((config, cwd))
            }
            Err(Error::ConfigNotFound(_)) => Ok((Config::default(), cwd)),
            Err(e) => Err(e),
        },
    }
}
