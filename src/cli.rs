// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines the run and init subcommands and their arguments.

use clap::{Args, Parser, Subcommand};
use sshprobe::config::{Overrides, Target};
use sshprobe::output::OutputMode;
use sshprobe::ssh::TrustPolicy;
use std::path::PathBuf;

const CONNECTION: Option<&str> = Some("Connection Options");
const LIMITS: Option<&str> = Some("Limit Options");

#[derive(Parser)]
#[command(name = "sshprobe")]
#[command(about = "Run a batch of commands on a remote device over SSH")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Connect, verify the host, authenticate and run every command in order
    Run(RunArgs),

    /// Initialize a new sshprobe.yml configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Remote device as [user@]host[:port]
    #[arg(value_parser = Target::parse)]
    pub target: Option<Target>,

    /// Remote user to authenticate as
    #[arg(short, long, help_heading = CONNECTION)]
    pub user: Option<String>,

    /// SSH port (default 22)
    #[arg(short, long, help_heading = CONNECTION)]
    pub port: Option<u16>,

    /// Password, also answered to every keyboard-interactive prompt
    #[arg(long, env = "SSHPROBE_PASSWORD", hide_env_values = true, help_heading = CONNECTION)]
    pub password: Option<String>,

    /// What to do with a host key that is not in known_hosts
    #[arg(long, value_enum, help_heading = CONNECTION)]
    pub trust: Option<TrustPolicy>,

    /// known_hosts file (default ~/.ssh/known_hosts)
    #[arg(long, help_heading = CONNECTION)]
    pub known_hosts: Option<PathBuf>,

    /// Time allowed for connecting, and again for authenticating (default 6s)
    #[arg(long, help_heading = CONNECTION)]
    pub connect_timeout: Option<humantime::Duration>,

    /// File with one command per line (default ssh_commands.txt)
    #[arg(short = 'f', long = "commands")]
    pub commands_file: Option<PathBuf>,

    /// Command to run; repeat for several. Takes precedence over --commands
    #[arg(short = 'c', long = "command")]
    pub commands: Vec<String>,

    /// Time allowed per command (default 2s)
    #[arg(long, help_heading = LIMITS)]
    pub command_timeout: Option<humantime::Duration>,

    /// Bytes of output kept per command (default 1023)
    #[arg(long, help_heading = LIMITS)]
    pub output_capacity: Option<usize>,

    /// Config file (default: discover sshprobe.yml in the working directory)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputMode::Normal)]
    pub output: OutputMode,
}

impl RunArgs {
    /// Split into the config file location and the values that override it.
    pub fn into_parts(self) -> (Option<PathBuf>, OutputMode, Overrides) {
        let overrides = Overrides {
            target: self.target,
            user: self.user,
            port: self.port,
            password: self.password,
            commands_file: self.commands_file,
            commands: self.commands,
            connect_timeout: self.connect_timeout.map(Into::into),
            command_timeout: self.command_timeout.map(Into::into),
            trust: self.trust,
            known_hosts: self.known_hosts,
            output_capacity: self.output_capacity,
        };
        (self.config, self.output, overrides)
    }
}
