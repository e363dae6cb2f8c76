// ABOUTME: Configuration types and parsing for sshprobe.yml.
// ABOUTME: Merges the optional config file with command-line overrides into one run.

mod deserialize;
mod init;
mod secret;
mod target;

pub use init::init_config;
pub use secret::SecretValue;
pub use target::Target;

use crate::error::{Error, Result};
use crate::run::{RunLimits, RunSettings};
use crate::ssh::{Endpoint, KnownHosts, TrustPolicy};
use crate::types::{CommandList, DEFAULT_OUTPUT_CAPACITY};
use deserialize::{deserialize_capacity, deserialize_commands, deserialize_target};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "sshprobe.yml";
pub const CONFIG_FILENAME_ALT: &str = "sshprobe.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".sshprobe/config.yml";

/// Command file read when neither the command line nor the config names commands.
pub const DEFAULT_COMMANDS_FILE: &str = "ssh_commands.txt";

pub const DEFAULT_PORT: u16 = 22;
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(6);
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(2);

/// Contents of a config file. Every field is optional; the command line fills
/// in or overrides whatever is set here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default, deserialize_with = "deserialize_target")]
    pub host: Option<Target>,

    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub user: Option<String>,

    #[serde(default)]
    pub password: Option<SecretValue>,

    #[serde(default, with = "humantime_serde")]
    pub connect_timeout: Option<Duration>,

    #[serde(default, with = "humantime_serde")]
    pub command_timeout: Option<Duration>,

    #[serde(default)]
    pub trust: Option<TrustPolicy>,

    #[serde(default)]
    pub known_hosts: Option<PathBuf>,

    #[serde(default, deserialize_with = "deserialize_capacity")]
    pub output_capacity: Option<usize>,

    #[serde(default)]
    pub commands_file: Option<PathBuf>,

    #[serde(default, deserialize_with = "deserialize_commands")]
    pub commands: Option<CommandList>,
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty file deserializes to unit; treat it as "nothing set".
        if yaml.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Find a config file in `dir`, returning it with its path.
    pub fn discover(dir: &Path) -> Result<(Self, PathBuf)> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in candidates {
            if path.exists() {
                let config = Self::load(&path)?;
                return Ok((config, path));
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Merge with command-line overrides and validate.
    ///
    /// Relative paths from the file are taken relative to `base_dir`; paths
    /// from the command line are used as given.
    pub fn resolve(self, overrides: Overrides, base_dir: &Path) -> Result<ResolvedRun> {
        let (cli_host, cli_target_port, cli_target_user) = match overrides.target {
            Some(t) => (Some(t.host), t.port, t.user),
            None => (None, None, None),
        };
        let (file_host, file_target_port, file_target_user) = match self.host {
            Some(t) => (Some(t.host), t.port, t.user),
            None => (None, None, None),
        };

        let host = cli_host
            .or(file_host)
            .ok_or_else(|| Error::Usage("no target host given".to_string()))?;

        let port = overrides
            .port
            .or(cli_target_port)
            .or(self.port)
            .or(file_target_port)
            .unwrap_or(DEFAULT_PORT);

        let user = overrides
            .user
            .or(cli_target_user)
            .or(self.user)
            .or(file_target_user)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| Error::Usage("no user given".to_string()))?;

        let credential = match (overrides.password, self.password) {
            (Some(pw), _) => crate::ssh::Credential::new(pw),
            (None, Some(secret)) => secret.resolve()?,
            (None, None) => return Err(Error::Usage("no password given".to_string())),
        };

        let connect_timeout = non_zero(
            overrides
                .connect_timeout
                .or(self.connect_timeout)
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT),
            "connect timeout",
        )?;
        let command_timeout = non_zero(
            overrides
                .command_timeout
                .or(self.command_timeout)
                .unwrap_or(DEFAULT_COMMAND_TIMEOUT),
            "command timeout",
        )?;

        let output_capacity = overrides
            .output_capacity
            .or(self.output_capacity)
            .unwrap_or(DEFAULT_OUTPUT_CAPACITY);
        if output_capacity == 0 {
            return Err(Error::Usage(
                "output capacity must be at least 1 byte".to_string(),
            ));
        }

        let known_hosts = match overrides.known_hosts {
            Some(path) => KnownHosts::at(path),
            None => KnownHosts::new(self.known_hosts.map(|p| base_dir.join(p))),
        };

        let commands = if !overrides.commands.is_empty() {
            CommandList::from_strings(&overrides.commands)?
        } else if let Some(path) = overrides.commands_file {
            CommandList::load(&path)?
        } else if let Some(list) = self.commands {
            list
        } else {
            let path = self
                .commands_file
                .unwrap_or_else(|| PathBuf::from(DEFAULT_COMMANDS_FILE));
            CommandList::load(&base_dir.join(path))?
        };

        Ok(ResolvedRun {
            settings: RunSettings {
                endpoint: Endpoint::new(host, port),
                user,
                credential,
                connect_timeout,
                limits: RunLimits {
                    command_timeout,
                    output_capacity,
                },
            },
            trust: overrides.trust.or(self.trust).unwrap_or_default(),
            known_hosts,
            commands,
        })
    }
}

fn non_zero(value: Duration, what: &str) -> Result<Duration> {
    if value.is_zero() {
        return Err(Error::Usage(format!("{what} must be greater than zero")));
    }
    Ok(value)
}

/// Values given on the command line. `None` (or an empty list) defers to the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub target: Option<Target>,
    pub user: Option<String>,
    pub port: Option<u16>,
    pub password: Option<String>,
    pub commands_file: Option<PathBuf>,
    pub commands: Vec<String>,
    pub connect_timeout: Option<Duration>,
    pub command_timeout: Option<Duration>,
    pub trust: Option<TrustPolicy>,
    pub known_hosts: Option<PathBuf>,
    pub output_capacity: Option<usize>,
}

/// Everything needed to start a run.
#[derive(Debug)]
pub struct ResolvedRun {
    pub settings: RunSettings,
    pub trust: TrustPolicy,
    pub known_hosts: KnownHosts,
    pub commands: CommandList,
}
