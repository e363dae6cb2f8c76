// ABOUTME: Config scaffolding for new probe setups.
// ABOUTME: Creates a commented sshprobe.yml template.

use std::path::Path;

use crate::error::{Error, Result};

use super::{
    CONFIG_FILENAME, DEFAULT_COMMAND_TIMEOUT, DEFAULT_COMMANDS_FILE, DEFAULT_CONNECT_TIMEOUT,
    DEFAULT_PORT,
};
use crate::types::DEFAULT_OUTPUT_CAPACITY;

pub fn init_config(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    std::fs::write(&config_path, template_yaml())?;
    tracing::debug!("wrote {}", config_path.display());

    Ok(())
}

fn template_yaml() -> String {
    format!(
        r#"host: 192.168.88.1
port: {port}
user: admin
# Read the password from the environment rather than storing it here.
password:
  env: SSHPROBE_PASSWORD

connect_timeout: {connect}
command_timeout: {command}

# Unknown host keys: prompt, accept-new (trust on first use) or reject
trust: prompt
# known_hosts: ~/.ssh/known_hosts

output_capacity: {capacity}

# One command per line. Inline `commands:` take precedence over the file.
commands_file: {commands_file}
# commands:
#   - /system identity print
"#,
        port = DEFAULT_PORT,
        connect = humantime::format_duration(DEFAULT_CONNECT_TIMEOUT),
        command = humantime::format_duration(DEFAULT_COMMAND_TIMEOUT),
        capacity = DEFAULT_OUTPUT_CAPACITY,
        commands_file = DEFAULT_COMMANDS_FILE,
    )
}
