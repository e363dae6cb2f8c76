// ABOUTME: Runs each command on its own channel, strictly in list order.
// ABOUTME: Channel failures are recorded per command and never stop the batch.

use super::report::{CommandResult, CommandStatus};
use crate::ssh::{RemoteChannel, Transport};
use crate::types::{BoundedOutput, Command, CommandList, DEFAULT_OUTPUT_CAPACITY};
use std::time::Duration;
use tokio::time::{Instant, timeout, timeout_at};

/// Size of a single read from a channel.
pub const TRANSFER_BUFFER_SIZE: usize = 1024;

/// Upper bound on releasing a channel.
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Per-command bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunLimits {
    /// Bounds the open/exec/read cycle of one command.
    pub command_timeout: Duration,
    /// Bytes of output kept per command.
    pub output_capacity: usize,
}

impl Default for RunLimits {
    fn default() -> Self {
        Self {
            command_timeout: Duration::from_secs(2),
            output_capacity: DEFAULT_OUTPUT_CAPACITY,
        }
    }
}

/// Run every command over `transport`, returning one result per command in order.
pub async fn run_commands<T: Transport>(
    transport: &T,
    commands: &CommandList,
    limits: &RunLimits,
) -> Vec<CommandResult> {
    let mut results = Vec::with_capacity(commands.len());

    for (index, command) in commands.iter().enumerate() {
        let result = run_one(transport, command, limits).await;
        match result.status {
            CommandStatus::Success => {
                tracing::debug!(index, bytes = result.output.len(), "command completed: {}", command)
            }
            status => tracing::warn!(
                index,
                %status,
                detail = result.detail.as_deref().unwrap_or(""),
                "command did not complete cleanly: {}",
                command
            ),
        }
        results.push(result);
    }

    results
}

async fn run_one<T: Transport>(
    transport: &T,
    command: &Command,
    limits: &RunLimits,
) -> CommandResult {
    let deadline = Instant::now() + limits.command_timeout;

    let mut channel = match timeout_at(deadline, transport.create_channel()).await {
        Ok(Ok(channel)) => channel,
        Ok(Err(e)) => {
            return CommandResult::failed(
                command,
                CommandStatus::ChannelCreateFailed,
                limits.output_capacity,
                e.to_string(),
            );
        }
        Err(_) => {
            return CommandResult::failed(
                command,
                CommandStatus::ChannelCreateFailed,
                limits.output_capacity,
                timed_out(limits),
            );
        }
    };

    let mut output = BoundedOutput::with_capacity(limits.output_capacity);
    let (status, detail) = drive(&mut channel, command, &mut output, deadline, limits).await;
    let exit_status = channel.exit_status();
    release(channel).await;

    CommandResult {
        command: command.clone(),
        output,
        status,
        exit_status,
        detail,
    }
}

/// Open, exec and drain one channel. The caller releases the channel.
async fn drive<C: RemoteChannel>(
    channel: &mut C,
    command: &Command,
    output: &mut BoundedOutput,
    deadline: Instant,
    limits: &RunLimits,
) -> (CommandStatus, Option<String>) {
    match timeout_at(deadline, channel.open_session()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return (CommandStatus::ChannelOpenFailed, Some(e.to_string())),
        Err(_) => return (CommandStatus::ChannelOpenFailed, Some(timed_out(limits))),
    }

    match timeout_at(deadline, channel.exec(command.as_str())).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return (CommandStatus::ExecRejected, Some(e.to_string())),
        Err(_) => return (CommandStatus::ExecRejected, Some(timed_out(limits))),
    }

    let mut buf = [0u8; TRANSFER_BUFFER_SIZE];
    loop {
        match timeout_at(deadline, channel.read(&mut buf)).await {
            Ok(Ok(0)) => break,
            // Keep draining once full so the remote is not left blocked.
            Ok(Ok(n)) => {
                output.append(&buf[..n]);
            }
            Ok(Err(e)) => return (CommandStatus::ReadFailed, Some(e.to_string())),
            Err(_) => {
                return (
                    CommandStatus::Truncated,
                    Some(format!("output incomplete: {}", timed_out(limits))),
                );
            }
        }
    }

    if output.is_truncated() {
        (
            CommandStatus::Truncated,
            Some(format!("output exceeded {} bytes", output.capacity())),
        )
    } else {
        (CommandStatus::Success, None)
    }
}

async fn release<C: RemoteChannel>(channel: C) {
    match timeout(CLOSE_GRACE, channel.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::debug!("channel close failed: {}", e),
        Err(_) => tracing::debug!("channel close timed out"),
    }
}

fn timed_out(limits: &RunLimits) -> String {
    format!("timed out after {:?}", limits.command_timeout)
}
