// ABOUTME: Per-command results and the report for a whole run.
// ABOUTME: Command-level failures are statuses on a result, never errors.

use crate::types::{BoundedOutput, Command};
use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;

/// How a single command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    /// Executed and all output captured. A non-zero remote exit status is still success.
    Success,
    /// Executed, but the captured output is incomplete (capacity reached or timed out).
    Truncated,
    ChannelCreateFailed,
    ChannelOpenFailed,
    ExecRejected,
    /// Executed, but reading its output failed part way.
    ReadFailed,
}

impl CommandStatus {
    /// Whether the command failed to run or to deliver its output.
    pub fn is_failure(&self) -> bool {
        !matches!(self, CommandStatus::Success | CommandStatus::Truncated)
    }

    /// Whether the output is usable but possibly incomplete.
    pub fn is_partial(&self) -> bool {
        matches!(self, CommandStatus::Truncated)
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CommandStatus::Success => "success",
            CommandStatus::Truncated => "output truncated",
            CommandStatus::ChannelCreateFailed => "channel creation failed",
            CommandStatus::ChannelOpenFailed => "channel open failed",
            CommandStatus::ExecRejected => "exec rejected",
            CommandStatus::ReadFailed => "read failed",
        };
        f.write_str(text)
    }
}

/// Outcome of one command, in the same position as the command in its list.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub command: Command,
    pub output: BoundedOutput,
    pub status: CommandStatus,
    pub exit_status: Option<u32>,
    pub detail: Option<String>,
}

impl CommandResult {
    /// A command that never produced output because a channel step failed.
    pub fn failed(
        command: &Command,
        status: CommandStatus,
        capacity: usize,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            command: command.clone(),
            output: BoundedOutput::with_capacity(capacity),
            status,
            exit_status: None,
            detail: Some(detail.into()),
        }
    }

    pub fn text(&self) -> String {
        self.output.to_text()
    }
}

impl Serialize for CommandResult {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let mut state = s.serialize_struct("CommandResult", 6)?;
        state.serialize_field("command", self.command.as_str())?;
        state.serialize_field("output", &self.output.to_text())?;
        state.serialize_field("truncated", &self.output.is_truncated())?;
        state.serialize_field("status", &self.status)?;
        match self.exit_status {
            Some(code) => state.serialize_field("exit_status", &code)?,
            None => state.skip_field("exit_status")?,
        }
        match &self.detail {
            Some(detail) => state.serialize_field("detail", detail)?,
            None => state.skip_field("detail")?,
        }
        state.end()
    }
}

/// Everything a completed run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub results: Vec<CommandResult>,
}

impl RunReport {
    pub fn failures(&self) -> impl Iterator<Item = &CommandResult> {
        self.results.iter().filter(|r| r.status.is_failure())
    }
}
