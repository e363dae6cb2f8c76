// ABOUTME: Validated remote command text and the ordered list of commands for one run.
// ABOUTME: Loads line-delimited command files with bounded length and count.

use nonempty::NonEmpty;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Longest command text accepted, in bytes.
pub const MAX_COMMAND_LEN: usize = 255;

/// Most commands run in one batch.
pub const MAX_COMMANDS: usize = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("command cannot be empty")]
    Empty,

    #[error("command exceeds maximum length of {MAX_COMMAND_LEN} bytes ({0} bytes)")]
    TooLong(usize),

    #[error("command contains a line break or NUL byte")]
    ControlChar,
}

#[derive(Debug, Error)]
pub enum CommandListError {
    #[error("no commands to run")]
    Empty,

    #[error("line {line}: {source}")]
    InvalidLine {
        line: usize,
        #[source]
        source: CommandError,
    },

    #[error("failed to read command file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Literal shell command text, sent to the remote verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Command(String);

impl Command {
    pub fn new(value: &str) -> Result<Self, CommandError> {
        if value.is_empty() {
            return Err(CommandError::Empty);
        }

        if value.len() > MAX_COMMAND_LEN {
            return Err(CommandError::TooLong(value.len()));
        }

        if value.bytes().any(|b| matches!(b, b'\n' | b'\r' | 0)) {
            return Err(CommandError::ControlChar);
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered, non-empty list of commands for one run.
#[derive(Debug, Clone)]
pub struct CommandList(NonEmpty<Command>);

impl CommandList {
    pub fn new(commands: Vec<Command>) -> Result<Self, CommandListError> {
        NonEmpty::from_vec(commands)
            .map(Self)
            .ok_or(CommandListError::Empty)
    }

    /// Build a list from raw strings, e.g. repeated `--command` flags.
    ///
    /// Like [`CommandList::parse`], keeps at most [`MAX_COMMANDS`].
    pub fn from_strings<I, S>(values: I) -> Result<Self, CommandListError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut commands = Vec::new();

        for (idx, value) in values.into_iter().enumerate() {
            if commands.len() == MAX_COMMANDS {
                tracing::warn!(
                    "command limit of {} reached, ignoring remaining commands",
                    MAX_COMMANDS
                );
                break;
            }

            let command =
                Command::new(value.as_ref()).map_err(|source| CommandListError::InvalidLine {
                    line: idx + 1,
                    source,
                })?;
            commands.push(command);
        }

        Self::new(commands)
    }

    /// Parse line-delimited command text.
    ///
    /// Trailing `\n`/`\r` are stripped and blank lines skipped. Reading stops
    /// after [`MAX_COMMANDS`] commands.
    pub fn parse(text: &str) -> Result<Self, CommandListError> {
        let mut commands = Vec::new();

        for (idx, raw) in text.split('\n').enumerate() {
            let line = raw.trim_end_matches(['\r', '\n']);
            if line.is_empty() {
                continue;
            }

            if commands.len() == MAX_COMMANDS {
                tracing::warn!(
                    line = idx + 1,
                    "command limit of {} reached, ignoring remaining lines",
                    MAX_COMMANDS
                );
                break;
            }

            let command = Command::new(line).map_err(|source| CommandListError::InvalidLine {
                line: idx + 1,
                source,
            })?;
            commands.push(command);
        }

        Self::new(commands)
    }

    pub fn load(path: &Path) -> Result<Self, CommandListError> {
        let text = std::fs::read_to_string(path).map_err(|source| CommandListError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_rejects_empty() {
        assert_eq!(Command::new(""), Err(CommandError::Empty));
    }

    #[test]
    fn command_accepts_max_length() {
        let text = "x".repeat(MAX_COMMAND_LEN);
        assert!(Command::new(&text).is_ok());
        assert_eq!(
            Command::new(&format!("{text}x")),
            Err(CommandError::TooLong(MAX_COMMAND_LEN + 1))
        );
    }

    #[test]
    fn command_keeps_quoting_verbatim() {
        let cmd = Command::new(r#"/interface/lte/at-chat [find] input="AT\$GPSACP""#).unwrap();
        assert_eq!(cmd.as_str(), r#"/interface/lte/at-chat [find] input="AT\$GPSACP""#);
    }

    #[test]
    fn parse_strips_line_endings_and_skips_blank_lines() {
        let list = CommandList::parse("echo A\r\n\n  \nfalse\necho B").unwrap();
        let cmds: Vec<_> = list.iter().map(Command::as_str).collect();
        assert_eq!(cmds, vec!["echo A", "  ", "false", "echo B"]);
    }

    #[test]
    fn parse_stops_at_command_limit() {
        let text = (0..MAX_COMMANDS + 5)
            .map(|i| format!("echo {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let list = CommandList::parse(&text).unwrap();
        assert_eq!(list.len(), MAX_COMMANDS);
    }

    #[test]
    fn from_strings_stops_at_command_limit() {
        let values: Vec<String> = (0..MAX_COMMANDS + 5).map(|i| format!("echo {i}")).collect();
        let list = CommandList::from_strings(&values).unwrap();
        assert_eq!(list.len(), MAX_COMMANDS);
        assert_eq!(list.iter().last().unwrap().as_str(), "echo 99");
    }

    #[test]
    fn parse_reports_line_number_of_long_line() {
        let text = format!("echo ok\n{}\n", "y".repeat(MAX_COMMAND_LEN + 1));
        let err = CommandList::parse(&text).unwrap_err();
        assert!(matches!(err, CommandListError::InvalidLine { line: 2, .. }));
    }

    #[test]
    fn parse_empty_text_is_error() {
        assert!(matches!(
            CommandList::parse("\n\r\n"),
            Err(CommandListError::Empty)
        ));
    }
}
