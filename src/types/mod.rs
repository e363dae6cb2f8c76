// ABOUTME: Validated domain types shared by the runner and the CLI.
// ABOUTME: Command text, command lists, and bounded output buffers.

mod command;
mod output;

pub use command::{
    Command, CommandError, CommandList, CommandListError, MAX_COMMAND_LEN, MAX_COMMANDS,
};
pub use output::{BoundedOutput, DEFAULT_OUTPUT_CAPACITY};
