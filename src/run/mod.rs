// ABOUTME: Probe run orchestration with type-safe session states.
// ABOUTME: Connected -> Verified -> Authenticated, then the command batch.

mod orchestrator;
mod report;
mod runner;
mod session;
mod state;

pub use orchestrator::{Orchestrator, RunSettings};
pub use report::{CommandResult, CommandStatus, RunReport};
pub use runner::{RunLimits, TRANSFER_BUFFER_SIZE, run_commands};
pub use session::{ProbeSession, TransitionResult};
pub use state::{Authenticated, Connected, Verified};
