// ABOUTME: Output formatting for CLI feedback and the command transcript.
// ABOUTME: Supports normal, quiet (transcript only), and JSON output modes.

use crate::run::{CommandResult, RunReport};
use serde::Serialize;
use std::time::Instant;

/// Prefix of the transcript line that names a command.
pub const TRANSCRIPT_PREFIX: &str = "•";

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputMode {
    /// Transcript on stdout, progress and diagnostics on stderr
    #[default]
    Normal,
    /// Transcript only
    Quiet,
    /// One JSON report for scripting
    Json,
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    /// Start timing the run.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            eprintln!("{message}");
        }
    }

    /// Emit the results of a finished run.
    pub fn report(&self, report: &RunReport) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                for result in &report.results {
                    print!("{}", transcript(result));
                }
            }
            OutputMode::Json => match serde_json::to_string_pretty(report) {
                Ok(json) => println!("{json}"),
                Err(e) => self.error(&format!("failed to encode report: {e}")),
            },
        }
    }

    /// Print a success message with optional timing.
    pub fn success(&self, message: &str) {
        if self.mode != OutputMode::Normal {
            return;
        }
        let elapsed = self.elapsed_secs();
        if elapsed > 0.0 {
            eprintln!("{message} ({:.1}s)", elapsed);
        } else {
            eprintln!("{message}");
        }
    }

    /// Print a non-fatal warning.
    pub fn warning(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => eprintln!("Warning: {message}"),
            OutputMode::Json => self.json_event("warning", message),
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => eprintln!("Error: {message}"),
            OutputMode::Json => self.json_event("error", message),
        }
    }

    fn json_event(&self, event: &str, message: &str) {
        let event = JsonEvent {
            event,
            message,
            duration_secs: if self.start_time.is_some() {
                Some(self.elapsed_secs())
            } else {
                None
            },
        };
        if let Ok(json) = serde_json::to_string(&event) {
            eprintln!("{json}");
        }
    }
}

/// Human-readable transcript entry: the prefixed command line, then its output.
pub fn transcript(result: &CommandResult) -> String {
    let mut text = format!("{TRANSCRIPT_PREFIX}{}\n", result.command);
    let output = result.text();
    text.push_str(&output);
    if !output.ends_with('\n') {
        text.push('\n');
    }
    text
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}
