// ABOUTME: Diagnostics accumulator for non-fatal warnings during a run.
// ABOUTME: Collects command-level failures that must not change the run's exit status.

/// Collects non-fatal warnings during a probe run.
#[derive(Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn count(&self, kind: WarningKind) -> usize {
        self.warnings.iter().filter(|w| w.kind == kind).count()
    }
}

/// A non-fatal warning collected during a run.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    pub fn command_failed(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::CommandFailed,
            message: message.into(),
        }
    }

    pub fn output_truncated(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::OutputTruncated,
            message: message.into(),
        }
    }

    pub fn ssh_disconnect(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::SshDisconnect,
            message: message.into(),
        }
    }
}

/// Categories of warnings that can occur during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// A command's channel could not be created/opened, exec was rejected, or reading failed.
    CommandFailed,
    /// A command ran but its captured output is incomplete.
    OutputTruncated,
    /// Failed to cleanly disconnect the SSH session.
    SshDisconnect,
}
