// ABOUTME: Application-wide error types for sshprobe.
// ABOUTME: Run-fatal failures carry the stage that failed and map to a distinct exit code.

use crate::ssh::{Endpoint, HostTrustDecision};
use crate::types::CommandListError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("usage: {0}")]
    Usage(String),

    #[error("connect to {endpoint} failed: {source}")]
    Connect {
        endpoint: Endpoint,
        #[source]
        source: crate::ssh::Error,
    },

    #[error("host trust for {endpoint} rejected: {decision}")]
    TrustRejected {
        endpoint: Endpoint,
        decision: HostTrustDecision,
    },

    #[error("authentication denied for {user} at {endpoint}")]
    AuthDenied { user: String, endpoint: Endpoint },

    #[error("authentication error at {endpoint}: {message}")]
    AuthError { endpoint: Endpoint, message: String },

    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("command list: {0}")]
    CommandList(#[from] CommandListError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Process exit status for a usage error.
pub const EXIT_USAGE: i32 = 2;
/// Process exit status when the transport could not be established.
pub const EXIT_CONNECT: i32 = 3;
/// Process exit status when the host key was not trusted.
pub const EXIT_TRUST: i32 = 4;
/// Process exit status when authentication was denied or failed.
pub const EXIT_AUTH: i32 = 5;

impl Error {
    /// Exit status distinguishing the stage that failed.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Usage(_)
            | Error::CommandList(_)
            | Error::ConfigNotFound(_)
            | Error::MissingEnvVar(_)
            | Error::Yaml(_) => EXIT_USAGE,
            Error::Connect { .. } => EXIT_CONNECT,
            Error::TrustRejected { .. } => EXIT_TRUST,
            Error::AuthDenied { .. } | Error::AuthError { .. } => EXIT_AUTH,
            _ => 1,
        }
    }

    /// Name of the stage that failed, for diagnostics.
    pub fn stage(&self) -> &'static str {
        match self {
            Error::Usage(_) | Error::CommandList(_) => "arguments",
            Error::ConfigNotFound(_)
            | Error::MissingEnvVar(_)
            | Error::Yaml(_) => "configuration",
            Error::Connect { .. } => "connect",
            Error::TrustRejected { .. } => "host verification",
            Error::AuthDenied { .. } | Error::AuthError { .. } => "authentication",
            _ => "setup",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
