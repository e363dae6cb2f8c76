// ABOUTME: SSH-specific error types.
// ABOUTME: Covers connection, host key lookup, channel lifecycle, and protocol failures.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("connection timed out after {0:?}")]
    ConnectTimeout(Duration),

    #[error("remote host key not available: {0}")]
    HostKeyUnavailable(String),

    #[error("failed to record host key: {0}")]
    TrustStore(String),

    #[error("failed to create channel: {0}")]
    ChannelCreate(String),

    #[error("failed to open session channel: {0}")]
    ChannelOpen(String),

    #[error("remote rejected exec request: {0}")]
    ExecRejected(String),

    #[error("failed to read channel: {0}")]
    Read(String),

    #[error("channel is not open")]
    ChannelNotOpen,

    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("SSH protocol error: {0}")]
    Protocol(#[from] russh::Error),

    #[error("SSH key error: {0}")]
    Key(#[from] russh::keys::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
