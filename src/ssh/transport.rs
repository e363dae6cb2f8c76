// ABOUTME: Capability traits for the SSH operations a probe run needs.
// ABOUTME: Connector opens a Transport; a Transport authenticates and hands out RemoteChannels.

use super::error::Result;
use async_trait::async_trait;
use russh::keys::ssh_key::PublicKey;
use std::fmt;

/// Host identity a session is opened to. Trust records are keyed by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Reply to one keyboard-interactive step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractiveReply {
    Success,
    Denied,
    /// Another round of prompts; one answer is expected per prompt.
    Prompts(Vec<String>),
}

/// Opens transports to a remote endpoint.
#[async_trait]
pub trait Connector: Send + Sync {
    type Transport: Transport;

    /// Establish the transport. No credentials are sent.
    async fn connect(&self, endpoint: &Endpoint) -> Result<Self::Transport>;
}

/// An established, not necessarily authenticated, SSH transport.
#[async_trait]
pub trait Transport: Send + Sync {
    type Channel: RemoteChannel;

    fn endpoint(&self) -> &Endpoint;

    /// Public key the remote presented during the handshake.
    fn host_key(&self) -> Result<PublicKey>;

    /// Try password authentication. `Ok(false)` means the remote denied it.
    async fn auth_password(&mut self, user: &str, password: &str) -> Result<bool>;

    async fn auth_interactive_start(&mut self, user: &str) -> Result<InteractiveReply>;

    async fn auth_interactive_respond(&mut self, answers: Vec<String>)
    -> Result<InteractiveReply>;

    /// Allocate a new logical channel bound to this transport.
    async fn create_channel(&self) -> Result<Self::Channel>;

    async fn disconnect(self) -> Result<()>;
}

/// One logical channel. Dropping or closing it releases it; `close` consumes
/// the channel so it cannot be released twice.
#[async_trait]
pub trait RemoteChannel: Send {
    /// Request a session on the channel.
    async fn open_session(&mut self) -> Result<()>;

    /// Ask the remote to execute `command` verbatim.
    async fn exec(&mut self, command: &str) -> Result<()>;

    /// Read output into `buf`. `Ok(0)` signals end of output.
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Exit status reported by the remote, if any arrived.
    fn exit_status(&self) -> Option<u32>;

    /// Signal end of input, close, and release the channel.
    async fn close(self) -> Result<()>;
}
