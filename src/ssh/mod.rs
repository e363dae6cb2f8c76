// ABOUTME: SSH module for remote equipment connections.
// ABOUTME: Password/keyboard-interactive authentication with known_hosts verification.

mod auth;
mod client;
mod error;
mod transport;
mod trust;

pub use auth::{AuthOutcome, Credential, MAX_PROMPT_ROUNDS, authenticate};
pub use client::{SshChannel, SshConnector, SshTransport};
pub use error::{Error, Result};
pub use transport::{Connector, Endpoint, InteractiveReply, RemoteChannel, Transport};
pub use trust::{
    ConsolePrompt, HostConfirm, HostTrustDecision, HostTrustVerifier, KnownHosts, TrustPolicy,
    fingerprint, is_affirmative,
};
