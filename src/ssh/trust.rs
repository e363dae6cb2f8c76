// ABOUTME: Host trust verification against a known_hosts store.
// ABOUTME: Decides whether a presented host key may proceed to authentication.

use super::transport::{Endpoint, Transport};
use async_trait::async_trait;
use russh::keys::known_hosts::{
    known_host_keys, known_host_keys_path, learn_known_hosts, learn_known_hosts_path,
};
use russh::keys::ssh_key::{HashAlg, PublicKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::BufRead;
use std::path::{Path, PathBuf};

/// Outcome of checking the remote host key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HostTrustDecision {
    AlreadyTrusted,
    ChangedKeyRejected,
    UnknownKeyAcceptedByUser,
    UnknownKeyRejected,
    LookupError,
}

impl HostTrustDecision {
    /// Whether the run may continue to authentication.
    pub fn is_trusted(&self) -> bool {
        matches!(
            self,
            HostTrustDecision::AlreadyTrusted | HostTrustDecision::UnknownKeyAcceptedByUser
        )
    }
}

impl fmt::Display for HostTrustDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            HostTrustDecision::AlreadyTrusted => "host key already trusted",
            HostTrustDecision::ChangedKeyRejected => {
                "host key changed (possible man-in-the-middle), refusing to continue"
            }
            HostTrustDecision::UnknownKeyAcceptedByUser => "unknown host key accepted",
            HostTrustDecision::UnknownKeyRejected => "unknown host key rejected",
            HostTrustDecision::LookupError => "could not obtain the remote host key",
        };
        f.write_str(text)
    }
}

/// What to do when the store has no record for a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TrustPolicy {
    /// Ask the operator.
    #[default]
    Prompt,
    /// Trust on first use: record the key and continue.
    AcceptNew,
    /// Refuse hosts that are not already recorded.
    Reject,
}

/// What the trust store holds for a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recorded {
    Match,
    Mismatch { line: usize },
    Absent,
}

/// A known_hosts file. `None` means the user's default `~/.ssh/known_hosts`.
#[derive(Debug, Clone, Default)]
pub struct KnownHosts {
    path: Option<PathBuf>,
}

impl KnownHosts {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lookup(&self, endpoint: &Endpoint, key: &PublicKey) -> Recorded {
        let recorded = match &self.path {
            Some(path) => known_host_keys_path(&endpoint.host, endpoint.port, path),
            None => known_host_keys(&endpoint.host, endpoint.port),
        };

        match recorded {
            Ok(keys) if keys.is_empty() => Recorded::Absent,
            Ok(keys) => {
                if keys
                    .iter()
                    .any(|(_, recorded)| recorded.key_data() == key.key_data())
                {
                    Recorded::Match
                } else {
                    Recorded::Mismatch { line: keys[0].0 }
                }
            }
            Err(e) => {
                tracing::warn!(
                    "known_hosts could not be read, treating {} as unknown: {}",
                    endpoint,
                    e
                );
                Recorded::Absent
            }
        }
    }

    fn record(&self, endpoint: &Endpoint, key: &PublicKey) -> Result<(), russh::keys::Error> {
        match &self.path {
            Some(path) => learn_known_hosts_path(&endpoint.host, endpoint.port, key, path),
            None => learn_known_hosts(&endpoint.host, endpoint.port, key),
        }
    }
}

/// Operator confirmation for an unknown host key.
#[async_trait]
pub trait HostConfirm: Send + Sync {
    /// Return true only on an explicit affirmative answer.
    async fn confirm(&self, endpoint: &Endpoint, fingerprint: &str) -> bool;
}

/// Asks on the controlling terminal: prompt on stderr, answer from stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsolePrompt;

#[async_trait]
impl HostConfirm for ConsolePrompt {
    async fn confirm(&self, endpoint: &Endpoint, fingerprint: &str) -> bool {
        eprintln!("The authenticity of host {endpoint} can't be established.");
        eprintln!("Host key fingerprint is {fingerprint}.");
        eprint!("Do you trust this host key (yes/no)? ");

        let answer = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line).map(|_| line)
        })
        .await;

        match answer {
            Ok(Ok(line)) => is_affirmative(&line),
            Ok(Err(e)) => {
                tracing::warn!("failed to read confirmation: {}", e);
                false
            }
            Err(e) => {
                tracing::warn!("confirmation prompt aborted: {}", e);
                false
            }
        }
    }
}

/// An answer counts as acceptance only if it is "yes" (any case).
pub fn is_affirmative(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("yes")
}

/// SHA-256 fingerprint in OpenSSH form (`SHA256:...`).
pub fn fingerprint(key: &PublicKey) -> String {
    key.fingerprint(HashAlg::Sha256).to_string()
}

/// Checks the remote host key before any credential is sent.
pub struct HostTrustVerifier {
    store: KnownHosts,
    policy: TrustPolicy,
    prompt: Box<dyn HostConfirm>,
}

impl fmt::Debug for HostTrustVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostTrustVerifier")
            .field("store", &self.store)
            .field("policy", &self.policy)
            .finish()
    }
}

impl HostTrustVerifier {
    pub fn new(store: KnownHosts, policy: TrustPolicy) -> Self {
        Self {
            store,
            policy,
            prompt: Box::new(ConsolePrompt),
        }
    }

    /// Replace the console prompt used under [`TrustPolicy::Prompt`].
    pub fn with_prompt(mut self, prompt: impl HostConfirm + 'static) -> Self {
        self.prompt = Box::new(prompt);
        self
    }

    pub async fn verify<T: Transport>(&self, transport: &T) -> HostTrustDecision {
        let endpoint = transport.endpoint();
        let key = match transport.host_key() {
            Ok(key) => key,
            Err(e) => {
                tracing::error!("host key lookup failed for {}: {}", endpoint, e);
                return HostTrustDecision::LookupError;
            }
        };
        let fingerprint = fingerprint(&key);

        match self.store.lookup(endpoint, &key) {
            Recorded::Match => {
                tracing::debug!(%fingerprint, "host key for {} is trusted", endpoint);
                HostTrustDecision::AlreadyTrusted
            }
            Recorded::Mismatch { line } => {
                tracing::error!(
                    %fingerprint,
                    known_hosts_line = line,
                    "host key for {} does not match the recorded key",
                    endpoint
                );
                HostTrustDecision::ChangedKeyRejected
            }
            Recorded::Absent => self.decide_unknown(endpoint, &key, &fingerprint).await,
        }
    }

    async fn decide_unknown(
        &self,
        endpoint: &Endpoint,
        key: &PublicKey,
        fingerprint: &str,
    ) -> HostTrustDecision {
        let accepted = match self.policy {
            TrustPolicy::Prompt => self.prompt.confirm(endpoint, fingerprint).await,
            TrustPolicy::AcceptNew => {
                tracing::warn!(
                    "Trust-On-First-Use: accepting unknown host key for {} ({})",
                    endpoint,
                    fingerprint
                );
                true
            }
            TrustPolicy::Reject => false,
        };

        if !accepted {
            tracing::warn!("unknown host key for {} was not accepted", endpoint);
            return HostTrustDecision::UnknownKeyRejected;
        }

        if let Err(e) = self.store.record(endpoint, key) {
            tracing::warn!("Failed to save host key to known_hosts: {}", e);
        }
        HostTrustDecision::UnknownKeyAcceptedByUser
    }
}
