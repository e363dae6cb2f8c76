// ABOUTME: Probe session parameterized by its lifecycle state.
// ABOUTME: Each transition consumes the session; failures hand it back for disconnect.

use std::marker::PhantomData;
use std::time::Duration;

use super::report::CommandResult;
use super::runner::{RunLimits, run_commands};
use super::state::{Authenticated, Connected, Verified};
use crate::error::Error;
use crate::ssh::{
    AuthOutcome, Connector, Credential, Endpoint, HostTrustVerifier, Transport, authenticate,
};
use crate::types::CommandList;

/// Result type for transitions; on failure the previous state comes back so
/// the transport can still be closed.
pub type TransitionResult<N, P, T> = Result<ProbeSession<N, T>, (ProbeSession<P, T>, Error)>;

/// The single transport of a run, in state `S`.
#[derive(Debug)]
pub struct ProbeSession<S, T> {
    transport: T,
    _state: PhantomData<S>,
}

impl<S, T: Transport> ProbeSession<S, T> {
    fn transition<N>(self) -> ProbeSession<N, T> {
        ProbeSession {
            transport: self.transport,
            _state: PhantomData,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        self.transport.endpoint()
    }

    /// Close the transport. Available in every state.
    pub async fn disconnect(self) -> crate::ssh::Result<()> {
        tracing::debug!("disconnecting from {}", self.transport.endpoint());
        self.transport.disconnect().await
    }
}

// =============================================================================
// Disconnected -> Connected
// =============================================================================

impl<T: Transport> ProbeSession<Connected, T> {
    /// Open the transport within `timeout`.
    pub async fn open<C>(connector: &C, endpoint: &Endpoint, timeout: Duration) -> Result<Self, Error>
    where
        C: Connector<Transport = T>,
    {
        let transport = match tokio::time::timeout(timeout, connector.connect(endpoint)).await {
            Ok(Ok(transport)) => transport,
            Ok(Err(source)) => {
                return Err(Error::Connect {
                    endpoint: endpoint.clone(),
                    source,
                });
            }
            Err(_) => {
                return Err(Error::Connect {
                    endpoint: endpoint.clone(),
                    source: crate::ssh::Error::ConnectTimeout(timeout),
                });
            }
        };

        Ok(Self {
            transport,
            _state: PhantomData,
        })
    }

    // =========================================================================
    // Connected -> Verified
    // =========================================================================

    /// Judge the remote host key. Nothing is sent to the remote here.
    pub async fn verify(self, verifier: &HostTrustVerifier) -> TransitionResult<Verified, Connected, T> {
        let decision = verifier.verify(&self.transport).await;
        if decision.is_trusted() {
            tracing::debug!(?decision, "host verified: {}", self.endpoint());
            return Ok(self.transition());
        }

        let error = Error::TrustRejected {
            endpoint: self.endpoint().clone(),
            decision,
        };
        Err((self, error))
    }
}

// =============================================================================
// Verified -> Authenticated
// =============================================================================

impl<T: Transport> ProbeSession<Verified, T> {
    /// Negotiate credentials within `timeout`. Never retried.
    pub async fn authenticate(
        mut self,
        user: &str,
        credential: &Credential,
        timeout: Duration,
    ) -> TransitionResult<Authenticated, Verified, T> {
        let outcome =
            tokio::time::timeout(timeout, authenticate(&mut self.transport, user, credential))
                .await;

        let message = match outcome {
            Ok(AuthOutcome::Success) => return Ok(self.transition()),
            Ok(AuthOutcome::Denied) => {
                let error = Error::AuthDenied {
                    user: user.to_string(),
                    endpoint: self.endpoint().clone(),
                };
                return Err((self, error));
            }
            Ok(AuthOutcome::Error(message)) => message,
            Err(_) => format!("timed out after {:?}", timeout),
        };

        let error = Error::AuthError {
            endpoint: self.endpoint().clone(),
            message,
        };
        Err((self, error))
    }
}

// =============================================================================
// Authenticated -> Running
// =============================================================================

impl<T: Transport> ProbeSession<Authenticated, T> {
    /// Run the full command list. Command failures are results, not errors.
    pub async fn run(&self, commands: &CommandList, limits: &RunLimits) -> Vec<CommandResult> {
        run_commands(&self.transport, commands, limits).await
    }
}
