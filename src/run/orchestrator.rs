// ABOUTME: Composes connect, host verification, authentication and the command batch.
// ABOUTME: Owns the single session of a run and always disconnects it.

use chrono::Utc;
use std::time::Duration;

use super::report::RunReport;
use super::runner::RunLimits;
use super::session::ProbeSession;
use crate::diagnostics::{Diagnostics, Warning};
use crate::error::{Error, Result};
use crate::ssh::{Connector, Credential, Endpoint, HostTrustVerifier, Transport};
use crate::types::CommandList;

/// Connection parameters for one run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub endpoint: Endpoint,
    pub user: String,
    pub credential: Credential,
    /// Bounds transport setup and, separately, credential negotiation.
    pub connect_timeout: Duration,
    pub limits: RunLimits,
}

/// Drives one run: connect, verify, authenticate, run all commands, disconnect.
#[derive(Debug)]
pub struct Orchestrator<C> {
    connector: C,
    verifier: HostTrustVerifier,
    settings: RunSettings,
}

impl<C: Connector> Orchestrator<C> {
    pub fn new(connector: C, verifier: HostTrustVerifier, settings: RunSettings) -> Self {
        Self {
            connector,
            verifier,
            settings,
        }
    }

    /// Execute the run. Run-fatal failures are returned as errors after the
    /// transport (if any) has been closed; command failures are recorded in
    /// the report and as warnings in `diag`.
    pub async fn run(&self, commands: &CommandList, diag: &mut Diagnostics) -> Result<RunReport> {
        let settings = &self.settings;
        let started_at = Utc::now();

        tracing::debug!("connecting to {}", settings.endpoint);
        let session =
            ProbeSession::open(&self.connector, &settings.endpoint, settings.connect_timeout)
                .await?;

        let session = match session.verify(&self.verifier).await {
            Ok(session) => session,
            Err((session, e)) => return Err(abort(session, e, diag).await),
        };

        let session = match session
            .authenticate(
                &settings.user,
                &settings.credential,
                settings.connect_timeout,
            )
            .await
        {
            Ok(session) => session,
            Err((session, e)) => return Err(abort(session, e, diag).await),
        };

        tracing::debug!(count = commands.len(), "running commands");
        let results = session.run(commands, &settings.limits).await;

        for result in &results {
            if result.status.is_failure() {
                diag.warn(Warning::command_failed(format!(
                    "{}: {}{}",
                    result.command,
                    result.status,
                    result
                        .detail
                        .as_deref()
                        .map(|d| format!(" ({d})"))
                        .unwrap_or_default()
                )));
            } else if result.status.is_partial() {
                diag.warn(Warning::output_truncated(format!(
                    "{}: {}",
                    result.command,
                    result.detail.as_deref().unwrap_or("output truncated")
                )));
            }
        }

        if let Err(e) = session.disconnect().await {
            diag.warn(Warning::ssh_disconnect(format!(
                "SSH disconnect failed for {}: {}",
                settings.endpoint, e
            )));
        }

        Ok(RunReport {
            host: settings.endpoint.host.clone(),
            port: settings.endpoint.port,
            user: settings.user.clone(),
            started_at,
            finished_at: Utc::now(),
            results,
        })
    }
}

/// Close the session after a fatal error and hand the error back.
async fn abort<S, T: Transport>(
    session: ProbeSession<S, T>,
    error: Error,
    diag: &mut Diagnostics,
) -> Error {
    tracing::error!(stage = error.stage(), "{}", error);
    let endpoint = session.endpoint().clone();
    if let Err(e) = session.disconnect().await {
        diag.warn(Warning::ssh_disconnect(format!(
            "SSH disconnect failed for {}: {}",
            endpoint, e
        )));
    }
    error
}
