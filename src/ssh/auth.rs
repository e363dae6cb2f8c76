// ABOUTME: Password authentication with keyboard-interactive fallback.
// ABOUTME: The single credential answers every interactive prompt.

use super::transport::{InteractiveReply, Transport};
use std::fmt;
use zeroize::Zeroizing;

/// Upper bound on keyboard-interactive prompt rounds.
pub const MAX_PROMPT_ROUNDS: usize = 16;

/// The one secret supplied to the remote. Redacted in Debug output and wiped on drop.
#[derive(Clone)]
pub struct Credential(Zeroizing<String>);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Zeroizing::new(secret.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Final result of credential negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Success,
    Denied,
    Error(String),
}

/// Authenticate `user`, trying password first and keyboard-interactive when
/// the password method is denied.
pub async fn authenticate<T: Transport>(
    transport: &mut T,
    user: &str,
    credential: &Credential,
) -> AuthOutcome {
    match transport.auth_password(user, credential.expose()).await {
        Ok(true) => {
            tracing::debug!(method = "password", "authenticated as {}", user);
            return AuthOutcome::Success;
        }
        Ok(false) => {
            tracing::debug!(
                method = "password",
                "password denied, trying keyboard-interactive"
            );
        }
        Err(e) => {
            tracing::error!(method = "password", "authentication error: {}", e);
            return AuthOutcome::Error(e.to_string());
        }
    }

    let outcome = keyboard_interactive(transport, user, credential).await;
    match &outcome {
        AuthOutcome::Success => {
            tracing::debug!(method = "keyboard-interactive", "authenticated as {}", user)
        }
        AuthOutcome::Denied => {
            tracing::error!(method = "keyboard-interactive", "authentication denied for {}", user)
        }
        AuthOutcome::Error(e) => {
            tracing::error!(method = "keyboard-interactive", "authentication error: {}", e)
        }
    }
    outcome
}

async fn keyboard_interactive<T: Transport>(
    transport: &mut T,
    user: &str,
    credential: &Credential,
) -> AuthOutcome {
    let mut reply = match transport.auth_interactive_start(user).await {
        Ok(reply) => reply,
        Err(e) => return AuthOutcome::Error(e.to_string()),
    };

    for round in 0..MAX_PROMPT_ROUNDS {
        let prompts = match reply {
            InteractiveReply::Success => return AuthOutcome::Success,
            InteractiveReply::Denied => return AuthOutcome::Denied,
            InteractiveReply::Prompts(prompts) => prompts,
        };

        tracing::debug!(round, count = prompts.len(), "answering interactive prompts");
        let answers = prompts
            .iter()
            .map(|_| credential.expose().to_string())
            .collect();

        reply = match transport.auth_interactive_respond(answers).await {
            Ok(reply) => reply,
            Err(e) => return AuthOutcome::Error(e.to_string()),
        };
    }

    match reply {
        InteractiveReply::Success => AuthOutcome::Success,
        InteractiveReply::Denied => AuthOutcome::Denied,
        InteractiveReply::Prompts(_) => AuthOutcome::Error(format!(
            "server still prompting after {MAX_PROMPT_ROUNDS} rounds"
        )),
    }
}
