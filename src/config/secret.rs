// ABOUTME: Password values in the config file, literal or read from the environment.
// ABOUTME: Resolves to a Credential so the secret never lives in a plain String field.

use crate::error::{Error, Result};
use crate::ssh::Credential;
use serde::Deserialize;
use std::fmt;

#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SecretValue {
    Literal(String),
    FromEnv {
        #[serde(rename = "env")]
        var: String,
        #[serde(default)]
        default: Option<String>,
    },
}

impl SecretValue {
    pub fn resolve(&self) -> Result<Credential> {
        match self {
            SecretValue::Literal(s) => Ok(Credential::new(s.as_str())),
            SecretValue::FromEnv { var, default } => match std::env::var(var) {
                Ok(val) => Ok(Credential::new(val)),
                Err(_) => default
                    .as_deref()
                    .map(Credential::new)
                    .ok_or_else(|| Error::MissingEnvVar(var.clone())),
            },
        }
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretValue::Literal(_) => f.write_str("Literal(<redacted>)"),
            SecretValue::FromEnv { var, .. } => f.debug_struct("FromEnv").field("var", var).finish(),
        }
    }
}
