// ABOUTME: Session state marker types for the type state pattern.
// ABOUTME: Zero-sized types enforce that commands only run after trust and authentication.

/// Transport established, host key not yet judged.
/// Available actions: `verify()`, `disconnect()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Connected;

/// Host key trusted, no credential sent yet.
/// Available actions: `authenticate()`, `disconnect()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Verified;

/// Authenticated: commands may run.
/// Available actions: `run()`, `disconnect()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Authenticated;
