// ABOUTME: Library root for sshprobe - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod output;
pub mod run;
pub mod ssh;
pub mod types;
