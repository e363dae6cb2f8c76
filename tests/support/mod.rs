// ABOUTME: Test support utilities.
// ABOUTME: Provides tracing setup, host key fixtures, a scripted transport and a local SSH server.

use russh::keys::ssh_key::PublicKey;
use std::sync::Once;

// Each test binary only uses some of these modules, so allow dead_code.
#[allow(dead_code)]
pub mod fake_transport;
#[allow(dead_code)]
pub mod ssh_server;

static TRACING_INIT: Once = Once::new();

/// Host key the fake remote presents unless a test says otherwise.
#[allow(dead_code)]
pub const HOST_KEY: &str =
    "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIBf26+ZVH3Sm5m7DjEn45Bqr14gEbEEHNn/4CSFZQsjr";

/// A different key, used to simulate a changed host.
#[allow(dead_code)]
pub const OTHER_HOST_KEY: &str =
    "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIEKOa+wxSKiSVmdyBW/rnudMFjeki+ZaIHQYyN3/TAjC";

#[allow(dead_code)]
pub fn host_key() -> PublicKey {
    PublicKey::from_openssh(HOST_KEY).unwrap()
}

#[allow(dead_code)]
pub fn other_host_key() -> PublicKey {
    PublicKey::from_openssh(OTHER_HOST_KEY).unwrap()
}

/// A known_hosts line recording `key` for `host:port`.
#[allow(dead_code)]
pub fn known_hosts_line(host: &str, port: u16, key: &str) -> String {
    if port == 22 {
        format!("{host} {key}\n")
    } else {
        format!("[{host}]:{port} {key}\n")
    }
}

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("sshprobe=debug".parse().unwrap())
            .add_directive("russh=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}
