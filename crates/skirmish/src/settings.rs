//! Connection-level server settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Listener and per-connection settings.
///
/// Deserializes from a `[server]` table; missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// How long a new connection may take to send its handshake.
    #[serde(default = "default_handshake_timeout_ms")]
    pub handshake_timeout_ms: u64,
    /// A connected session that sends nothing for this long is dropped.
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            handshake_timeout_ms: default_handshake_timeout_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
        }
    }
}

impl ServerSettings {
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

fn default_bind() -> String {
    "0.0.0.0:2567".to_string()
}
fn default_handshake_timeout_ms() -> u64 {
    5_000
}
fn default_idle_timeout_ms() -> u64 {
    15_000
}
