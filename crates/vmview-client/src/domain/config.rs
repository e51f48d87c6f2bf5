//! Client configuration.
//!
//! A config file is optional.  Every field has a default so a missing file,
//! or one written by an older version, still loads:
//!
//! ```toml
//! username = "rgb"
//! log_level = "debug"
//! servers = [
//!     "ws://vm1.example.net:6004",
//!     "ws://vm2.example.net:6004",
//! ]
//! ```

use serde::{Deserialize, Serialize};

/// Runtime settings for the viewer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    /// WebSocket endpoints queried by `vmview list`, in display order.
    #[serde(default)]
    pub servers: Vec<String>,
    /// Name sent in the `connect` handshake.
    #[serde(default = "default_username")]
    pub username: String,
    /// `tracing` level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_username() -> String {
    "anonymous".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            servers: Vec::new(),
            username: default_username(),
            log_level: default_log_level(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
