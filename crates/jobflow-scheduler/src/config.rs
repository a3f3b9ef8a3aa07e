//! Service configuration.

use serde::{Deserialize, Serialize};

/// Configuration for [`crate::JobService`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Seconds `stop()` waits for an in-flight deferred registration drain
    /// before giving up on it. Defaults to 30.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Forward asynchronous engine error events to the log channel.
    /// Hosts that consume the engine's error stream themselves can turn
    /// this off. Defaults to true.
    #[serde(default = "default_forward_engine_errors")]
    pub forward_engine_errors: bool,
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_forward_engine_errors() -> bool {
    true
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            shutdown_timeout_secs: default_shutdown_timeout(),
            forward_engine_errors: default_forward_engine_errors(),
        }
    }
}
