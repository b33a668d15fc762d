//! Configuration settings for the bridge host.
//!
//! Configuration can be loaded from environment variables or constructed
//! programmatically.

use std::env;

/// Runtime configuration for [`crate::BridgeHost`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Re-run a namespace's injection script on every command, even if the current
    /// document already received it.
    pub reinject_each_command: bool,
}

impl BridgeConfig {
    /// Construct a new `BridgeConfig` with explicit values.
    #[inline]
    #[must_use]
    pub const fn new(reinject_each_command: bool) -> Self {
        Self {
            reinject_each_command,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `BRIDGE_REINJECT`: Set to "0" to inject each namespace once per document (default: re-inject)
    #[inline]
    #[must_use]
    pub fn from_env() -> Self {
        let reinject_each_command = env::var("BRIDGE_REINJECT").ok().as_deref() != Some("0");
        Self {
            reinject_each_command,
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::new(true)
    }
}
