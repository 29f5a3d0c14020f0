//! Session configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::flags::FlagMode;

/// Well-known seed of the pre-provisioned funding account on a standalone
/// dev node. Never use on a shared network.
pub const DEV_FUNDING_SEED: &str =
    "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

/// Caller-supplied session settings. Loadable from a TOML file; every
/// field has a standalone-dev default.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// WebSocket endpoint of the ledger node.
    pub endpoint: String,
    /// Hex seed of the funding source account.
    pub funding_seed: String,
    /// How unknown capability names are treated during issuance.
    pub flag_mode: FlagMode,
    /// Per-request timeout.
    pub request_timeout_secs: u64,
    /// How many times to poll `tx` for a validated result.
    pub finality_attempts: u32,
    pub finality_interval_ms: u64,
    /// Post-success refresh polling budget (ledger-side settlement).
    pub settle_attempts: u32,
    pub settle_interval_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            endpoint: "ws://127.0.0.1:6006".to_string(),
            funding_seed: DEV_FUNDING_SEED.to_string(),
            flag_mode: FlagMode::Lenient,
            request_timeout_secs: 30,
            finality_attempts: 10,
            finality_interval_ms: 500,
            settle_attempts: 6,
            settle_interval_ms: 500,
        }
    }
}

impl SessionConfig {
    /// Load settings from a TOML file. Missing fields take defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self, ClientError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ClientError::Config(format!("cannot read {}: {e}", path.display())))?;
        toml::from_str(&contents)
            .map_err(|e| ClientError::Config(format!("cannot parse {}: {e}", path.display())))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn finality_interval(&self) -> Duration {
        Duration::from_millis(self.finality_interval_ms)
    }

    pub fn settle_interval(&self) -> Duration {
        Duration::from_millis(self.settle_interval_ms)
    }
}
