use std::time::Duration;

use alloy::primitives::{Address, B256};
use serde::Deserialize;

use crate::domain::actor::{L1Actor, L2Actor, MESSAGE_VERSION};
use crate::orchestrator::FlowTiming;
use crate::portal::PortalConfig;

/// Top-level bridge configuration loaded from TOML.
///
/// The trusted constants (attester address, circuit id) live here rather
/// than in code: they are environment-specific and bound once at startup.
#[derive(Debug, Deserialize)]
pub struct BridgeConfig {
    pub l1: L1Config,
    pub l2: L2Config,
    pub attestation: AttestationConfig,
    pub flow: FlowConfig,
}

/// Base-layer parameters.
#[derive(Debug, Deserialize)]
pub struct L1Config {
    pub chain_id: u64,
    /// Address the portal escrows under.
    pub portal_address: Address,
}

/// Rollup parameters.
#[derive(Debug, Deserialize)]
pub struct L2Config {
    /// L2 bridge contract identifier.
    pub bridge_address: B256,
    /// Rollup protocol version. Defaults to the current message version.
    pub version: Option<u64>,
}

/// Attestation trust root and oracle endpoint.
#[derive(Debug, Deserialize)]
pub struct AttestationConfig {
    /// Trusted attestation signer.
    pub attester: Address,
    /// Circuit identifier attestations must be issued for.
    pub circuit_id: B256,
    /// Oracle base URL. When absent, the harness runs an in-process signer.
    pub oracle_url: Option<String>,
}

/// Client-side flow timing. Durations parse via humantime (e.g. "500ms", "30s").
#[derive(Debug, Deserialize)]
pub struct FlowConfig {
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    #[serde(with = "humantime_serde")]
    pub consumability_timeout: Duration,
}

/// Errors from config loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

impl BridgeConfig {
    /// Load and validate a config from a TOML file.
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.flow.poll_interval.is_zero() {
            return Err(ConfigError::Validation(
                "flow.poll_interval must be non-zero".into(),
            ));
        }
        if self.flow.poll_interval >= self.flow.consumability_timeout {
            return Err(ConfigError::Validation(
                "flow.poll_interval must be shorter than flow.consumability_timeout".into(),
            ));
        }
        Ok(())
    }

    /// Portal parameters derived from this config.
    pub fn portal_config(&self) -> PortalConfig {
        PortalConfig {
            portal: L1Actor::new(self.l1.portal_address, self.l1.chain_id),
            l2_bridge: L2Actor::new(
                self.l2.bridge_address,
                self.l2.version.unwrap_or(MESSAGE_VERSION),
            ),
            attester: self.attestation.attester,
            circuit_id: self.attestation.circuit_id,
        }
    }

    pub fn flow_timing(&self) -> FlowTiming {
        FlowTiming {
            poll_interval: self.flow.poll_interval,
            consumability_timeout: self.flow.consumability_timeout,
        }
    }
}
