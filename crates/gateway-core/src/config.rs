//! Configuration types for the gateway

use serde::{Deserialize, Serialize};

use crate::Address;

/// Gateway operation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Account the gateway acts as on every collaborator
    pub address: Address,

    /// Slippage tolerance applied when a request does not carry one
    #[serde(default = "default_slippage_bps")]
    pub default_slippage_bps: u16,

    /// Largest slippage tolerance a request may ask for
    #[serde(default = "default_max_slippage_bps")]
    pub max_slippage_bps: u16,
}

fn default_slippage_bps() -> u16 {
    // 3%
    300
}

fn default_max_slippage_bps() -> u16 {
    5_000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            address: Address::from_low_u64(0x6a7e),
            default_slippage_bps: default_slippage_bps(),
            max_slippage_bps: default_max_slippage_bps(),
        }
    }
}

/// Seed values for the in-memory collaborators served by the binary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Principal token of the reference lending ledger
    pub principal_token: Address,

    /// Mock exchange address
    pub exchange: Address,

    /// Reference lending ledger address
    pub lending_ledger: Address,

    /// Native -> principal token rate in whole units
    #[serde(default = "default_rate_units")]
    pub rate_units: u64,

    /// Principal tokens the exchange holds, in whole units
    #[serde(default = "default_exchange_reserve_units")]
    pub exchange_reserve_units: u64,
}

fn default_rate_units() -> u64 {
    5_000
}

fn default_exchange_reserve_units() -> u64 {
    1_000_000
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            principal_token: Address::from_low_u64(0x7c4),
            exchange: Address::from_low_u64(0xe1),
            lending_ledger: Address::from_low_u64(0x1e4d),
            rate_units: default_rate_units(),
            exchange_reserve_units: default_exchange_reserve_units(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Gateway settings
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Sandbox collaborator seeds
    #[serde(default)]
    pub sandbox: SandboxConfig,

    /// API server port
    #[serde(default = "default_api_port")]
    pub api_port: u16,
}

fn default_api_port() -> u16 {
    18545
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            sandbox: SandboxConfig::default(),
            api_port: default_api_port(),
        }
    }
}

impl AppConfig {
    /// Parse configuration from JSON, filling omitted fields with defaults
    pub fn from_json(json: &str) -> Result<Self, crate::Error> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), crate::Error> {
        let bps_limit = crate::constants::BPS_DENOMINATOR as u16;
        if self.gateway.max_slippage_bps > bps_limit {
            return Err(crate::Error::Config(format!(
                "max_slippage_bps {} exceeds {}",
                self.gateway.max_slippage_bps, bps_limit
            )));
        }
        if self.gateway.default_slippage_bps > self.gateway.max_slippage_bps {
            return Err(crate::Error::Config(format!(
                "default_slippage_bps {} exceeds max_slippage_bps {}",
                self.gateway.default_slippage_bps, self.gateway.max_slippage_bps
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.gateway.default_slippage_bps, 300);
        assert_eq!(config.gateway.max_slippage_bps, 5_000);
        assert_eq!(config.sandbox.rate_units, 5_000);
        assert_eq!(config.api_port, 18545);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.gateway.address, config.gateway.address);
        assert_eq!(parsed.sandbox.exchange, config.sandbox.exchange);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = AppConfig::from_json(r#"{"api_port": 9000}"#).unwrap();
        assert_eq!(config.api_port, 9000);
        assert_eq!(config.gateway.default_slippage_bps, 300);

        let config = AppConfig::from_json(
            r#"{"gateway": {"address": "0x00000000000000000000000000000000000000aa"}}"#,
        )
        .unwrap();
        assert_eq!(config.gateway.address, Address::from_low_u64(0xaa));
        assert_eq!(config.gateway.max_slippage_bps, 5_000);
    }

    #[test]
    fn test_invalid_slippage_bounds_rejected() {
        let err = AppConfig::from_json(
            r#"{"gateway": {"address": "0x00000000000000000000000000000000000000aa", "default_slippage_bps": 600, "max_slippage_bps": 500}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));

        assert!(AppConfig::from_json(r#"{"gateway": {"address": "0x12"}}"#).is_err());
    }
}
