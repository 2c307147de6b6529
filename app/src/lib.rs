//! swapfund: wires the gateway to a sandbox world and serves it over HTTP

use std::path::Path;

use anyhow::Context;
use gateway::Gateway;
use gateway_api::AppState;
use gateway_core::AppConfig;
use sandbox::World;
use tracing_subscriber::EnvFilter;

/// Environment variable naming the JSON config file
pub const CONFIG_ENV: &str = "SWAPFUND_CONFIG";

/// Install the global subscriber. `RUST_LOG` adds to the default directives.
pub fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("swapfund=debug".parse()?)
                .add_directive("gateway=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {}", e))
}

/// Read the config at `path`, or the defaults when there is none
pub fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let Some(path) = path else {
        tracing::info!("No {} set, using default configuration", CONFIG_ENV);
        return Ok(AppConfig::default());
    };

    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    let config = AppConfig::from_json(&json)
        .with_context(|| format!("parsing config file {}", path.display()))?;

    tracing::info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Seed the sandbox and serve the API until the listener fails
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    tracing::debug!(
        config = %serde_json::to_string(&config)?,
        "Effective configuration"
    );

    let world = World::seed(&config.sandbox).await;
    let gateway = Gateway::new(config.gateway.clone(), world.registry());
    tracing::info!(
        gateway = %gateway.address(),
        exchanges = ?gateway.registry().exchange_addresses(),
        lending_ledgers = ?gateway.registry().lending_ledger_addresses(),
        "Gateway ready"
    );

    let state = AppState::new(config, gateway);
    gateway_api::start_server(state)
        .await
        .context("API server stopped")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("swapfund-{}-{}", std::process::id(), name));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_missing_path_uses_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.api_port, 18545);
        assert_eq!(config.gateway.default_slippage_bps, 300);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let path = write_temp("partial.json", r#"{"api_port": 9000}"#);
        let config = load_config(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.api_port, 9000);
        assert_eq!(config.sandbox.rate_units, 5000);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let path = write_temp(
            "invalid.json",
            r#"{"gateway": {"default_slippage_bps": 9000, "max_slippage_bps": 5000}}"#,
        );
        let err = load_config(Some(&path)).unwrap_err();
        std::fs::remove_file(&path).ok();

        assert!(format!("{:#}", err).contains("default_slippage_bps"));
    }

    #[test]
    fn test_unreadable_path_is_an_error() {
        let path = std::env::temp_dir().join("swapfund-does-not-exist.json");
        assert!(load_config(Some(&path)).is_err());
    }
}
