use std::path::PathBuf;

use swapfund_lib::{init_tracing, load_config, run, CONFIG_ENV};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    tracing::info!("Starting swapfund gateway");

    let path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
    let config = load_config(path.as_deref())?;
    run(config).await
}
