//! aozora-build: Aozora Bunko checkout → SQLite database
//!
//! Reads AOZORABUNKO_REPO_PATH and OUTPUT_PATH from the environment and
//! rebuilds the output database from scratch. Exits non-zero on
//! configuration, input or storage errors.

use anyhow::Result;
use aozora_common::config::BuildConfig;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!(
        "Starting aozora-build v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("AOZORA_BUILD_REVISION"),
        env!("AOZORA_BUILD_TIME"),
        env!("AOZORA_BUILD_PROFILE")
    );

    let config = match BuildConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };

    info!("Source: {}", config.repo_path.display());
    info!("Output: {}", config.output_path.display());

    match aozora_build::run(&config).await {
        Ok(summary) => {
            info!("✓ {}", summary.display_string());
            Ok(())
        }
        Err(e) => {
            error!("Build failed: {}", e);
            Err(e.into())
        }
    }
}
