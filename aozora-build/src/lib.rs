//! aozora-build library
//!
//! Converts an Aozora Bunko checkout into a single SQLite database:
//! source reader → card parser → text normalizer → license filter → writer.

pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use error::{BuildError, BuildResult};
pub use services::{BuildDriver, BuildSummary};

use aozora_common::config::BuildConfig;

/// Run a full rebuild with the default parsers
pub async fn run(config: &BuildConfig) -> BuildResult<BuildSummary> {
    BuildDriver::new().run(config).await
}
