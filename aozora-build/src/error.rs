//! Error types for aozora-build

use crate::db::WriteError;
use crate::services::source_reader::MissingInputError;
use thiserror::Error;

/// Fatal run errors
///
/// Per-work problems (unreadable entries, malformed cards) are not errors at
/// this level; the driver counts them as skips.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] aozora_common::Error),

    #[error(transparent)]
    MissingInput(#[from] MissingInputError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("Cannot serialize build summary: {0}")]
    Summary(#[from] serde_json::Error),
}

pub type BuildResult<T> = Result<T, BuildError>;
