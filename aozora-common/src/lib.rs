//! # Aozora Common Library
//!
//! Shared code for the Aozora Bunko database tools:
//! - Error type shared by every crate
//! - Configuration resolution from the process environment
//! - Reading and text normalization used for sort keys

pub mod config;
pub mod error;
pub mod normalize;

pub use error::{Error, Result};
pub use normalize::{normalize_reading, normalize_text};
