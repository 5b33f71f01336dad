//! Configuration resolution
//!
//! The build tool is configured entirely through two environment variables.
//! They are read once at process start into a [`BuildConfig`], which is then
//! passed by parameter to every component.

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Environment variable naming the local Aozora Bunko repository checkout
pub const REPO_PATH_ENV: &str = "AOZORABUNKO_REPO_PATH";

/// Environment variable naming the SQLite file to produce
pub const OUTPUT_PATH_ENV: &str = "OUTPUT_PATH";

/// Resolved configuration for one build run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    /// Root of the archive mirror (contains `cards/`)
    pub repo_path: PathBuf,
    /// Destination database file
    pub output_path: PathBuf,
}

impl BuildConfig {
    /// Resolve configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve configuration through an arbitrary variable lookup
    ///
    /// Both variables are required. Relative paths are resolved against the
    /// current working directory so that log output names absolute locations.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let repo_path = required_path(&lookup, REPO_PATH_ENV)?;
        let output_path = required_path(&lookup, OUTPUT_PATH_ENV)?;

        if output_path.is_dir() {
            return Err(Error::Config(format!(
                "{} points to a directory, expected a database file path: {}",
                OUTPUT_PATH_ENV,
                output_path.display()
            )));
        }

        let config = Self {
            repo_path: absolutize(&repo_path)?,
            output_path: absolutize(&output_path)?,
        };

        tracing::debug!(
            "Resolved configuration: repo={}, output={}",
            config.repo_path.display(),
            config.output_path.display()
        );

        Ok(config)
    }
}

fn required_path<F>(lookup: &F, name: &str) -> Result<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => Ok(PathBuf::from(value.trim())),
        Some(_) => Err(Error::Config(format!("{} is set but empty", name))),
        None => Err(Error::Config(format!("{} is not set", name))),
    }
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_both_variables_resolved() {
        let config = BuildConfig::from_lookup(lookup_from(&[
            (REPO_PATH_ENV, "/srv/aozorabunko"),
            (OUTPUT_PATH_ENV, "/tmp/out/aozora.db"),
        ]))
        .unwrap();

        assert_eq!(config.repo_path, PathBuf::from("/srv/aozorabunko"));
        assert_eq!(config.output_path, PathBuf::from("/tmp/out/aozora.db"));
    }

    #[test]
    fn test_missing_repo_path_is_config_error() {
        let result = BuildConfig::from_lookup(lookup_from(&[(OUTPUT_PATH_ENV, "/tmp/a.db")]));
        match result {
            Err(Error::Config(msg)) => assert!(msg.contains(REPO_PATH_ENV)),
            other => panic!("Expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_output_path_is_config_error() {
        let result = BuildConfig::from_lookup(lookup_from(&[
            (REPO_PATH_ENV, "/srv/aozorabunko"),
            (OUTPUT_PATH_ENV, "   "),
        ]));
        match result {
            Err(Error::Config(msg)) => assert!(msg.contains("empty")),
            other => panic!("Expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_relative_paths_become_absolute() {
        let config = BuildConfig::from_lookup(lookup_from(&[
            (REPO_PATH_ENV, "aozorabunko"),
            (OUTPUT_PATH_ENV, "out/aozora.db"),
        ]))
        .unwrap();

        assert!(config.repo_path.is_absolute());
        assert!(config.output_path.ends_with("out/aozora.db"));
    }
}
