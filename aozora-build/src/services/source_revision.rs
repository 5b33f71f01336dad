//! Source checkout revision (commit hash and date)

use chrono::{DateTime, FixedOffset, Utc};
use std::path::Path;
use std::process::Command;
use tracing::warn;

/// Recorded when the source root is not a git checkout
pub const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRevision {
    pub commit_hash: String,
    /// Commit date in UTC, `%Y-%m-%d %H:%M:%S %z`
    pub date: String,
}

impl SourceRevision {
    pub fn unknown() -> Self {
        Self {
            commit_hash: UNKNOWN.to_string(),
            date: UNKNOWN.to_string(),
        }
    }

    /// Read the last commit of the checkout at `root`
    ///
    /// Falls back to [`SourceRevision::unknown`] with a warning when git is
    /// unavailable or `root` is not a checkout.
    pub fn read(root: &Path) -> Self {
        let output = Command::new("git")
            .args(["log", "-1", "--pretty=format:%ci%x09%H"])
            .current_dir(root)
            .output();

        let stdout = match output {
            Ok(out) if out.status.success() => String::from_utf8_lossy(&out.stdout).into_owned(),
            Ok(out) => {
                warn!(
                    "git log failed in {}: {}",
                    root.display(),
                    String::from_utf8_lossy(&out.stderr).trim()
                );
                return Self::unknown();
            }
            Err(e) => {
                warn!("Cannot run git in {}: {}", root.display(), e);
                return Self::unknown();
            }
        };

        Self::parse(&stdout).unwrap_or_else(|| {
            warn!("Unexpected git log output: {:?}", stdout);
            Self::unknown()
        })
    }

    /// `2024-01-02 09:00:00 +0900\t<hash>` → UTC date and hash
    pub fn parse(line: &str) -> Option<Self> {
        let (date, hash) = line.trim().split_once('\t')?;
        let hash = hash.trim();
        if hash.is_empty() {
            return None;
        }

        let date = DateTime::<FixedOffset>::parse_from_str(date.trim(), "%Y-%m-%d %H:%M:%S %z").ok()?;

        Some(Self {
            commit_hash: hash.to_string(),
            date: date.with_timezone(&Utc).format("%Y-%m-%d %H:%M:%S %z").to_string(),
        })
    }
}
