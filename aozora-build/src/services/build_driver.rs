//! Build driver: one linear pass from source tree to database
//!
//! load index → enumerate → parse card → normalize text → license filter →
//! write, then build metadata, commit and vacuum.

use crate::db::{BuildMetadata, DatabaseWriter};
use crate::error::BuildResult;
use crate::models::{WorkEntry, WorkRecord};
use crate::services::archive_index::ArchiveIndex;
use crate::services::card_parser::{CardParser, MalformedMetadataError};
use crate::services::license;
use crate::services::source_reader::SourceTree;
use crate::services::source_revision::SourceRevision;
use crate::services::text_normalizer::TextNormalizer;
use aozora_common::config::BuildConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Progress is logged every this many entries
const PROGRESS_INTERVAL: usize = 1000;

/// Counts for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSummary {
    /// Source entries visited
    pub processed: usize,
    /// Works written
    pub included: usize,
    pub excluded_by_license: usize,
    /// Missing card page or unreadable file
    pub skipped_source: usize,
    pub skipped_malformed: usize,
    /// Identifier already written in this run
    pub skipped_duplicate: usize,
}

impl BuildSummary {
    pub fn skipped(&self) -> usize {
        self.skipped_source + self.skipped_malformed + self.skipped_duplicate
    }

    pub fn display_string(&self) -> String {
        format!(
            "{} processed, {} included, {} excluded by license, {} skipped ({} source, {} malformed, {} duplicate)",
            self.processed,
            self.included,
            self.excluded_by_license,
            self.skipped(),
            self.skipped_source,
            self.skipped_malformed,
            self.skipped_duplicate
        )
    }
}

/// Runs the conversion
#[derive(Default)]
pub struct BuildDriver {
    card_parser: CardParser,
    text_normalizer: TextNormalizer,
}

impl BuildDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_card_parser(card_parser: CardParser) -> Self {
        Self {
            card_parser,
            text_normalizer: TextNormalizer::new(),
        }
    }

    /// Rebuild the output database from the source tree
    pub async fn run(&self, config: &BuildConfig) -> BuildResult<BuildSummary> {
        let tree = SourceTree::open(&config.repo_path)?;
        let revision = SourceRevision::read(tree.root());
        info!(
            "Source {} at commit {} ({})",
            tree.root().display(),
            revision.commit_hash,
            revision.date
        );

        let index = ArchiveIndex::load_or_empty(tree.root());

        let mut writer = DatabaseWriter::open(&config.output_path).await?;
        writer.reset().await?;
        writer.ensure_schema().await?;

        let mut summary = BuildSummary::default();

        for record in tree.records() {
            summary.processed += 1;
            if summary.processed % PROGRESS_INTERVAL == 0 {
                info!("Progress: {}", summary.display_string());
            }

            // Already logged by the reader
            let Ok(record) = record else {
                summary.skipped_source += 1;
                continue;
            };

            let entry = match self.normalize(&record, &index) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping {} ({}): {}", record.id, record.card_path.display(), e);
                    summary.skipped_malformed += 1;
                    continue;
                }
            };

            if !license::include(&entry) {
                debug!(
                    "Excluded {} 「{}」 by license: {:?}",
                    entry.id,
                    entry.title(),
                    entry.metadata.rights.license_source
                );
                summary.excluded_by_license += 1;
                continue;
            }

            if writer.write(&entry).await? {
                summary.included += 1;
            } else {
                warn!("Duplicate identifier {}, skipping {}", entry.id.key(), entry.id);
                summary.skipped_duplicate += 1;
            }
        }

        let meta = BuildMetadata::new(revision, serde_json::to_string(&summary)?);
        writer.write_build_metadata(&meta).await?;
        writer.commit().await?;

        info!("Build complete: {}", summary.display_string());
        Ok(summary)
    }

    /// Card metadata plus normalized body
    pub fn normalize(&self, record: &WorkRecord, index: &ArchiveIndex) -> Result<WorkEntry, MalformedMetadataError> {
        let metadata = self.card_parser.parse(record, index)?;
        let text = self.text_normalizer.normalize(&record.body);
        Ok(WorkEntry::new(record.id, metadata, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_display_and_skips() {
        let summary = BuildSummary {
            processed: 10,
            included: 5,
            excluded_by_license: 2,
            skipped_source: 1,
            skipped_malformed: 1,
            skipped_duplicate: 1,
        };
        assert_eq!(summary.skipped(), 3);
        assert_eq!(
            summary.display_string(),
            "10 processed, 5 included, 2 excluded by license, 3 skipped (1 source, 1 malformed, 1 duplicate)"
        );
    }

    #[test]
    fn test_summary_serializes_to_json() {
        let summary = BuildSummary {
            processed: 3,
            included: 2,
            excluded_by_license: 1,
            ..Default::default()
        };
        let json: serde_json::Value = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["processed"], 3);
        assert_eq!(json["excluded_by_license"], 1);
    }
}
