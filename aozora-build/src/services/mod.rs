//! Pipeline stages

pub mod archive_index;
pub mod build_driver;
pub mod card_parser;
pub mod html;
pub mod license;
pub mod source_reader;
pub mod source_revision;
pub mod text_normalizer;

pub use archive_index::{ArchiveIndex, IndexError};
pub use build_driver::{BuildDriver, BuildSummary};
pub use card_parser::{CardParser, MalformedMetadataError};
pub use license::{DefaultLicenseParser, LicenseParser};
pub use source_reader::{MissingInputError, SourceError, SourceTree};
pub use text_normalizer::TextNormalizer;
