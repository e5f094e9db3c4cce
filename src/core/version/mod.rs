mod manifest;
pub mod rules;
mod version_file;

pub use manifest::{VersionCatalog, VersionEntry};
pub use rules::{rules_allow, LibraryRule, Platform, RuleAction};
pub use version_file::{
    AssetIndexInfo, DownloadArtifact, LibDownloadArtifact, LibraryEntry, VersionJson,
};
