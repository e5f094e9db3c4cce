// ─── Version Catalog ───
// Fetches the global version list and locates a version's descriptor URL.

use serde::Deserialize;
use tracing::info;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::METADATA_TIMEOUT;

/// Top-level version catalog.
#[derive(Debug, Deserialize)]
pub struct VersionCatalog {
    pub versions: Vec<VersionEntry>,
}

/// A single entry in the catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub version_type: String,
    pub url: String,
    #[serde(default, rename = "releaseTime")]
    pub release_time: Option<String>,
}

impl VersionCatalog {
    pub async fn fetch(client: &reqwest::Client, url: &str) -> LauncherResult<Self> {
        info!("Fetching version catalog...");

        let resp = client.get(url).timeout(METADATA_TIMEOUT).send().await?;
        if !resp.status().is_success() {
            return Err(LauncherError::DownloadFailed {
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }
        let catalog: VersionCatalog = resp.json().await?;

        info!("Loaded {} versions from catalog", catalog.versions.len());
        Ok(catalog)
    }

    /// Find a version entry by id (e.g. "1.20.1").
    pub fn find_version(&self, id: &str) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.id == id)
    }
}
