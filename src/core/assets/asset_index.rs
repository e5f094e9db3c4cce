use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::core::downloader::DownloadTask;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::METADATA_TIMEOUT;
use crate::core::store::{ManifestKind, ManifestStore};
use crate::core::version::AssetIndexInfo;

/// Logical asset name → content-addressed object.
#[derive(Debug, Deserialize)]
pub struct AssetIndex {
    #[serde(default)]
    pub objects: BTreeMap<String, AssetObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetObject {
    pub hash: String,
    #[serde(default)]
    pub size: u64,
}

impl AssetObject {
    /// `<hh>/<hash>`, shared by the object store and the resources URL.
    pub fn relative_path(&self) -> Option<String> {
        let prefix = self.hash.get(..2)?;
        if !self.hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        Some(format!("{}/{}", prefix, self.hash))
    }
}

impl AssetIndex {
    /// One task per distinct object. The hash doubles as the expected SHA-1.
    pub fn download_tasks(&self, resources_base: &str, objects_dir: &Path) -> Vec<DownloadTask> {
        let base = resources_base.trim_end_matches('/');
        let mut seen = HashSet::new();

        self.objects
            .values()
            .filter(|obj| seen.insert(obj.hash.as_str()))
            .filter_map(|obj| {
                let rel = obj.relative_path()?;
                Some(
                    DownloadTask::new(format!("{base}/{rel}"), objects_dir.join(&rel))
                        .with_sha1(Some(obj.hash.to_ascii_lowercase())),
                )
            })
            .collect()
    }

    /// Load the cached index or fetch and cache it.
    pub async fn load_or_fetch(
        store: &dyn ManifestStore,
        client: &reqwest::Client,
        info: &AssetIndexInfo,
    ) -> LauncherResult<Self> {
        if let Some(doc) = store.load_manifest(ManifestKind::AssetIndex, &info.id).await {
            debug!("Using cached asset index {}", info.id);
            return Ok(serde_json::from_value(doc)?);
        }

        info!("Fetching asset index {}", info.id);
        let resp = client
            .get(&info.url)
            .timeout(METADATA_TIMEOUT)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(LauncherError::DownloadFailed {
                url: info.url.clone(),
                status: resp.status().as_u16(),
            });
        }
        let doc: serde_json::Value = resp.json().await?;
        let index: AssetIndex = serde_json::from_value(doc.clone())?;
        store
            .save_manifest(ManifestKind::AssetIndex, &info.id, &doc)
            .await?;
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn tasks_are_content_addressed_and_deduplicated() {
        let index: AssetIndex = serde_json::from_value(serde_json::json!({
            "objects": {
                "icons/icon_16x16.png": {"hash": "bdf48ef6b5d0d23bbb02e17d04865216179f510a", "size": 3665},
                "icons/icon_32x32.png": {"hash": "92750c5f93c312ba9ab413d546f32190c56d6f1f", "size": 5362},
                "copy/of/icon.png":     {"hash": "bdf48ef6b5d0d23bbb02e17d04865216179f510a", "size": 3665},
                "broken":               {"hash": "z"}
            }
        }))
        .unwrap();

        let tasks = index.download_tasks("https://res/", Path::new("/a/objects"));

        assert_eq!(tasks.len(), 2);
        let icon = tasks
            .iter()
            .find(|t| t.primary_url().ends_with("bdf48ef6b5d0d23bbb02e17d04865216179f510a"))
            .unwrap();
        assert_eq!(
            icon.primary_url(),
            "https://res/bd/bdf48ef6b5d0d23bbb02e17d04865216179f510a"
        );
        assert_eq!(
            icon.dest,
            PathBuf::from("/a/objects/bd/bdf48ef6b5d0d23bbb02e17d04865216179f510a")
        );
        assert_eq!(
            icon.sha1.as_deref(),
            Some("bdf48ef6b5d0d23bbb02e17d04865216179f510a")
        );
    }
}
