// ─── Manifest Store ───
// Narrow repository over the persisted manifests and mod trackers. The
// pipeline reads and writes through `ManifestStore` only; `JsonFileStore`
// maps each document onto the data layout.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::layout::{DataLayout, TRACKING_FILE};
use crate::core::mods::ModTracking;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestKind {
    /// Keyed by loader label.
    LoaderProfile,
    /// Keyed by version id.
    BaseDescriptor,
    /// Keyed by asset index id.
    AssetIndex,
}

/// Which tracker of a version's mod directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingScope {
    Root,
    Preinstalled,
}

#[async_trait]
pub trait ManifestStore: Send + Sync {
    /// A stored document, or `None` when absent or unreadable.
    async fn load_manifest(&self, kind: ManifestKind, id: &str) -> Option<Value>;

    async fn save_manifest(&self, kind: ManifestKind, id: &str, doc: &Value)
        -> LauncherResult<()>;

    /// Ids of every stored document of `kind`.
    async fn manifest_ids(&self, kind: ManifestKind) -> Vec<String>;

    /// Tracker for a version; an empty one when absent or corrupt.
    async fn load_tracking(&self, version_id: &str, scope: TrackingScope) -> ModTracking;

    async fn save_tracking(
        &self,
        version_id: &str,
        scope: TrackingScope,
        tracking: &ModTracking,
    ) -> LauncherResult<()>;
}

/// Pretty-printed JSON files under the data root.
pub struct JsonFileStore {
    layout: DataLayout,
}

impl JsonFileStore {
    pub fn new(layout: DataLayout) -> Self {
        Self { layout }
    }

    fn manifest_path(&self, kind: ManifestKind, id: &str) -> PathBuf {
        match kind {
            ManifestKind::LoaderProfile | ManifestKind::BaseDescriptor => {
                self.layout.version_json(id)
            }
            ManifestKind::AssetIndex => self.layout.asset_index(id),
        }
    }

    fn tracking_path(&self, version_id: &str, scope: TrackingScope) -> PathBuf {
        let dir = match scope {
            TrackingScope::Root => self.layout.mods_dir(version_id),
            TrackingScope::Preinstalled => self.layout.preinstalled_dir(version_id),
        };
        dir.join(TRACKING_FILE)
    }
}

#[async_trait]
impl ManifestStore for JsonFileStore {
    async fn load_manifest(&self, kind: ManifestKind, id: &str) -> Option<Value> {
        let path = self.manifest_path(kind, id);
        let raw = tokio::fs::read_to_string(&path).await.ok()?;
        match serde_json::from_str(&raw) {
            Ok(doc) => Some(doc),
            Err(e) => {
                warn!("Discarding unreadable manifest {:?}: {}", path, e);
                None
            }
        }
    }

    async fn save_manifest(
        &self,
        kind: ManifestKind,
        id: &str,
        doc: &Value,
    ) -> LauncherResult<()> {
        let path = self.manifest_path(kind, id);
        write_pretty(&path, doc).await?;
        debug!("Stored {:?} {} at {:?}", kind, id, path);
        Ok(())
    }

    async fn manifest_ids(&self, kind: ManifestKind) -> Vec<String> {
        let dir = match kind {
            ManifestKind::LoaderProfile | ManifestKind::BaseDescriptor => {
                self.layout.versions_dir()
            }
            ManifestKind::AssetIndex => self.layout.assets_dir().join("indexes"),
        };
        let Ok(mut entries) = tokio::fs::read_dir(&dir).await else {
            return Vec::new();
        };

        let mut ids = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name().to_string_lossy().to_string();
            let id = match kind {
                ManifestKind::AssetIndex => match name.strip_suffix(".json") {
                    Some(stem) => stem.to_string(),
                    None => continue,
                },
                _ => name,
            };
            if self.manifest_path(kind, &id).is_file() {
                ids.push(id);
            }
        }
        ids.sort();
        ids
    }

    async fn load_tracking(&self, version_id: &str, scope: TrackingScope) -> ModTracking {
        let path = self.tracking_path(version_id, scope);
        let Ok(raw) = tokio::fs::read_to_string(&path).await else {
            return ModTracking::default();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Resetting unreadable tracker {:?}: {}", path, e);
            ModTracking::default()
        })
    }

    async fn save_tracking(
        &self,
        version_id: &str,
        scope: TrackingScope,
        tracking: &ModTracking,
    ) -> LauncherResult<()> {
        write_pretty(&self.tracking_path(version_id, scope), tracking).await
    }
}

async fn write_pretty<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> LauncherResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| LauncherError::io(parent, e))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| LauncherError::io(path, e))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn manifests_land_where_the_layout_says() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        let store = JsonFileStore::new(layout.clone());

        store
            .save_manifest(ManifestKind::BaseDescriptor, "1.20.1", &json!({"id": "1.20.1"}))
            .await
            .unwrap();
        store
            .save_manifest(ManifestKind::AssetIndex, "5", &json!({"objects": {}}))
            .await
            .unwrap();

        assert!(layout.version_json("1.20.1").is_file());
        assert!(layout.asset_index("5").is_file());
        assert_eq!(
            store.load_manifest(ManifestKind::BaseDescriptor, "1.20.1").await,
            Some(json!({"id": "1.20.1"}))
        );
        assert_eq!(store.manifest_ids(ManifestKind::AssetIndex).await, vec!["5"]);
    }

    #[tokio::test]
    async fn absent_or_corrupt_manifest_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        let store = JsonFileStore::new(layout.clone());

        assert!(store
            .load_manifest(ManifestKind::LoaderProfile, "nope")
            .await
            .is_none());

        std::fs::create_dir_all(layout.version_json("bad").parent().unwrap()).unwrap();
        std::fs::write(layout.version_json("bad"), "{ truncated").unwrap();
        assert!(store
            .load_manifest(ManifestKind::BaseDescriptor, "bad")
            .await
            .is_none());
    }

    #[tokio::test]
    async fn tracking_scopes_are_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        let store = JsonFileStore::new(layout.clone());

        let mut root = ModTracking::default();
        root.track("root-id", Some("r.jar"));
        store
            .save_tracking("1.20.1", TrackingScope::Root, &root)
            .await
            .unwrap();

        assert!(layout.mods_dir("1.20.1").join(TRACKING_FILE).is_file());
        assert_eq!(
            store.load_tracking("1.20.1", TrackingScope::Root).await,
            root
        );
        assert_eq!(
            store
                .load_tracking("1.20.1", TrackingScope::Preinstalled)
                .await,
            ModTracking::default()
        );
    }
}
