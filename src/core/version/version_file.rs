// ─── Version File ───
// Parses a base-game version descriptor and resolves per-library artifacts
// for the host platform.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::rules::{rules_allow, LibraryRule, Platform};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::METADATA_TIMEOUT;

/// A parsed base-game version descriptor.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionJson {
    pub id: Option<String>,
    #[serde(default)]
    pub main_class: Option<String>,
    #[serde(default)]
    pub libraries: Vec<LibraryEntry>,
    pub downloads: Option<VersionDownloads>,
    #[serde(default)]
    pub asset_index: Option<AssetIndexInfo>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VersionDownloads {
    pub client: Option<DownloadArtifact>,
    #[serde(default)]
    pub server: Option<DownloadArtifact>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadArtifact {
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetIndexInfo {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub total_size: Option<u64>,
}

// ─── Library Entry with Rules ───

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryEntry {
    pub name: String,
    #[serde(default)]
    pub downloads: Option<LibraryDownloads>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<LibraryRule>>,
    /// Platform name → classifier, possibly containing `${arch}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub natives: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extract: Option<ExtractRules>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LibraryDownloads {
    #[serde(default)]
    pub artifact: Option<LibDownloadArtifact>,
    #[serde(default)]
    pub classifiers: Option<BTreeMap<String, LibDownloadArtifact>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibDownloadArtifact {
    pub path: String,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ExtractRules {
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl LibraryEntry {
    /// Whether this library applies to the running platform.
    pub fn should_include(&self) -> bool {
        self.allowed_on(Platform::current())
    }

    pub fn allowed_on(&self, platform: Platform) -> bool {
        rules_allow(self.rules.as_deref(), platform)
    }

    /// `group:artifact` part of the coordinate.
    pub fn group_artifact(&self) -> Option<String> {
        let mut parts = self.name.split(':');
        let group = parts.next()?;
        let artifact = parts.next()?;
        Some(format!("{group}:{artifact}"))
    }

    pub fn artifact(&self) -> Option<&LibDownloadArtifact> {
        self.downloads.as_ref()?.artifact.as_ref()
    }

    /// Every classifier artifact, for all platforms.
    pub fn classifier_artifacts(&self) -> impl Iterator<Item = &LibDownloadArtifact> {
        self.downloads
            .as_ref()
            .and_then(|d| d.classifiers.as_ref())
            .into_iter()
            .flat_map(|c| c.values())
    }

    /// Classifier holding natives for `platform`.
    ///
    /// Uses the `natives` map when declared (with `${arch}` replaced),
    /// otherwise `natives-<platform>`.
    pub fn native_classifier_for(&self, platform: Platform) -> String {
        self.natives
            .as_ref()
            .and_then(|map| map.get(platform.as_str()))
            .map(|classifier| {
                let arch = if cfg!(target_pointer_width = "64") {
                    "64"
                } else {
                    "32"
                };
                classifier.replace("${arch}", arch)
            })
            .unwrap_or_else(|| platform.native_classifier())
    }

    pub fn native_artifact_for(&self, platform: Platform) -> Option<&LibDownloadArtifact> {
        let classifier = self.native_classifier_for(platform);
        self.downloads
            .as_ref()?
            .classifiers
            .as_ref()?
            .get(&classifier)
    }

    pub fn extract_excludes(&self) -> &[String] {
        self.extract
            .as_ref()
            .map(|e| e.exclude.as_slice())
            .unwrap_or_default()
    }
}

impl VersionJson {
    /// Fetch a descriptor, returning both the parsed form and the raw document.
    pub async fn fetch(
        client: &reqwest::Client,
        url: &str,
    ) -> LauncherResult<(Self, serde_json::Value)> {
        let resp = client.get(url).timeout(METADATA_TIMEOUT).send().await?;
        if !resp.status().is_success() {
            return Err(LauncherError::DownloadFailed {
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }
        let raw: serde_json::Value = resp.json().await?;
        let parsed = serde_json::from_value(raw.clone())?;
        Ok((parsed, raw))
    }

    pub fn client_download(&self) -> Option<&DownloadArtifact> {
        self.downloads.as_ref()?.client.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lwjgl_natives() -> LibraryEntry {
        serde_json::from_value(serde_json::json!({
            "name": "org.lwjgl.lwjgl:lwjgl-platform:2.9.4",
            "downloads": {
                "classifiers": {
                    "natives-linux": {"path": "l/natives-linux.jar", "url": "https://x/l"},
                    "natives-osx": {"path": "l/natives-osx.jar", "url": "https://x/o"},
                    "natives-windows-64": {"path": "l/natives-windows-64.jar", "url": "https://x/w"}
                }
            },
            "natives": {"linux": "natives-linux", "osx": "natives-osx", "windows": "natives-windows-${arch}"},
            "extract": {"exclude": ["META-INF/"]}
        }))
        .unwrap()
    }

    #[test]
    fn native_classifier_prefers_declared_map() {
        let lib = lwjgl_natives();
        assert_eq!(lib.native_classifier_for(Platform::Linux), "natives-linux");
        if cfg!(target_pointer_width = "64") {
            assert_eq!(
                lib.native_classifier_for(Platform::Windows),
                "natives-windows-64"
            );
            assert!(lib.native_artifact_for(Platform::Windows).is_some());
        }
        assert_eq!(lib.extract_excludes(), ["META-INF/".to_string()]);
    }

    #[test]
    fn native_classifier_defaults_to_platform_name() {
        let lib: LibraryEntry = serde_json::from_value(serde_json::json!({
            "name": "org.lwjgl:lwjgl:3.3.1",
            "downloads": {
                "classifiers": {
                    "natives-linux": {"path": "a.jar", "url": "https://x/a"}
                }
            }
        }))
        .unwrap();
        assert_eq!(lib.native_classifier_for(Platform::Osx), "natives-osx");
        assert!(lib.native_artifact_for(Platform::Linux).is_some());
        assert!(lib.native_artifact_for(Platform::Osx).is_none());
    }

    #[test]
    fn classifier_artifacts_cover_every_platform() {
        let lib = lwjgl_natives();
        assert_eq!(lib.classifier_artifacts().count(), 3);
        assert!(lib.artifact().is_none());
    }

    #[test]
    fn group_artifact_drops_version() {
        let lib: LibraryEntry =
            serde_json::from_value(serde_json::json!({"name": "org.ow2.asm:asm:9.6"})).unwrap();
        assert_eq!(lib.group_artifact().as_deref(), Some("org.ow2.asm:asm"));
    }

    #[test]
    fn parses_descriptor_fields() {
        let parsed: VersionJson = serde_json::from_value(serde_json::json!({
            "id": "1.20.1",
            "mainClass": "net.minecraft.client.main.Main",
            "downloads": {"client": {"url": "https://x/client.jar", "sha1": "abc", "size": 10}},
            "assetIndex": {"id": "5", "url": "https://x/5.json", "totalSize": 100},
            "libraries": [{"name": "a:b:1.0", "rules": [{"action": "allow", "os": {"name": "linux"}}]}]
        }))
        .unwrap();

        assert_eq!(parsed.client_download().unwrap().url, "https://x/client.jar");
        assert_eq!(parsed.asset_index.as_ref().unwrap().id, "5");
        assert!(parsed.libraries[0].allowed_on(Platform::Linux));
        assert!(!parsed.libraries[0].allowed_on(Platform::Windows));
    }
}
