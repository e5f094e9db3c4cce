use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::downloader::DownloadTask;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::METADATA_TIMEOUT;
use crate::core::maven::MavenArtifact;

const LOADER_GROUP_ARTIFACT: &str = "net.fabricmc:fabric-loader";

/// Loader profile as served by the Fabric metadata service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FabricProfile {
    pub id: Option<String>,
    pub main_class: String,
    #[serde(default)]
    pub libraries: Vec<FabricLibrary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<FabricArguments>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FabricLibrary {
    pub name: String,
    /// Repository base; the loader maven when absent.
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FabricArguments {
    #[serde(default)]
    pub jvm: Vec<String>,
    #[serde(default)]
    pub game: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct LoaderVersion {
    version: String,
    #[serde(default)]
    stable: bool,
}

/// Directory and file stem of a persisted loader profile.
pub fn loader_label(loader_version: &str, version_id: &str) -> String {
    format!("fabric-loader-{loader_version}-{version_id}")
}

impl FabricLibrary {
    pub fn artifact(&self) -> LauncherResult<MavenArtifact> {
        MavenArtifact::parse(&self.name)
    }

    /// Download task for this library: declared repository (or `default_maven`)
    /// first, `mirror` as fallback.
    pub fn download_task(
        &self,
        libs_dir: &Path,
        default_maven: &str,
        mirror: &str,
    ) -> LauncherResult<DownloadTask> {
        let artifact = self.artifact()?;
        let repo = self
            .url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(default_maven);

        Ok(
            DownloadTask::new(artifact.url(repo), libs_dir.join(artifact.local_path()))
                .with_fallback(artifact.url(mirror)),
        )
    }
}

impl FabricProfile {
    /// Make sure the loader jar itself is part of the library list.
    pub fn ensure_loader_library(&mut self, loader_version: &str) {
        let present = self
            .libraries
            .iter()
            .any(|lib| lib.name.starts_with(&format!("{LOADER_GROUP_ARTIFACT}:")));
        if present {
            return;
        }
        self.libraries.push(FabricLibrary {
            name: format!("{LOADER_GROUP_ARTIFACT}:{loader_version}"),
            url: None,
        });
    }

    pub fn loader_version(&self) -> Option<&str> {
        self.libraries.iter().find_map(|lib| {
            lib.name
                .strip_prefix(LOADER_GROUP_ARTIFACT)
                .and_then(|rest| rest.strip_prefix(':'))
        })
    }
}

/// Client for the loader metadata service.
pub struct FabricMeta<'a> {
    client: &'a reqwest::Client,
    base: &'a str,
}

impl<'a> FabricMeta<'a> {
    pub fn new(client: &'a reqwest::Client, base: &'a str) -> Self {
        Self { client, base }
    }

    /// Newest loader release; the first stable one in the listing, else the first.
    pub async fn latest_loader(&self) -> LauncherResult<String> {
        let url = format!("{}/versions/loader", self.base.trim_end_matches('/'));
        let versions: Vec<LoaderVersion> = self.get_json(&url).await?;

        let picked = versions
            .iter()
            .find(|v| v.stable)
            .or_else(|| versions.first())
            .map(|v| v.version.clone())
            .ok_or_else(|| {
                LauncherError::ManifestFetch(format!("{url} returned no loader versions"))
            })?;

        debug!("Latest Fabric loader: {}", picked);
        Ok(picked)
    }

    /// Fetch the profile for `(game_version, loader_version)`, returning the
    /// parsed form and the raw document to persist.
    pub async fn fetch_profile(
        &self,
        game_version: &str,
        loader_version: &str,
    ) -> LauncherResult<(FabricProfile, serde_json::Value)> {
        let url = format!(
            "{}/versions/loader/{}/{}/profile/json",
            self.base.trim_end_matches('/'),
            game_version,
            loader_version
        );
        info!(
            "Fetching Fabric {} profile for Minecraft {}",
            loader_version, game_version
        );

        let raw: serde_json::Value = self.get_json(&url).await?;
        let profile: FabricProfile = serde_json::from_value(raw.clone())?;

        if profile.main_class.is_empty() {
            return Err(LauncherError::ManifestFetch(
                "Fabric profile missing mainClass".into(),
            ));
        }

        Ok((profile, raw))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> LauncherResult<T> {
        let resp = self.client.get(url).timeout(METADATA_TIMEOUT).send().await?;
        if !resp.status().is_success() {
            return Err(LauncherError::DownloadFailed {
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }
        Ok(resp.json::<T>().await?)
    }
}
