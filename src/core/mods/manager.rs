// ─── Mod Manager ───
// User-facing operations on `mods/<v>` and its Preinstalled bundle.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::overlay::is_deployable;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::layout::{MODPACK_MARKER, PREINSTALLED_DIR};
use crate::core::state::LaunchSession;
use crate::core::store::TrackingScope;

const DISABLED_SUFFIX: &str = ".disabled";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModEntry {
    pub name: String,
    pub enabled: bool,
    /// File name without the `.disabled` suffix.
    pub base_name: String,
}

impl ModEntry {
    fn from_file_name(name: String) -> Self {
        let base_name = name
            .strip_suffix(DISABLED_SUFFIX)
            .unwrap_or(&name)
            .to_string();
        Self {
            enabled: base_name == name,
            name,
            base_name,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModListing {
    pub root: Vec<ModEntry>,
    pub preinstalled: Vec<ModEntry>,
    /// The curated bundle has been installed for this version.
    pub installed: bool,
}

/// A mod download request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModDownload {
    pub url: String,
    pub filename: String,
    pub version: String,
    pub project_id: Option<String>,
}

/// Download a mod into `mods/<v>` and track it. An existing file is kept and
/// only its tracking is updated.
pub async fn download_mod(session: &LaunchSession, request: &ModDownload) -> LauncherResult<PathBuf> {
    check_file_name(&request.filename)?;
    let dest = session.layout.mods_dir(&request.version).join(&request.filename);

    if dest.is_file() {
        info!("{} already present, updating tracking only", request.filename);
    } else {
        session
            .observer
            .on_status(&format!("Downloading {}...", request.filename));
        let observer = &session.observer;
        let progress = move |done: u64, total: Option<u64>| {
            if let Some(total) = total.filter(|t| *t > 0) {
                observer.on_progress(done as f64 / total as f64);
            }
        };
        session
            .downloader
            .fetch_with(
                &request.url,
                &dest,
                None,
                session.downloader.policy(),
                Some(&progress),
            )
            .await?;
    }

    if let Some(project_id) = request.project_id.as_deref() {
        let store = session.store.as_ref();
        let mut tracking = store.load_tracking(&request.version, TrackingScope::Root).await;
        tracking.track(project_id, Some(&request.filename));
        store
            .save_tracking(&request.version, TrackingScope::Root, &tracking)
            .await?;
    }
    Ok(dest)
}

/// Delete a mod file. Root mods are also untracked.
pub async fn delete_mod(
    session: &LaunchSession,
    version_id: &str,
    filename: &str,
    preinstalled: bool,
) -> LauncherResult<()> {
    let path = mod_path(session, version_id, filename, preinstalled)?;
    if !path.is_file() {
        return Err(LauncherError::ModNotFound(filename.to_string()));
    }
    tokio::fs::remove_file(&path)
        .await
        .map_err(|e| LauncherError::io(&path, e))?;
    info!("Deleted mod {:?}", path);

    if !preinstalled {
        let store = session.store.as_ref();
        let mut tracking = store.load_tracking(version_id, TrackingScope::Root).await;
        let base = filename.strip_suffix(DISABLED_SUFFIX).unwrap_or(filename);
        let removed = tracking.untrack(filename).or_else(|| tracking.untrack(base));
        if removed.is_some() {
            store
                .save_tracking(version_id, TrackingScope::Root, &tracking)
                .await?;
        }
    }
    Ok(())
}

/// Flip a mod between `x` and `x.disabled`. Returns the new file name.
pub async fn toggle_mod(
    session: &LaunchSession,
    version_id: &str,
    filename: &str,
    preinstalled: bool,
) -> LauncherResult<String> {
    let path = mod_path(session, version_id, filename, preinstalled)?;
    if !path.is_file() {
        return Err(LauncherError::ModNotFound(filename.to_string()));
    }

    let new_name = match filename.strip_suffix(DISABLED_SUFFIX) {
        Some(base) => base.to_string(),
        None => format!("{filename}{DISABLED_SUFFIX}"),
    };
    let new_path = path.with_file_name(&new_name);
    if new_path.exists() {
        return Err(LauncherError::Other(format!(
            "cannot rename {filename}: {new_name} already exists"
        )));
    }

    tokio::fs::rename(&path, &new_path)
        .await
        .map_err(|e| LauncherError::io(&path, e))?;
    info!("Renamed {} -> {}", filename, new_name);
    Ok(new_name)
}

/// Root and Preinstalled mods of a version.
pub async fn list_mods(session: &LaunchSession, version_id: &str) -> LauncherResult<ModListing> {
    let root_dir = session.layout.mods_dir(version_id);
    let pre_dir = session.layout.preinstalled_dir(version_id);

    Ok(ModListing {
        root: list_dir(&root_dir).await?,
        preinstalled: list_dir(&pre_dir).await?,
        installed: root_dir.join(MODPACK_MARKER).is_file()
            || pre_dir.join(MODPACK_MARKER).is_file(),
    })
}

/// Catalog ids installed for a version. Root ids whose file is gone are left
/// out of the answer but stay in the tracker, so a disabled mod keeps its id.
/// The Preinstalled tracker is taken as is.
pub async fn installed_mod_ids(
    session: &LaunchSession,
    version_id: &str,
) -> LauncherResult<Vec<String>> {
    let store = session.store.as_ref();
    let root_dir = session.layout.mods_dir(version_id);

    let root = store.load_tracking(version_id, TrackingScope::Root).await;
    let preinstalled = store
        .load_tracking(version_id, TrackingScope::Preinstalled)
        .await;

    let mut ids = root.live_ids(&root_dir);
    for id in preinstalled.installed_ids {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

fn mod_path(
    session: &LaunchSession,
    version_id: &str,
    filename: &str,
    preinstalled: bool,
) -> LauncherResult<PathBuf> {
    check_file_name(filename)?;
    let dir = if preinstalled {
        session.layout.preinstalled_dir(version_id)
    } else {
        session.layout.mods_dir(version_id)
    };
    Ok(dir.join(filename))
}

/// Mod names are plain file names; anything that could leave the mods
/// directory is refused.
fn check_file_name(filename: &str) -> LauncherResult<()> {
    let plain = !filename.is_empty()
        && filename != "."
        && filename != ".."
        && !filename.contains(['/', '\\'])
        && filename != PREINSTALLED_DIR;
    if plain {
        Ok(())
    } else {
        Err(LauncherError::Other(format!("invalid mod file name: {filename:?}")))
    }
}

async fn list_dir(dir: &Path) -> LauncherResult<Vec<ModEntry>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(LauncherError::io(dir, e)),
    };

    let mut mods = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| LauncherError::io(dir, e))?
    {
        let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
        let name = entry.file_name().to_string_lossy().to_string();
        if !is_file || name.starts_with('.') {
            continue;
        }
        // Disabled mods are listed even though they are never deployed.
        if is_deployable(&name) || name.ends_with(DISABLED_SUFFIX) {
            mods.push(ModEntry::from_file_name(name));
        }
    }
    mods.sort_by(|a, b| a.base_name.cmp(&b.base_name));
    Ok(mods)
}
