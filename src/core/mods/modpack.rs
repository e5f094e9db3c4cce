use tracing::{debug, error, info};

use crate::core::archive::extract_zip_blocking;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::layout::MODPACK_MARKER;
use crate::core::state::LaunchSession;

/// Install the curated bundle configured for `version_id` into
/// `mods/<v>/Preinstalled`.
///
/// Returns `false` when there is nothing to do: no bundle is configured or
/// the marker says it is already installed.
pub async fn install_modpack(session: &LaunchSession, version_id: &str) -> LauncherResult<bool> {
    let layout = &session.layout;
    let root_marker = layout.mods_dir(version_id).join(MODPACK_MARKER);
    if root_marker.is_file() {
        debug!("Bundle for {} already installed", version_id);
        return Ok(false);
    }
    let Some(url) = session.config.modpacks.get(version_id) else {
        debug!("No bundle configured for {}", version_id);
        return Ok(false);
    };

    let archive = layout.modpack_archive(version_id);
    let preinstalled = layout.preinstalled_dir(version_id);

    session.observer.on_status("Downloading modpack...");
    let observer = &session.observer;
    let progress = move |done: u64, total: Option<u64>| {
        if let Some(total) = total.filter(|t| *t > 0) {
            observer.on_progress(done as f64 / total as f64);
        }
    };
    session
        .downloader
        .fetch_with(
            url,
            &archive,
            None,
            &session.config.bundle_fetch,
            Some(&progress),
        )
        .await?;

    session.observer.on_status("Extracting modpack...");
    let extracted = extract_zip_blocking(archive.clone(), preinstalled.clone(), Vec::new()).await;
    let count = match extracted {
        Ok(count) => count,
        Err(e) => {
            error!("Bundle for {} could not be extracted: {}", version_id, e);
            let _ = tokio::fs::remove_file(&archive).await;
            session.observer.on_status(&format!("Error: {e}"));
            return Err(e);
        }
    };

    let stamp = chrono::Utc::now().to_rfc3339();
    write_marker(&preinstalled.join(MODPACK_MARKER), &stamp).await?;
    if let Err(e) = tokio::fs::remove_file(&archive).await {
        debug!("Bundle archive {:?} not removed: {}", archive, e);
    }
    write_marker(&root_marker, &stamp).await?;

    info!("Installed {} bundled file(s) for {}", count, version_id);
    session.observer.on_status("Modpack installed");
    Ok(true)
}

async fn write_marker(path: &std::path::Path, stamp: &str) -> LauncherResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| LauncherError::io(parent, e))?;
    }
    tokio::fs::write(path, stamp)
        .await
        .map_err(|e| LauncherError::io(path, e))
}
