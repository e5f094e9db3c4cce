use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::core::config::LauncherConfig;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::layout::{DataLayout, MODPACK_MARKER, TRACKING_FILE};

/// Whether a file found in a mod source directory is a deployable mod.
pub fn is_deployable(file_name: &str) -> bool {
    !(file_name.starts_with('.')
        || file_name == MODPACK_MARKER
        || file_name == TRACKING_FILE
        || file_name.ends_with(".disabled"))
}

/// Rebuild `instances/<version_id>/mods` from `sources`, lowest priority
/// first. Returns the number of files deployed.
pub async fn deploy_mods(
    layout: &DataLayout,
    config: &LauncherConfig,
    version_id: &str,
    sources: &[PathBuf],
) -> LauncherResult<usize> {
    let target = layout.instance_mods_dir(version_id);

    if tokio::fs::try_exists(&target).await.unwrap_or(false) {
        tokio::fs::remove_dir_all(&target)
            .await
            .map_err(|e| LauncherError::io(&target, e))?;
    }
    tokio::fs::create_dir_all(&target)
        .await
        .map_err(|e| LauncherError::io(&target, e))?;

    let mut selected: BTreeMap<String, PathBuf> = BTreeMap::new();
    for source in sources {
        let Ok(mut entries) = tokio::fs::read_dir(source).await else {
            debug!("Mod source {:?} not present", source);
            continue;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            if !is_file {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if !is_deployable(&name) {
                continue;
            }
            if config.is_excluded_mod(version_id, &name) {
                info!("Excluding {} from {}", name, version_id);
                continue;
            }
            selected.insert(name, entry.path());
        }
    }

    for (name, src) in &selected {
        link_file(src, &target.join(name)).await?;
    }

    info!("Deployed {} mod(s) into {:?}", selected.len(), target);
    Ok(selected.len())
}

/// Symlink `dst` to `src`, copying when links are not permitted.
async fn link_file(src: &Path, dst: &Path) -> LauncherResult<()> {
    #[cfg(unix)]
    let linked = tokio::fs::symlink(src, dst).await;
    #[cfg(windows)]
    let linked = tokio::fs::symlink_file(src, dst).await;

    if let Err(e) = linked {
        warn!("Symlink for {:?} failed ({}), copying", dst, e);
        tokio::fs::copy(src, dst)
            .await
            .map_err(|e| LauncherError::io(dst, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, body: &[u8]) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    #[test]
    fn markers_and_disabled_mods_are_not_deployable() {
        assert!(is_deployable("sodium.jar"));
        assert!(!is_deployable(".mods.json"));
        assert!(!is_deployable(".modpack_installed"));
        assert!(!is_deployable(".DS_Store"));
        assert!(!is_deployable("iris.jar.disabled"));
    }

    #[tokio::test]
    async fn later_source_wins_on_name_clash() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        let config = LauncherConfig::with_data_dir(dir.path());

        let root = layout.mods_dir("1.20.1");
        let pre = layout.preinstalled_dir("1.20.1");
        write(&root.join("foo.jar"), b"root");
        write(&root.join("only-root.jar"), b"r");
        write(&root.join("off.jar.disabled"), b"d");
        write(&root.join(TRACKING_FILE), b"{}");
        write(&pre.join("foo.jar"), b"preinstalled");

        let deployed = deploy_mods(&layout, &config, "1.20.1", &[root.clone(), pre.clone()])
            .await
            .unwrap();

        let target = layout.instance_mods_dir("1.20.1");
        assert_eq!(deployed, 2);
        assert_eq!(std::fs::read(target.join("foo.jar")).unwrap(), b"preinstalled");
        assert!(target.join("only-root.jar").exists());
        assert!(!target.join("off.jar.disabled").exists());
        assert!(!target.join(TRACKING_FILE).exists());
        // The Preinstalled directory itself is never linked.
        assert!(!target.join("Preinstalled").exists());
    }

    #[tokio::test]
    async fn stale_overlay_is_cleared_and_exclusions_apply() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        let config = LauncherConfig::with_data_dir(dir.path());

        let target = layout.instance_mods_dir("1.20.1-Vulkan");
        write(&target.join("stale.jar"), b"old");
        let root = layout.mods_dir("1.20.1-Vulkan");
        write(&root.join("vulkan-tutorial-mod.jar"), b"t");
        write(&root.join("keep.jar"), b"k");

        deploy_mods(&layout, &config, "1.20.1-Vulkan", &[root])
            .await
            .unwrap();

        assert!(!target.join("stale.jar").exists());
        assert!(!target.join("vulkan-tutorial-mod.jar").exists());
        assert!(target.join("keep.jar").exists());
    }
}
