use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::core::archive::extract_zip_blocking;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::layout::DataLayout;
use crate::core::version::{LibraryEntry, Platform};

/// Rebuild `natives/<version_id>` from the native classifiers of `libraries`.
///
/// A library whose archive is missing or unreadable is logged and skipped.
pub async fn stage_natives(
    layout: &DataLayout,
    libraries: &[LibraryEntry],
    version_id: &str,
) -> LauncherResult<PathBuf> {
    stage_natives_for(layout, libraries, version_id, Platform::current()).await
}

pub(crate) async fn stage_natives_for(
    layout: &DataLayout,
    libraries: &[LibraryEntry],
    version_id: &str,
    platform: Platform,
) -> LauncherResult<PathBuf> {
    let natives_dir = layout.natives_dir(version_id);

    if tokio::fs::try_exists(&natives_dir).await.unwrap_or(false) {
        tokio::fs::remove_dir_all(&natives_dir)
            .await
            .map_err(|e| LauncherError::io(&natives_dir, e))?;
    }
    tokio::fs::create_dir_all(&natives_dir)
        .await
        .map_err(|e| LauncherError::io(&natives_dir, e))?;

    let libs_dir = layout.libraries_dir();
    let mut staged = 0;

    for lib in libraries.iter().filter(|lib| lib.allowed_on(platform)) {
        let Some(native) = lib.native_artifact_for(platform) else {
            continue;
        };
        let archive = libs_dir.join(&native.path);
        if !archive.is_file() {
            debug!("Native archive not present: {:?}", archive);
            continue;
        }

        match extract_zip_blocking(
            archive.clone(),
            natives_dir.clone(),
            lib.extract_excludes().to_vec(),
        )
        .await
        {
            Ok(_) => staged += 1,
            Err(e) => warn!("Failed to extract natives from {:?}: {}", archive, e),
        }
    }

    info!("Staged natives from {} archive(s) into {:?}", staged, natives_dir);
    Ok(natives_dir)
}

/// Remove the staging directory once the game has exited.
pub async fn cleanup_natives(natives_dir: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(natives_dir).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Cannot remove natives dir {:?}: {}", natives_dir, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::zip_bytes;

    fn native_lib(name: &str, rules: serde_json::Value) -> LibraryEntry {
        serde_json::from_value(serde_json::json!({
            "name": format!("org.lwjgl:{name}:3.3.1"),
            "rules": rules,
            "downloads": {"classifiers": {
                "natives-linux": {"path": format!("{name}-linux.jar"), "url": "https://x"},
                "natives-windows": {"path": format!("{name}-windows.jar"), "url": "https://x"}
            }},
            "extract": {"exclude": ["META-INF/"]}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn stages_current_platform_natives_only() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        let libs = layout.libraries_dir();
        std::fs::create_dir_all(&libs).unwrap();
        std::fs::write(
            libs.join("lwjgl-linux.jar"),
            zip_bytes(&[("liblwjgl.so", b"so"), ("META-INF/MANIFEST.MF", b"m")]),
        )
        .unwrap();
        std::fs::write(libs.join("lwjgl-windows.jar"), zip_bytes(&[("lwjgl.dll", b"dll")]))
            .unwrap();
        std::fs::write(libs.join("glfw-linux.jar"), b"not a zip").unwrap();
        // Present on disk, but its rules only allow osx.
        std::fs::write(
            libs.join("excluded-linux.jar"),
            zip_bytes(&[("libexcluded.so", b"so")]),
        )
        .unwrap();

        // A stale file from the previous launch must disappear.
        let stale = layout.natives_dir("1.20.1").join("stale.so");
        std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
        std::fs::write(&stale, b"old").unwrap();

        let libraries = vec![
            native_lib("lwjgl", serde_json::Value::Null),
            native_lib("glfw", serde_json::Value::Null),
            native_lib(
                "excluded",
                serde_json::json!([{"action": "allow", "os": {"name": "osx"}}]),
            ),
        ];

        let staged = stage_natives_for(&layout, &libraries, "1.20.1", Platform::Linux)
            .await
            .unwrap();

        assert!(staged.join("liblwjgl.so").is_file());
        assert!(!staged.join("lwjgl.dll").exists());
        assert!(!staged.join("libexcluded.so").exists());
        assert!(!staged.join("META-INF").exists());
        assert!(!stale.exists());
    }
}
