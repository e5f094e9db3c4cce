use std::path::{Path, PathBuf};

use crate::core::error::{LauncherError, LauncherResult};

pub const PREINSTALLED_DIR: &str = "Preinstalled";
pub const TRACKING_FILE: &str = ".mods.json";
pub const MODPACK_MARKER: &str = ".modpack_installed";

/// Version ids become directory names under several roots, so only plain
/// names are accepted.
pub fn check_version_id(version_id: &str) -> LauncherResult<()> {
    let plain = !version_id.is_empty()
        && version_id != "."
        && version_id != ".."
        && !version_id.contains(['/', '\\']);
    if plain {
        Ok(())
    } else {
        Err(LauncherError::InvalidVersionId(version_id.to_string()))
    }
}

/// On-disk layout under the launcher data root.
///
/// ```text
/// versions/<id>/<id>.json        base descriptor (or loader profile)
/// versions/<base>/<base>.jar     client archive
/// libraries/<maven path>         shared library store
/// natives/<id>/                  staged natives, rebuilt per launch
/// assets/indexes/<id>.json
/// assets/objects/<hh>/<hash>
/// mods/<id>/[Preinstalled/]      user mods and curated bundle
/// instances/<id>/                game working directory
/// ```
#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.root.join("versions")
    }

    /// `versions/<name>/<name>.json`
    pub fn version_json(&self, name: &str) -> PathBuf {
        self.versions_dir().join(name).join(format!("{name}.json"))
    }

    /// `versions/<name>/<name>.jar`
    pub fn client_jar(&self, name: &str) -> PathBuf {
        self.versions_dir().join(name).join(format!("{name}.jar"))
    }

    pub fn libraries_dir(&self) -> PathBuf {
        self.root.join("libraries")
    }

    pub fn natives_dir(&self, version_id: &str) -> PathBuf {
        self.root.join("natives").join(version_id)
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.root.join("assets")
    }

    pub fn asset_index(&self, index_id: &str) -> PathBuf {
        self.assets_dir()
            .join("indexes")
            .join(format!("{index_id}.json"))
    }

    pub fn asset_objects_dir(&self) -> PathBuf {
        self.assets_dir().join("objects")
    }

    pub fn mods_dir(&self, version_id: &str) -> PathBuf {
        self.root.join("mods").join(version_id)
    }

    pub fn preinstalled_dir(&self, version_id: &str) -> PathBuf {
        self.mods_dir(version_id).join(PREINSTALLED_DIR)
    }

    /// Temporary download location for a curated bundle archive.
    pub fn modpack_archive(&self, version_id: &str) -> PathBuf {
        self.root
            .join("mods")
            .join(format!("modpack-{version_id}.zip"))
    }

    pub fn instance_dir(&self, version_id: &str) -> PathBuf {
        self.root.join("instances").join(version_id)
    }

    pub fn instance_mods_dir(&self, version_id: &str) -> PathBuf {
        self.instance_dir(version_id).join("mods")
    }

    pub fn instance_settings(&self, version_id: &str) -> PathBuf {
        self.instance_dir(version_id).join("settings.json")
    }

    pub fn global_settings(&self) -> PathBuf {
        self.root.join("global_settings.json")
    }
}
