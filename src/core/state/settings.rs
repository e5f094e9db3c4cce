// ─── Settings ───
// User preferences consumed by the launch step. The pipeline only sees the
// `SettingsProvider` trait; `JsonSettings` is the file-backed implementation.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::layout::DataLayout;

pub const DEFAULT_USERNAME: &str = "Player";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct GlobalSettings {
    /// Whitespace-separated JVM arguments appended to every launch.
    pub custom_jvm_args: String,
    /// Java executable; `java` from `PATH` when unset.
    pub java_path: Option<PathBuf>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct InstanceSettings {
    /// Heap size in GB.
    pub ram: u32,
    pub jvm_args: String,
}

impl Default for InstanceSettings {
    fn default() -> Self {
        Self {
            ram: 2,
            jvm_args: "-XX:+UseG1GC".into(),
        }
    }
}

impl GlobalSettings {
    pub fn custom_jvm_args(&self) -> Vec<String> {
        split_args(&self.custom_jvm_args)
    }

    pub fn username(&self) -> &str {
        self.username
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_USERNAME)
    }
}

impl InstanceSettings {
    pub fn jvm_args(&self) -> Vec<String> {
        split_args(&self.jvm_args)
    }
}

fn split_args(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

/// Read-only access to user preferences.
pub trait SettingsProvider: Send + Sync {
    fn global(&self) -> GlobalSettings;

    fn instance(&self, version_id: &str) -> InstanceSettings;
}

/// Settings stored as `global_settings.json` and `instances/<v>/settings.json`.
pub struct JsonSettings {
    layout: DataLayout,
}

impl JsonSettings {
    pub fn new(layout: DataLayout) -> Self {
        Self { layout }
    }

    pub fn save_global(&self, settings: &GlobalSettings) -> LauncherResult<()> {
        write_json(&self.layout.global_settings(), settings)
    }

    pub fn save_instance(&self, version_id: &str, settings: &InstanceSettings) -> LauncherResult<()> {
        write_json(&self.layout.instance_settings(version_id), settings)
    }
}

impl SettingsProvider for JsonSettings {
    fn global(&self) -> GlobalSettings {
        read_or_default(&self.layout.global_settings())
    }

    fn instance(&self, version_id: &str) -> InstanceSettings {
        read_or_default(&self.layout.instance_settings(version_id))
    }
}

fn read_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    let Ok(raw) = std::fs::read_to_string(path) else {
        return T::default();
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        warn!("Ignoring unreadable settings {:?}: {}", path, e);
        T::default()
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> LauncherResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| LauncherError::io(parent, e))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).map_err(|e| LauncherError::io(path, e))
}
