// ─── Launcher Configuration ───
// Data directory discovery, remote endpoints, fetch policies and the curated
// mod bundle catalog. Persisted as `launcher_config.json` in the data dir.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const APP_DIR_NAME: &str = "launchkit";
const BOOTSTRAP_FILE: &str = "launcher_bootstrap.json";
const CONFIG_FILE: &str = "launcher_config.json";
const DATA_DIR_ENV: &str = "LAUNCHKIT_DATA_DIR";

/// Remote services the pipeline talks to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub fabric_meta: String,
    pub version_manifest: String,
    pub fabric_maven: String,
    pub maven_mirror: String,
    pub resources: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            fabric_meta: "https://meta.fabricmc.net/v2".into(),
            version_manifest: "https://launchermeta.mojang.com/mc/game/version_manifest.json"
                .into(),
            fabric_maven: "https://maven.fabricmc.net".into(),
            maven_mirror: "https://repo1.maven.org/maven2".into(),
            resources: "https://resources.download.minecraft.net".into(),
        }
    }
}

impl Endpoints {
    /// Every endpoint below a single base URL, laid out like the real services.
    #[cfg(test)]
    pub fn mirrored_at(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            fabric_meta: format!("{base}/meta/v2"),
            version_manifest: format!("{base}/mc/game/version_manifest.json"),
            fabric_maven: format!("{base}/fabric-maven"),
            maven_mirror: format!("{base}/central"),
            resources: format!("{base}/resources"),
        }
    }
}

/// Retry budget and stall detection for one class of downloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub inactivity_timeout_secs: u64,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self::artifact()
    }
}

impl FetchPolicy {
    /// Libraries, client archive, asset objects, single mods.
    pub fn artifact() -> Self {
        Self {
            max_attempts: 4,
            base_delay_ms: 2_000,
            inactivity_timeout_secs: 60,
        }
    }

    /// Large curated mod bundles.
    pub fn bundle() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 3_000,
            inactivity_timeout_secs: 120,
        }
    }

    /// Delay before retrying after the given zero-based failed attempt.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt.min(16)).unwrap_or(u64::MAX);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor))
    }

    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_secs(self.inactivity_timeout_secs)
    }

    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// A mod that must not be deployed for matching version variants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModExclusion {
    pub version_contains: String,
    pub file_contains: String,
}

impl ModExclusion {
    pub fn matches(&self, version_id: &str, file_name: &str) -> bool {
        version_id
            .to_lowercase()
            .contains(&self.version_contains.to_lowercase())
            && file_name
                .to_lowercase()
                .contains(&self.file_contains.to_lowercase())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    #[serde(skip)]
    pub data_dir: PathBuf,
    pub endpoints: Endpoints,
    pub artifact_fetch: FetchPolicy,
    pub bundle_fetch: FetchPolicy,
    /// Bind outgoing connections to IPv4; dual-stack resolution stalls on some networks.
    pub prefer_ipv4: bool,
    /// Curated bundle URL per version id.
    pub modpacks: HashMap<String, String>,
    pub mod_exclusions: Vec<ModExclusion>,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::new(),
            endpoints: Endpoints::default(),
            artifact_fetch: FetchPolicy::artifact(),
            bundle_fetch: FetchPolicy::bundle(),
            prefer_ipv4: true,
            modpacks: HashMap::new(),
            mod_exclusions: vec![ModExclusion {
                version_contains: "vulkan".into(),
                file_contains: "tutorial".into(),
            }],
        }
    }
}

impl LauncherConfig {
    /// Discover the data directory and load its config file.
    pub fn load() -> Self {
        Self::load_from(default_data_dir())
    }

    /// Load `launcher_config.json` from `data_dir`, falling back to defaults.
    pub fn load_from(data_dir: PathBuf) -> Self {
        let path = data_dir.join(CONFIG_FILE);
        let mut config = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str::<LauncherConfig>(&raw).unwrap_or_else(|e| {
                warn!("Ignoring corrupt {:?}: {}", path, e);
                LauncherConfig::default()
            }),
            Err(_) => LauncherConfig::default(),
        };
        config.data_dir = data_dir;
        debug!("Launcher data dir: {:?}", config.data_dir);
        config
    }

    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn save(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(self.data_dir.join(CONFIG_FILE), json)
    }

    pub fn is_excluded_mod(&self, version_id: &str, file_name: &str) -> bool {
        self.mod_exclusions
            .iter()
            .any(|rule| rule.matches(version_id, file_name))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BootstrapConfig {
    data_dir: PathBuf,
}

fn default_base_dir() -> PathBuf {
    dirs::data_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn default_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }

    let base = default_base_dir();
    if let Some(dir) = read_bootstrap(&base.join(BOOTSTRAP_FILE)) {
        return dir;
    }

    base.join(APP_DIR_NAME)
}

fn read_bootstrap(path: &Path) -> Option<PathBuf> {
    let raw = std::fs::read_to_string(path).ok()?;
    let cfg = serde_json::from_str::<BootstrapConfig>(&raw).ok()?;
    Some(cfg.data_dir)
}
