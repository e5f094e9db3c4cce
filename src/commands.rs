// ─── Command Layer ───
// Public entry points. Every command answers with a `CommandOutcome`; no
// error or panic from the pipeline crosses this boundary.

use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::core::config::LauncherConfig;
use crate::core::error::LauncherResult;
use crate::core::install;
use crate::core::launch::{self, LaunchOptions};
use crate::core::layout::{check_version_id, DataLayout};
use crate::core::mods::{self, ModDownload, ModListing};
use crate::core::progress::InstallObserver;
use crate::core::state::{
    GlobalSettings, InstanceSettings, JsonSettings, LaunchSession, SettingsProvider,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandOutcome<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> CommandOutcome<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

impl<T> From<LauncherResult<T>> for CommandOutcome<T> {
    fn from(result: LauncherResult<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::failed(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InstallSummary {
    pub version_id: String,
    pub loader_label: String,
    /// Files that stayed missing after every retry.
    pub missing_files: usize,
}

/// Long-lived handle shared by every command: configuration, the observer
/// and the one-game-at-a-time flag.
pub struct Launcher {
    config: Arc<LauncherConfig>,
    observer: Arc<dyn InstallObserver>,
    game_running: Arc<AtomicBool>,
    game: Mutex<Option<JoinHandle<Option<i32>>>>,
}

impl Launcher {
    pub fn new(config: LauncherConfig, observer: Arc<dyn InstallObserver>) -> Self {
        Self {
            config: Arc::new(config),
            observer,
            game_running: Arc::new(AtomicBool::new(false)),
            game: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }

    pub fn is_game_running(&self) -> bool {
        self.game_running.load(std::sync::atomic::Ordering::SeqCst)
    }

    fn session(&self) -> LauncherResult<LaunchSession> {
        LaunchSession::new(
            Arc::clone(&self.config),
            Arc::clone(&self.observer),
            Arc::clone(&self.game_running),
        )
    }

    /// Run `job` on its own task so a panic turns into a failed outcome.
    async fn run<T, F, Fut>(&self, command: &'static str, job: F) -> CommandOutcome<T>
    where
        F: FnOnce(LaunchSession) -> Fut,
        Fut: Future<Output = LauncherResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        let session = match self.session() {
            Ok(session) => session,
            Err(e) => {
                error!("{}: cannot start a session: {}", command, e);
                return CommandOutcome::failed(e.to_string());
            }
        };

        match tokio::spawn(job(session)).await {
            Ok(result) => {
                if let Err(e) = &result {
                    error!("{} failed: {}", command, e);
                }
                result.into()
            }
            Err(join_err) => {
                error!("{} aborted: {}", command, join_err);
                CommandOutcome::failed(format!("{command} aborted unexpectedly"))
            }
        }
    }

    pub async fn install_version(&self, version_id: &str) -> CommandOutcome<InstallSummary> {
        let version_id = version_id.to_string();
        self.run("install_version", move |session| async move {
            check_version_id(&version_id)?;
            let (resolved, report) = install::install_version(&session, &version_id).await?;
            Ok(InstallSummary {
                version_id,
                loader_label: resolved.loader_label,
                missing_files: report.missing_files(),
            })
        })
        .await
    }

    /// Start the game. Use [`Launcher::wait_for_game`] to block until it exits.
    pub async fn launch_game(&self, version_id: &str, options: LaunchOptions) -> CommandOutcome<()> {
        let version_id = version_id.to_string();
        let outcome = self
            .run("launch_game", move |session| async move {
                check_version_id(&version_id)?;
                launch::launch_game(&session, &version_id, options).await
            })
            .await;

        match outcome.data {
            Some(handle) => {
                *self.game.lock().await = Some(handle);
                CommandOutcome::ok(())
            }
            None => CommandOutcome {
                success: false,
                data: None,
                message: outcome.message,
            },
        }
    }

    /// Exit code of the game started by the last successful `launch_game`.
    pub async fn wait_for_game(&self) -> Option<i32> {
        let handle = self.game.lock().await.take()?;
        match handle.await {
            Ok(code) => {
                info!("Game finished with {:?}", code);
                code
            }
            Err(e) => {
                error!("Game supervisor failed: {}", e);
                None
            }
        }
    }

    pub async fn get_installed_mod_ids(&self, version_id: &str) -> CommandOutcome<Vec<String>> {
        let version_id = version_id.to_string();
        self.run("get_installed_mod_ids", move |session| async move {
            check_version_id(&version_id)?;
            mods::installed_mod_ids(&session, &version_id).await
        })
        .await
    }

    pub async fn list_mods(&self, version_id: &str) -> CommandOutcome<ModListing> {
        let version_id = version_id.to_string();
        self.run("list_mods", move |session| async move {
            check_version_id(&version_id)?;
            mods::list_mods(&session, &version_id).await
        })
        .await
    }

    pub async fn toggle_mod(
        &self,
        version_id: &str,
        filename: &str,
        preinstalled: bool,
    ) -> CommandOutcome<String> {
        let (version_id, filename) = (version_id.to_string(), filename.to_string());
        self.run("toggle_mod", move |session| async move {
            check_version_id(&version_id)?;
            mods::toggle_mod(&session, &version_id, &filename, preinstalled).await
        })
        .await
    }

    pub async fn delete_mod(
        &self,
        version_id: &str,
        filename: &str,
        preinstalled: bool,
    ) -> CommandOutcome<()> {
        let (version_id, filename) = (version_id.to_string(), filename.to_string());
        self.run("delete_mod", move |session| async move {
            check_version_id(&version_id)?;
            mods::delete_mod(&session, &version_id, &filename, preinstalled).await
        })
        .await
    }

    pub async fn download_mod(&self, request: ModDownload) -> CommandOutcome<PathBuf> {
        self.run("download_mod", move |session| async move {
            check_version_id(&request.version)?;
            mods::download_mod(&session, &request).await
        })
        .await
    }

    // ── Settings ────────────────────────────────────────

    fn settings_store(&self) -> JsonSettings {
        JsonSettings::new(DataLayout::new(&self.config.data_dir))
    }

    pub fn get_global_settings(&self) -> CommandOutcome<GlobalSettings> {
        CommandOutcome::ok(self.settings_store().global())
    }

    pub fn save_global_settings(&self, settings: &GlobalSettings) -> CommandOutcome<()> {
        self.settings_store().save_global(settings).into()
    }

    pub fn get_instance_settings(&self, version_id: &str) -> CommandOutcome<InstanceSettings> {
        check_version_id(version_id)
            .map(|()| self.settings_store().instance(version_id))
            .into()
    }

    pub fn save_instance_settings(
        &self,
        version_id: &str,
        settings: &InstanceSettings,
    ) -> CommandOutcome<()> {
        check_version_id(version_id)
            .and_then(|()| self.settings_store().save_instance(version_id, settings))
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::LauncherError;
    use crate::core::progress::testing::RecordingObserver;

    fn launcher(root: &std::path::Path) -> Launcher {
        let mut config = LauncherConfig::with_data_dir(root);
        config.prefer_ipv4 = false;
        Launcher::new(config, Arc::new(RecordingObserver::default()))
    }

    #[test]
    fn failure_serializes_without_data() {
        let outcome: CommandOutcome<u32> =
            Err(LauncherError::ModNotFound("x.jar".into())).into();
        let json = serde_json::to_value(&outcome).unwrap();

        assert_eq!(json["success"], false);
        assert!(json.get("data").is_none());
        assert_eq!(json["message"], "Mod file not found: x.jar");
    }

    #[tokio::test]
    async fn panic_in_a_command_becomes_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = launcher(dir.path());

        let outcome: CommandOutcome<()> = launcher
            .run("explode", |_session| async {
                let explode = true;
                if explode {
                    panic!("boom");
                }
                Ok::<(), LauncherError>(())
            })
            .await;

        assert!(!outcome.success);
        assert!(outcome.message.unwrap().contains("explode"));
    }

    #[tokio::test]
    async fn mod_commands_work_on_an_empty_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = launcher(dir.path());

        let listing = launcher.list_mods("1.20.1").await;
        assert!(listing.success);
        assert_eq!(listing.data, Some(ModListing::default()));

        let ids = launcher.get_installed_mod_ids("1.20.1").await;
        assert_eq!(ids.data, Some(Vec::new()));

        let toggled = launcher.toggle_mod("1.20.1", "missing.jar", false).await;
        assert!(!toggled.success);
    }

    #[test]
    fn settings_commands_persist_under_the_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let launcher = launcher(dir.path());

        let mut instance = launcher.get_instance_settings("1.20.1").data.unwrap();
        instance.ram = 6;
        assert!(launcher.save_instance_settings("1.20.1", &instance).success);

        let mut global = launcher.get_global_settings().data.unwrap();
        global.username = Some("Alex".into());
        assert!(launcher.save_global_settings(&global).success);

        assert_eq!(launcher.get_instance_settings("1.20.1").data.unwrap().ram, 6);
        assert_eq!(launcher.get_global_settings().data.unwrap().username(), "Alex");
    }

    #[tokio::test]
    async fn version_ids_that_leave_the_data_dir_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        let outside = dir.path().join("keep/mods");
        std::fs::create_dir_all(&outside).unwrap();
        std::fs::write(outside.join("precious.jar"), b"x").unwrap();
        let launcher = launcher(&data);

        let escape = "../../keep";
        assert!(!launcher.list_mods(escape).await.success);
        assert!(!launcher.toggle_mod(escape, "precious.jar", false).await.success);
        assert!(!launcher.delete_mod(escape, "precious.jar", false).await.success);
        assert!(!launcher.launch_game(escape, LaunchOptions::default()).await.success);
        assert!(!launcher.get_instance_settings("a/b").success);
        assert!(!launcher
            .save_instance_settings("..", &InstanceSettings::default())
            .success);

        assert!(outside.join("precious.jar").is_file());
        assert!(!launcher.is_game_running());
    }

    #[tokio::test]
    async fn nothing_to_wait_for_without_a_launch() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(launcher(dir.path()).wait_for_game().await, None);
    }
}
