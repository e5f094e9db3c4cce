use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use reqwest::Client;

use super::settings::{JsonSettings, SettingsProvider};
use super::system::optimal_concurrency;
use crate::core::config::LauncherConfig;
use crate::core::downloader::Downloader;
use crate::core::error::LauncherResult;
use crate::core::http::build_http_client;
use crate::core::layout::DataLayout;
use crate::core::progress::InstallObserver;
use crate::core::store::{JsonFileStore, ManifestStore};

/// Everything one install or launch attempt needs, built up front and passed
/// down explicitly.
pub struct LaunchSession {
    pub config: Arc<LauncherConfig>,
    pub layout: DataLayout,
    pub http_client: Client,
    pub downloader: Arc<Downloader>,
    /// Governor value; stages apply their own caps on top.
    pub concurrency: usize,
    pub observer: Arc<dyn InstallObserver>,
    pub store: Arc<dyn ManifestStore>,
    pub settings: Arc<dyn SettingsProvider>,
    game_running: Arc<AtomicBool>,
}

impl LaunchSession {
    /// Session backed by the JSON store and settings under the config's data dir.
    pub fn new(
        config: Arc<LauncherConfig>,
        observer: Arc<dyn InstallObserver>,
        game_running: Arc<AtomicBool>,
    ) -> LauncherResult<Self> {
        let layout = DataLayout::new(&config.data_dir);
        let http_client = build_http_client(config.prefer_ipv4)?;
        let downloader = Arc::new(Downloader::new(
            http_client.clone(),
            config.artifact_fetch.clone(),
        ));

        Ok(Self {
            store: Arc::new(JsonFileStore::new(layout.clone())),
            settings: Arc::new(JsonSettings::new(layout.clone())),
            concurrency: optimal_concurrency(),
            config,
            layout,
            http_client,
            downloader,
            observer,
            game_running,
        })
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_downloader(mut self, downloader: Downloader) -> Self {
        self.downloader = Arc::new(downloader);
        self
    }

    pub fn is_game_running(&self) -> bool {
        self.game_running.load(Ordering::SeqCst)
    }

    /// Claim the running slot. False when a game is already running.
    pub(crate) fn try_mark_running(&self) -> bool {
        self.game_running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub(crate) fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.game_running)
    }
}
