use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::StreamExt;
use reqwest::Client;
use sha1::{Digest, Sha1};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, error, warn};

use super::integrity::{is_archive_path, validate_archive};
use super::task::DownloadTask;
use crate::core::config::FetchPolicy;
use crate::core::error::{LauncherError, LauncherResult};

/// Byte-level progress: `(downloaded, total_if_known)`.
pub type ProgressFn<'a> = &'a (dyn Fn(u64, Option<u64>) + Send + Sync);

/// Streaming downloader with inactivity detection, exponential backoff and
/// archive validation.
///
/// Writes go straight to the destination; every failed attempt deletes
/// what it wrote, so a terminal failure leaves nothing behind.
pub struct Downloader {
    client: Client,
    policy: FetchPolicy,
    /// Serializes check-then-write on the same destination.
    path_locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
    transfers: AtomicU64,
}

impl Downloader {
    pub fn new(client: Client, policy: FetchPolicy) -> Self {
        Self {
            client,
            policy,
            path_locks: Mutex::new(HashMap::new()),
            transfers: AtomicU64::new(0),
        }
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// Number of payloads actually transferred over the network.
    pub fn transfers(&self) -> u64 {
        self.transfers.load(Ordering::Relaxed)
    }

    // ── Single file download ────────────────────────────

    /// Fetch `url` into `dest` with the downloader's default policy.
    pub async fn fetch(
        &self,
        url: &str,
        dest: &Path,
        on_progress: Option<ProgressFn<'_>>,
    ) -> LauncherResult<()> {
        self.fetch_with(url, dest, None, &self.policy, on_progress)
            .await
    }

    /// Fetch with an explicit policy and optional expected SHA-1.
    pub async fn fetch_with(
        &self,
        url: &str,
        dest: &Path,
        sha1_expected: Option<&str>,
        policy: &FetchPolicy,
        on_progress: Option<ProgressFn<'_>>,
    ) -> LauncherResult<()> {
        let lock = self.path_lock(dest).await;
        let result = {
            let _guard = lock.lock().await;
            self.fetch_locked(url, dest, sha1_expected, policy, on_progress)
                .await
        };
        self.release_path_lock(dest, &lock).await;
        result
    }

    async fn fetch_locked(
        &self,
        url: &str,
        dest: &Path,
        sha1_expected: Option<&str>,
        policy: &FetchPolicy,
        on_progress: Option<ProgressFn<'_>>,
    ) -> LauncherResult<()> {
        let attempts = policy.attempts();
        let mut last_err = None;

        for attempt in 0..attempts {
            match self
                .attempt(url, dest, sha1_expected, policy, on_progress)
                .await
            {
                Ok(()) => return Ok(()),
                Err(err) => {
                    remove_partial(dest).await;

                    if attempt + 1 < attempts {
                        let delay = policy.backoff(attempt);
                        let status = err
                            .http_status()
                            .map(|s| format!(" (status {s})"))
                            .unwrap_or_default();
                        warn!(
                            "Retry {}/{} for {} in {:?}: {}{}",
                            attempt + 1,
                            attempts,
                            url,
                            delay,
                            err,
                            status
                        );
                        tokio::time::sleep(delay).await;
                    } else {
                        error!("Download failed after {} attempt(s): {} ({})", attempts, url, err);
                    }
                    last_err = Some(err);
                }
            }
        }

        let last = last_err.unwrap_or_else(|| LauncherError::Other("no attempt was made".into()));
        Err(LauncherError::FetchExhausted {
            url: url.to_string(),
            attempts,
            status: last.http_status(),
            source: Box::new(last),
        })
    }

    /// Fetch a task, trying each candidate source in order with the full
    /// retry budget.
    pub async fn fetch_task(&self, task: &DownloadTask, policy: &FetchPolicy) -> LauncherResult<()> {
        let mut last_err = None;

        for (idx, url) in task.sources.iter().enumerate() {
            match self
                .fetch_with(url, &task.dest, task.sha1.as_deref(), policy, None)
                .await
            {
                Ok(()) => return Ok(()),
                Err(err) => {
                    if idx + 1 < task.sources.len() {
                        warn!("Source {} failed for {:?}, trying next: {}", url, task.dest, err);
                    }
                    last_err = Some(err);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            LauncherError::Other(format!("No source declared for {:?}", task.dest))
        }))
    }

    async fn attempt(
        &self,
        url: &str,
        dest: &Path,
        sha1_expected: Option<&str>,
        policy: &FetchPolicy,
        on_progress: Option<ProgressFn<'_>>,
    ) -> LauncherResult<()> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::io(parent, e))?;
        }

        let archive = is_archive_path(dest);

        if tokio::fs::try_exists(dest).await.unwrap_or(false) {
            if !archive {
                return Ok(());
            }
            if validate_archive(dest).await {
                return Ok(());
            }
            warn!("Corrupted file detected, removing: {:?}", dest);
            tokio::fs::remove_file(dest)
                .await
                .map_err(|e| LauncherError::io(dest, e))?;
        }

        let inactivity = policy.inactivity_timeout();
        let stalled = || LauncherError::InactivityTimeout {
            url: url.to_string(),
            secs: inactivity.as_secs(),
        };

        let response = timeout(inactivity, self.client.get(url).send())
            .await
            .map_err(|_| stalled())??;

        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let total_bytes = response.content_length();
        let mut stream = response.bytes_stream();
        let mut hasher = sha1_expected.map(|_| Sha1::new());
        let mut downloaded = 0u64;

        // Scoped so the handle is closed before validation reopens the file.
        {
            let mut file = tokio::fs::File::create(dest)
                .await
                .map_err(|e| LauncherError::io(dest, e))?;

            while let Some(chunk) = timeout(inactivity, stream.next())
                .await
                .map_err(|_| stalled())?
            {
                let chunk = chunk?;
                file.write_all(&chunk)
                    .await
                    .map_err(|e| LauncherError::io(dest, e))?;
                if let Some(hasher) = hasher.as_mut() {
                    hasher.update(&chunk);
                }
                downloaded += chunk.len() as u64;
                if let Some(report) = on_progress {
                    report(downloaded, total_bytes);
                }
            }

            file.flush().await.map_err(|e| LauncherError::io(dest, e))?;
        }

        if let (Some(expected), Some(hasher)) = (sha1_expected, hasher) {
            let actual = hex::encode(hasher.finalize());
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(LauncherError::Sha1Mismatch {
                    path: dest.to_path_buf(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        if archive && !validate_archive(dest).await {
            return Err(LauncherError::CorruptArchive {
                path: dest.to_path_buf(),
            });
        }

        self.transfers.fetch_add(1, Ordering::Relaxed);
        debug!("Downloaded: {} -> {:?} ({} bytes)", url, dest, downloaded);
        Ok(())
    }

    async fn path_lock(&self, dest: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.path_locks.lock().await;
        locks
            .entry(dest.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the entry for `dest` unless another fetch still holds it.
    async fn release_path_lock(&self, dest: &Path, lock: &Arc<Mutex<()>>) {
        let mut locks = self.path_locks.lock().await;
        // One reference in the map, one held by the caller.
        if Arc::strong_count(lock) == 2 {
            locks.remove(dest);
        }
    }
}

async fn remove_partial(dest: &Path) {
    if let Err(e) = tokio::fs::remove_file(dest).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Cannot remove partial file {:?}: {}", dest, e);
        }
    }
}
