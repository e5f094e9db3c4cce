use futures_util::future::join_all;
use tracing::{info, warn};

use super::client::Downloader;
use super::task::DownloadTask;
use crate::core::config::FetchPolicy;
use crate::core::error::LauncherError;

/// Outcome of a batched or pooled run. Failures never abort the run.
#[derive(Debug, Default)]
pub struct DownloadReport {
    pub completed: usize,
    pub failures: Vec<(DownloadTask, LauncherError)>,
}

impl DownloadReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn merge(&mut self, other: DownloadReport) {
        self.completed += other.completed;
        self.failures.extend(other.failures);
    }
}

impl Downloader {
    /// Run tasks in fixed-size batches with all-settled semantics.
    ///
    /// A batch is admitted only after every task of the previous one has
    /// settled. A failing task is logged and recorded; its siblings and the
    /// following batches still run.
    pub async fn download_in_batches(
        &self,
        tasks: Vec<DownloadTask>,
        batch_size: usize,
        policy: &FetchPolicy,
    ) -> DownloadReport {
        let batch_size = batch_size.max(1);
        let mut report = DownloadReport::default();

        info!(
            "Starting batched download: {} files, batch size {}",
            tasks.len(),
            batch_size
        );

        for batch in tasks.chunks(batch_size) {
            let results = join_all(batch.iter().map(|task| self.fetch_task(task, policy))).await;

            for (task, result) in batch.iter().zip(results) {
                match result {
                    Ok(()) => report.completed += 1,
                    Err(err) => {
                        warn!("Download failed for {}: {}", task.primary_url(), err);
                        report.failures.push((task.clone(), err));
                    }
                }
            }
        }

        report
    }
}
