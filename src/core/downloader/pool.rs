use std::sync::atomic::{AtomicUsize, Ordering};

use futures_util::future::join_all;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

use super::batch::DownloadReport;
use super::client::Downloader;
use super::task::DownloadTask;
use crate::core::config::FetchPolicy;

impl Downloader {
    /// Drain `tasks` through a fixed pool of symmetric workers.
    ///
    /// Tasks flow through a bounded channel that closes once the producer
    /// has sent everything, so a worker stops only when the queue is empty
    /// and no more work can arrive. `on_completed(done, total)` fires after
    /// every successful task.
    pub async fn download_pooled<F>(
        &self,
        tasks: Vec<DownloadTask>,
        workers: usize,
        policy: &FetchPolicy,
        on_completed: F,
    ) -> DownloadReport
    where
        F: Fn(usize, usize) + Sync,
    {
        let total = tasks.len();
        if total == 0 {
            return DownloadReport::default();
        }

        let workers = workers.clamp(1, total);
        let (tx, rx) = mpsc::channel::<DownloadTask>(workers * 2);
        let rx = Mutex::new(rx);
        let completed = AtomicUsize::new(0);
        let failures = std::sync::Mutex::new(Vec::new());

        debug!("Worker pool: {} tasks, {} workers", total, workers);

        let producer = async move {
            for task in tasks {
                if tx.send(task).await.is_err() {
                    break;
                }
            }
            // `tx` dropped here closes the queue.
        };

        let rx = &rx;
        let completed = &completed;
        let failures = &failures;
        let on_completed = &on_completed;

        let pool = (0..workers).map(move |_| async move {
            loop {
                let next = rx.lock().await.recv().await;
                let Some(task) = next else {
                    break;
                };

                match self.fetch_task(&task, policy).await {
                    Ok(()) => {
                        let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                        on_completed(done, total);
                    }
                    Err(err) => {
                        warn!("Pooled download failed for {}: {}", task.primary_url(), err);
                        if let Ok(mut list) = failures.lock() {
                            list.push((task, err));
                        }
                    }
                }
            }
        });

        tokio::join!(producer, join_all(pool));

        let failures = match failures.lock() {
            Ok(mut list) => std::mem::take(&mut *list),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };

        DownloadReport {
            completed: completed.load(Ordering::SeqCst),
            failures,
        }
    }
}
