mod batch;
mod client;
pub mod integrity;
mod pool;
mod task;

pub use batch::DownloadReport;
pub use client::{Downloader, ProgressFn};
pub use integrity::{is_archive_path, is_valid_archive, validate_archive};
pub use task::DownloadTask;
