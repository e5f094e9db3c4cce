// Shared fixtures for unit tests.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;

use crate::core::config::FetchPolicy;
use crate::core::downloader::Downloader;
use crate::core::http::build_http_client;

/// In-memory zip archive with the given entries.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        if name.ends_with('/') {
            writer
                .add_directory(name.trim_end_matches('/'), SimpleFileOptions::default())
                .unwrap();
        } else {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(data).unwrap();
        }
    }
    writer.finish().unwrap().into_inner()
}

/// Three attempts, millisecond backoff.
pub fn fast_policy() -> FetchPolicy {
    FetchPolicy {
        max_attempts: 3,
        base_delay_ms: 1,
        inactivity_timeout_secs: 5,
    }
}

pub fn test_downloader() -> Downloader {
    Downloader::new(build_http_client(false).unwrap(), fast_policy())
}

/// Session whose endpoints all point at `base_url`, using the fast policy.
pub fn test_session(
    base_url: &str,
    root: &std::path::Path,
) -> (
    crate::core::state::LaunchSession,
    std::sync::Arc<crate::core::progress::testing::RecordingObserver>,
) {
    let observer = std::sync::Arc::new(crate::core::progress::testing::RecordingObserver::default());
    let session = test_session_observed(base_url, root, observer.clone());
    (session, observer)
}

/// Like [`test_session`], reporting to a caller-supplied observer.
pub fn test_session_observed(
    base_url: &str,
    root: &std::path::Path,
    observer: std::sync::Arc<dyn crate::core::progress::InstallObserver>,
) -> crate::core::state::LaunchSession {
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    use crate::core::config::{Endpoints, LauncherConfig};
    use crate::core::state::LaunchSession;

    let mut config = LauncherConfig::with_data_dir(root);
    config.endpoints = Endpoints::mirrored_at(base_url);
    config.prefer_ipv4 = false;
    config.artifact_fetch = fast_policy();
    config.bundle_fetch = fast_policy();

    LaunchSession::new(Arc::new(config), observer, Arc::new(AtomicBool::new(false)))
        .unwrap()
        .with_downloader(test_downloader())
        .with_concurrency(8)
}

/// Lowercase hex SHA-1 of `data`.
pub fn sha1_hex(data: &[u8]) -> String {
    use sha1::{Digest, Sha1};
    hex::encode(Sha1::digest(data))
}
