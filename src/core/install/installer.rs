// ─── Library & Asset Installer ───
// Materializes everything a resolved version needs: client archive, base and
// loader libraries, asset objects. Every stage skips what is already valid on
// disk, so re-running an install is cheap and resumes where it stopped.

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, info, warn};

use super::resolver::ResolvedVersion;
use crate::core::assets::AssetIndex;
use crate::core::downloader::{DownloadReport, DownloadTask};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::loaders::FabricProfile;
use crate::core::state::LaunchSession;
use crate::core::version::VersionJson;

pub const MAX_ASSET_WORKERS: usize = 25;

/// Per-stage outcome. Missing files are logged but never fail the install.
#[derive(Debug, Default)]
pub struct InstallReport {
    pub base_libraries: DownloadReport,
    pub loader_libraries: DownloadReport,
    pub assets: DownloadReport,
}

impl InstallReport {
    pub fn missing_files(&self) -> usize {
        self.base_libraries.failures.len()
            + self.loader_libraries.failures.len()
            + self.assets.failures.len()
    }
}

/// Library batch width: `min(4, ceil(governor / 4))`.
pub fn library_batch_size(governor: usize) -> usize {
    governor.div_ceil(4).clamp(1, 4)
}

pub fn asset_workers(governor: usize) -> usize {
    governor.clamp(1, MAX_ASSET_WORKERS)
}

/// Download every artifact of `resolved` into the shared stores.
pub async fn install_artifacts(
    session: &LaunchSession,
    resolved: &ResolvedVersion,
) -> LauncherResult<InstallReport> {
    install_client(session, resolved).await?;

    let base_libraries = install_base_libraries(session, &resolved.base_descriptor).await;
    let loader_libraries = install_loader_libraries(session, &resolved.loader_profile).await;
    let assets = install_assets(session, &resolved.base_descriptor).await?;

    let report = InstallReport {
        base_libraries,
        loader_libraries,
        assets,
    };
    info!(
        "Install of {} finished ({} file(s) missing)",
        resolved.version_id,
        report.missing_files()
    );
    Ok(report)
}

async fn install_client(session: &LaunchSession, resolved: &ResolvedVersion) -> LauncherResult<()> {
    let client = resolved.base_descriptor.client_download().ok_or_else(|| {
        LauncherError::ManifestFetch(format!(
            "descriptor for {} has no client download",
            resolved.base_version
        ))
    })?;

    session.observer.on_status(&format!(
        "Downloading Minecraft {}...",
        resolved.base_version
    ));
    let task = DownloadTask::new(
        &client.url,
        session.layout.client_jar(&resolved.base_version),
    )
    .with_sha1(client.sha1.clone());

    session
        .downloader
        .fetch_task(&task, session.downloader.policy())
        .await
}

/// Artifact and every classifier of each rule-passing library, de-duplicated
/// by destination.
pub fn base_library_tasks(descriptor: &VersionJson, libs_dir: &Path) -> Vec<DownloadTask> {
    let mut seen = HashSet::new();
    let mut tasks = Vec::new();

    for lib in descriptor.libraries.iter().filter(|lib| lib.should_include()) {
        for artifact in lib.artifact().into_iter().chain(lib.classifier_artifacts()) {
            let dest = libs_dir.join(&artifact.path);
            if seen.insert(dest.clone()) {
                tasks.push(DownloadTask::new(&artifact.url, dest).with_sha1(artifact.sha1.clone()));
            }
        }
    }

    tasks
}

pub fn loader_library_tasks(
    profile: &FabricProfile,
    libs_dir: &Path,
    loader_maven: &str,
    mirror: &str,
) -> Vec<DownloadTask> {
    profile
        .libraries
        .iter()
        .filter_map(|lib| match lib.download_task(libs_dir, loader_maven, mirror) {
            Ok(task) => Some(task),
            Err(e) => {
                warn!("Skipping loader library {}: {}", lib.name, e);
                None
            }
        })
        .collect()
}

async fn install_base_libraries(session: &LaunchSession, descriptor: &VersionJson) -> DownloadReport {
    session.observer.on_status("Downloading Minecraft libraries...");
    let tasks = base_library_tasks(descriptor, &session.layout.libraries_dir());
    debug!("{} base library files declared", tasks.len());

    session
        .downloader
        .download_in_batches(
            tasks,
            library_batch_size(session.concurrency),
            session.downloader.policy(),
        )
        .await
}

async fn install_loader_libraries(session: &LaunchSession, profile: &FabricProfile) -> DownloadReport {
    session.observer.on_status("Downloading Fabric libraries...");
    let endpoints = &session.config.endpoints;
    let tasks = loader_library_tasks(
        profile,
        &session.layout.libraries_dir(),
        &endpoints.fabric_maven,
        &endpoints.maven_mirror,
    );

    session
        .downloader
        .download_in_batches(
            tasks,
            library_batch_size(session.concurrency),
            session.downloader.policy(),
        )
        .await
}

async fn install_assets(session: &LaunchSession, descriptor: &VersionJson) -> LauncherResult<DownloadReport> {
    let Some(index_info) = descriptor.asset_index.as_ref() else {
        debug!("Descriptor declares no asset index");
        return Ok(DownloadReport::default());
    };

    session.observer.on_status("Downloading assets...");
    let index =
        AssetIndex::load_or_fetch(session.store.as_ref(), &session.http_client, index_info).await?;
    let tasks = index.download_tasks(
        &session.config.endpoints.resources,
        &session.layout.asset_objects_dir(),
    );

    let total = tasks.len();
    let workers = asset_workers(session.concurrency);
    let policy = session.downloader.policy();
    session
        .observer
        .on_status(&format!("Downloading assets ({total})..."));

    let observer = &session.observer;
    let report_progress = |done: usize| observer.on_progress(done as f64 / total as f64);
    let mut report = session
        .downloader
        .download_pooled(tasks, workers, policy, |done, _| report_progress(done))
        .await;

    if !report.is_clean() {
        let retry: Vec<DownloadTask> = report.failures.drain(..).map(|(task, _)| task).collect();
        warn!("Retrying {} failed asset(s) once", retry.len());
        session
            .observer
            .on_status(&format!("Retrying {} asset(s)...", retry.len()));
        // The second pass counts on from the first.
        let offset = report.completed;
        let second = session
            .downloader
            .download_pooled(retry, workers, policy, |done, _| {
                report_progress(offset + done)
            })
            .await;
        report.merge(second);
    }

    if report.is_clean() {
        session.observer.on_log(&format!("All {total} assets present"));
    } else {
        let missing = report.failures.len();
        warn!("{} of {} assets could not be downloaded", missing, total);
        session
            .observer
            .on_status(&format!("{missing} assets could not be downloaded"));
    }

    Ok(report)
}
