mod installer;
mod resolver;

pub use installer::{
    asset_workers, base_library_tasks, install_artifacts, library_batch_size,
    loader_library_tasks, InstallReport, MAX_ASSET_WORKERS,
};
pub use resolver::{base_version_of, resolve, ResolvedVersion};

use tracing::warn;

use crate::core::error::LauncherResult;
use crate::core::mods::install_modpack;
use crate::core::state::LaunchSession;

/// Resolve, download every artifact, then install the curated bundle.
///
/// A bundle failure is reported and logged but does not fail the install;
/// the game still runs with whatever mods are present.
pub async fn install_version(
    session: &LaunchSession,
    version_id: &str,
) -> LauncherResult<(ResolvedVersion, InstallReport)> {
    let resolved = resolve(session, version_id).await?;
    let report = match install_artifacts(session, &resolved).await {
        Ok(report) => report,
        Err(e) => {
            session.observer.on_status(&format!("Error: {e}"));
            return Err(e);
        }
    };

    if let Err(e) = install_modpack(session, version_id).await {
        warn!("Bundle install for {} failed: {}", version_id, e);
    }

    session
        .observer
        .on_status(&format!("{version_id} is ready"));
    Ok((resolved, report))
}
