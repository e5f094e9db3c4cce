use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::core::error::{LauncherError, LauncherResult};

/// Unpack `archive_path` into `dest_dir`, overwriting existing files.
///
/// Entries whose name starts with one of `exclude_prefixes` are skipped, as
/// are entries that would land outside `dest_dir`. Returns the number of
/// files written.
pub fn extract_zip(
    archive_path: &Path,
    dest_dir: &Path,
    exclude_prefixes: &[String],
) -> LauncherResult<usize> {
    let file = std::fs::File::open(archive_path).map_err(|e| LauncherError::io(archive_path, e))?;
    let mut archive = zip::ZipArchive::new(file)?;
    std::fs::create_dir_all(dest_dir).map_err(|e| LauncherError::io(dest_dir, e))?;

    let mut written = 0;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = entry.name().to_string();

        if exclude_prefixes.iter().any(|prefix| name.starts_with(prefix.as_str())) {
            continue;
        }
        let Some(relative) = entry.enclosed_name() else {
            warn!("Skipping unsafe entry {:?} in {:?}", name, archive_path);
            continue;
        };

        let output_path = dest_dir.join(&relative);
        if entry.is_dir() {
            std::fs::create_dir_all(&output_path).map_err(|e| LauncherError::io(&output_path, e))?;
            continue;
        }
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LauncherError::io(parent, e))?;
        }

        let mut outfile =
            std::fs::File::create(&output_path).map_err(|e| LauncherError::io(&output_path, e))?;
        std::io::copy(&mut entry, &mut outfile).map_err(|e| LauncherError::io(&output_path, e))?;
        written += 1;
    }

    debug!("Extracted {} file(s) from {:?}", written, archive_path);
    Ok(written)
}

/// [`extract_zip`] on the blocking pool.
pub async fn extract_zip_blocking(
    archive_path: PathBuf,
    dest_dir: PathBuf,
    exclude_prefixes: Vec<String>,
) -> LauncherResult<usize> {
    tokio::task::spawn_blocking(move || extract_zip(&archive_path, &dest_dir, &exclude_prefixes))
        .await
        .map_err(|e| LauncherError::TaskJoin(e.to_string()))?
}
