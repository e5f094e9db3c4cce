// ─── Manifest Resolver ───
// Turns a version id into the loader profile and base descriptor, fetching
// what is not cached yet and persisting both for the later stages.

use tracing::{info, warn};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::loaders::{loader_label, FabricMeta, FabricProfile};
use crate::core::state::LaunchSession;
use crate::core::store::{ManifestKind, ManifestStore};
use crate::core::version::{VersionCatalog, VersionJson};

/// Manifests backing one version id.
#[derive(Debug, Clone)]
pub struct ResolvedVersion {
    /// Full id, e.g. `1.20.1-Vulkan`.
    pub version_id: String,
    /// Game version, the part before the first `-`.
    pub base_version: String,
    pub loader_label: String,
    pub loader_profile: FabricProfile,
    pub base_descriptor: VersionJson,
}

pub fn base_version_of(version_id: &str) -> &str {
    version_id.split('-').next().unwrap_or(version_id)
}

/// Resolve and persist the manifests for `version_id`.
///
/// Failures are reported through the status sink and returned; they are
/// terminal for the install.
pub async fn resolve(session: &LaunchSession, version_id: &str) -> LauncherResult<ResolvedVersion> {
    match resolve_inner(session, version_id).await {
        Ok(resolved) => Ok(resolved),
        Err(err) => {
            session.observer.on_status(&format!("Error: {err}"));
            Err(err)
        }
    }
}

async fn resolve_inner(session: &LaunchSession, version_id: &str) -> LauncherResult<ResolvedVersion> {
    let base_version = base_version_of(version_id).to_string();

    session
        .observer
        .on_status(&format!("Resolving Fabric for {version_id}..."));
    let (label, profile) = resolve_loader_profile(session, version_id, &base_version).await?;

    session
        .observer
        .on_status(&format!("Resolving Minecraft {base_version}..."));
    let descriptor = resolve_base_descriptor(session, version_id, &base_version).await?;

    info!("Resolved {} → {} on {}", version_id, label, base_version);
    Ok(ResolvedVersion {
        version_id: version_id.to_string(),
        base_version,
        loader_label: label,
        loader_profile: profile,
        base_descriptor: descriptor,
    })
}

async fn resolve_loader_profile(
    session: &LaunchSession,
    version_id: &str,
    base_version: &str,
) -> LauncherResult<(String, FabricProfile)> {
    let store = session.store.as_ref();
    let meta = FabricMeta::new(&session.http_client, &session.config.endpoints.fabric_meta);

    let loader = match meta.latest_loader().await {
        Ok(loader) => loader,
        Err(err) => {
            if let Some(cached) = find_cached_profile(store, version_id).await {
                warn!(
                    "Loader metadata unavailable ({}), reusing {}",
                    err, cached.0
                );
                return Ok(cached);
            }
            return Err(LauncherError::ManifestFetch(format!(
                "loader versions unavailable: {err}"
            )));
        }
    };

    let label = loader_label(&loader, version_id);
    if let Some(doc) = store.load_manifest(ManifestKind::LoaderProfile, &label).await {
        if let Ok(mut profile) = serde_json::from_value::<FabricProfile>(doc) {
            profile.ensure_loader_library(&loader);
            return Ok((label, profile));
        }
        warn!("Stored profile {} does not parse, fetching again", label);
    }

    let (mut profile, raw) = meta
        .fetch_profile(base_version, &loader)
        .await
        .map_err(|err| match err {
            LauncherError::ManifestFetch(_) => err,
            other => LauncherError::ManifestFetch(format!("loader profile {label}: {other}")),
        })?;
    store
        .save_manifest(ManifestKind::LoaderProfile, &label, &raw)
        .await?;
    profile.ensure_loader_library(&loader);

    Ok((label, profile))
}

/// Newest stored profile whose label belongs to `version_id`.
async fn find_cached_profile(
    store: &dyn ManifestStore,
    version_id: &str,
) -> Option<(String, FabricProfile)> {
    let suffix = format!("-{version_id}");
    let candidates = store.manifest_ids(ManifestKind::LoaderProfile).await;

    for label in candidates.iter().rev() {
        if !label.starts_with("fabric-loader-") || !label.ends_with(&suffix) {
            continue;
        }
        let Some(doc) = store.load_manifest(ManifestKind::LoaderProfile, label).await else {
            continue;
        };
        let Ok(profile) = serde_json::from_value::<FabricProfile>(doc) else {
            continue;
        };
        let owns_label = profile
            .loader_version()
            .is_some_and(|loader| loader_label(loader, version_id) == *label);
        if owns_label {
            return Some((label.clone(), profile));
        }
    }
    None
}

async fn resolve_base_descriptor(
    session: &LaunchSession,
    version_id: &str,
    base_version: &str,
) -> LauncherResult<VersionJson> {
    let store = session.store.as_ref();

    if let Some(doc) = store
        .load_manifest(ManifestKind::BaseDescriptor, version_id)
        .await
    {
        match serde_json::from_value::<VersionJson>(doc) {
            Ok(descriptor) => return Ok(descriptor),
            Err(e) => warn!("Stored descriptor for {} is invalid: {}", version_id, e),
        }
    }

    let catalog = VersionCatalog::fetch(
        &session.http_client,
        &session.config.endpoints.version_manifest,
    )
    .await
    .map_err(|e| LauncherError::ManifestFetch(format!("version catalog: {e}")))?;

    let entry = catalog
        .find_version(base_version)
        .ok_or_else(|| LauncherError::VersionNotFound(base_version.to_string()))?;

    let (descriptor, raw) = VersionJson::fetch(&session.http_client, &entry.url)
        .await
        .map_err(|e| LauncherError::ManifestFetch(format!("descriptor {base_version}: {e}")))?;
    store
        .save_manifest(ManifestKind::BaseDescriptor, version_id, &raw)
        .await?;

    Ok(descriptor)
}
