use tracing::info;

use super::classpath::{build_classpath, join_classpath};
use super::natives::stage_natives;
use super::task::{resolve_java, spawn_game, supervise, LaunchPlan, OfflineProfile};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::install::install_version;
use crate::core::mods::deploy_mods;
use crate::core::state::{system_default_ram_gb, LaunchSession};

#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    /// Heap size in GB; instance settings when unset.
    pub ram_gb: Option<u32>,
}

/// Install, stage and start `version_id`.
///
/// The returned handle resolves with the game's exit code once it closes.
/// Only one game runs per session.
pub async fn launch_game(
    session: &LaunchSession,
    version_id: &str,
    options: LaunchOptions,
) -> LauncherResult<tokio::task::JoinHandle<Option<i32>>> {
    if !session.try_mark_running() {
        return Err(LauncherError::GameAlreadyRunning);
    }

    match prepare_and_spawn(session, version_id, &options).await {
        Ok(handle) => Ok(handle),
        Err(e) => {
            session.running_flag().store(false, std::sync::atomic::Ordering::SeqCst);
            session.observer.on_status(&format!("Error: {e}"));
            Err(e)
        }
    }
}

async fn prepare_and_spawn(
    session: &LaunchSession,
    version_id: &str,
    options: &LaunchOptions,
) -> LauncherResult<tokio::task::JoinHandle<Option<i32>>> {
    let layout = &session.layout;
    let (resolved, _) = install_version(session, version_id).await?;

    session.observer.on_status("Preparing game files...");
    let natives_dir =
        stage_natives(layout, &resolved.base_descriptor.libraries, version_id).await?;
    let classpath = build_classpath(
        layout,
        &resolved.loader_profile,
        &resolved.base_descriptor,
        &resolved.base_version,
    );
    deploy_mods(
        layout,
        &session.config,
        version_id,
        &[layout.mods_dir(version_id), layout.preinstalled_dir(version_id)],
    )
    .await?;

    let global = session.settings.global();
    let instance = session.settings.instance(version_id);
    let ram_gb = options
        .ram_gb
        .unwrap_or_else(|| {
            if layout.instance_settings(version_id).is_file() {
                instance.ram
            } else {
                system_default_ram_gb()
            }
        })
        .max(1);

    let mut extra_jvm_args = instance.jvm_args();
    extra_jvm_args.extend(global.custom_jvm_args());
    if let Some(arguments) = &resolved.loader_profile.arguments {
        extra_jvm_args.extend(
            arguments
                .jvm
                .iter()
                .map(|arg| arg.trim().to_string())
                .filter(|arg| !arg.is_empty()),
        );
    }

    let game_dir = layout.instance_dir(version_id);
    let assets_dir = layout.assets_dir();
    let asset_index = resolved
        .base_descriptor
        .asset_index
        .as_ref()
        .map(|index| index.id.clone())
        .unwrap_or_else(|| resolved.base_version.clone());
    let game_args = OfflineProfile {
        username: global.username(),
        version_label: &resolved.loader_label,
        game_dir: &game_dir,
        assets_dir: &assets_dir,
        asset_index: &asset_index,
    }
    .game_args();

    let plan = LaunchPlan {
        java: resolve_java(global.java_path.as_deref()),
        ram_gb,
        natives_dir: natives_dir.clone(),
        classpath: join_classpath(&classpath),
        main_class: resolved.loader_profile.main_class.clone(),
        extra_jvm_args,
        game_args,
        working_dir: game_dir,
    };

    session.observer.on_status("Launching game...");
    let child = spawn_game(&plan)?;
    info!("Started {} (pid {})", version_id, child.id());
    session.observer.on_status("Game running");

    Ok(supervise(
        child,
        session.observer.clone(),
        session.running_flag(),
        Some(natives_dir),
    ))
}
