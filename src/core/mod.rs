// ─── launchkit core ───
// Install and launch pipeline for a Fabric-modded game client.
//
//   version/     version catalog, descriptors, platform rules
//   loaders/     Fabric metadata service and loader profiles
//   maven/       Maven coordinate parsing
//   downloader/  resilient fetcher, batches, worker pool, integrity checks
//   assets/      asset index and object layout
//   install/     manifest resolver and artifact installer
//   launch/      natives, classpath, process spawn and supervision
//   mods/        mod tracking, overlay deployment, curated bundles
//   store/       persisted manifests and trackers
//   state/       launch session, settings, hardware sizing

pub mod archive;
pub mod assets;
pub mod config;
pub mod downloader;
pub mod error;
pub mod http;
pub mod install;
pub mod launch;
pub mod layout;
pub mod loaders;
pub mod maven;
pub mod mods;
pub mod progress;
pub mod state;
pub mod store;
pub mod version;

#[cfg(test)]
pub(crate) mod test_support;
