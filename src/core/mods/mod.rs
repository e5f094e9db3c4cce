mod manager;
mod modpack;
mod overlay;
mod tracking;

pub use manager::{
    delete_mod, download_mod, installed_mod_ids, list_mods, toggle_mod, ModDownload, ModEntry,
    ModListing,
};
pub use modpack::install_modpack;
pub use overlay::{deploy_mods, is_deployable};
pub use tracking::ModTracking;
