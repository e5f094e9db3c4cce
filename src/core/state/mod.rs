mod session;
mod settings;
mod system;

pub use session::LaunchSession;
pub use settings::{
    GlobalSettings, InstanceSettings, JsonSettings, SettingsProvider, DEFAULT_USERNAME,
};
pub use system::{concurrency_for_cores, optimal_concurrency, system_default_ram_gb};
