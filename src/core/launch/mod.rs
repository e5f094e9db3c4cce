mod classpath;
mod game;
mod natives;
mod task;

pub use classpath::{build_classpath, get_classpath_separator, join_classpath, LOADER_PROVIDED};
pub use game::{launch_game, LaunchOptions};
pub use natives::{cleanup_natives, stage_natives};
pub use task::{resolve_java, spawn_game, supervise, LaunchPlan, OfflineProfile};
