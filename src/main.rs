use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;

use launchkit_lib::commands::{CommandOutcome, Launcher};
use launchkit_lib::core::config::LauncherConfig;
use launchkit_lib::core::launch::LaunchOptions;
use launchkit_lib::core::mods::ModDownload;
use launchkit_lib::core::progress::TracingObserver;

#[derive(Parser)]
#[command(name = "launchkit")]
#[command(about = "Install and launch Fabric game versions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve and download everything a version needs.
    Install { version: String },
    /// Install if needed, then start the game and wait for it to close.
    Launch {
        version: String,
        /// Heap size in GB.
        #[arg(long)]
        ram: Option<u32>,
    },
    /// Manage the mods of a version.
    Mods {
        #[command(subcommand)]
        command: ModCommands,
    },
    /// Show or change launch settings.
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Print the global settings, or a version's settings when given.
    Show { version: Option<String> },
    /// Change the settings of one version.
    Instance {
        version: String,
        #[arg(long)]
        ram: Option<u32>,
        #[arg(long, allow_hyphen_values = true)]
        jvm_args: Option<String>,
    },
    /// Change settings applied to every launch.
    Global {
        #[arg(long, allow_hyphen_values = true)]
        jvm_args: Option<String>,
        #[arg(long)]
        java: Option<PathBuf>,
        #[arg(long)]
        username: Option<String>,
    },
}

#[derive(Subcommand)]
enum ModCommands {
    List {
        version: String,
    },
    /// Catalog ids of the installed mods.
    Ids {
        version: String,
    },
    Toggle {
        version: String,
        filename: String,
        #[arg(long)]
        preinstalled: bool,
    },
    Delete {
        version: String,
        filename: String,
        #[arg(long)]
        preinstalled: bool,
    },
    Add {
        version: String,
        url: String,
        filename: String,
        #[arg(long)]
        project_id: Option<String>,
    },
}

fn report<T: Serialize>(outcome: &CommandOutcome<T>) -> ExitCode {
    match serde_json::to_string_pretty(outcome) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("cannot render result: {e}"),
    }
    if outcome.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    launchkit_lib::init_logging();
    let cli = Cli::parse();

    let launcher = Launcher::new(LauncherConfig::load(), Arc::new(TracingObserver::new()));

    match cli.command {
        Commands::Install { version } => report(&launcher.install_version(&version).await),
        Commands::Launch { version, ram } => {
            let outcome = launcher
                .launch_game(&version, LaunchOptions { ram_gb: ram })
                .await;
            if !outcome.success {
                return report(&outcome);
            }
            match launcher.wait_for_game().await {
                Some(0) | None => ExitCode::SUCCESS,
                Some(_) => ExitCode::FAILURE,
            }
        }
        Commands::Mods { command } => match command {
            ModCommands::List { version } => report(&launcher.list_mods(&version).await),
            ModCommands::Ids { version } => {
                report(&launcher.get_installed_mod_ids(&version).await)
            }
            ModCommands::Toggle {
                version,
                filename,
                preinstalled,
            } => report(&launcher.toggle_mod(&version, &filename, preinstalled).await),
            ModCommands::Delete {
                version,
                filename,
                preinstalled,
            } => report(&launcher.delete_mod(&version, &filename, preinstalled).await),
            ModCommands::Add {
                version,
                url,
                filename,
                project_id,
            } => report(
                &launcher
                    .download_mod(ModDownload {
                        url,
                        filename,
                        version,
                        project_id,
                    })
                    .await,
            ),
        },
        Commands::Settings { command } => match command {
            SettingsCommands::Show { version: Some(version) } => {
                report(&launcher.get_instance_settings(&version))
            }
            SettingsCommands::Show { version: None } => report(&launcher.get_global_settings()),
            SettingsCommands::Instance {
                version,
                ram,
                jvm_args,
            } => {
                let mut settings = launcher
                    .get_instance_settings(&version)
                    .data
                    .unwrap_or_default();
                if let Some(ram) = ram {
                    settings.ram = ram.max(1);
                }
                if let Some(args) = jvm_args {
                    settings.jvm_args = args;
                }
                report(&launcher.save_instance_settings(&version, &settings))
            }
            SettingsCommands::Global {
                jvm_args,
                java,
                username,
            } => {
                let mut settings = launcher.get_global_settings().data.unwrap_or_default();
                if let Some(args) = jvm_args {
                    settings.custom_jvm_args = args;
                }
                if java.is_some() {
                    settings.java_path = java;
                }
                if username.is_some() {
                    settings.username = username;
                }
                report(&launcher.save_global_settings(&settings))
            }
        },
    }
}
