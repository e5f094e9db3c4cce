// ─── Launch Task ───
// Spawns the game process and supervises it until exit.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::classpath::safe_path_str;
use super::natives::cleanup_natives;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::progress::InstallObserver;

const LAUNCHER_BRAND: &str = "launchkit";
const OFFLINE_UUID: &str = "00000000-0000-0000-0000-000000000000";

/// Everything needed to start the JVM.
#[derive(Debug, Clone)]
pub struct LaunchPlan {
    pub java: PathBuf,
    pub ram_gb: u32,
    pub natives_dir: PathBuf,
    pub classpath: String,
    pub main_class: String,
    /// Instance and user supplied JVM arguments, in that order.
    pub extra_jvm_args: Vec<String>,
    pub game_args: Vec<String>,
    pub working_dir: PathBuf,
}

/// Offline-mode game arguments.
#[derive(Debug, Clone)]
pub struct OfflineProfile<'a> {
    pub username: &'a str,
    pub version_label: &'a str,
    pub game_dir: &'a Path,
    pub assets_dir: &'a Path,
    pub asset_index: &'a str,
}

impl OfflineProfile<'_> {
    pub fn game_args(&self) -> Vec<String> {
        vec![
            "--username".into(),
            self.username.into(),
            "--version".into(),
            self.version_label.into(),
            "--gameDir".into(),
            safe_path_str(self.game_dir),
            "--assetsDir".into(),
            safe_path_str(self.assets_dir),
            "--assetIndex".into(),
            self.asset_index.into(),
            "--uuid".into(),
            OFFLINE_UUID.into(),
            "--accessToken".into(),
            "0".into(),
            "--userType".into(),
            "legacy".into(),
            "--versionType".into(),
            "release".into(),
        ]
    }
}

impl LaunchPlan {
    /// JVM arguments up to and including the main class.
    pub fn jvm_args(&self) -> Vec<String> {
        let mut args = vec![
            "-Djava.net.preferIPv4Stack=true".to_string(),
            format!("-Xmx{}G", self.ram_gb),
            format!("-Xms{}G", self.ram_gb),
            format!("-Djava.library.path={}", safe_path_str(&self.natives_dir)),
            format!("-Dminecraft.launcher.brand={LAUNCHER_BRAND}"),
            format!("-Dminecraft.launcher.version={}", env!("CARGO_PKG_VERSION")),
        ];
        args.extend(self.extra_jvm_args.iter().cloned());
        args.push("-cp".into());
        args.push(self.classpath.clone());
        args.push(self.main_class.clone());
        args
    }

    pub fn command(&self) -> std::process::Command {
        let mut cmd = std::process::Command::new(&self.java);
        cmd.args(self.jvm_args())
            .args(&self.game_args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        configure_native_library_env(&mut cmd, &self.natives_dir);
        cmd
    }
}

/// Hint for a log line that points at a known installation problem.
fn diagnostic_for(line: &str) -> Option<&'static str> {
    if line.contains("ZipException: zip END header not found") {
        return Some("A library archive is corrupt. Reinstall the version to download a clean copy.");
    }
    if line.contains("Could not find or load main class") {
        return Some("The classpath is incomplete. Reinstall the version to restore missing libraries.");
    }
    None
}

fn forward_lines(
    stream: impl std::io::Read,
    observer: &dyn InstallObserver,
    pid: u32,
    is_stderr: bool,
) {
    let mut hinted = false;
    for line in BufReader::new(stream).lines().map_while(Result::ok) {
        if is_stderr {
            warn!("[game:{}][stderr] {}", pid, line);
        } else {
            debug!("[game:{}][stdout] {}", pid, line);
        }
        observer.on_log(&line);

        if !hinted {
            if let Some(hint) = diagnostic_for(&line) {
                warn!("{}", hint);
                observer.on_log(hint);
                hinted = true;
            }
        }
    }
}

/// Java executable: the configured one, then `$JAVA_HOME/bin/java`, then `java`.
pub fn resolve_java(configured: Option<&Path>) -> PathBuf {
    if let Some(path) = configured.filter(|p| p.exists()) {
        return path.to_path_buf();
    }
    let exe = if cfg!(target_os = "windows") {
        "java.exe"
    } else {
        "java"
    };
    if let Some(home) = std::env::var_os("JAVA_HOME") {
        let candidate = PathBuf::from(home).join("bin").join(exe);
        if candidate.is_file() {
            return candidate;
        }
    }
    PathBuf::from(exe)
}

/// Start the game. The working directory is created if needed.
pub fn spawn_game(plan: &LaunchPlan) -> LauncherResult<std::process::Child> {
    if plan.classpath.trim().is_empty() {
        return Err(LauncherError::JavaExecution("empty classpath".into()));
    }
    std::fs::create_dir_all(&plan.working_dir)
        .map_err(|e| LauncherError::io(&plan.working_dir, e))?;

    let mut cmd = plan.command();
    info!("Launching {} with Java {:?}", plan.main_class, plan.java);
    debug!("Command: {:?}", cmd);

    cmd.spawn()
        .map_err(|e| LauncherError::JavaExecution(format!("{:?}: {}", plan.java, e)))
}

/// Forward the child's output to `observer` and clear `running` on exit.
///
/// Returns the exit code, `None` when the process was killed by a signal.
pub fn supervise(
    mut child: std::process::Child,
    observer: Arc<dyn InstallObserver>,
    running: Arc<AtomicBool>,
    natives_dir: Option<PathBuf>,
) -> tokio::task::JoinHandle<Option<i32>> {
    let pid = child.id();
    let mut readers = Vec::new();

    if let Some(stdout) = child.stdout.take() {
        let observer = Arc::clone(&observer);
        readers.push(tokio::task::spawn_blocking(move || {
            forward_lines(stdout, observer.as_ref(), pid, false)
        }));
    }

    if let Some(stderr) = child.stderr.take() {
        let observer = Arc::clone(&observer);
        readers.push(tokio::task::spawn_blocking(move || {
            forward_lines(stderr, observer.as_ref(), pid, true)
        }));
    }

    tokio::spawn(async move {
        let wait_result = tokio::task::spawn_blocking(move || child.wait())
            .await
            .map_err(|e| std::io::Error::other(e.to_string()))
            .and_then(|result| result);

        for reader in readers {
            let _ = reader.await;
        }

        let code = match wait_result {
            Ok(status) => {
                info!("Game process {} exited with {:?}", pid, status);
                status.code()
            }
            Err(e) => {
                error!("Lost track of game process {}: {}", pid, e);
                None
            }
        };

        if let Some(dir) = natives_dir {
            cleanup_natives(&dir).await;
        }
        running.store(false, Ordering::SeqCst);
        observer.on_log(&match code {
            Some(code) => format!("Game closed with code {code}"),
            None => "Game closed without an exit code".to_string(),
        });
        code
    })
}

fn configure_native_library_env(cmd: &mut std::process::Command, natives_dir: &Path) {
    let native_path = safe_path_str(natives_dir);

    let var = if cfg!(target_os = "windows") {
        "PATH"
    } else if cfg!(target_os = "macos") {
        "DYLD_LIBRARY_PATH"
    } else {
        "LD_LIBRARY_PATH"
    };
    cmd.env(var, append_env_path(var, &native_path));
}

fn append_env_path(var_name: &str, value: &str) -> String {
    let separator = if cfg!(target_os = "windows") { ";" } else { ":" };
    match std::env::var(var_name) {
        Ok(existing) if !existing.trim().is_empty() => format!("{value}{separator}{existing}"),
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::progress::testing::RecordingObserver;

    fn plan() -> LaunchPlan {
        LaunchPlan {
            java: PathBuf::from("java"),
            ram_gb: 4,
            natives_dir: PathBuf::from("/nonexistent/natives/1.20.1"),
            classpath: "a.jar:b.jar".into(),
            main_class: "net.fabricmc.loader.impl.launch.knot.KnotClient".into(),
            extra_jvm_args: vec!["-XX:+UseG1GC".into(), "-Dcustom=1".into()],
            game_args: vec!["--username".into(), "Player".into()],
            working_dir: PathBuf::from("/nonexistent/instances/1.20.1"),
        }
    }

    #[test]
    fn jvm_args_put_memory_first_and_main_class_last() {
        let args = plan().jvm_args();

        assert!(args.contains(&"-Xmx4G".to_string()));
        assert!(args.contains(&"-Xms4G".to_string()));
        assert!(args.contains(&"-Djava.library.path=/nonexistent/natives/1.20.1".to_string()));
        assert!(args.contains(&"-Dminecraft.launcher.brand=launchkit".to_string()));

        let cp = args.iter().position(|a| a == "-cp").unwrap();
        let custom = args.iter().position(|a| a == "-Dcustom=1").unwrap();
        assert!(custom < cp);
        assert_eq!(args[cp + 1], "a.jar:b.jar");
        assert_eq!(
            args.last().map(String::as_str),
            Some("net.fabricmc.loader.impl.launch.knot.KnotClient")
        );
    }

    #[test]
    fn offline_game_args_carry_version_label_and_index() {
        let args = OfflineProfile {
            username: "Steve",
            version_label: "fabric-loader-0.16.10-1.20.1",
            game_dir: Path::new("/nonexistent/instances/1.20.1"),
            assets_dir: Path::new("/nonexistent/assets"),
            asset_index: "5",
        }
        .game_args();

        let value_of = |flag: &str| {
            let idx = args.iter().position(|a| a == flag).unwrap();
            args[idx + 1].clone()
        };
        assert_eq!(value_of("--username"), "Steve");
        assert_eq!(value_of("--version"), "fabric-loader-0.16.10-1.20.1");
        assert_eq!(value_of("--assetIndex"), "5");
        assert_eq!(value_of("--userType"), "legacy");
    }

    #[test]
    fn empty_classpath_is_refused() {
        let mut plan = plan();
        plan.classpath = "  ".into();
        assert!(matches!(
            spawn_game(&plan),
            Err(LauncherError::JavaExecution(_))
        ));
    }

    #[test]
    fn missing_java_is_a_launch_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut plan = plan();
        plan.java = dir.path().join("no-such-java");
        plan.working_dir = dir.path().join("instance");

        assert!(matches!(
            spawn_game(&plan),
            Err(LauncherError::JavaExecution(_))
        ));
        assert!(plan.working_dir.is_dir());
    }

    #[test]
    fn known_failures_get_a_hint() {
        assert!(diagnostic_for("java.util.zip.ZipException: zip END header not found").is_some());
        assert!(diagnostic_for("[Render thread/INFO]: Loading").is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn supervisor_streams_output_and_clears_running_flag() {
        let child = std::process::Command::new("sh")
            .arg("-c")
            .arg("echo from-stdout; echo from-stderr 1>&2; exit 3")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();
        let observer = Arc::new(RecordingObserver::default());
        let running = Arc::new(AtomicBool::new(true));

        let code = supervise(child, observer.clone(), running.clone(), None)
            .await
            .unwrap();

        assert_eq!(code, Some(3));
        assert!(!running.load(Ordering::SeqCst));
        let logs = observer.logs.lock().unwrap();
        assert!(logs.iter().any(|l| l == "from-stdout"));
        assert!(logs.iter().any(|l| l == "from-stderr"));
        assert_eq!(logs.last().map(String::as_str), Some("Game closed with code 3"));
    }
}
