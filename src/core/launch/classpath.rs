// ─── Classpath Composer ───
// Orders the jars handed to the JVM: loader libraries, then the base game's
// libraries minus the ones the loader ships itself, then the client archive.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::layout::DataLayout;
use crate::core::loaders::FabricProfile;
use crate::core::version::{Platform, VersionJson};

/// Base libraries the loader provides in its own (newer) version.
pub const LOADER_PROVIDED: [&str; 6] = [
    "org.ow2.asm:asm",
    "org.ow2.asm:asm-analysis",
    "org.ow2.asm:asm-commons",
    "org.ow2.asm:asm-tree",
    "org.ow2.asm:asm-util",
    "net.fabricmc:sponge-mixin",
];

/// Ordered classpath entries for the host platform.
pub fn build_classpath(
    layout: &DataLayout,
    profile: &FabricProfile,
    descriptor: &VersionJson,
    base_version: &str,
) -> Vec<PathBuf> {
    build_classpath_for(layout, profile, descriptor, base_version, Platform::current())
}

pub(crate) fn build_classpath_for(
    layout: &DataLayout,
    profile: &FabricProfile,
    descriptor: &VersionJson,
    base_version: &str,
    platform: Platform,
) -> Vec<PathBuf> {
    let libs_dir = layout.libraries_dir();
    let mut entries = Vec::new();

    for lib in &profile.libraries {
        let Ok(artifact) = lib.artifact() else {
            continue;
        };
        let path = libs_dir.join(artifact.local_path());
        if path.is_file() {
            entries.push(path);
        }
    }

    for lib in descriptor.libraries.iter().filter(|l| l.allowed_on(platform)) {
        if let Some(key) = lib.group_artifact() {
            if LOADER_PROVIDED.contains(&key.as_str()) {
                debug!("Skipping loader-provided duplicate: {}", lib.name);
                continue;
            }
        }
        let Some(artifact) = lib.artifact() else {
            continue;
        };
        let path = libs_dir.join(&artifact.path);
        if path.is_file() {
            entries.push(path);
        }
    }

    entries.push(layout.client_jar(base_version));
    entries
}

/// Join entries with the platform separator.
pub fn join_classpath(entries: &[PathBuf]) -> String {
    entries
        .iter()
        .map(|p| safe_path_str(p))
        .collect::<Vec<_>>()
        .join(get_classpath_separator())
}

pub fn get_classpath_separator() -> &'static str {
    Platform::current().classpath_separator()
}

/// Absolute path text suitable for JVM arguments.
pub fn safe_path_str(path: &Path) -> String {
    let resolved = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let text = resolved.to_string_lossy().to_string();

    #[cfg(target_os = "windows")]
    {
        // The JVM mis-handles extended-length `\\?\` paths on the classpath.
        if let Some(stripped) = text.strip_prefix(r"\\?\") {
            return stripped.to_string();
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::core::loaders::FabricLibrary;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"jar").unwrap();
    }

    #[test]
    fn orders_loader_then_base_then_client() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());
        let libs = layout.libraries_dir();

        let profile = FabricProfile {
            id: None,
            main_class: "Knot".into(),
            libraries: ["net.fabricmc:l1:1.0", "net.fabricmc:l2:1.0", "net.fabricmc:absent:1.0"]
                .iter()
                .map(|name| FabricLibrary {
                    name: name.to_string(),
                    url: None,
                })
                .collect(),
            arguments: None,
        };
        touch(&libs.join("net/fabricmc/l1/1.0/l1-1.0.jar"));
        touch(&libs.join("net/fabricmc/l2/1.0/l2-1.0.jar"));

        let descriptor: VersionJson = serde_json::from_value(json!({
            "libraries": [
                {"name": "org.ow2.asm:asm:9.3", "downloads": {"artifact": {"path": "b1.jar", "url": "u"}}},
                {"name": "com.example:b2:1", "downloads": {"artifact": {"path": "b2.jar", "url": "u"}}},
                {"name": "com.example:b3:1", "downloads": {"artifact": {"path": "b3.jar", "url": "u"}}},
                {"name": "com.example:b4:1", "downloads": {"artifact": {"path": "b4.jar", "url": "u"}}},
                {"name": "com.example:mac:1", "rules": [{"action": "allow", "os": {"name": "osx"}}],
                 "downloads": {"artifact": {"path": "mac.jar", "url": "u"}}}
            ]
        }))
        .unwrap();
        for name in ["b1.jar", "b2.jar", "b3.jar", "mac.jar"] {
            touch(&libs.join(name));
        }

        let entries = build_classpath_for(&layout, &profile, &descriptor, "1.20.1", Platform::Linux);

        assert_eq!(
            entries,
            vec![
                libs.join("net/fabricmc/l1/1.0/l1-1.0.jar"),
                libs.join("net/fabricmc/l2/1.0/l2-1.0.jar"),
                libs.join("b2.jar"),
                libs.join("b3.jar"),
                layout.client_jar("1.20.1"),
            ]
        );
    }

    #[test]
    fn joined_with_platform_separator() {
        let joined = join_classpath(&[PathBuf::from("/nope/a.jar"), PathBuf::from("/nope/b.jar")]);
        let sep = get_classpath_separator();
        assert_eq!(joined.matches(sep).count(), 1);
        assert!(joined.ends_with("b.jar"));
    }
}
