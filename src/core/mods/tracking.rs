use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Contents of a `.mods.json` tracker: which catalog ids are installed and
/// which file each one landed in.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct ModTracking {
    pub installed_ids: Vec<String>,
    pub mod_map: BTreeMap<String, String>,
}

impl ModTracking {
    pub fn track(&mut self, project_id: &str, filename: Option<&str>) {
        if !self.installed_ids.iter().any(|id| id == project_id) {
            self.installed_ids.push(project_id.to_string());
        }
        if let Some(filename) = filename {
            self.mod_map
                .insert(filename.to_string(), project_id.to_string());
        }
    }

    /// Forget the mod stored in `filename`. Returns the id it was mapped to.
    pub fn untrack(&mut self, filename: &str) -> Option<String> {
        let id = self.mod_map.remove(filename)?;
        self.installed_ids.retain(|existing| existing != &id);
        Some(id)
    }

    fn file_for(&self, project_id: &str) -> Option<&str> {
        self.mod_map
            .iter()
            .find(|(_, id)| id.as_str() == project_id)
            .map(|(file, _)| file.as_str())
    }

    /// Installed ids, minus those whose mapped file no longer exists in `dir`.
    /// Ids without a mapping are trusted.
    pub fn live_ids(&self, dir: &Path) -> Vec<String> {
        self.installed_ids
            .iter()
            .filter(|id| match self.file_for(id) {
                Some(file) => dir.join(file).is_file(),
                None => true,
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_is_idempotent() {
        let mut tracking = ModTracking::default();
        tracking.track("AANobbMI", Some("sodium.jar"));
        tracking.track("AANobbMI", Some("sodium.jar"));

        assert_eq!(tracking.installed_ids, vec!["AANobbMI".to_string()]);
        assert_eq!(tracking.mod_map.len(), 1);
    }

    #[test]
    fn untrack_drops_id_and_mapping() {
        let mut tracking = ModTracking::default();
        tracking.track("a", Some("a.jar"));
        tracking.track("b", Some("b.jar"));

        assert_eq!(tracking.untrack("a.jar").as_deref(), Some("a"));
        assert_eq!(tracking.untrack("missing.jar"), None);
        assert_eq!(tracking.installed_ids, vec!["b".to_string()]);
        assert!(!tracking.mod_map.contains_key("a.jar"));
    }

    #[test]
    fn live_ids_skip_entries_whose_file_is_gone() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("present.jar"), b"x").unwrap();

        let mut tracking = ModTracking::default();
        tracking.track("present", Some("present.jar"));
        tracking.track("gone", Some("gone.jar"));
        tracking.track("unmapped", None);

        assert_eq!(
            tracking.live_ids(dir.path()),
            vec!["present".to_string(), "unmapped".to_string()]
        );
    }

    #[test]
    fn parses_tracker_written_with_camel_case_keys() {
        let tracking: ModTracking = serde_json::from_str(
            r#"{"installedIds": ["x"], "modMap": {"x.jar": "x"}}"#,
        )
        .unwrap();
        assert_eq!(tracking.mod_map.get("x.jar").map(String::as_str), Some("x"));
    }
}
