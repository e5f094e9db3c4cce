// ─── Platform Rules ───
// Decides whether a declared library applies to the host platform.

use serde::{Deserialize, Serialize};

/// The three platform families descriptors distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Osx,
    Linux,
}

impl Platform {
    /// Platform of the running process.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::Osx
        } else {
            Platform::Linux
        }
    }

    /// Descriptor spelling (`windows`, `osx`, `linux`).
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::Osx => "osx",
            Platform::Linux => "linux",
        }
    }

    /// Default classifier of native bundles, e.g. `natives-linux`.
    pub fn native_classifier(self) -> String {
        format!("natives-{}", self.as_str())
    }

    pub fn classpath_separator(self) -> &'static str {
        match self {
            Platform::Windows => ";",
            Platform::Osx | Platform::Linux => ":",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryRule {
    pub action: RuleAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<OsRule>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OsRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl LibraryRule {
    pub fn allow(os: Option<Platform>) -> Self {
        Self {
            action: RuleAction::Allow,
            os: os.map(OsRule::named),
        }
    }

    pub fn disallow(os: Option<Platform>) -> Self {
        Self {
            action: RuleAction::Disallow,
            os: os.map(OsRule::named),
        }
    }

    fn constrained_platform(&self) -> Option<&str> {
        self.os.as_ref().and_then(|os| os.name.as_deref())
    }
}

impl OsRule {
    pub fn named(platform: Platform) -> Self {
        Self {
            name: Some(platform.as_str().to_string()),
            ..Self::default()
        }
    }
}

/// Evaluate a rule list for `platform`.
///
/// - No rules: allowed.
/// - Rules run top to bottom starting from "disallowed".
/// - `allow` without a platform name, or naming `platform`, allows.
/// - `disallow` naming `platform` disallows.
pub fn rules_allow(rules: Option<&[LibraryRule]>, platform: Platform) -> bool {
    let Some(rules) = rules else {
        return true;
    };

    let mut allowed = false;
    for rule in rules {
        let target = rule.constrained_platform();
        match rule.action {
            RuleAction::Allow => {
                if target.map_or(true, |name| name == platform.as_str()) {
                    allowed = true;
                }
            }
            RuleAction::Disallow => {
                if target == Some(platform.as_str()) {
                    allowed = false;
                }
            }
        }
    }

    allowed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_rules_means_allowed() {
        for platform in [Platform::Windows, Platform::Osx, Platform::Linux] {
            assert!(rules_allow(None, platform));
        }
    }

    #[test]
    fn empty_rule_list_means_excluded() {
        assert!(!rules_allow(Some(&[]), Platform::Linux));
    }

    #[test]
    fn allow_one_disallow_another() {
        let rules = [
            LibraryRule::allow(Some(Platform::Osx)),
            LibraryRule::disallow(Some(Platform::Windows)),
        ];
        assert!(rules_allow(Some(&rules), Platform::Osx));
        assert!(!rules_allow(Some(&rules), Platform::Windows));
        assert!(!rules_allow(Some(&rules), Platform::Linux));
    }

    #[test]
    fn allow_all_except_one() {
        let rules = [
            LibraryRule::allow(None),
            LibraryRule::disallow(Some(Platform::Osx)),
        ];
        assert!(rules_allow(Some(&rules), Platform::Linux));
        assert!(rules_allow(Some(&rules), Platform::Windows));
        assert!(!rules_allow(Some(&rules), Platform::Osx));
    }

    #[test]
    fn unconstrained_disallow_is_ignored() {
        let rules = [LibraryRule::allow(None), LibraryRule::disallow(None)];
        assert!(rules_allow(Some(&rules), Platform::Linux));
    }

    #[test]
    fn rules_parse_from_descriptor_json() {
        let rules: Vec<LibraryRule> = serde_json::from_value(serde_json::json!([
            {"action": "allow"},
            {"action": "disallow", "os": {"name": "osx"}}
        ]))
        .unwrap();
        assert!(rules_allow(Some(&rules), Platform::Windows));
        assert!(!rules_allow(Some(&rules), Platform::Osx));
    }

    #[test]
    fn separator_follows_platform_family() {
        assert_eq!(Platform::Windows.classpath_separator(), ";");
        assert_eq!(Platform::Linux.classpath_separator(), ":");
        assert_eq!(Platform::Osx.classpath_separator(), ":");
    }
}
