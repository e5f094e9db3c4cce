use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::core::error::{LauncherError, LauncherResult};

/// Maven coordinate `group:artifact:version[:classifier][@packaging]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MavenArtifact {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub classifier: Option<String>,
    /// File extension. Defaults to `"jar"`.
    pub packaging: String,
}

impl MavenArtifact {
    /// ```
    /// use launchkit_lib::core::maven::MavenArtifact;
    ///
    /// let a = MavenArtifact::parse("net.fabricmc:fabric-loader:0.16.10").unwrap();
    /// assert_eq!(a.group_id, "net.fabricmc");
    /// assert_eq!(a.filename(), "fabric-loader-0.16.10.jar");
    /// ```
    pub fn parse(coord: &str) -> LauncherResult<Self> {
        let invalid = || LauncherError::InvalidMavenCoordinate(coord.to_string());
        let (body, packaging) = coord.split_once('@').unwrap_or((coord, "jar"));

        let mut fields = body.split(':');
        let (Some(group_id), Some(artifact_id), Some(version)) =
            (fields.next(), fields.next(), fields.next())
        else {
            return Err(invalid());
        };
        let classifier = fields.next();
        if fields.next().is_some() {
            return Err(invalid());
        }

        let required = [group_id, artifact_id, version, packaging];
        if required.iter().chain(classifier.iter()).any(|f| f.is_empty()) {
            return Err(invalid());
        }

        Ok(Self {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            version: version.to_string(),
            classifier: classifier.map(str::to_string),
            packaging: packaging.to_string(),
        })
    }

    /// Group id as a directory path: `net.fabricmc` becomes `net/fabricmc`.
    pub fn group_path(&self) -> String {
        self.group_id.replace('.', "/")
    }

    /// `group:artifact`, the identity used for de-duplication.
    pub fn group_artifact(&self) -> String {
        format!("{}:{}", self.group_id, self.artifact_id)
    }

    pub fn filename(&self) -> String {
        let mut stem = format!("{}-{}", self.artifact_id, self.version);
        if let Some(classifier) = &self.classifier {
            stem.push('-');
            stem.push_str(classifier);
        }
        format!("{stem}.{}", self.packaging)
    }

    /// Repository-relative path with `/` separators.
    fn repo_path(&self) -> String {
        [
            self.group_path().as_str(),
            self.artifact_id.as_str(),
            self.version.as_str(),
            self.filename().as_str(),
        ]
        .join("/")
    }

    /// Download URL below `repo_base`; a trailing slash on the base is ignored.
    pub fn url(&self, repo_base: &str) -> String {
        format!("{}/{}", repo_base.trim_end_matches('/'), self.repo_path())
    }

    /// Path relative to the libraries directory.
    pub fn local_path(&self) -> PathBuf {
        self.repo_path().split('/').collect()
    }
}

impl fmt::Display for MavenArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.group_artifact())?;
        write!(f, ":{}", self.version)?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{classifier}")?;
        }
        match self.packaging.as_str() {
            "jar" => Ok(()),
            other => write!(f, "@{other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_coordinate() {
        let a = MavenArtifact::parse("net.fabricmc:intermediary:1.20.1").unwrap();
        assert_eq!(a.group_id, "net.fabricmc");
        assert_eq!(a.artifact_id, "intermediary");
        assert_eq!(a.version, "1.20.1");
        assert_eq!(a.classifier, None);
        assert_eq!(a.packaging, "jar");
        assert_eq!(a.group_artifact(), "net.fabricmc:intermediary");
    }

    #[test]
    fn parse_with_classifier_and_packaging() {
        let a = MavenArtifact::parse("org.lwjgl:lwjgl:3.3.3:natives-windows").unwrap();
        assert_eq!(a.classifier.as_deref(), Some("natives-windows"));

        let b = MavenArtifact::parse("com.example:lib:1.0@zip").unwrap();
        assert_eq!(b.packaging, "zip");
        assert_eq!(b.to_string(), "com.example:lib:1.0@zip");
    }

    #[test]
    fn rejects_malformed_coordinates() {
        assert!(MavenArtifact::parse("net.fabricmc:fabric-loader").is_err());
        assert!(MavenArtifact::parse("a::1.0").is_err());
        assert!(MavenArtifact::parse("a:b:c:d:e").is_err());
    }

    #[test]
    fn url_tolerates_trailing_slash() {
        let a = MavenArtifact::parse("org.ow2.asm:asm:9.6").unwrap();
        let expected = "https://maven.fabricmc.net/org/ow2/asm/asm/9.6/asm-9.6.jar";
        assert_eq!(a.url("https://maven.fabricmc.net/"), expected);
        assert_eq!(a.url("https://maven.fabricmc.net"), expected);
    }

    #[test]
    fn local_path_follows_repository_layout() {
        let a = MavenArtifact::parse("net.fabricmc:sponge-mixin:0.13.3+mixin.0.8.5").unwrap();
        assert_eq!(
            a.local_path(),
            PathBuf::from(
                "net/fabricmc/sponge-mixin/0.13.3+mixin.0.8.5/sponge-mixin-0.13.3+mixin.0.8.5.jar"
            )
        );
    }
}
