use std::path::PathBuf;

/// One file to materialize, with candidate sources tried in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub sources: Vec<String>,
    pub dest: PathBuf,
    /// Expected SHA-1 of a freshly downloaded payload, when the manifest declares one.
    pub sha1: Option<String>,
}

impl DownloadTask {
    pub fn new(url: impl Into<String>, dest: impl Into<PathBuf>) -> Self {
        Self {
            sources: vec![url.into()],
            dest: dest.into(),
            sha1: None,
        }
    }

    pub fn with_fallback(mut self, url: impl Into<String>) -> Self {
        self.sources.push(url.into());
        self
    }

    pub fn with_sha1(mut self, sha1: Option<String>) -> Self {
        self.sha1 = sha1.filter(|s| !s.is_empty());
        self
    }

    pub fn primary_url(&self) -> &str {
        self.sources.first().map(String::as_str).unwrap_or_default()
    }
}
