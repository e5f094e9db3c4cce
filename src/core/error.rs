use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the launcher core.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    #[error("Transfer stalled for {url}: no data for {secs}s")]
    InactivityTimeout { url: String, secs: u64 },

    #[error("Giving up on {url} after {attempts} attempt(s): {source}")]
    FetchExhausted {
        url: String,
        attempts: u32,
        status: Option<u16>,
        #[source]
        source: Box<LauncherError>,
    },

    // ── Integrity ───────────────────────────────────────
    #[error("Archive at {path:?} is missing, truncated or corrupt")]
    CorruptArchive { path: PathBuf },

    #[error("SHA-1 mismatch for {path:?}: expected {expected}, got {actual}")]
    Sha1Mismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    // ── Manifests ───────────────────────────────────────
    #[error("Manifest resolution failed: {0}")]
    ManifestFetch(String),

    #[error("Version {0} not found in the version catalog")]
    VersionNotFound(String),

    #[error("Invalid version id: {0:?}")]
    InvalidVersionId(String),

    // ── Maven ───────────────────────────────────────────
    #[error("Invalid Maven coordinate: {0}")]
    InvalidMavenCoordinate(String),

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Archive ─────────────────────────────────────────
    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ── Mods ────────────────────────────────────────────
    #[error("Mod file not found: {0}")]
    ModNotFound(String),

    // ── Launch ──────────────────────────────────────────
    #[error("A game process is already running")]
    GameAlreadyRunning,

    #[error("Java execution failed: {0}")]
    JavaExecution(String),

    #[error("Background task failed: {0}")]
    TaskJoin(String),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

impl LauncherError {
    /// HTTP status carried by this error or by the last cause it wraps.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            LauncherError::DownloadFailed { status, .. } => Some(*status),
            LauncherError::Http(err) => err.status().map(|s| s.as_u16()),
            LauncherError::FetchExhausted { status, .. } => *status,
            _ => None,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LauncherError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

// Outcome payloads carry the error as its display string.
impl serde::Serialize for LauncherError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
