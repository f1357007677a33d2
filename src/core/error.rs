use std::path::PathBuf;
use thiserror::Error;

/// Boxed error returned by code running behind the handoff.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Central error type for the launcher.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Bundle / configuration ──────────────────────────
    #[error("Launcher bundle is missing its embedded resource {resource}")]
    BundleCorrupt { resource: String },

    #[error("Failed to read configuration file {path:?}: {source}")]
    ConfigUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid value of {key}: {value:?} ({reason})")]
    ConfigInvalid {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Failed to save configuration file {path:?}: {source}")]
    ConfigWriteFailure {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed hex value {value:?}: {reason}")]
    MalformedHex { value: String, reason: String },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    // ── Integrity ───────────────────────────────────────
    #[error("Server jar not found at {path:?}")]
    ArtifactNotFound { path: PathBuf },

    #[error("SHA-1 mismatch for {path:?}: expected {expected}, found {found}")]
    DigestMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    #[error("Failed to download or validate the server jar after {attempts} attempts")]
    DownloadExhausted {
        url: String,
        path: PathBuf,
        expected: String,
        attempts: u32,
    },

    // ── Archive ─────────────────────────────────────────
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ── Isolated domain ─────────────────────────────────
    #[error("Class {name} not found in {scope}")]
    ClassNotFound { name: String, scope: String },

    #[error("Failed to wire shim to {class}: {reason}")]
    ShimWiring { class: String, reason: String },

    #[error("Cannot wire shim to {class}: launcher bundle {location:?} links no server jar implementations")]
    BundleNotLinked { location: PathBuf, class: String },

    // ── Handoff ─────────────────────────────────────────
    #[error("{class} resolved to a {kind}, not an entry point")]
    NotAnEntryPoint { class: String, kind: &'static str },

    /// Error raised by the entry point itself, passed through untouched.
    #[error(transparent)]
    EntryFailed(BoxError),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

impl LauncherError {
    /// Whether the download/verify loop may try again after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LauncherError::Io { .. }
                | LauncherError::Http(_)
                | LauncherError::DownloadFailed { .. }
                | LauncherError::ArtifactNotFound { .. }
                | LauncherError::DigestMismatch { .. }
        )
    }

    /// Remediation text printed after a fatal error, if there is any.
    pub fn hint(&self) -> Option<String> {
        match self {
            LauncherError::BundleCorrupt { .. } => {
                Some("The launcher jar is corrupt, please redownload it!".into())
            }
            LauncherError::ConfigUnreadable { path, .. }
            | LauncherError::ConfigWriteFailure { path, .. } => Some(format!(
                "Check the permissions and contents of {}",
                path.display()
            )),
            LauncherError::ConfigInvalid { key, .. } => Some(format!(
                "Fix {key} in bundle-server-launcher.properties, or delete the file to use the defaults"
            )),
            LauncherError::MalformedHex { value, .. } => Some(format!(
                "{value:?} must be an even number of hexadecimal digits"
            )),
            LauncherError::DownloadExhausted {
                url,
                path,
                expected,
                ..
            } => Some(format!(
                "If you are lacking a direct internet connection, you can download it from:\n    {url}\nand place it at {}\nIt should have the following SHA-1 hash: {expected}",
                path.display()
            )),
            LauncherError::BundleNotLinked { .. } => Some(
                "This launcher binary carries no linked server jar implementations. \
                 Embed it and pass a bundle built with LauncherBundle::with_linked to run(bundle, args)"
                    .into(),
            ),
            LauncherError::ShimWiring { .. }
            | LauncherError::ClassNotFound { .. }
            | LauncherError::NotAnEntryPoint { .. } => Some(
                "The launcher and the server jar do not match; update the launcher".into(),
            ),
            _ => None,
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
