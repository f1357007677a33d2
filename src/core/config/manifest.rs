// ─── Launcher Manifest ───
// Resolves the launcher configuration from the manifest embedded in the
// bundle plus the override files in the working directory.

use std::path::{Path, PathBuf};

use reqwest::Url;
use tracing::{debug, info};

use super::migrate::LegacyMigrator;
use super::properties::Properties;
use crate::core::bundle::{LauncherBundle, MANIFEST_RESOURCE};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::hex::Sha1Digest;

/// Override file that takes priority over everything else.
pub const PRIMARY_OVERRIDE: &str = "bundle-server-launcher.properties";
/// Override file left behind by fabric-server-launcher installs.
pub const LEGACY_OVERRIDE: &str = "fabric-server-launcher.properties";
pub const DEFAULT_SERVER_JAR: &str = ".fabric/bundle-cache/server.jar";

pub mod keys {
    pub const MAIN_CLASS: &str = "launch.mainClass";
    pub const SERVER_JAR_URL: &str = "serverJarUrl";
    pub const SERVER_JAR_HASH: &str = "serverJarHash";
    pub const SERVER_JAR: &str = "serverJar";
}

/// Validated launcher configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherConfig {
    /// Entry class resolved inside the isolated domain.
    pub main_class: String,
    pub server_jar_url: Url,
    pub server_jar_hash: Sha1Digest,
    /// Artifact location as configured; may be relative to the working dir.
    pub server_jar: PathBuf,
}

impl LauncherConfig {
    pub fn from_properties(props: &Properties) -> LauncherResult<Self> {
        let main_class = required(props, keys::MAIN_CLASS)?.to_string();

        let raw_url = required(props, keys::SERVER_JAR_URL)?;
        let server_jar_url = Url::parse(raw_url).map_err(|e| LauncherError::ConfigInvalid {
            key: keys::SERVER_JAR_URL.into(),
            value: raw_url.to_string(),
            reason: e.to_string(),
        })?;

        let raw_hash = required(props, keys::SERVER_JAR_HASH)?;
        let server_jar_hash = Sha1Digest::from_hex(raw_hash)?;

        let server_jar = PathBuf::from(props.get_or(keys::SERVER_JAR, DEFAULT_SERVER_JAR));

        Ok(Self {
            main_class,
            server_jar_url,
            server_jar_hash,
            server_jar,
        })
    }

    /// The artifact path anchored at `work_dir` when it is relative.
    pub fn artifact_path(&self, work_dir: &Path) -> PathBuf {
        if self.server_jar.is_absolute() {
            self.server_jar.clone()
        } else {
            work_dir.join(&self.server_jar)
        }
    }
}

fn required<'a>(props: &'a Properties, key: &str) -> LauncherResult<&'a str> {
    match props.get(key) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        Some(value) => Err(LauncherError::ConfigInvalid {
            key: key.into(),
            value: value.to_string(),
            reason: "value is empty".into(),
        }),
        None => Err(LauncherError::ConfigInvalid {
            key: key.into(),
            value: String::new(),
            reason: "missing required property".into(),
        }),
    }
}

/// Reads and layers the manifest sources.
///
/// Precedence, last wins: embedded manifest, then the legacy override (only
/// when the primary override is absent), then the primary override.
pub struct ManifestReader<'a> {
    bundle: &'a LauncherBundle,
    work_dir: PathBuf,
}

impl<'a> ManifestReader<'a> {
    pub fn new(bundle: &'a LauncherBundle, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            bundle,
            work_dir: work_dir.into(),
        }
    }

    pub fn primary_path(&self) -> PathBuf {
        self.work_dir.join(PRIMARY_OVERRIDE)
    }

    pub fn legacy_path(&self) -> PathBuf {
        self.work_dir.join(LEGACY_OVERRIDE)
    }

    /// The manifest shipped inside the launcher bundle.
    pub fn embedded(&self) -> LauncherResult<Properties> {
        let corrupt = || LauncherError::BundleCorrupt {
            resource: MANIFEST_RESOURCE.into(),
        };
        let bytes = self.bundle.resource(MANIFEST_RESOURCE).ok_or_else(corrupt)?;
        let text = std::str::from_utf8(bytes).map_err(|_| corrupt())?;
        Ok(Properties::parse(text))
    }

    /// Merge every source into one property map, migrating the legacy
    /// override when it is the only one present.
    pub async fn merged(&self) -> LauncherResult<Properties> {
        let mut props = self.embedded()?;

        let primary = self.primary_path();
        if file_exists(&primary).await? {
            if let Some(text) = read_override(&primary).await? {
                debug!("Applying overrides from {:?}", primary);
                props.load(&text);
            }
        } else {
            let migrator = LegacyMigrator::new(&self.work_dir);
            if file_exists(migrator.legacy_path()).await? {
                info!("Reading legacy overrides from {:?}", migrator.legacy_path());
                migrator.migrate(&mut props).await?;
            }
        }

        Ok(props)
    }

    pub async fn read(&self) -> LauncherResult<LauncherConfig> {
        let props = self.merged().await?;
        LauncherConfig::from_properties(&props)
    }
}

pub(crate) async fn file_exists(path: &Path) -> LauncherResult<bool> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|source| LauncherError::ConfigUnreadable {
            path: path.to_path_buf(),
            source,
        })
}

/// Read an override file. A file that disappeared since the existence check
/// counts as absent.
pub(crate) async fn read_override(path: &Path) -> LauncherResult<Option<String>> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(Some(text)),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(LauncherError::ConfigUnreadable {
            path: path.to_path_buf(),
            source,
        }),
    }
}
