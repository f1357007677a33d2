// ─── Bootstrap ───
// Provision the server jar, then hand the process over to the configured
// entry class inside an isolated domain.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::core::bundle::LauncherBundle;
use crate::core::config::{LauncherConfig, ManifestReader};
use crate::core::domain::{set_context_scope, CodeScope, Component, IsolatedDomainBuilder};
use crate::core::downloader::{ensure_artifact, ArtifactDownloader};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::jimfs::{handler, provider};
use crate::core::runtime::HostRuntime;

/// Property the loader reads to find the game jar.
pub const GAME_JAR_PATH_PROPERTY: &str = "fabric.gameJarPath";

/// A verified server jar and the configuration that produced it.
#[derive(Debug, Clone)]
pub struct ProvisionedArtifact {
    pub config: LauncherConfig,
    /// Absolute path of the verified jar.
    pub path: PathBuf,
}

pub struct Bootstrap {
    runtime: Arc<HostRuntime>,
    bundle: Arc<LauncherBundle>,
    work_dir: PathBuf,
}

impl Bootstrap {
    pub fn new(
        runtime: Arc<HostRuntime>,
        bundle: Arc<LauncherBundle>,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runtime,
            bundle,
            work_dir: work_dir.into(),
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Resolve the configuration and make sure the server jar is present
    /// and intact. Publishes the jar path on success.
    pub async fn provision(&self) -> LauncherResult<ProvisionedArtifact> {
        let config = ManifestReader::new(&self.bundle, &self.work_dir).read().await?;
        debug!("Resolved launcher config: {:?}", config);

        let target = config.artifact_path(&self.work_dir);
        let downloader = ArtifactDownloader::new()?;
        ensure_artifact(
            &downloader,
            &config.server_jar_url,
            &target,
            &config.server_jar_hash,
        )
        .await?;

        let path = std::path::absolute(&target).map_err(|source| LauncherError::Io {
            path: target.clone(),
            source,
        })?;
        self.runtime
            .set_property(GAME_JAR_PATH_PROPERTY, path.to_string_lossy());
        info!("{}={}", GAME_JAR_PATH_PROPERTY, path.display());

        Ok(ProvisionedArtifact { config, path })
    }

    /// Build the game domain, wire the jimfs shims to it, and run the entry
    /// class on the calling thread. Returns when the entry point returns.
    pub fn handoff(&self, artifact: &ProvisionedArtifact, args: Vec<String>) -> LauncherResult<()> {
        let domain = IsolatedDomainBuilder::for_artifact(
            Arc::clone(self.runtime.platform()),
            &self.bundle,
            &artifact.path,
        )?;

        handler::register(&self.runtime, domain.as_ref()).map_err(|e| self.explain_wiring(e))?;
        provider::initialize(domain.as_ref()).map_err(|e| self.explain_wiring(e))?;

        let scope: Arc<dyn CodeScope> = domain.clone();
        set_context_scope(Some(scope));

        let main_class = &artifact.config.main_class;
        let entry = match domain.load(main_class)? {
            Component::Entry(entry) => entry,
            other => {
                return Err(LauncherError::NotAnEntryPoint {
                    class: main_class.clone(),
                    kind: other.kind(),
                })
            }
        };

        info!("Handing off to {} with {} argument(s)", main_class, args.len());
        entry(&self.runtime, args).map_err(LauncherError::EntryFailed)
    }

    /// A bundle with nothing linked can never satisfy a shim, whatever the
    /// server jar contains.
    fn explain_wiring(&self, err: LauncherError) -> LauncherError {
        match err {
            LauncherError::ShimWiring { class, .. } if self.bundle.linked().is_empty() => {
                LauncherError::BundleNotLinked {
                    location: self.bundle.location().to_path_buf(),
                    class,
                }
            }
            other => other,
        }
    }
}
