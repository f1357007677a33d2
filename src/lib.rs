pub mod core;

use std::sync::Arc;

use crate::core::bundle::LauncherBundle;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::launch::Bootstrap;
use crate::core::runtime::HostRuntime;

/// Provision the server jar for `bundle` in the current directory, then run
/// the configured entry point with `args`.
///
/// Provisioning runs on a short-lived single-threaded tokio runtime that is
/// shut down before the handoff.
pub fn run(bundle: LauncherBundle, args: Vec<String>) -> LauncherResult<()> {
    let runtime = HostRuntime::install_global(Arc::new(HostRuntime::for_bundle(&bundle)));
    let work_dir = std::env::current_dir().map_err(|source| LauncherError::Io {
        path: ".".into(),
        source,
    })?;
    let bootstrap = Bootstrap::new(runtime, Arc::new(bundle), work_dir);

    let artifact = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(bootstrap.provision())?;

    bootstrap.handoff(&artifact, args)
}
