use std::io;
use std::sync::{Arc, OnceLock};

use reqwest::Url;
use tracing::info;

use super::{unbound, SHIM_PACKAGE};
use crate::core::domain::{CodeScope, Component};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::runtime::url::{
    prepend_handler_package, UrlConnection, UrlStreamHandler, HANDLER_PACKAGES_PROPERTY,
};
use crate::core::runtime::HostRuntime;

/// Class name the runtime probes for `jimfs:` URLs under [`SHIM_PACKAGE`].
pub const SHIM_HANDLER_CLASS: &str = "link.infra.bundle.server.jimfs.Handler";
/// The real handler, shipped inside the server jar.
pub const TARGET_HANDLER_CLASS: &str = "com.google.common.jimfs.Handler";

pub type HandlerBinding = Arc<dyn Fn(&Url) -> io::Result<Box<dyn UrlConnection>> + Send + Sync>;

static BINDING: OnceLock<HandlerBinding> = OnceLock::new();

/// Instantiate the real handler from `domain` and capture it.
pub fn bind(domain: &dyn CodeScope) -> LauncherResult<HandlerBinding> {
    let wiring = |reason: String| LauncherError::ShimWiring {
        class: TARGET_HANDLER_CLASS.into(),
        reason,
    };
    let inner: Arc<dyn UrlStreamHandler> = match domain.resolve(TARGET_HANDLER_CLASS) {
        Some(Component::Handler(factory)) => Arc::from(factory()),
        Some(other) => {
            return Err(wiring(format!(
                "expected a URL stream handler, found a {}",
                other.kind()
            )))
        }
        None => return Err(wiring(format!("class not found in {}", domain.name()))),
    };
    Ok(Arc::new(move |url: &Url| inner.open_connection(url)))
}

/// Bind the process-wide shim and advertise its package to the runtime.
///
/// The package list is only touched once binding succeeded.
pub fn register(runtime: &HostRuntime, domain: &dyn CodeScope) -> LauncherResult<()> {
    let binding = bind(domain)?;
    BINDING.set(binding).map_err(|_| LauncherError::ShimWiring {
        class: SHIM_HANDLER_CLASS.into(),
        reason: "handler is already registered".into(),
    })?;

    let packages = runtime.update_property(HANDLER_PACKAGES_PROPERTY, |existing| {
        prepend_handler_package(existing, SHIM_PACKAGE)
    });
    info!("Registered jimfs URL handler, {}={}", HANDLER_PACKAGES_PROPERTY, packages);
    Ok(())
}

/// URL stream handler for `jimfs:` that forwards to the handler bound from
/// the server jar.
#[derive(Default)]
pub struct ShimHandler {
    binding: Option<HandlerBinding>,
}

impl ShimHandler {
    /// A handler forwarding to `binding` instead of the process-wide one.
    pub fn bound(binding: HandlerBinding) -> Self {
        Self {
            binding: Some(binding),
        }
    }

    fn binding(&self) -> io::Result<HandlerBinding> {
        match &self.binding {
            Some(binding) => Ok(Arc::clone(binding)),
            None => BINDING
                .get()
                .cloned()
                .ok_or_else(|| unbound(SHIM_HANDLER_CLASS, "handler used before registration")),
        }
    }
}

impl std::fmt::Debug for ShimHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShimHandler")
            .field("bound", &self.binding.is_some())
            .finish()
    }
}

impl UrlStreamHandler for ShimHandler {
    fn open_connection(&self, url: &Url) -> io::Result<Box<dyn UrlConnection>> {
        (self.binding()?)(url)
    }
}

pub(super) fn construct() -> Box<dyn UrlStreamHandler> {
    Box::new(ShimHandler::default())
}
