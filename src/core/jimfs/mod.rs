// ─── Jimfs Shims ───
// The server jar ships an in-memory filesystem that registers itself with
// the runtime. Registration happens from inside the isolated domain, where
// the runtime cannot see it, so the launcher carries thin shims that live in
// its own scope and forward to the real implementations once bound.

pub mod handler;
pub mod provider;

pub use handler::{ShimHandler, SHIM_HANDLER_CLASS, TARGET_HANDLER_CLASS};
pub use provider::{
    ProviderBinding, ShimJimfsFileSystemProvider, SHIM_PROVIDER_CLASS, TARGET_PROVIDER_CLASS,
};

use std::io;

use crate::core::domain::{Component, ComponentTable, ProviderClass};
use crate::core::error::LauncherError;
use crate::core::runtime::fs::FILE_SYSTEM_PROVIDER_SERVICE;

/// Handler package prefix that makes the runtime find [`ShimHandler`].
pub const SHIM_PACKAGE: &str = "link.infra.bundle.server";
pub const JIMFS_SCHEME: &str = "jimfs";

/// The shim classes, as the launcher bundle ships them.
pub fn shim_components() -> ComponentTable {
    ComponentTable::new()
        .with_component(SHIM_HANDLER_CLASS, Component::Handler(handler::construct))
        .with_component(
            SHIM_PROVIDER_CLASS,
            Component::Provider(ProviderClass {
                construct: provider::construct,
                remove_file_system_runnable: Some(
                    ShimJimfsFileSystemProvider::remove_file_system_runnable,
                ),
            }),
        )
        .with_service(FILE_SYSTEM_PROVIDER_SERVICE, SHIM_PROVIDER_CLASS)
}

/// I/O error for a shim invoked before it was bound. It carries a
/// [`LauncherError::ShimWiring`] so [`wiring_failure`] can pick it out.
pub(crate) fn unbound(class: &str, reason: &str) -> io::Error {
    io::Error::other(LauncherError::ShimWiring {
        class: class.into(),
        reason: reason.into(),
    })
}

/// The wiring error behind `err`, if it came from an unbound shim rather
/// than from the filesystem or the connection itself. Such errors are fatal.
pub fn wiring_failure(err: &io::Error) -> Option<&LauncherError> {
    err.get_ref()
        .and_then(|inner| inner.downcast_ref::<LauncherError>())
        .filter(|inner| matches!(inner, LauncherError::ShimWiring { .. }))
}
