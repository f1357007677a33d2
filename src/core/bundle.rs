// ─── Launcher Bundle ───
// The launcher's own code and resources: the embedded manifest, the shim
// classes it ships, and the implementations it links for classes that live
// inside the server jar.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::domain::{Component, ComponentTable};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::jimfs;

include!(concat!(env!("OUT_DIR"), "/embedded_manifest.rs"));

/// Resource name of the manifest inside the bundle.
pub const MANIFEST_RESOURCE: &str = "bundle-server-launcher.properties";

#[derive(Debug, Clone)]
pub struct LauncherBundle {
    location: PathBuf,
    resources: BTreeMap<String, Vec<u8>>,
    components: ComponentTable,
    linked: ComponentTable,
}

impl LauncherBundle {
    /// An empty bundle rooted at `location`.
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
            resources: BTreeMap::new(),
            components: ComponentTable::new(),
            linked: ComponentTable::new(),
        }
    }

    /// The bundle this executable was built as: the running binary, the
    /// manifest baked in at build time, and the jimfs shims.
    pub fn embedded() -> LauncherResult<Self> {
        let location = std::env::current_exe().map_err(|source| LauncherError::Io {
            path: PathBuf::from("<current executable>"),
            source,
        })?;

        let mut bundle = Self::new(location).with_shims();
        if let Some(manifest) = EMBEDDED_MANIFEST {
            bundle = bundle.with_resource(MANIFEST_RESOURCE, manifest.as_bytes().to_vec());
        }
        Ok(bundle)
    }

    /// Ship the jimfs shim classes and advertise the provider shim.
    pub fn with_shims(mut self) -> Self {
        self.components.extend(&jimfs::shim_components());
        self
    }

    pub fn with_resource(mut self, name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.resources.insert(name.into(), bytes);
        self
    }

    /// Add a class shipped by the bundle itself.
    pub fn with_component(mut self, name: impl Into<String>, component: Component) -> Self {
        self.components.insert(name, component);
        self
    }

    pub fn with_service(mut self, service: impl Into<String>, class_name: impl Into<String>) -> Self {
        self.components.advertise(service, class_name);
        self
    }

    /// Link an implementation for a class the server jar provides. It only
    /// becomes visible when the jar actually carries the class entry.
    pub fn with_linked(mut self, name: impl Into<String>, component: Component) -> Self {
        self.linked.insert(name, component);
        self
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn resource(&self, name: &str) -> Option<&[u8]> {
        self.resources.get(name).map(Vec::as_slice)
    }

    pub fn components(&self) -> &ComponentTable {
        &self.components
    }

    pub fn linked(&self) -> &ComponentTable {
        &self.linked
    }
}
