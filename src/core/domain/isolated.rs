// ─── Isolated Domain ───
// Child scope that sees the server jar and the launcher bundle, parented to
// the platform scope so the ambient application scope is never a fallback.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

use super::scope::{CodeScope, Component, ComponentTable};
use crate::core::bundle::LauncherBundle;
use crate::core::error::{LauncherError, LauncherResult};

/// One location the isolated domain resolves from, in order.
pub trait ResolutionRoot: Send + Sync + std::fmt::Debug {
    fn location(&self) -> &Path;

    fn find_component(&self, class_name: &str) -> Option<Component>;

    fn find_resource(&self, name: &str) -> LauncherResult<Option<Vec<u8>>>;

    fn services(&self, _service: &str) -> Vec<String> {
        Vec::new()
    }
}

/// Archive entry holding the compiled form of `class_name`.
pub fn class_entry_name(class_name: &str) -> String {
    format!("{}.class", class_name.replace('.', "/"))
}

/// A jar on disk.
///
/// A class is visible only when the archive contains its entry and the
/// bundle links an implementation for it.
#[derive(Debug)]
pub struct ArchiveRoot {
    path: PathBuf,
    entries: BTreeSet<String>,
    linked: ComponentTable,
    archive: Mutex<ZipArchive<File>>,
}

impl ArchiveRoot {
    pub fn open(path: &Path, linked: ComponentTable) -> LauncherResult<Self> {
        let file = File::open(path).map_err(|source| LauncherError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let archive = ZipArchive::new(file)?;
        let entries: BTreeSet<String> = archive.file_names().map(str::to_string).collect();

        debug!("Opened {:?} with {} entries", path, entries.len());
        Ok(Self {
            path: path.to_path_buf(),
            entries,
            linked,
            archive: Mutex::new(archive),
        })
    }

    pub fn contains_entry(&self, name: &str) -> bool {
        self.entries.contains(name)
    }
}

impl ResolutionRoot for ArchiveRoot {
    fn location(&self) -> &Path {
        &self.path
    }

    fn find_component(&self, class_name: &str) -> Option<Component> {
        if !self.contains_entry(&class_entry_name(class_name)) {
            return None;
        }
        self.linked.get(class_name)
    }

    fn find_resource(&self, name: &str) -> LauncherResult<Option<Vec<u8>>> {
        let mut archive = self.archive.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entry = match archive.by_name(name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut bytes)
            .map_err(|source| LauncherError::Io {
                path: self.path.join(name),
                source,
            })?;
        Ok(Some(bytes))
    }
}

/// The launcher bundle itself: its own components and embedded resources.
#[derive(Debug)]
pub struct BundleRoot {
    bundle: Arc<LauncherBundle>,
}

impl BundleRoot {
    pub fn new(bundle: Arc<LauncherBundle>) -> Self {
        Self { bundle }
    }
}

impl ResolutionRoot for BundleRoot {
    fn location(&self) -> &Path {
        self.bundle.location()
    }

    fn find_component(&self, class_name: &str) -> Option<Component> {
        self.bundle.components().get(class_name)
    }

    fn find_resource(&self, name: &str) -> LauncherResult<Option<Vec<u8>>> {
        Ok(self.bundle.resource(name).map(<[u8]>::to_vec))
    }

    fn services(&self, service: &str) -> Vec<String> {
        self.bundle.components().services(service).to_vec()
    }
}

/// Independent code-loading scope over an ordered list of roots.
#[derive(Debug)]
pub struct IsolatedDomain {
    name: String,
    parent: Arc<dyn CodeScope>,
    roots: Vec<Arc<dyn ResolutionRoot>>,
}

impl IsolatedDomain {
    pub fn root_locations(&self) -> Vec<&Path> {
        self.roots.iter().map(|root| root.location()).collect()
    }
}

impl CodeScope for IsolatedDomain {
    fn name(&self) -> &str {
        &self.name
    }

    fn parent(&self) -> Option<&Arc<dyn CodeScope>> {
        Some(&self.parent)
    }

    fn find_local(&self, class_name: &str) -> Option<Component> {
        self.roots
            .iter()
            .find_map(|root| root.find_component(class_name))
    }

    fn find_local_resource(&self, name: &str) -> LauncherResult<Option<Vec<u8>>> {
        for root in &self.roots {
            if let Some(bytes) = root.find_resource(name)? {
                return Ok(Some(bytes));
            }
        }
        Ok(None)
    }

    fn local_services(&self, service: &str) -> Vec<String> {
        let mut found = Vec::new();
        for class_name in self.roots.iter().flat_map(|root| root.services(service)) {
            if !found.contains(&class_name) {
                found.push(class_name);
            }
        }
        found
    }
}

pub struct IsolatedDomainBuilder {
    name: String,
    parent: Arc<dyn CodeScope>,
    roots: Vec<Arc<dyn ResolutionRoot>>,
}

impl IsolatedDomainBuilder {
    /// Start a domain whose parent is `platform`.
    pub fn new(platform: Arc<dyn CodeScope>) -> Self {
        Self {
            name: "game".into(),
            parent: platform,
            roots: Vec::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Append a resolution root; earlier roots win.
    pub fn root(mut self, root: impl ResolutionRoot + 'static) -> Self {
        self.roots.push(Arc::new(root));
        self
    }

    pub fn build(self) -> Arc<IsolatedDomain> {
        Arc::new(IsolatedDomain {
            name: self.name,
            parent: self.parent,
            roots: self.roots,
        })
    }

    /// The game domain: the server jar first, then the launcher bundle.
    pub fn for_artifact(
        platform: Arc<dyn CodeScope>,
        bundle: &Arc<LauncherBundle>,
        artifact: &Path,
    ) -> LauncherResult<Arc<IsolatedDomain>> {
        let archive = ArchiveRoot::open(artifact, bundle.linked().clone())?;
        Ok(Self::new(platform)
            .root(archive)
            .root(BundleRoot::new(Arc::clone(bundle)))
            .build())
    }
}
