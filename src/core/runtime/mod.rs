// ─── Host Runtime ───
// Process-wide state the launcher shares with the code it hands off to:
// the platform and application scopes, string properties, and the URL
// handler and filesystem provider registries built on top of them.

pub mod fs;
pub mod url;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io;
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};

use reqwest::Url;
use tracing::{debug, warn};

use self::fs::{FileSystem, FileSystemProvider, FsEnv, VfsPath, FILE_SYSTEM_PROVIDER_SERVICE};
use self::url::{
    handler_class_name, split_handler_packages, UrlConnection, UrlStreamHandler,
    DEFAULT_HANDLER_PACKAGE, HANDLER_PACKAGES_PROPERTY,
};
use crate::core::bundle::LauncherBundle;
use crate::core::domain::{CodeScope, Component, ComponentTable, TableScope};

static GLOBAL: OnceLock<Arc<HostRuntime>> = OnceLock::new();

pub struct HostRuntime {
    platform: Arc<dyn CodeScope>,
    ambient: Arc<dyn CodeScope>,
    properties: RwLock<BTreeMap<String, String>>,
    handlers: Mutex<HashMap<String, Arc<dyn UrlStreamHandler>>>,
    providers: OnceLock<Vec<Arc<dyn FileSystemProvider>>>,
}

impl HostRuntime {
    pub fn new(platform: Arc<dyn CodeScope>, ambient: Arc<dyn CodeScope>) -> Self {
        Self {
            platform,
            ambient,
            properties: RwLock::new(BTreeMap::new()),
            handlers: Mutex::new(HashMap::new()),
            providers: OnceLock::new(),
        }
    }

    /// Runtime whose application scope holds the bundle's own classes on
    /// top of an empty platform scope.
    pub fn for_bundle(bundle: &LauncherBundle) -> Self {
        let platform: Arc<dyn CodeScope> = Arc::new(TableScope::platform(ComponentTable::new()));
        let ambient: Arc<dyn CodeScope> = Arc::new(TableScope::new(
            "app",
            Some(Arc::clone(&platform)),
            bundle.components().clone(),
        ));
        Self::new(platform, ambient)
    }

    /// Make `runtime` the process-wide instance. The first install wins and
    /// is returned.
    pub fn install_global(runtime: Arc<HostRuntime>) -> Arc<HostRuntime> {
        Arc::clone(GLOBAL.get_or_init(|| runtime))
    }

    pub fn global() -> Option<Arc<HostRuntime>> {
        GLOBAL.get().cloned()
    }

    pub fn with_property(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_property(name, value);
        self
    }

    pub fn platform(&self) -> &Arc<dyn CodeScope> {
        &self.platform
    }

    /// The scope the launcher itself was loaded from.
    pub fn ambient(&self) -> &Arc<dyn CodeScope> {
        &self.ambient
    }

    // ── Properties ──────────────────────────────────────

    pub fn property(&self, name: &str) -> Option<String> {
        self.properties
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Set a property, returning its previous value.
    pub fn set_property(&self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.properties
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), value.into())
    }

    /// Read-modify-write a property under a single lock.
    pub fn update_property<F>(&self, name: &str, update: F) -> String
    where
        F: FnOnce(Option<&str>) -> String,
    {
        let mut properties = self.properties.write().unwrap_or_else(PoisonError::into_inner);
        let value = update(properties.get(name).map(String::as_str));
        properties.insert(name.to_string(), value.clone());
        value
    }

    // ── URL handlers ────────────────────────────────────

    /// Find the stream handler for `scheme`.
    ///
    /// Each configured package prefix is probed in order, then the default
    /// package. Probing goes through the application scope only. A handler
    /// once found is cached for the life of the runtime.
    pub fn handler_for(&self, scheme: &str) -> io::Result<Arc<dyn UrlStreamHandler>> {
        let scheme = scheme.to_ascii_lowercase();
        let mut handlers = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handler) = handlers.get(&scheme) {
            return Ok(Arc::clone(handler));
        }

        let configured = self.property(HANDLER_PACKAGES_PROPERTY).unwrap_or_default();
        let prefixes = split_handler_packages(&configured)
            .into_iter()
            .chain(std::iter::once(DEFAULT_HANDLER_PACKAGE));

        for prefix in prefixes {
            let class_name = handler_class_name(prefix, &scheme);
            match self.ambient.resolve(&class_name) {
                Some(Component::Handler(factory)) => {
                    debug!("Using {} for {}: URLs", class_name, scheme);
                    let handler: Arc<dyn UrlStreamHandler> = Arc::from(factory());
                    handlers.insert(scheme, Arc::clone(&handler));
                    return Ok(handler);
                }
                Some(other) => warn!("{} is a {}, skipping", class_name, other.kind()),
                None => {}
            }
        }

        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("unknown protocol: {scheme}"),
        ))
    }

    pub fn open_connection(&self, url: &Url) -> io::Result<Box<dyn UrlConnection>> {
        self.handler_for(url.scheme())?.open_connection(url)
    }

    // ── Filesystem providers ────────────────────────────

    /// Providers advertised in the application scope, constructed on first use.
    pub fn installed_providers(&self) -> &[Arc<dyn FileSystemProvider>] {
        self.providers.get_or_init(|| {
            let mut providers: Vec<Arc<dyn FileSystemProvider>> = Vec::new();
            for class_name in self.ambient.services(FILE_SYSTEM_PROVIDER_SERVICE) {
                match self.ambient.resolve(&class_name) {
                    Some(Component::Provider(class)) => {
                        let provider: Arc<dyn FileSystemProvider> = Arc::from((class.construct)());
                        debug!("Installed {} for scheme {}", class_name, provider.scheme());
                        providers.push(provider);
                    }
                    Some(other) => warn!("{} is a {}, not a provider", class_name, other.kind()),
                    None => warn!("Advertised provider {} cannot be loaded", class_name),
                }
            }
            providers
        })
    }

    pub fn provider(&self, scheme: &str) -> io::Result<Arc<dyn FileSystemProvider>> {
        self.installed_providers()
            .iter()
            .find(|p| p.scheme().eq_ignore_ascii_case(scheme))
            .cloned()
            .ok_or_else(|| fs::provider_not_found(scheme))
    }

    pub fn new_file_system(&self, uri: &Url, env: &FsEnv) -> io::Result<Arc<dyn FileSystem>> {
        self.provider(uri.scheme())?.new_file_system(uri, env)
    }

    pub fn file_system(&self, uri: &Url) -> io::Result<Arc<dyn FileSystem>> {
        self.provider(uri.scheme())?.file_system(uri)
    }

    pub fn path(&self, uri: &Url) -> io::Result<VfsPath> {
        self.provider(uri.scheme())?.path(uri)
    }
}

impl fmt::Debug for HostRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostRuntime")
            .field("platform", &self.platform.name())
            .field("ambient", &self.ambient.name())
            .field("properties", &*self.properties.read().unwrap_or_else(PoisonError::into_inner))
            .finish_non_exhaustive()
    }
}
