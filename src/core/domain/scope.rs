// ─── Code Scopes ───
// A scope resolves components by fully qualified name. Lookups delegate to
// the parent first, the same way class loaders do.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::sync::Arc;

use reqwest::Url;

use crate::core::error::{BoxError, LauncherError, LauncherResult};
use crate::core::runtime::fs::{FileSystemProvider, ReleaseHook};
use crate::core::runtime::url::UrlStreamHandler;
use crate::core::runtime::HostRuntime;

/// Program entry: receives the host runtime and the forwarded arguments.
pub type EntryPoint = fn(&HostRuntime, Vec<String>) -> Result<(), BoxError>;

/// No-argument constructor of a URL stream handler class.
pub type HandlerFactory = fn() -> Box<dyn UrlStreamHandler>;

/// A filesystem provider class: its no-argument constructor plus the
/// static release hook, when the class declares one.
#[derive(Clone, Copy)]
pub struct ProviderClass {
    pub construct: fn() -> Box<dyn FileSystemProvider>,
    pub remove_file_system_runnable: Option<fn(&Url) -> io::Result<ReleaseHook>>,
}

/// A loadable unit resolved by name.
#[derive(Clone, Copy)]
pub enum Component {
    Handler(HandlerFactory),
    Provider(ProviderClass),
    Entry(EntryPoint),
}

impl Component {
    pub fn kind(&self) -> &'static str {
        match self {
            Component::Handler(_) => "URL stream handler",
            Component::Provider(_) => "filesystem provider",
            Component::Entry(_) => "entry point",
        }
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({})", self.kind())
    }
}

/// Named components plus service advertisements.
#[derive(Clone, Default)]
pub struct ComponentTable {
    components: BTreeMap<String, Component>,
    services: BTreeMap<String, Vec<String>>,
}

impl ComponentTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_component(mut self, name: impl Into<String>, component: Component) -> Self {
        self.insert(name, component);
        self
    }

    pub fn with_service(mut self, service: impl Into<String>, class_name: impl Into<String>) -> Self {
        self.advertise(service, class_name);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, component: Component) {
        self.components.insert(name.into(), component);
    }

    /// Advertise `class_name` as an implementation of `service`.
    pub fn advertise(&mut self, service: impl Into<String>, class_name: impl Into<String>) {
        let entries = self.services.entry(service.into()).or_default();
        let class_name = class_name.into();
        if !entries.contains(&class_name) {
            entries.push(class_name);
        }
    }

    /// Copy every component and advertisement from `other` into this table.
    pub fn extend(&mut self, other: &ComponentTable) {
        for (name, component) in &other.components {
            self.components.insert(name.clone(), *component);
        }
        for (service, classes) in &other.services {
            for class_name in classes {
                self.advertise(service.clone(), class_name.clone());
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Component> {
        self.components.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    pub fn services(&self, service: &str) -> &[String] {
        self.services.get(service).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty() && self.services.is_empty()
    }
}

impl fmt::Debug for ComponentTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentTable")
            .field("components", &self.components.keys().collect::<Vec<_>>())
            .field("services", &self.services)
            .finish()
    }
}

/// A code-loading scope.
pub trait CodeScope: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn parent(&self) -> Option<&Arc<dyn CodeScope>>;

    /// Look `class_name` up in this scope only.
    fn find_local(&self, class_name: &str) -> Option<Component>;

    fn find_local_resource(&self, _name: &str) -> LauncherResult<Option<Vec<u8>>> {
        Ok(None)
    }

    fn local_services(&self, _service: &str) -> Vec<String> {
        Vec::new()
    }

    /// Parent-first resolution.
    fn resolve(&self, class_name: &str) -> Option<Component> {
        if let Some(parent) = self.parent() {
            if let Some(found) = parent.resolve(class_name) {
                return Some(found);
            }
        }
        self.find_local(class_name)
    }

    fn load(&self, class_name: &str) -> LauncherResult<Component> {
        self.resolve(class_name)
            .ok_or_else(|| LauncherError::ClassNotFound {
                name: class_name.to_string(),
                scope: self.name().to_string(),
            })
    }

    fn resource(&self, name: &str) -> LauncherResult<Option<Vec<u8>>> {
        if let Some(parent) = self.parent() {
            if let Some(found) = parent.resource(name)? {
                return Ok(Some(found));
            }
        }
        self.find_local_resource(name)
    }

    /// Every class advertised for `service`, ancestors first.
    fn services(&self, service: &str) -> Vec<String> {
        let mut found = self
            .parent()
            .map(|parent| parent.services(service))
            .unwrap_or_default();
        for class_name in self.local_services(service) {
            if !found.contains(&class_name) {
                found.push(class_name);
            }
        }
        found
    }
}

/// A scope backed by a fixed component table.
#[derive(Debug)]
pub struct TableScope {
    name: String,
    parent: Option<Arc<dyn CodeScope>>,
    table: ComponentTable,
}

impl TableScope {
    pub fn new(
        name: impl Into<String>,
        parent: Option<Arc<dyn CodeScope>>,
        table: ComponentTable,
    ) -> Self {
        Self {
            name: name.into(),
            parent,
            table,
        }
    }

    /// The root scope holding host built-ins. Empty unless populated.
    pub fn platform(table: ComponentTable) -> Self {
        Self::new("platform", None, table)
    }
}

impl CodeScope for TableScope {
    fn name(&self) -> &str {
        &self.name
    }

    fn parent(&self) -> Option<&Arc<dyn CodeScope>> {
        self.parent.as_ref()
    }

    fn find_local(&self, class_name: &str) -> Option<Component> {
        self.table.get(class_name)
    }

    fn local_services(&self, service: &str) -> Vec<String> {
        self.table.services(service).to_vec()
    }
}
