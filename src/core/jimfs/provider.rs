use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::sync::{Arc, OnceLock};

use reqwest::Url;
use tracing::info;

use super::{unbound, JIMFS_SCHEME};
use crate::core::domain::{CodeScope, Component};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::runtime::fs::{
    unsupported, AccessMode, AttributeValue, BasicAttributes, ByteChannel, CopyOption, FileStore,
    FileSystem, FileSystemProvider, FsEnv, OpenOption, ReleaseHook, VfsPath,
};

pub const SHIM_PROVIDER_CLASS: &str = "link.infra.bundle.server.jimfs.ShimJimfsFileSystemProvider";
/// The real provider, shipped inside the server jar.
pub const TARGET_PROVIDER_CLASS: &str = "com.google.common.jimfs.SystemJimfsFileSystemProvider";

type RemoveRunnable = fn(&Url) -> io::Result<ReleaseHook>;

static BINDING: OnceLock<Arc<ProviderBinding>> = OnceLock::new();

/// The real provider instance plus its static release hook.
pub struct ProviderBinding {
    inner: Arc<dyn FileSystemProvider>,
    remove_file_system_runnable: RemoveRunnable,
}

impl ProviderBinding {
    pub fn bind(domain: &dyn CodeScope) -> LauncherResult<Arc<Self>> {
        let wiring = |reason: String| LauncherError::ShimWiring {
            class: TARGET_PROVIDER_CLASS.into(),
            reason,
        };

        let class = match domain.resolve(TARGET_PROVIDER_CLASS) {
            Some(Component::Provider(class)) => class,
            Some(other) => {
                return Err(wiring(format!(
                    "expected a filesystem provider, found a {}",
                    other.kind()
                )))
            }
            None => return Err(wiring(format!("class not found in {}", domain.name()))),
        };
        let remove_file_system_runnable = class
            .remove_file_system_runnable
            .ok_or_else(|| wiring("class has no removeFileSystemRunnable".into()))?;

        let inner: Arc<dyn FileSystemProvider> = Arc::from((class.construct)());
        if inner.scheme() != JIMFS_SCHEME {
            return Err(wiring(format!(
                "provider serves scheme {:?}, not {JIMFS_SCHEME:?}",
                inner.scheme()
            )));
        }

        Ok(Arc::new(Self {
            inner,
            remove_file_system_runnable,
        }))
    }

    pub fn new_file_system(&self, uri: &Url, env: &FsEnv) -> io::Result<Arc<dyn FileSystem>> {
        self.inner.new_file_system(uri, env)
    }

    pub fn file_system(&self, uri: &Url) -> io::Result<Arc<dyn FileSystem>> {
        self.inner.file_system(uri)
    }

    pub fn path(&self, uri: &Url) -> io::Result<VfsPath> {
        self.inner.path(uri)
    }

    pub fn remove_file_system_runnable(&self, uri: &Url) -> io::Result<ReleaseHook> {
        (self.remove_file_system_runnable)(uri)
    }
}

impl fmt::Debug for ProviderBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderBinding")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

/// Bind the process-wide provider shim. Fails if it is already bound.
pub fn initialize(domain: &dyn CodeScope) -> LauncherResult<()> {
    let binding = ProviderBinding::bind(domain)?;
    BINDING.set(binding).map_err(|_| LauncherError::ShimWiring {
        class: SHIM_PROVIDER_CLASS.into(),
        reason: "provider is already initialized".into(),
    })?;
    info!("Bound {} to {}", SHIM_PROVIDER_CLASS, TARGET_PROVIDER_CLASS);
    Ok(())
}

fn global_binding() -> io::Result<Arc<ProviderBinding>> {
    BINDING
        .get()
        .cloned()
        .ok_or_else(|| unbound(SHIM_PROVIDER_CLASS, "provider used before initialization"))
}

/// Filesystem provider for `jimfs` that forwards mounting and path lookup
/// to the provider bound from the server jar. Nothing else is forwarded.
#[derive(Debug, Default)]
pub struct ShimJimfsFileSystemProvider {
    binding: Option<Arc<ProviderBinding>>,
}

impl ShimJimfsFileSystemProvider {
    pub fn bound(binding: Arc<ProviderBinding>) -> Self {
        Self {
            binding: Some(binding),
        }
    }

    /// Static hook releasing the filesystem mounted at `uri`.
    pub fn remove_file_system_runnable(uri: &Url) -> io::Result<ReleaseHook> {
        global_binding()?.remove_file_system_runnable(uri)
    }

    fn binding(&self) -> io::Result<Arc<ProviderBinding>> {
        match &self.binding {
            Some(binding) => Ok(Arc::clone(binding)),
            None => global_binding(),
        }
    }
}

impl FileSystemProvider for ShimJimfsFileSystemProvider {
    fn scheme(&self) -> &str {
        JIMFS_SCHEME
    }

    fn new_file_system(&self, uri: &Url, env: &FsEnv) -> io::Result<Arc<dyn FileSystem>> {
        self.binding()?.new_file_system(uri, env)
    }

    fn file_system(&self, uri: &Url) -> io::Result<Arc<dyn FileSystem>> {
        self.binding()?.file_system(uri)
    }

    fn path(&self, uri: &Url) -> io::Result<VfsPath> {
        self.binding()?.path(uri)
    }

    fn new_byte_channel(&self, _: &VfsPath, _: &[OpenOption]) -> io::Result<Box<dyn ByteChannel>> {
        unsupported("newByteChannel")
    }

    fn new_directory_stream(&self, _: &VfsPath) -> io::Result<Vec<VfsPath>> {
        unsupported("newDirectoryStream")
    }

    fn create_directory(&self, _: &VfsPath) -> io::Result<()> {
        unsupported("createDirectory")
    }

    fn delete(&self, _: &VfsPath) -> io::Result<()> {
        unsupported("delete")
    }

    fn copy(&self, _: &VfsPath, _: &VfsPath, _: &[CopyOption]) -> io::Result<()> {
        unsupported("copy")
    }

    fn move_path(&self, _: &VfsPath, _: &VfsPath, _: &[CopyOption]) -> io::Result<()> {
        unsupported("move")
    }

    fn is_same_file(&self, _: &VfsPath, _: &VfsPath) -> io::Result<bool> {
        unsupported("isSameFile")
    }

    fn is_hidden(&self, _: &VfsPath) -> io::Result<bool> {
        unsupported("isHidden")
    }

    fn file_store(&self, _: &VfsPath) -> io::Result<FileStore> {
        unsupported("getFileStore")
    }

    fn check_access(&self, _: &VfsPath, _: &[AccessMode]) -> io::Result<()> {
        unsupported("checkAccess")
    }

    fn file_attribute_view(&self, _: &VfsPath, _: &str) -> io::Result<BTreeMap<String, AttributeValue>> {
        unsupported("getFileAttributeView")
    }

    fn read_attributes(&self, _: &VfsPath) -> io::Result<BasicAttributes> {
        unsupported("readAttributes")
    }

    fn read_attributes_map(&self, _: &VfsPath, _: &str) -> io::Result<BTreeMap<String, AttributeValue>> {
        unsupported("readAttributes")
    }

    fn set_attribute(&self, _: &VfsPath, _: &str, _: AttributeValue) -> io::Result<()> {
        unsupported("setAttribute")
    }
}

pub(super) fn construct() -> Box<dyn FileSystemProvider> {
    Box::new(ShimJimfsFileSystemProvider::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bundle::LauncherBundle;
    use crate::core::domain::{ComponentTable, ProviderClass, TableScope};
    use crate::core::jimfs::fixtures::{self, FakeJimfsProvider};
    use crate::core::runtime::HostRuntime;
    use serial_test::serial;

    fn shim() -> ShimJimfsFileSystemProvider {
        let domain = fixtures::jimfs_domain();
        ShimJimfsFileSystemProvider::bound(ProviderBinding::bind(domain.as_ref()).unwrap())
    }

    fn vfs(path: &str) -> VfsPath {
        VfsPath {
            file_system: Url::parse("jimfs://mem").unwrap(),
            path: path.into(),
        }
    }

    #[test]
    fn mounting_and_lookup_are_forwarded() {
        let shim = shim();
        let uri = Url::parse("jimfs://world").unwrap();

        let fs = shim.new_file_system(&uri, &FsEnv::new()).unwrap();
        assert_eq!(fs.uri(), &uri);
        assert!(shim.file_system(&uri).unwrap().is_open());

        let path = shim.path(&Url::parse("jimfs://world/region/r.0.0.mca").unwrap()).unwrap();
        assert_eq!(path.path, "/region/r.0.0.mca");
        assert_eq!(path.file_system, uri);
    }

    #[test]
    fn inner_errors_pass_through() {
        let shim = shim();
        let err = shim.file_system(&Url::parse("jimfs://never-mounted").unwrap()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);

        let uri = Url::parse("jimfs://twice").unwrap();
        shim.new_file_system(&uri, &FsEnv::new()).unwrap();
        let err = shim.new_file_system(&uri, &FsEnv::new()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
    }

    #[test]
    fn everything_else_is_unsupported() {
        let shim = shim();
        let p = vfs("/a");
        let q = vfs("/b");
        let kinds = [
            shim.new_byte_channel(&p, &[OpenOption::Read]).err().map(|e| e.kind()),
            shim.new_directory_stream(&p).err().map(|e| e.kind()),
            shim.create_directory(&p).err().map(|e| e.kind()),
            shim.delete(&p).err().map(|e| e.kind()),
            shim.copy(&p, &q, &[]).err().map(|e| e.kind()),
            shim.move_path(&p, &q, &[CopyOption::AtomicMove]).err().map(|e| e.kind()),
            shim.is_same_file(&p, &q).err().map(|e| e.kind()),
            shim.is_hidden(&p).err().map(|e| e.kind()),
            shim.file_store(&p).err().map(|e| e.kind()),
            shim.check_access(&p, &[AccessMode::Read]).err().map(|e| e.kind()),
            shim.file_attribute_view(&p, "basic").err().map(|e| e.kind()),
            shim.read_attributes(&p).err().map(|e| e.kind()),
            shim.read_attributes_map(&p, "*").err().map(|e| e.kind()),
            shim.set_attribute(&p, "lastModifiedTime", AttributeValue::Long(0)).err().map(|e| e.kind()),
        ];
        for kind in kinds {
            assert_eq!(kind, Some(io::ErrorKind::Unsupported));
        }
        assert_eq!(shim.scheme(), "jimfs");
    }

    #[test]
    fn binding_rejects_a_provider_for_another_scheme() {
        fn zipfs() -> Box<dyn FileSystemProvider> {
            Box::new(FakeJimfsProvider::with_scheme("zipfs"))
        }
        let domain = TableScope::platform(ComponentTable::new().with_component(
            TARGET_PROVIDER_CLASS,
            Component::Provider(ProviderClass {
                construct: zipfs,
                remove_file_system_runnable: Some(FakeJimfsProvider::remove_file_system_runnable),
            }),
        ));
        let err = ProviderBinding::bind(&domain).unwrap_err();
        assert!(matches!(err, LauncherError::ShimWiring { ref reason, .. } if reason.contains("zipfs")));
    }

    #[test]
    fn binding_requires_the_static_release_hook() {
        fn jimfs() -> Box<dyn FileSystemProvider> {
            Box::new(FakeJimfsProvider::default())
        }
        let domain = TableScope::platform(ComponentTable::new().with_component(
            TARGET_PROVIDER_CLASS,
            Component::Provider(ProviderClass {
                construct: jimfs,
                remove_file_system_runnable: None,
            }),
        ));
        assert!(matches!(
            ProviderBinding::bind(&domain).unwrap_err(),
            LauncherError::ShimWiring { .. }
        ));
    }

    #[test]
    #[serial]
    fn initialized_shim_serves_the_runtime() {
        let runtime = HostRuntime::for_bundle(&LauncherBundle::embedded().unwrap());
        let domain = fixtures::jimfs_domain();

        initialize(domain.as_ref()).unwrap();
        assert!(matches!(
            initialize(domain.as_ref()).unwrap_err(),
            LauncherError::ShimWiring { .. }
        ));

        let uri = Url::parse("jimfs://session").unwrap();
        runtime.new_file_system(&uri, &FsEnv::new()).unwrap();
        assert!(runtime.file_system(&uri).unwrap().is_open());

        let release = ShimJimfsFileSystemProvider::remove_file_system_runnable(&uri).unwrap();
        release();
        assert!(fixtures::released().contains(&uri.to_string()));
    }
}
