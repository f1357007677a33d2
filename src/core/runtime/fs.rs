// ─── Filesystem Providers ───
// Virtual filesystems are reached through providers keyed by URI scheme.
// Providers are discovered through the `FileSystemProvider` service.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Read, Seek, Write};
use std::sync::Arc;

use reqwest::Url;

/// Service name under which providers are advertised.
pub const FILE_SYSTEM_PROVIDER_SERVICE: &str = "FileSystemProvider";

/// Environment passed when mounting a new filesystem.
pub type FsEnv = BTreeMap<String, String>;

/// Closure that releases a mounted filesystem when run.
pub type ReleaseHook = Box<dyn FnOnce() + Send + 'static>;

/// A path inside a virtual filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VfsPath {
    /// URI of the filesystem the path belongs to.
    pub file_system: Url,
    pub path: String,
}

/// A mounted virtual filesystem.
pub trait FileSystem: Send + Sync + fmt::Debug {
    fn uri(&self) -> &Url;
    fn is_open(&self) -> bool;
    fn close(&self) -> io::Result<()>;
}

pub trait ByteChannel: Read + Write + Seek + Send {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOption {
    Read,
    Write,
    Append,
    Create,
    CreateNew,
    TruncateExisting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOption {
    ReplaceExisting,
    CopyAttributes,
    AtomicMove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    Write,
    Execute,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    Bool(bool),
    Long(i64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicAttributes {
    pub size: u64,
    pub is_directory: bool,
    pub is_regular_file: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStore {
    pub name: String,
    pub kind: String,
}

/// A filesystem provider for one URI scheme.
///
/// Every operation is required. Providers that do not support an operation
/// return [`unsupported`].
pub trait FileSystemProvider: Send + Sync + fmt::Debug {
    fn scheme(&self) -> &str;

    fn new_file_system(&self, uri: &Url, env: &FsEnv) -> io::Result<Arc<dyn FileSystem>>;
    fn file_system(&self, uri: &Url) -> io::Result<Arc<dyn FileSystem>>;
    fn path(&self, uri: &Url) -> io::Result<VfsPath>;

    fn new_byte_channel(
        &self,
        path: &VfsPath,
        options: &[OpenOption],
    ) -> io::Result<Box<dyn ByteChannel>>;
    fn new_directory_stream(&self, dir: &VfsPath) -> io::Result<Vec<VfsPath>>;
    fn create_directory(&self, dir: &VfsPath) -> io::Result<()>;
    fn delete(&self, path: &VfsPath) -> io::Result<()>;
    fn copy(&self, source: &VfsPath, target: &VfsPath, options: &[CopyOption]) -> io::Result<()>;
    fn move_path(
        &self,
        source: &VfsPath,
        target: &VfsPath,
        options: &[CopyOption],
    ) -> io::Result<()>;
    fn is_same_file(&self, path: &VfsPath, other: &VfsPath) -> io::Result<bool>;
    fn is_hidden(&self, path: &VfsPath) -> io::Result<bool>;
    fn file_store(&self, path: &VfsPath) -> io::Result<FileStore>;
    fn check_access(&self, path: &VfsPath, modes: &[AccessMode]) -> io::Result<()>;
    fn file_attribute_view(
        &self,
        path: &VfsPath,
        view: &str,
    ) -> io::Result<BTreeMap<String, AttributeValue>>;
    fn read_attributes(&self, path: &VfsPath) -> io::Result<BasicAttributes>;
    fn read_attributes_map(
        &self,
        path: &VfsPath,
        attributes: &str,
    ) -> io::Result<BTreeMap<String, AttributeValue>>;
    fn set_attribute(
        &self,
        path: &VfsPath,
        attribute: &str,
        value: AttributeValue,
    ) -> io::Result<()>;
}

/// Error for a provider operation that is not implemented.
pub fn unsupported<T>(operation: &str) -> io::Result<T> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        format!("{operation} is not supported by this provider"),
    ))
}

/// Error for a URI whose scheme has no installed provider.
pub fn provider_not_found(scheme: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("Provider \"{scheme}\" not found"),
    )
}
