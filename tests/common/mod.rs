//! Shared fixtures: a local HTTP responder, server jar builders, and
//! stand-ins for the classes a real server jar carries.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{self, Cursor, Read, Write};
use std::net::TcpListener;
use std::path::Path;
use std::sync::{Arc, Mutex};

use bundle_server_launcher::core::bundle::{LauncherBundle, MANIFEST_RESOURCE};
use bundle_server_launcher::core::domain::{Component, ProviderClass};
use bundle_server_launcher::core::error::BoxError;
use bundle_server_launcher::core::jimfs::{TARGET_HANDLER_CLASS, TARGET_PROVIDER_CLASS};
use bundle_server_launcher::core::runtime::fs::{
    unsupported, AccessMode, AttributeValue, BasicAttributes, ByteChannel, CopyOption, FileStore,
    FileSystem, FileSystemProvider, FsEnv, OpenOption, ReleaseHook, VfsPath,
};
use bundle_server_launcher::core::runtime::url::{UrlConnection, UrlStreamHandler};
use bundle_server_launcher::core::runtime::HostRuntime;
use reqwest::Url;
use sha1::{Digest, Sha1};
use zip::write::SimpleFileOptions;

pub const MAIN_CLASS: &str = "net.fabricmc.loader.impl.launch.server.FabricServerLauncher";

// ── HTTP ────────────────────────────────────────────────────────────────────

pub type Requests = Arc<Mutex<Vec<String>>>;

/// Serve `responses` in order, one per connection.
pub fn serve(responses: Vec<Vec<u8>>) -> (String, Requests) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    let requests: Requests = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&requests);
    std::thread::spawn(move || {
        for response in responses {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => head.extend_from_slice(&buf[..n]),
                }
            }
            seen.lock()
                .unwrap()
                .push(String::from_utf8_lossy(&head).into_owned());
            let _ = stream.write_all(&response);
        }
    });
    (format!("http://127.0.0.1:{port}"), requests)
}

pub fn ok_body(body: &[u8]) -> Vec<u8> {
    let mut response = format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(body);
    response
}

pub fn http_status(code: u16, reason: &str) -> Vec<u8> {
    format!("HTTP/1.1 {code} {reason}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
        .into_bytes()
}

// ── Artifacts ───────────────────────────────────────────────────────────────

/// A server jar holding the entry class and the jimfs classes.
pub fn server_jar_bytes(extra: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let mut entries: Vec<(&str, &[u8])> = vec![
        ("net/fabricmc/loader/impl/launch/server/FabricServerLauncher.class", &b"\xCA\xFE\xBA\xBE"[..]),
        ("com/google/common/jimfs/Handler.class", &b"\xCA\xFE\xBA\xBE"[..]),
        ("com/google/common/jimfs/SystemJimfsFileSystemProvider.class", &b"\xCA\xFE\xBA\xBE"[..]),
    ];
    entries.extend_from_slice(extra);
    for (name, contents) in entries {
        writer.start_file(name, SimpleFileOptions::default()).unwrap();
        writer.write_all(contents).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

pub fn sha1_hex(bytes: &[u8]) -> String {
    hex::encode_upper(Sha1::digest(bytes))
}

pub fn write_file(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    File::create(path).unwrap().write_all(bytes).unwrap();
}

// ── Bundles ─────────────────────────────────────────────────────────────────

pub fn manifest(url: &str, hash: &str) -> String {
    format!("launch.mainClass={MAIN_CLASS}\nserverJarUrl={url}\nserverJarHash={hash}\n")
}

/// A launcher bundle shaped like the real one, with `entry` linked as the
/// loader's entry class.
pub fn bundle(
    manifest: Option<&str>,
    entry: fn(&HostRuntime, Vec<String>) -> Result<(), BoxError>,
) -> LauncherBundle {
    let bundle = LauncherBundle::new("/opt/launcher/bundle-server-launcher")
        .with_linked(MAIN_CLASS, Component::Entry(entry))
        .with_linked(TARGET_HANDLER_CLASS, Component::Handler(fake_handler))
        .with_linked(
            TARGET_PROVIDER_CLASS,
            Component::Provider(ProviderClass {
                construct: fake_provider,
                remove_file_system_runnable: Some(MemoryProvider::remove_file_system_runnable),
            }),
        )
        .with_shims();
    match manifest {
        Some(text) => bundle.with_resource(MANIFEST_RESOURCE, text.as_bytes().to_vec()),
        None => bundle,
    }
}

pub fn noop_entry(_: &HostRuntime, _: Vec<String>) -> Result<(), BoxError> {
    Ok(())
}

// ── jimfs stand-ins ─────────────────────────────────────────────────────────

pub static RELEASED: Mutex<Vec<String>> = Mutex::new(Vec::new());

#[derive(Debug)]
pub struct EchoHandler;

#[derive(Debug)]
struct EchoConnection {
    url: Url,
}

impl UrlConnection for EchoConnection {
    fn url(&self) -> &Url {
        &self.url
    }

    fn input_stream(&mut self) -> io::Result<Box<dyn Read + Send + '_>> {
        Ok(Box::new(Cursor::new(self.url.path().as_bytes().to_vec())))
    }
}

impl UrlStreamHandler for EchoHandler {
    fn open_connection(&self, url: &Url) -> io::Result<Box<dyn UrlConnection>> {
        Ok(Box::new(EchoConnection { url: url.clone() }))
    }
}

#[derive(Debug)]
pub struct MemoryFs {
    uri: Url,
}

impl FileSystem for MemoryFs {
    fn uri(&self) -> &Url {
        &self.uri
    }

    fn is_open(&self) -> bool {
        true
    }

    fn close(&self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryProvider {
    mounted: Mutex<HashMap<String, Arc<MemoryFs>>>,
}

impl MemoryProvider {
    pub fn remove_file_system_runnable(uri: &Url) -> io::Result<ReleaseHook> {
        let uri = uri.to_string();
        Ok(Box::new(move || RELEASED.lock().unwrap().push(uri)))
    }
}

impl FileSystemProvider for MemoryProvider {
    fn scheme(&self) -> &str {
        "jimfs"
    }

    fn new_file_system(&self, uri: &Url, _: &FsEnv) -> io::Result<Arc<dyn FileSystem>> {
        let fs = Arc::new(MemoryFs { uri: uri.clone() });
        self.mounted
            .lock()
            .unwrap()
            .insert(uri.to_string(), Arc::clone(&fs));
        Ok(fs)
    }

    fn file_system(&self, uri: &Url) -> io::Result<Arc<dyn FileSystem>> {
        match self.mounted.lock().unwrap().get(uri.as_str()) {
            Some(fs) => Ok(Arc::clone(fs) as Arc<dyn FileSystem>),
            None => Err(io::Error::new(io::ErrorKind::NotFound, uri.to_string())),
        }
    }

    fn path(&self, uri: &Url) -> io::Result<VfsPath> {
        let mut root = uri.clone();
        root.set_path("");
        Ok(VfsPath {
            file_system: root,
            path: uri.path().to_string(),
        })
    }

    fn new_byte_channel(&self, _: &VfsPath, _: &[OpenOption]) -> io::Result<Box<dyn ByteChannel>> {
        unsupported("newByteChannel")
    }
    fn new_directory_stream(&self, _: &VfsPath) -> io::Result<Vec<VfsPath>> {
        Ok(Vec::new())
    }
    fn create_directory(&self, _: &VfsPath) -> io::Result<()> {
        Ok(())
    }
    fn delete(&self, _: &VfsPath) -> io::Result<()> {
        Ok(())
    }
    fn copy(&self, _: &VfsPath, _: &VfsPath, _: &[CopyOption]) -> io::Result<()> {
        Ok(())
    }
    fn move_path(&self, _: &VfsPath, _: &VfsPath, _: &[CopyOption]) -> io::Result<()> {
        Ok(())
    }
    fn is_same_file(&self, a: &VfsPath, b: &VfsPath) -> io::Result<bool> {
        Ok(a == b)
    }
    fn is_hidden(&self, _: &VfsPath) -> io::Result<bool> {
        Ok(false)
    }
    fn file_store(&self, _: &VfsPath) -> io::Result<FileStore> {
        Ok(FileStore {
            name: "memory".into(),
            kind: "jimfs".into(),
        })
    }
    fn check_access(&self, _: &VfsPath, _: &[AccessMode]) -> io::Result<()> {
        Ok(())
    }
    fn file_attribute_view(&self, _: &VfsPath, _: &str) -> io::Result<BTreeMap<String, AttributeValue>> {
        Ok(BTreeMap::new())
    }
    fn read_attributes(&self, _: &VfsPath) -> io::Result<BasicAttributes> {
        Ok(BasicAttributes {
            size: 0,
            is_directory: true,
            is_regular_file: false,
        })
    }
    fn read_attributes_map(&self, _: &VfsPath, _: &str) -> io::Result<BTreeMap<String, AttributeValue>> {
        Ok(BTreeMap::new())
    }
    fn set_attribute(&self, _: &VfsPath, _: &str, _: AttributeValue) -> io::Result<()> {
        Ok(())
    }
}

fn fake_handler() -> Box<dyn UrlStreamHandler> {
    Box::new(EchoHandler)
}

fn fake_provider() -> Box<dyn FileSystemProvider> {
    Box::new(MemoryProvider::default())
}
