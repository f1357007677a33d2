use std::path::Path;

use futures_util::StreamExt;
use reqwest::{Client, Url};
use tempfile::NamedTempFile;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::build_http_client;

/// Streams a single artifact to disk.
pub struct ArtifactDownloader {
    client: Client,
}

impl ArtifactDownloader {
    pub fn new() -> LauncherResult<Self> {
        Ok(Self::with_client(build_http_client()?))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Download `url` to `dest`, returning the number of bytes written.
    ///
    /// The body goes to a temporary file next to `dest`, which is renamed
    /// over `dest` only once fully written. On failure `dest` is untouched.
    pub async fn download(&self, url: &Url, dest: &Path) -> LauncherResult<u64> {
        let io_error = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| LauncherError::Io { path, source }
        };

        let parent = match dest.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(io_error(parent))?;

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // Dropped without persisting on any early return, which deletes it.
        let part = NamedTempFile::new_in(parent).map_err(io_error(parent))?;
        let mut out = File::from_std(part.reopen().map_err(io_error(part.path()))?);
        let mut written = 0u64;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            out.write_all(&chunk).await.map_err(io_error(part.path()))?;
            written += chunk.len() as u64;
        }
        out.flush().await.map_err(io_error(part.path()))?;
        out.sync_all().await.map_err(io_error(part.path()))?;
        drop(out);

        part.persist(dest)
            .map_err(|e| LauncherError::Io {
                path: dest.to_path_buf(),
                source: e.error,
            })?;

        debug!("Downloaded {} bytes: {} -> {:?}", written, url, dest);
        Ok(written)
    }
}
