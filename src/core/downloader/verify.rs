use std::path::Path;

use sha1::{Digest, Sha1};
use tokio::io::AsyncReadExt;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::hex::Sha1Digest;

const CHUNK_SIZE: usize = 64 * 1024;

/// SHA-1 of the file at `path`, read in fixed-size chunks.
pub async fn sha1_file(path: &Path) -> LauncherResult<Sha1Digest> {
    let io_error = |source: std::io::Error| {
        if source.kind() == std::io::ErrorKind::NotFound {
            LauncherError::ArtifactNotFound {
                path: path.to_path_buf(),
            }
        } else {
            LauncherError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    };

    let mut file = tokio::fs::File::open(path).await.map_err(io_error)?;
    let mut hasher = Sha1::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let read = file.read(&mut buf).await.map_err(io_error)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }

    Ok(Sha1Digest::from_bytes(hasher.finalize().to_vec()))
}

/// Check the file at `path` against `expected`.
pub async fn verify(path: &Path, expected: &Sha1Digest) -> LauncherResult<()> {
    let found = sha1_file(path).await?;
    if &found != expected {
        return Err(LauncherError::DigestMismatch {
            path: path.to_path_buf(),
            expected: expected.to_string(),
            found: found.to_string(),
        });
    }
    Ok(())
}
