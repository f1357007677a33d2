use std::path::Path;

use reqwest::Url;
use tracing::{info, warn};

use super::client::ArtifactDownloader;
use super::verify::verify;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::hex::Sha1Digest;

pub const MAX_DOWNLOAD_TRIES: u32 = 3;

/// Make sure `path` holds the artifact whose SHA-1 is `expected`.
///
/// An existing valid file is used as is. Otherwise the artifact is fetched
/// from `url` and re-verified, up to [`MAX_DOWNLOAD_TRIES`] times in a row.
pub async fn ensure_artifact(
    downloader: &ArtifactDownloader,
    url: &Url,
    path: &Path,
    expected: &Sha1Digest,
) -> LauncherResult<()> {
    match verify(path, expected).await {
        Ok(()) => {
            info!("Server jar at {:?} is valid", path);
            return Ok(());
        }
        Err(LauncherError::DigestMismatch {
            expected, found, ..
        }) => println!(
            "Server jar has invalid hash (expected {expected}, found {found}) attempting to download..."
        ),
        Err(LauncherError::ArtifactNotFound { .. }) => println!("Downloading server jar..."),
        Err(e) => {
            warn!("Could not read {:?}: {}", path, e);
            println!("Server jar could not be read, attempting to download...");
        }
    }

    for attempt in 1..=MAX_DOWNLOAD_TRIES {
        let result = match downloader.download(url, path).await {
            Ok(_) => verify(path, expected).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                println!("Successfully downloaded server jar!");
                return Ok(());
            }
            Err(LauncherError::DigestMismatch {
                expected, found, ..
            }) => eprintln!(
                "Downloaded server jar has invalid hash (expected {expected}, found {found})"
            ),
            Err(e) if e.is_retryable() => eprintln!("Download failed!\n{e}"),
            Err(e) => return Err(e),
        }

        if attempt < MAX_DOWNLOAD_TRIES {
            println!("Retrying... ({}/{})", attempt, MAX_DOWNLOAD_TRIES - 1);
        }
    }

    Err(LauncherError::DownloadExhausted {
        url: url.to_string(),
        path: path.to_path_buf(),
        expected: expected.to_string(),
        attempts: MAX_DOWNLOAD_TRIES,
    })
}
