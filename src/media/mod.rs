pub mod encode;

use crate::config::MediaConfig;
use crate::errors::{RelayError, RelayResult};
use crate::utils::safe_filename;
use async_trait::async_trait;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Image types the relay forwards for analysis.
pub const SUPPORTED_MEDIA_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

pub fn is_supported_media_type(media_type: &str) -> bool {
    SUPPORTED_MEDIA_TYPES.contains(&media_type)
}

/// Map a supported media type to its file extension (with the leading dot).
/// Unknown types map to an empty extension.
pub fn extension_for_media_type(media_type: &str) -> &'static str {
    match media_type {
        "image/jpeg" => ".jpg",
        "image/png" => ".png",
        "image/webp" => ".webp",
        _ => "",
    }
}

/// Extension of the last path segment of `url`, if it has one.
fn url_extension(url: &str) -> Option<String> {
    let path = url::Url::parse(url).map_or_else(|_| url.to_string(), |u| u.path().to_string());
    let name = path.rsplit('/').next()?;
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(format!(".{ext}"))
}

/// The URL's own extension wins; otherwise fall back to the media type table.
pub fn resolve_extension(url: &str, media_type: &str) -> String {
    url_extension(url).unwrap_or_else(|| extension_for_media_type(media_type).to_string())
}

/// Retrieves remote attachments into local storage.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Download `url` and persist it under `id`, returning the local path.
    async fn fetch(&self, url: &str, id: &str, media_type: &str) -> RelayResult<PathBuf>;

    /// Called once the stored file has been consumed.
    async fn discard(&self, _path: &Path) {}
}

/// Media directory on the local filesystem, shared by all requests.
///
/// Files are keyed by platform message id, so concurrent requests never
/// write the same file.
pub struct MediaStore {
    dir: PathBuf,
    keep_files: bool,
    max_bytes: u64,
    client: Client,
}

impl MediaStore {
    pub fn new(config: &MediaConfig) -> Self {
        Self::with_client(
            config,
            crate::utils::http::client_with_timeouts(10, config.timeout_secs),
        )
    }

    pub fn with_client(config: &MediaConfig, client: Client) -> Self {
        Self {
            dir: PathBuf::from(&config.dir),
            keep_files: config.keep_files,
            max_bytes: config.max_bytes,
            client,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_path(&self, id: &str, ext: &str) -> PathBuf {
        let mut name = safe_filename(id);
        if name.is_empty() {
            name = format!(
                "unnamed-{}",
                chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
            );
        }
        self.dir.join(format!("{name}{ext}"))
    }

    /// Remove stored files whose modification time is older than `max_age`.
    /// Returns the number of files removed.
    pub async fn prune_older_than(&self, max_age: Duration) -> RelayResult<usize> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(RelayError::io("reading media directory", e)),
        };

        let now = SystemTime::now();
        let mut removed = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| RelayError::io("reading media directory", e))?
        {
            let Ok(meta) = entry.metadata().await else {
                continue;
            };
            if !meta.is_file() {
                continue;
            }
            let age = meta
                .modified()
                .ok()
                .and_then(|m| now.duration_since(m).ok())
                .unwrap_or_default();
            if age > max_age {
                match tokio::fs::remove_file(entry.path()).await {
                    Ok(()) => removed += 1,
                    Err(e) => warn!("failed to prune {}: {}", entry.path().display(), e),
                }
            }
        }

        if removed > 0 {
            info!("pruned {} media file(s) from {}", removed, self.dir.display());
        }
        Ok(removed)
    }

    async fn download_to(&self, mut resp: reqwest::Response, path: &Path) -> RelayResult<u64> {
        let mut file = tokio::fs::File::create(path)
            .await
            .map_err(|e| RelayError::io("creating media file", e))?;

        let mut written: u64 = 0;
        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| RelayError::io("reading media body", e))?
        {
            written += chunk.len() as u64;
            if written > self.max_bytes {
                return Err(RelayError::Io(format!(
                    "media too large: more than {} bytes",
                    self.max_bytes
                )));
            }
            file.write_all(&chunk)
                .await
                .map_err(|e| RelayError::io("writing media file", e))?;
        }
        file.flush()
            .await
            .map_err(|e| RelayError::io("writing media file", e))?;
        Ok(written)
    }
}

#[async_trait]
impl MediaFetcher for MediaStore {
    async fn fetch(&self, url: &str, id: &str, media_type: &str) -> RelayResult<PathBuf> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RelayError::io("downloading media", e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RelayError::Io(format!(
                "downloading media: unexpected status {}",
                status.as_u16()
            )));
        }
        if let Some(len) = resp.content_length()
            && len > self.max_bytes
        {
            return Err(RelayError::Io(format!(
                "media too large: Content-Length {} exceeds limit {}",
                len, self.max_bytes
            )));
        }

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| RelayError::io("creating media directory", e))?;

        let path = self.file_path(id, &resolve_extension(url, media_type));
        match self.download_to(resp, &path).await {
            Ok(bytes) => {
                debug!("stored {} bytes of media at {}", bytes, path.display());
                Ok(path)
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&path).await;
                Err(e)
            }
        }
    }

    async fn discard(&self, path: &Path) {
        if self.keep_files {
            return;
        }
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!("failed to remove media file {}: {}", path.display(), e);
        }
    }
}
