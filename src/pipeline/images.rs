use crate::app::ports::HttpClientPort;
use crate::constants::{normalize_main_site, DEFAULT_IMAGE_NAME};
use crate::error::{ImportError, Result};
use crate::gateway::ImageStore;
use crate::parser::slugify;
use crate::storage::Storage;
use crate::types::Image;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Content-addressed image persistence: identical bytes map to one row and one file.
pub struct ImageStorage {
    storage: Arc<dyn Storage>,
    files: ImageStore,
}

impl ImageStorage {
    pub fn new(storage: Arc<dyn Storage>, files: ImageStore) -> Self {
        Self { storage, files }
    }

    pub async fn store_from_binary(&self, bytes: &[u8], original_name: &str) -> Result<Image> {
        let crc = checksum(bytes);

        if crc != 0 {
            if let Some(existing) = self.storage.find_image_by_crc32(crc).await? {
                debug!("Reusing image {} (crc32 {})", existing.name, crc);
                self.ensure_file_exists(&existing, bytes)?;
                return Ok(existing);
            }
        }

        let (base, extension) = split_file_name(original_name);
        let base = match slugify(base) {
            slug if slug.is_empty() => "image".to_string(),
            slug => slug,
        };
        let mut name = format!("{base}.{extension}");
        if self.storage.image_name_exists(&name).await? {
            name = format!("{base}-{crc}.{extension}");
        }

        self.files.write(&name, bytes)?;
        let image = self.storage.create_image(&name, crc).await?;
        info!("Stored new image {} ({} bytes)", image.name, bytes.len());
        Ok(image)
    }

    /// Rewrite the file of a known image if it vanished from disk.
    fn ensure_file_exists(&self, image: &Image, bytes: &[u8]) -> Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        if self.files.write_if_missing(&image.name, bytes)? {
            warn!("Restored missing file for image {}", image.name);
        }
        Ok(())
    }
}

/// CRC32 (IEEE) of the content; empty content has checksum 0.
pub fn checksum(bytes: &[u8]) -> u32 {
    if bytes.is_empty() {
        0
    } else {
        crc32fast::hash(bytes)
    }
}

/// Split a file name into its stem and lowercase extension (default `jpg`).
fn split_file_name(name: &str) -> (&str, String) {
    let extension_of = |ext: &str| {
        let ext: String = ext
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        if ext.is_empty() {
            "jpg".to_string()
        } else {
            ext
        }
    };
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, extension_of(ext)),
        _ => (name, "jpg".to_string()),
    }
}

/// Downloads event pictures and hands them to [`ImageStorage`].
pub struct ImageResolver {
    http: Arc<dyn HttpClientPort>,
    images: ImageStorage,
    main_site: String,
    timeout: Duration,
}

impl ImageResolver {
    pub fn new(
        http: Arc<dyn HttpClientPort>,
        images: ImageStorage,
        main_site: &str,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            images,
            main_site: normalize_main_site(main_site),
            timeout,
        }
    }

    pub async fn resolve(&self, image_path: &str) -> Result<Image> {
        let url = self.normalize_url(image_path);
        let bytes = self.download(&url).await?;
        let original_name = original_name(&url);
        self.images.store_from_binary(&bytes, &original_name).await
    }

    /// Absolute URLs pass through; relative paths hang off the main site.
    pub fn normalize_url(&self, path: &str) -> String {
        let path = path.trim();
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.main_site, path.trim_start_matches('/'))
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self
            .http
            .get(url, self.timeout)
            .await
            .map_err(|message| ImportError::Transport {
                url: url.to_string(),
                message,
            })?;

        if !resp.is_success() {
            return Err(ImportError::Download {
                url: url.to_string(),
                status: resp.status,
            });
        }
        if resp.bytes.is_empty() {
            return Err(ImportError::EmptyImage {
                url: url.to_string(),
            });
        }
        Ok(resp.bytes)
    }
}

/// Last path segment of `url`, or the generic name when it has no extension.
fn original_name(url: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or_default();
    let segment = without_query.rsplit('/').next().unwrap_or_default();
    let decoded = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());
    if decoded.is_empty() || !decoded.contains('.') {
        DEFAULT_IMAGE_NAME.to_string()
    } else {
        decoded
    }
}
