//! Image hosting: where uploaded bytes end up and how they are removed again.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use sha1::{Digest, Sha1};
use thiserror::Error;

use crate::config::CloudinaryConfig;

/// File extensions and MIME subtypes accepted by the upload endpoint.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["jpeg", "jpg", "png", "gif", "webp"];

#[derive(Debug, Error)]
pub enum ImageHostError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image host request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("image host rejected the request: {0}")]
    Rejected(String),
    #[error("url is not managed by this host: {0}")]
    Foreign(String),
}

#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Stores the bytes and returns the permanent url they are served from.
    async fn upload(&self, bytes: Vec<u8>, mime: &str, ext: &str)
        -> Result<String, ImageHostError>;

    async fn delete(&self, url: &str) -> Result<(), ImageHostError>;

    /// Whether `url` points at an asset this host stored.
    fn owns(&self, url: &str) -> bool;
}

/// Best-effort removal of hosted assets after their rows are gone.
///
/// Urls the host does not own are skipped; failures are logged and swallowed.
pub async fn purge(host: &dyn ImageHost, urls: &[String]) {
    for url in urls.iter().filter(|url| host.owns(url)) {
        match host.delete(url).await {
            Ok(()) => tracing::debug!(%url, "removed hosted image"),
            Err(err) => tracing::warn!(%url, error = %err, "failed to remove hosted image"),
        }
    }
}

/// Checks the declared MIME type and the file name's extension against
/// [`ALLOWED_IMAGE_TYPES`]. Returns the normalised extension.
pub fn check_image_type(mime: &str, filename: &str) -> Option<String> {
    let subtype = mime.strip_prefix("image/")?.to_ascii_lowercase();
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())?
        .to_ascii_lowercase();
    let allowed = |value: &str| ALLOWED_IMAGE_TYPES.contains(&value);
    (allowed(&subtype) && allowed(&ext)).then_some(ext)
}

/// Writes uploads into a directory that the server exposes under
/// `public_path`.
pub struct LocalDiskHost {
    dir: PathBuf,
    public_path: String,
}

impl LocalDiskHost {
    pub fn new(dir: impl Into<PathBuf>, public_path: &str) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(LocalDiskHost {
            dir,
            public_path: public_path.trim_end_matches('/').to_string(),
        })
    }

    fn file_name<'a>(&self, url: &'a str) -> Option<&'a str> {
        let name = url
            .strip_prefix(self.public_path.as_str())?
            .strip_prefix('/')?;
        let plain = !name.is_empty() && !name.contains(['/', '\\']) && name != "..";
        plain.then_some(name)
    }
}

#[async_trait]
impl ImageHost for LocalDiskHost {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        _mime: &str,
        ext: &str,
    ) -> Result<String, ImageHostError> {
        let name = format!("{}.{ext}", uuid::Uuid::new_v4());
        tokio::fs::write(self.dir.join(&name), bytes).await?;
        Ok(format!("{}/{name}", self.public_path))
    }

    async fn delete(&self, url: &str) -> Result<(), ImageHostError> {
        let name = self
            .file_name(url)
            .ok_or_else(|| ImageHostError::Foreign(url.to_string()))?;
        tokio::fs::remove_file(self.dir.join(name)).await?;
        Ok(())
    }

    fn owns(&self, url: &str) -> bool {
        self.file_name(url).is_some()
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Deserialize)]
struct DestroyResponse {
    result: String,
}

/// Cloudinary's signed upload and destroy API.
pub struct CloudinaryHost {
    client: reqwest::Client,
    settings: CloudinaryConfig,
    api_base: String,
}

impl CloudinaryHost {
    pub fn new(settings: CloudinaryConfig) -> Self {
        let api_base = format!(
            "https://api.cloudinary.com/v1_1/{}/image",
            settings.cloud_name
        );
        CloudinaryHost {
            client: reqwest::Client::new(),
            settings,
            api_base,
        }
    }

    /// Signature over the request parameters, sorted by key, as the API
    /// expects: `sha1("a=1&b=2" + api_secret)`.
    fn sign(&self, params: &[(&str, String)]) -> String {
        let mut sorted: Vec<&(&str, String)> = params.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));
        let joined = sorted
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        let mut hasher = Sha1::new();
        hasher.update(joined.as_bytes());
        hasher.update(self.settings.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn signed_form(&self, mut params: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
        params.push(("timestamp", chrono::Utc::now().timestamp().to_string()));
        let signature = self.sign(&params);
        params.push(("signature", signature));
        params.push(("api_key", self.settings.api_key.clone()));
        params
    }
}

/// Recovers the public id from a delivery url:
/// `.../image/upload/v1712/shop/abc.jpg` becomes `shop/abc`.
pub fn cloudinary_public_id(url: &str) -> Option<String> {
    let (_, path) = url.split_once("/upload/")?;
    let path = path.split(['?', '#']).next()?;
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let is_version =
        |s: &str| s.len() > 1 && s.starts_with('v') && s[1..].bytes().all(|b| b.is_ascii_digit());
    if let Some(position) = segments.iter().position(|s| is_version(*s)) {
        segments.drain(..=position);
    } else {
        let is_transformation = |s: &str| {
            s.contains(',')
                || s.split_once('_').is_some_and(|(key, _)| {
                    (1..=3).contains(&key.len()) && key.bytes().all(|b| b.is_ascii_lowercase())
                })
        };
        while segments.len() > 1 && is_transformation(segments[0]) {
            segments.remove(0);
        }
    }
    let last = segments.pop()?;
    let stem = last.rsplit_once('.').map_or(last, |(stem, _)| stem);
    segments.push(stem);
    let id = segments.join("/");
    (!id.is_empty()).then_some(id)
}

#[async_trait]
impl ImageHost for CloudinaryHost {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        mime: &str,
        _ext: &str,
    ) -> Result<String, ImageHostError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
        let mut params = Vec::new();
        if let Some(folder) = &self.settings.folder {
            params.push(("folder", folder.clone()));
        }
        let mut form = self.signed_form(params);
        form.push(("file", format!("data:{mime};base64,{encoded}")));

        let response = self
            .client
            .post(format!("{}/upload", self.api_base))
            .form(&form)
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ImageHostError::Rejected(format!("{status}: {body}")));
        }
        let uploaded: UploadResponse = response.json().await?;
        Ok(uploaded.secure_url)
    }

    async fn delete(&self, url: &str) -> Result<(), ImageHostError> {
        let public_id =
            cloudinary_public_id(url).ok_or_else(|| ImageHostError::Foreign(url.to_string()))?;
        let form = self.signed_form(vec![("public_id", public_id)]);
        let response = self
            .client
            .post(format!("{}/destroy", self.api_base))
            .form(&form)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ImageHostError::Rejected(response.status().to_string()));
        }
        let outcome: DestroyResponse = response.json().await?;
        match outcome.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(ImageHostError::Rejected(other.to_string())),
        }
    }

    fn owns(&self, url: &str) -> bool {
        url.contains("res.cloudinary.com")
            && url.contains(&format!("/{}/", self.settings.cloud_name))
    }
}
