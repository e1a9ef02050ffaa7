use std::path::{Path, PathBuf};

use axum::extract::Multipart;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::AppError;

pub const MAX_PHOTO_BYTES: usize = 20 * 1024 * 1024;

/// A photo received from a child's device, with optional capture metadata.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub bytes: Bytes,
    pub content_type: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub taken_at: Option<DateTime<Utc>>,
}

impl PhotoUpload {
    pub fn new(bytes: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into(),
            latitude: None,
            longitude: None,
            taken_at: None,
        }
    }

    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut photo: Option<(Bytes, String)> = None;
        let mut latitude = None;
        let mut longitude = None;
        let mut taken_at = None;

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or("").to_string();
            match name.as_str() {
                "photo" | "file" => {
                    let content_type = field.content_type().unwrap_or("").to_string();
                    let bytes = field.bytes().await?;
                    photo = Some((bytes, content_type));
                }
                "latitude" => latitude = Some(parse_field(&name, &field.text().await?)?),
                "longitude" => longitude = Some(parse_field(&name, &field.text().await?)?),
                "taken_at" => {
                    let text = field.text().await?;
                    let parsed = DateTime::parse_from_rfc3339(text.trim()).map_err(|_| {
                        AppError::bad_request("taken_at must be an RFC 3339 timestamp")
                    })?;
                    taken_at = Some(parsed.with_timezone(&Utc));
                }
                _ => {}
            }
        }

        let (bytes, content_type) =
            photo.ok_or_else(|| AppError::bad_request("No photo field in upload"))?;
        Ok(Self {
            bytes,
            content_type,
            latitude,
            longitude,
            taken_at,
        })
    }

    pub fn is_image(&self) -> bool {
        self.content_type
            .parse::<mime::Mime>()
            .map(|m| m.type_() == mime::IMAGE)
            .unwrap_or(false)
    }

    pub fn sha256_hex(&self) -> String {
        hex::encode(Sha256::digest(&self.bytes))
    }
}

fn parse_field(name: &str, text: &str) -> Result<f64, AppError> {
    text.trim()
        .parse()
        .map_err(|_| AppError::bad_request(format!("{name} must be a decimal number")))
}

/// `jpg` for JPEG content types, `png` for everything else.
pub fn extension_for(content_type: &str) -> &'static str {
    let lower = content_type.to_ascii_lowercase();
    if lower.contains("jpeg") || lower.contains("jpg") {
        "jpg"
    } else {
        "png"
    }
}

/// Stores submitted photos under a single directory.
#[derive(Debug, Clone)]
pub struct PhotoStorage {
    dir: PathBuf,
}

impl PhotoStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `{activity_id}_{child_id}_{random}.{ext}` and returns its path.
    pub async fn save(
        &self,
        activity_id: i64,
        child_id: i64,
        upload: &PhotoUpload,
    ) -> anyhow::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let random = Uuid::new_v4().simple().to_string();
        let filename = format!(
            "{}_{}_{}.{}",
            activity_id,
            child_id,
            &random[..12],
            extension_for(&upload.content_type)
        );
        let path = self.dir.join(filename);
        tokio::fs::write(&path, &upload.bytes).await?;
        Ok(path)
    }

    /// Best effort; failures are logged.
    pub async fn remove(&self, path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            tracing::warn!("Failed to remove photo {}: {}", path.display(), e);
        }
    }
}
