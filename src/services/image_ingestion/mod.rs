pub mod orientation;

use crate::api::error::{AppError, messages};
use crate::infrastructure::storage::IMAGES_FOLDER;
use crate::services::storage::FileStorage;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, ImageFormat};
use orientation::Rotation;
use std::io::Cursor;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};

const JPEG_QUALITY: u8 = 75;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("payload has no media type header")]
    InvalidMetadata,

    #[error("unsupported extension: {0}")]
    UnsupportedExtension(String),

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("storage failed: {0}")]
    Io(#[from] anyhow::Error),
}

impl From<IngestError> for AppError {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::InvalidMetadata => AppError::bad_request(messages::INVALID_METADATA),
            IngestError::UnsupportedExtension(_) => {
                AppError::bad_request(messages::INVALID_IMAGE_EXTENSION)
            }
            IngestError::Decode(_) | IngestError::Io(_) => {
                error!("Image ingestion failed: {}", e);
                AppError::unexpected()
            }
        }
    }
}

/// True for payloads that are already public URLs.
pub fn is_url(payload: &str) -> bool {
    let lower = payload.trim_start().to_ascii_lowercase();
    lower.starts_with("http:") || lower.starts_with("https:")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pipeline {
    Image,
    Raw,
}

fn pipeline_for(extension: &str) -> Option<Pipeline> {
    match extension {
        "png" | "jpg" | "jpeg" | "webp" => Some(Pipeline::Image),
        "pdf" | "mp4" => Some(Pipeline::Raw),
        _ => None,
    }
}

/// A `type/subtype;base64,<data>` payload split into subtype and encoded body.
#[derive(Debug, PartialEq, Eq)]
struct DataUri<'a> {
    subtype: String,
    body: &'a str,
}

impl<'a> DataUri<'a> {
    fn parse(payload: &'a str) -> Result<Self, IngestError> {
        if !(payload.contains(':') && payload.contains(';') && payload.contains(',')) {
            return Err(IngestError::InvalidMetadata);
        }

        let (header, body) = payload
            .split_once(',')
            .ok_or(IngestError::InvalidMetadata)?;
        let slash = header.find('/').ok_or(IngestError::InvalidMetadata)?;
        let semicolon = header.find(';').ok_or(IngestError::InvalidMetadata)?;
        if semicolon <= slash {
            return Err(IngestError::InvalidMetadata);
        }

        Ok(Self {
            subtype: header[slash + 1..semicolon].trim().to_ascii_lowercase(),
            body,
        })
    }

    /// Line breaks inside the body are ignored.
    fn decode(&self) -> Result<Vec<u8>, IngestError> {
        let body: String = self
            .body
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        STANDARD
            .decode(body)
            .map_err(|e| IngestError::Decode(e.to_string()))
    }
}

/// Storage location of a file previously returned as `url`, if it is one of ours.
pub fn stored_path_for_url(url: &str, domain: &str) -> Option<String> {
    let without_query = url.split(['?', '#']).next().unwrap_or_default();
    let relative = without_query
        .strip_prefix(domain)?
        .strip_prefix('/')?
        .trim_start_matches('/');
    if relative.is_empty() {
        return None;
    }

    let extension = relative.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match extension.as_deref().and_then(pipeline_for) {
        Some(Pipeline::Raw) => Some(relative.to_string()),
        _ => Some(format!("{}/{}", IMAGES_FOLDER, relative)),
    }
}

/// Turns data-URI payloads into stored files and public URLs.
pub struct ImageIngestion {
    storage: Arc<dyn FileStorage>,
    domain: String,
}

impl ImageIngestion {
    pub fn new(storage: Arc<dyn FileStorage>, domain: String) -> Self {
        Self { storage, domain }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Stores `payload` at `destination` (relative, no extension) and returns its URL.
    /// URL payloads are returned unchanged.
    pub async fn ingest(&self, payload: &str, destination: &str) -> Result<String, IngestError> {
        let payload = payload.trim();
        if is_url(payload) {
            return Ok(payload.to_string());
        }

        let data_uri = DataUri::parse(payload)?;
        let pipeline = pipeline_for(&data_uri.subtype)
            .ok_or_else(|| IngestError::UnsupportedExtension(data_uri.subtype.clone()))?;

        let destination = destination.trim_start_matches('/');
        let file_name = format!("{}.{}", destination, data_uri.subtype);
        let bytes = data_uri.decode()?;

        match pipeline {
            Pipeline::Raw => self.save_file(&file_name, &bytes).await?,
            Pipeline::Image => {
                self.save_image(&file_name, &data_uri.subtype, &bytes)
                    .await?
            }
        }

        Ok(format!("{}/{}", self.domain, file_name))
    }

    async fn save_file(&self, file_name: &str, bytes: &[u8]) -> Result<(), IngestError> {
        self.replace(file_name, bytes).await
    }

    async fn save_image(
        &self,
        file_name: &str,
        extension: &str,
        bytes: &[u8],
    ) -> Result<(), IngestError> {
        let path = format!("{}/{}", IMAGES_FOLDER, file_name);

        // webp is stored as received
        if extension == "webp" {
            return self.replace(&path, bytes).await;
        }

        let img = image::load_from_memory(bytes).map_err(|e| IngestError::Decode(e.to_string()))?;
        self.replace(&path, &encode(&img, extension)?).await?;

        let orientation = orientation::read_orientation(bytes);
        if let Some(rotation) = Rotation::from_orientation(orientation) {
            debug!("Correcting orientation {} of {}", orientation, path);
            let written = self.storage.read(&path).await?;
            let img = image::load_from_memory(&written)
                .map_err(|e| IngestError::Decode(e.to_string()))?;
            let rotated = orientation::rotate(&img, rotation);
            self.storage.write(&path, &encode(&rotated, extension)?).await?;
        }

        Ok(())
    }

    /// Deletes whatever is at `path`, makes sure its folder exists, then writes.
    async fn replace(&self, path: &str, bytes: &[u8]) -> Result<(), IngestError> {
        self.storage.delete_path(path).await?;
        if let Some((parent, _)) = path.rsplit_once('/') {
            self.storage.create_folder_if_not_exists(parent).await?;
        }
        self.storage.write(path, bytes).await?;
        Ok(())
    }
}

fn encode(img: &DynamicImage, extension: &str) -> Result<Vec<u8>, IngestError> {
    let mut out = Vec::new();

    match extension {
        "jpg" | "jpeg" => {
            let rgb = img.to_rgb8();
            JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
                .encode(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)
                .map_err(|e| IngestError::Decode(e.to_string()))?;
        }
        "png" => {
            img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
                .map_err(|e| IngestError::Decode(e.to_string()))?;
        }
        other => return Err(IngestError::UnsupportedExtension(other.to_string())),
    }

    Ok(out)
}
