//! Image loader: slide registry access, raster decoding, and load tickets.
//!
//! A load is issued for a [`LoadTicket`] handed out by
//! [`crate::engine::EngineCore::set_active_slide`]. The ticket travels with the
//! result in a [`LoadCompletion`], so the engine can tell whether the result
//! still belongs to the active slide when it arrives. There is no cancellation:
//! a stale completion is ignored when it comes back.
//!
//! ERROR HANDLING
//! ==============
//! Fetch and decode failures are returned as [`LoadError`] inside the
//! completion. The engine absorbs them (draws no base image) and logs them;
//! nothing here panics or retries.

#[cfg(test)]
#[path = "loader_test.rs"]
mod loader_test;

use std::fmt;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::ViewerConfig;
use crate::viewport::Size;

// =============================================================================
// IDENTIFIERS AND METADATA
// =============================================================================

/// Opaque, registry-issued slide identifier.
///
/// The registry reports ids as JSON numbers; both numbers and strings are
/// accepted and kept in their decimal/text form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SlideId(String);

impl SlideId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SlideId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl<'de> Deserialize<'de> for SlideId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => Self(s),
            RawId::Number(n) => Self(n.to_string()),
        })
    }
}

/// Slide metadata as served by `GET /api/slides/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideMeta {
    pub id: SlideId,
    #[serde(default)]
    pub original_filename: String,
    #[serde(default)]
    pub scanner_type: Option<String>,
    #[serde(default)]
    pub stain_type: Option<String>,
    /// Full-resolution width in pixels (not the thumbnail's).
    #[serde(default)]
    pub width: Option<u32>,
    /// Full-resolution height in pixels (not the thumbnail's).
    #[serde(default)]
    pub height: Option<u32>,
    /// Pyramid level count.
    #[serde(default)]
    pub levels: Option<u32>,
    /// Microns per pixel, horizontal.
    #[serde(default)]
    pub mpp_x: Option<f64>,
    /// Microns per pixel, vertical.
    #[serde(default)]
    pub mpp_y: Option<f64>,
    /// Processing status (`uploaded`, `processing`, `ready`, `error`).
    #[serde(default)]
    pub status: Option<String>,
}

impl SlideMeta {
    /// `"W × H"` when both dimensions are known, otherwise `"N/A"`.
    #[must_use]
    pub fn dimensions_label(&self) -> String {
        match (self.width, self.height) {
            (Some(w), Some(h)) => format!("{w} × {h}"),
            _ => "N/A".to_owned(),
        }
    }
}

// =============================================================================
// DECODED RASTER
// =============================================================================

/// A decoded RGBA8 raster ready for positioned drawing.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageSurface {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA bytes, `width * height * 4` long.
    pub pixels: Vec<u8>,
}

impl ImageSurface {
    /// Natural size of the raster.
    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }
}

impl fmt::Debug for ImageSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// Decode encoded image bytes (PNG, JPEG, TIFF, WebP) into an RGBA surface.
///
/// # Errors
///
/// Returns [`LoadError::Decode`] if the bytes are corrupt or in an unsupported format.
pub fn decode_image(bytes: &[u8]) -> Result<ImageSurface, LoadError> {
    let decoded = image::load_from_memory(bytes).map_err(|e| LoadError::Decode(e.to_string()))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(ImageSurface { width, height, pixels: rgba.into_raw() })
}

// =============================================================================
// TICKETS
// =============================================================================

/// Identifies one slide activation. Loads are issued for, and matched against, a ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    /// Slide the load was issued for.
    pub slide: SlideId,
    /// Activation counter; bumps on every activation, including re-activating the same slide.
    pub generation: u64,
}

/// The result of one load, tagged with the ticket it was issued for.
#[derive(Debug, Clone)]
pub struct LoadCompletion {
    pub ticket: LoadTicket,
    pub result: Result<ImageSurface, LoadError>,
}

/// A raster that has been accepted by the engine for the active slide.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub ticket: LoadTicket,
    pub surface: ImageSurface,
}

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced while fetching or decoding a slide.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    /// The request to the registry failed before a response arrived.
    #[error("slide fetch failed: {0}")]
    Fetch(String),

    /// The registry answered with a non-success HTTP status.
    #[error("slide registry responded with status {status}")]
    Status { status: u16 },

    /// The raster bytes could not be decoded.
    #[error("slide image decode failed: {0}")]
    Decode(String),

    /// The metadata response body could not be deserialized.
    #[error("slide metadata parse failed: {0}")]
    Metadata(String),
}

impl LoadError {
    /// Whether the failure happened while fetching (as opposed to decoding).
    #[must_use]
    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch(_) | Self::Status { .. })
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Source of slide metadata and raster bytes. Enables mocking in tests.
#[async_trait::async_trait(?Send)]
pub trait SlideRegistry {
    /// Fetch metadata for a slide.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] if the request fails or the body is malformed.
    async fn slide(&self, id: &SlideId) -> Result<SlideMeta, LoadError>;

    /// Fetch the encoded raster for a slide.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] if the request fails or the status is not a success.
    async fn image_bytes(&self, id: &SlideId) -> Result<Vec<u8>, LoadError>;
}

/// [`SlideRegistry`] backed by the registry's REST API.
pub struct HttpSlideRegistry {
    http: reqwest::Client,
    base_url: String,
}

impl HttpSlideRegistry {
    /// Build a client for the registry named in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Fetch`] if the HTTP client cannot be constructed.
    pub fn new(config: &ViewerConfig) -> Result<Self, LoadError> {
        let builder = reqwest::Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs));
        let http = builder
            .build()
            .map_err(|e| LoadError::Fetch(format!("http client build failed: {e}")))?;
        Ok(Self { http, base_url: config.registry_base_url.clone() })
    }

    async fn get(&self, url: Url) -> Result<reqwest::Response, LoadError> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| LoadError::Fetch(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(LoadError::Status { status: status.as_u16() });
        }
        Ok(resp)
    }
}

#[async_trait::async_trait(?Send)]
impl SlideRegistry for HttpSlideRegistry {
    async fn slide(&self, id: &SlideId) -> Result<SlideMeta, LoadError> {
        let resp = self.get(slide_endpoint(&self.base_url, id)?).await?;
        resp.json::<SlideMeta>()
            .await
            .map_err(|e| LoadError::Metadata(e.to_string()))
    }

    async fn image_bytes(&self, id: &SlideId) -> Result<Vec<u8>, LoadError> {
        let resp = self.get(thumbnail_endpoint(&self.base_url, id)?).await?;
        let bytes = resp.bytes().await.map_err(|e| LoadError::Fetch(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

fn slide_endpoint(base_url: &str, id: &SlideId) -> Result<Url, LoadError> {
    registry_url(base_url, &["api", "slides", id.as_str()])
}

fn thumbnail_endpoint(base_url: &str, id: &SlideId) -> Result<Url, LoadError> {
    registry_url(base_url, &["api", "slides", id.as_str(), "thumbnail"])
}

/// Append path segments to the registry base. Each segment is percent-encoded,
/// so a slide id can never add segments, a query or a fragment.
fn registry_url(base_url: &str, segments: &[&str]) -> Result<Url, LoadError> {
    let mut url =
        Url::parse(base_url).map_err(|e| LoadError::Fetch(format!("invalid registry url {base_url:?}: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| LoadError::Fetch(format!("registry url {base_url:?} cannot take a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

// =============================================================================
// LOADER
// =============================================================================

/// Fetches and decodes the raster for a ticket.
pub struct ImageLoader<R> {
    registry: R,
}

impl<R: SlideRegistry> ImageLoader<R> {
    #[must_use]
    pub fn new(registry: R) -> Self {
        Self { registry }
    }

    /// The underlying registry, for metadata lookups.
    #[must_use]
    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Fetch and decode the raster for `ticket`. Never fails outright: the
    /// outcome is carried in the completion.
    pub async fn load(&self, ticket: LoadTicket) -> LoadCompletion {
        tracing::debug!(slide = %ticket.slide, generation = ticket.generation, "fetching slide raster");
        let result = match self.registry.image_bytes(&ticket.slide).await {
            Ok(bytes) => decode_image(&bytes),
            Err(e) => Err(e),
        };
        LoadCompletion { ticket, result }
    }
}
