use std::path::Path;

use base64::Engine as _;
use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::model::FramePayload;

/// A paused preview of a section's video from which stills can be taken.
///
/// A surface with zero dimensions has not decoded a frame yet and must
/// not be snapshotted.
pub trait PreviewSurface {
    fn dimensions(&self) -> (u32, u32);
    fn position_seconds(&self) -> f64;
    fn snapshot(&self) -> Result<Vec<u8>>;
}

/// A still image taken from a section preview, used as visual context
/// for a fix request. Ephemeral; lives only in the workbench's pending
/// list until the fix is submitted or the user discards it.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub timestamp_seconds: f64,
    pub captured_at: DateTime<Utc>,
    pub image: Vec<u8>,
}

impl CapturedFrame {
    pub fn payload(&self) -> FramePayload {
        FramePayload {
            timestamp_seconds: self.timestamp_seconds,
            image_base64: base64::engine::general_purpose::STANDARD.encode(&self.image),
        }
    }
}

/// File-backed surface for the CLI: a still exported from the preview
/// player (PNG or JPEG), paired with the timestamp it was taken at.
#[derive(Debug, Clone)]
pub struct StillImageSurface {
    width: u32,
    height: u32,
    position_seconds: f64,
    bytes: Vec<u8>,
}

impl StillImageSurface {
    pub fn open(path: &Path, position_seconds: f64) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|err| {
            Error::InvalidRequest(format!("read frame image {}: {err}", path.display()))
        })?;
        let decoded = image::load_from_memory(&bytes).map_err(|err| {
            Error::InvalidRequest(format!("decode frame image {}: {err}", path.display()))
        })?;

        Ok(Self {
            width: decoded.width(),
            height: decoded.height(),
            position_seconds,
            bytes,
        })
    }
}

impl PreviewSurface for StillImageSurface {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn position_seconds(&self) -> f64 {
        self.position_seconds
    }

    fn snapshot(&self) -> Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}
