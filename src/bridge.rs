//! Host-platform collaborator seams.
//!
//! Window enumeration/capture and OCR are supplied by the embedding
//! application (platform bridges, permission handling and all). The core
//! only sees these two traits; both are synchronous and are dispatched
//! through `spawn_blocking` by callers that run on the async loop.

use anyhow::Result;
use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// Geometry and identity of the tracked window at one instant.
///
/// Recomputed on every poll tick; never cached across ticks except as the
/// previous value for transition detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowSnapshot {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub title: String,
    pub app_name: String,
    pub visible: bool,
}

impl WindowSnapshot {
    /// True when position, size or visibility differs from `other`.
    pub fn geometry_differs(&self, other: &WindowSnapshot) -> bool {
        self.x != other.x
            || self.y != other.y
            || self.width != other.width
            || self.height != other.height
            || self.visible != other.visible
    }
}

/// Locates and captures the target window. The title filter is fixed when
/// the backend is constructed.
pub trait WindowBackend: Send + Sync {
    /// Returns `None` when the target window is not currently present.
    fn locate_window(&self) -> Result<Option<WindowSnapshot>>;

    /// Full-window RGBA capture of the target window.
    fn capture_window(&self) -> Result<RgbaImage>;
}

/// Text recognition over a captured image region.
pub trait OcrEngine: Send + Sync {
    fn recognize_text(&self, image: &RgbaImage, language: &str) -> Result<String>;
}
