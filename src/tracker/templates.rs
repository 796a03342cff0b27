//! Reference templates for the career-profile icon classifier.

use std::path::Path;

use anyhow::{Context, Result};
use image::RgbaImage;

/// The two shipped icon references. "blurred" is the icon under a menu
/// overlay, "active" the alternate skin the icon takes on the career
/// profile screen. These two are the whole template family: a third skin
/// is not recognized, and a blur match is indistinguishable from the
/// blurred-menu case by construction.
pub struct IconTemplates {
    pub blurred: RgbaImage,
    pub active: RgbaImage,
}

impl IconTemplates {
    /// Load `icon-blurred.png` and `icon-active.png` from a template
    /// directory.
    pub fn load(dir: &Path) -> Result<Self> {
        Ok(Self {
            blurred: load_template(&dir.join("icon-blurred.png"))?,
            active: load_template(&dir.join("icon-active.png"))?,
        })
    }

    pub fn from_images(blurred: RgbaImage, active: RgbaImage) -> Self {
        Self { blurred, active }
    }
}

fn load_template(path: &Path) -> Result<RgbaImage> {
    let img = image::open(path)
        .with_context(|| format!("Failed to load icon template {}", path.display()))?;
    Ok(img.to_rgba8())
}
