//! Named capture zones: rectangular sub-regions of the tracked window,
//! defined as fractions of the window dimensions and resolved against the
//! latest [`WindowSnapshot`] on every use. Resolved rects are never reused
//! across a geometry change.

use anyhow::{bail, Result};
use image::imageops;
use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::bridge::WindowSnapshot;

/// Zone used to classify the career-profile icon state.
pub const ZONE_CAREER_PROFILE_ICON: &str = "career_profile_icon";
/// Zone holding the trainee name banner.
pub const ZONE_UMAMUSUME: &str = "umamusume";
/// Zone holding the decision-prompt title line.
pub const ZONE_EVENT_TITLE: &str = "event_title";
/// Zone holding the decision-prompt source tag (trainee/support/scenario).
pub const ZONE_EVENT_TYPE: &str = "event_type";

/// Fixed pixel padding subtracted from the window height before the
/// vertical fractions apply (title bar above, ad strip below).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Padding {
    pub top: u32,
    pub bottom: u32,
}

impl Default for Padding {
    fn default() -> Self {
        Self { top: 35, bottom: 0 }
    }
}

/// One zone definition. `left` and `width` are fractions of the window
/// width; `top` and `bottom` are fractions of the height remaining after
/// padding is subtracted, measured from each edge of that inner area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneDef {
    pub name: String,
    pub left: f64,
    pub width: f64,
    pub top: f64,
    pub bottom: f64,
}

impl ZoneDef {
    pub fn new(name: &str, left: f64, width: f64, top: f64, bottom: f64) -> Self {
        Self {
            name: name.to_string(),
            left,
            width,
            top,
            bottom,
        }
    }
}

/// Axis-aligned pixel rectangle. Positions are signed so absolute rects can
/// live on any monitor arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A zone definition resolved against one snapshot: local window
/// coordinates plus the screen-absolute rect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureZone {
    pub name: String,
    pub rel: ZoneDef,
    pub local: PixelRect,
    pub abs: PixelRect,
}

/// The stock zone table for the supported game layout.
pub fn default_zones() -> Vec<ZoneDef> {
    vec![
        ZoneDef::new(ZONE_CAREER_PROFILE_ICON, 0.025, 0.06, 0.025, 0.915),
        ZoneDef::new(ZONE_UMAMUSUME, 0.25, 0.50, 0.045, 0.875),
        ZoneDef::new(ZONE_EVENT_TYPE, 0.18, 0.32, 0.175, 0.79),
        ZoneDef::new(ZONE_EVENT_TITLE, 0.18, 0.64, 0.225, 0.72),
    ]
}

/// Resolve one zone against a snapshot.
pub fn zone_rect(def: &ZoneDef, snapshot: &WindowSnapshot, padding: Padding) -> CaptureZone {
    let win_w = snapshot.width.max(0.0);
    let win_h = snapshot.height.max(0.0);
    let inner_h = (win_h - f64::from(padding.top) - f64::from(padding.bottom)).max(0.0);

    let x = (win_w * def.left).floor() as i32;
    let width = (win_w * def.width).floor().max(0.0) as u32;
    let y = padding.top as i32 + (inner_h * def.top).floor() as i32;
    let height = (inner_h * (1.0 - def.top - def.bottom)).floor().max(0.0) as u32;

    let local = PixelRect {
        x,
        y,
        width,
        height,
    };
    let abs = PixelRect {
        x: local.x + snapshot.x.round() as i32,
        y: local.y + snapshot.y.round() as i32,
        width,
        height,
    };

    CaptureZone {
        name: def.name.clone(),
        rel: def.clone(),
        local,
        abs,
    }
}

/// Resolve the full zone table against a snapshot, preserving order.
pub fn compute_zones(
    defs: &[ZoneDef],
    snapshot: &WindowSnapshot,
    padding: Padding,
) -> Vec<CaptureZone> {
    defs.iter()
        .map(|def| zone_rect(def, snapshot, padding))
        .collect()
}

/// Crop `rect` (local window coordinates) out of a window capture without
/// mutating the source. The rect is clamped to the image bounds; an empty
/// intersection is an error.
pub fn crop_zone(image: &RgbaImage, rect: PixelRect) -> Result<RgbaImage> {
    let (img_w, img_h) = image.dimensions();

    let x0 = rect.x.clamp(0, img_w as i32) as u32;
    let y0 = rect.y.clamp(0, img_h as i32) as u32;
    let x1 = (rect.x + rect.width as i32).clamp(0, img_w as i32) as u32;
    let y1 = (rect.y + rect.height as i32).clamp(0, img_h as i32) as u32;

    if x1 <= x0 || y1 <= y0 {
        bail!(
            "zone rect {:?} lies outside the {}x{} capture",
            rect,
            img_w,
            img_h
        );
    }

    Ok(imageops::crop_imm(image, x0, y0, x1 - x0, y1 - y0).to_image())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(x: f64, y: f64, w: f64, h: f64) -> WindowSnapshot {
        WindowSnapshot {
            x,
            y,
            width: w,
            height: h,
            title: "Umamusume".into(),
            app_name: "umamusume".into(),
            visible: true,
        }
    }

    #[test]
    fn zone_rect_applies_padding_and_floors() {
        let def = ZoneDef::new("band", 0.1, 0.5, 0.25, 0.25);
        let padding = Padding { top: 40, bottom: 10 };
        let zone = zone_rect(&def, &snapshot(100.0, 200.0, 801.0, 650.0), padding);

        // inner height = 650 - 40 - 10 = 600
        assert_eq!(zone.local.x, 80);
        assert_eq!(zone.local.width, 400);
        assert_eq!(zone.local.y, 40 + 150);
        assert_eq!(zone.local.height, 300);

        assert_eq!(zone.abs.x, 180);
        assert_eq!(zone.abs.y, 390);
        assert_eq!(zone.abs.width, zone.local.width);
    }

    #[test]
    fn zone_rect_clamps_degenerate_windows() {
        let def = ZoneDef::new("band", 0.1, 0.5, 0.25, 0.25);
        let zone = zone_rect(&def, &snapshot(0.0, 0.0, 0.0, 20.0), Padding::default());
        assert!(zone.local.is_empty());
    }

    #[test]
    fn compute_zones_preserves_order() {
        let defs = default_zones();
        let zones = compute_zones(&defs, &snapshot(0.0, 0.0, 900.0, 1600.0), Padding::default());
        let names: Vec<&str> = zones.iter().map(|z| z.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                ZONE_CAREER_PROFILE_ICON,
                ZONE_UMAMUSUME,
                ZONE_EVENT_TYPE,
                ZONE_EVENT_TITLE
            ]
        );
    }

    #[test]
    fn crop_zone_clamps_and_copies() {
        let mut img = RgbaImage::new(10, 10);
        img.put_pixel(9, 9, image::Rgba([1, 2, 3, 255]));

        let rect = PixelRect {
            x: 8,
            y: 8,
            width: 20,
            height: 20,
        };
        let crop = crop_zone(&img, rect).unwrap();
        assert_eq!(crop.dimensions(), (2, 2));
        assert_eq!(crop.get_pixel(1, 1), &image::Rgba([1, 2, 3, 255]));
        // Source untouched
        assert_eq!(img.get_pixel(9, 9), &image::Rgba([1, 2, 3, 255]));
    }

    #[test]
    fn crop_zone_rejects_empty_intersection() {
        let img = RgbaImage::new(10, 10);
        let rect = PixelRect {
            x: 50,
            y: 50,
            width: 5,
            height: 5,
        };
        assert!(crop_zone(&img, rect).is_err());
    }
}
