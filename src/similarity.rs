//! Cheap resolution-invariant image comparison.
//!
//! Both images are squashed to a fixed square and compared pixel by pixel
//! on summed absolute RGB channel differences. This tolerates the minor
//! anti-aliasing and compression drift between a live frame and a stored
//! reference template; it is not exact pixel equality and not general
//! image recognition.

use image::imageops::{self, FilterType};
use image::RgbaImage;

/// Match threshold used by the tracker's icon classification.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.55;
/// Per-pixel summed channel difference at or under which a pixel counts as
/// matching.
pub const PIXEL_DIFF_TOLERANCE: u32 = 30;

const NORMALIZED_EDGE: u32 = 200;

/// Compare a candidate against a reference template.
///
/// Fails closed: any degenerate input or normalization mismatch yields
/// `false` rather than an error.
pub fn images_match(reference: &RgbaImage, candidate: &RgbaImage, threshold: f64) -> bool {
    similarity_score(reference, candidate).is_some_and(|score| score > threshold)
}

/// Fraction of normalized pixels whose summed RGB difference is within
/// tolerance, or `None` when the pair cannot be compared.
pub fn similarity_score(reference: &RgbaImage, candidate: &RgbaImage) -> Option<f64> {
    let lhs = normalize(reference)?;
    let rhs = normalize(candidate)?;
    buffer_similarity(&lhs, &rhs)
}

/// Squash to the fixed comparison square, ignoring aspect ratio.
fn normalize(image: &RgbaImage) -> Option<Vec<u8>> {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return None;
    }
    let resized = imageops::resize(image, NORMALIZED_EDGE, NORMALIZED_EDGE, FilterType::Nearest);
    Some(resized.into_raw())
}

fn buffer_similarity(lhs: &[u8], rhs: &[u8]) -> Option<f64> {
    if lhs.len() != rhs.len() || lhs.is_empty() || lhs.len() % 4 != 0 {
        return None;
    }

    let total = lhs.len() / 4;
    let mut matching = 0usize;
    for (a, b) in lhs.chunks_exact(4).zip(rhs.chunks_exact(4)) {
        let diff = a[..3]
            .iter()
            .zip(&b[..3])
            .map(|(&x, &y)| u32::from(x.abs_diff(y)))
            .sum::<u32>();
        if diff <= PIXEL_DIFF_TOLERANCE {
            matching += 1;
        }
    }

    Some(matching as f64 / total as f64)
}
