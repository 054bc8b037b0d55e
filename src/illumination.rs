//! Brightness and contrast standardization of canonical faces.
//!
//! Lighting in real scenes is rarely uniform: one side of a face is often much brighter than the
//! other. [`Illumination::Split`] equalizes both halves of the face independently and blends them
//! back together through a whole-face equalization, so that no visible seam appears at the
//! midline.

use crate::image::{equalize_histogram, equalized, Image, Rect};

/// Illumination standardization mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Illumination {
    /// Histogram-equalize the whole face at once.
    WholeFace,
    /// Equalize the left and right half separately and blend them across the center.
    #[default]
    Split,
}

/// Standardizes the brightness and contrast of `face` in place.
pub fn equalize_illumination(face: &mut Image, mode: Illumination) {
    match mode {
        Illumination::WholeFace => equalize_histogram(face),
        Illumination::Split => equalize_split(face),
    }
}

fn equalize_split(face: &mut Image) {
    let (w, h) = (face.width(), face.height());
    if face.is_empty() {
        return;
    }

    let mid_x = w / 2;
    let whole = equalized(&*face);
    let left = equalized(&face.view(Rect::from_top_left(0, 0, mid_x, h)));
    let right = equalized(&face.view(Rect::from_top_left(mid_x as i32, 0, w - mid_x, h)));

    let quarter = w as f32 * 0.25;
    for y in 0..h {
        for x in 0..w {
            let value = if x < w / 4 {
                left.get(x, y)
            } else if x < w * 2 / 4 {
                let f = (x - w / 4) as f32 / quarter;
                lerp(left.get(x, y), whole.get(x, y), f)
            } else if x < w * 3 / 4 {
                let f = (x - w * 2 / 4) as f32 / quarter;
                lerp(whole.get(x, y), right.get(x - mid_x, y), f)
            } else {
                right.get(x - mid_x, y)
            };
            face.set(x, y, value);
        }
    }
}

/// Mixes `a` and `b`, with `f` being the weight of `b`.
fn lerp(a: u8, b: u8, f: f32) -> u8 {
    ((1.0 - f) * f32::from(a) + f * f32::from(b))
        .round()
        .clamp(0.0, 255.0) as u8
}
