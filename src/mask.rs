//! Noise suppression and background removal for canonical faces.

use image::Luma;
use imageproc::drawing::draw_filled_ellipse_mut;

use crate::image::{Image, MID_GRAY};

/// Vertical center of the face ellipse, as a fraction of the face height.
pub const FACE_ELLIPSE_CY: f32 = 0.40;
/// Horizontal semi-axis of the face ellipse, as a fraction of the face width.
pub const FACE_ELLIPSE_W: f32 = 0.50;
/// Vertical semi-axis of the face ellipse, as a fraction of the face height.
pub const FACE_ELLIPSE_H: f32 = 0.80;

/// Intensity range of the edge-preserving smoothing filter.
pub const SIGMA_COLOR: f32 = 20.0;
/// Spatial extent of the edge-preserving smoothing filter, in pixels.
pub const SIGMA_SPACE: f32 = 2.0;

/// Parameters of the [`FaceMasker`].
///
/// The defaults are tuning values that work for frontal webcam faces; other datasets may need
/// different ones.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskConfig {
    pub ellipse_cy: f32,
    pub ellipse_w: f32,
    pub ellipse_h: f32,
    pub sigma_color: f32,
    pub sigma_space: f32,
    /// Value of every pixel outside of the face ellipse.
    pub background: u8,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            ellipse_cy: FACE_ELLIPSE_CY,
            ellipse_w: FACE_ELLIPSE_W,
            ellipse_h: FACE_ELLIPSE_H,
            sigma_color: SIGMA_COLOR,
            sigma_space: SIGMA_SPACE,
            background: MID_GRAY,
        }
    }
}

impl MaskConfig {
    pub fn ellipse(mut self, cy: f32, w: f32, h: f32) -> Self {
        self.ellipse_cy = cy;
        self.ellipse_w = w;
        self.ellipse_h = h;
        self
    }

    pub fn sigmas(mut self, sigma_color: f32, sigma_space: f32) -> Self {
        self.sigma_color = sigma_color;
        self.sigma_space = sigma_space;
        self
    }

    pub fn background(mut self, background: u8) -> Self {
        self.background = background;
        self
    }
}

/// An axis-aligned ellipse with integer center and semi-axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ellipse {
    pub cx: i32,
    pub cy: i32,
    pub semi_x: u32,
    pub semi_y: u32,
}

/// Smooths canonical faces and replaces everything outside of a central ellipse with a uniform
/// background.
///
/// This removes hair, ears and background clutter that a rectangular face crop always contains.
pub struct FaceMasker {
    config: MaskConfig,
}

impl FaceMasker {
    pub fn new(config: MaskConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MaskConfig {
        &self.config
    }

    /// Returns the face ellipse for a face of the given size.
    pub fn ellipse(&self, width: u32, height: u32) -> Ellipse {
        Ellipse {
            cx: (width / 2) as i32,
            cy: (height as f32 * self.config.ellipse_cy).round() as i32,
            semi_x: (width as f32 * self.config.ellipse_w).round() as u32,
            semi_y: (height as f32 * self.config.ellipse_h).round() as u32,
        }
    }

    /// Rasterizes the face ellipse: 255 for pixels that belong to the face, 0 for the rest.
    pub fn face_mask(&self, width: u32, height: u32) -> Image {
        let mut mask = Image::new(width, height);
        let ellipse = self.ellipse(width, height);
        if ellipse.semi_x == 0 || ellipse.semi_y == 0 {
            return mask;
        }
        draw_filled_ellipse_mut(
            &mut mask.buf,
            (ellipse.cx, ellipse.cy),
            ellipse.semi_x as i32,
            ellipse.semi_y as i32,
            Luma([255]),
        );
        mask
    }

    /// Produces the final preprocessed face.
    pub fn mask(&self, face: &Image) -> Image {
        let filtered = bilateral_filter(face, self.config.sigma_color, self.config.sigma_space);
        let mask = self.face_mask(face.width(), face.height());
        let background = self.config.background;
        Image::from_fn(face.width(), face.height(), |x, y| {
            if mask.get(x, y) != 0 {
                filtered.get(x, y)
            } else {
                background
            }
        })
    }
}

/// Applies an edge-preserving bilateral filter to `image`.
///
/// Each output pixel is a weighted average of its neighborhood, where the weight decays with both
/// spatial distance (`sigma_space`) and intensity difference (`sigma_color`). The window spans
/// `1.5 * sigma_space` pixels in every direction.
pub fn bilateral_filter(image: &Image, sigma_color: f32, sigma_space: f32) -> Image {
    if image.is_empty() {
        return image.clone();
    }

    let sigma_color = if sigma_color <= 0.0 { 1.0 } else { sigma_color };
    let sigma_space = if sigma_space <= 0.0 { 1.0 } else { sigma_space };
    let radius = ((sigma_space * 1.5).round() as u32).max(1);

    Image {
        buf: imageproc::filter::bilateral_filter(
            &image.buf,
            2 * radius + 1,
            sigma_color,
            sigma_space,
        ),
    }
}
