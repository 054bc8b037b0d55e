//! Geometric face normalization.
//!
//! Faces are rotated, scaled and translated so that both eyes end up at fixed positions of a square
//! canonical image. This cancels in-plane head roll and distance to the camera.

use nalgebra::{Matrix3, Point2, Rotation2, Vector2};

use crate::image::{AsImageView, Image, ImageView, MID_GRAY};

/// Horizontal position of the left eye in the canonical face, as a fraction of its width.
///
/// The right eye is placed symmetrically at `1.0 - DESIRED_LEFT_EYE_X`. 0.14 to 0.19 work well;
/// smaller values keep more of the face.
pub const DESIRED_LEFT_EYE_X: f32 = 0.16;

/// Vertical position of both eyes in the canonical face, as a fraction of its height.
pub const DESIRED_EYE_Y: f32 = 0.14;

/// Canonical eye placement.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignConfig {
    pub left_eye_x: f32,
    pub eye_y: f32,
    /// Intensity of output pixels that no input pixel maps to.
    pub border: u8,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            left_eye_x: DESIRED_LEFT_EYE_X,
            eye_y: DESIRED_EYE_Y,
            border: MID_GRAY,
        }
    }
}

impl AlignConfig {
    pub fn left_eye_x(mut self, left_eye_x: f32) -> Self {
        self.left_eye_x = left_eye_x;
        self
    }

    pub fn eye_y(mut self, eye_y: f32) -> Self {
        self.eye_y = eye_y;
        self
    }

    pub fn border(mut self, border: u8) -> Self {
        self.border = border;
        self
    }
}

/// Warps face crops into the canonical pose.
pub struct FaceAligner {
    config: AlignConfig,
}

impl FaceAligner {
    pub fn new(config: AlignConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AlignConfig {
        &self.config
    }

    /// Computes the similarity transform mapping face crop coordinates to the coordinates of a
    /// `width x width` canonical face.
    ///
    /// `left` and `right` are the eye centers from the perspective of the image (not the depicted
    /// person). Returns `None` if both eyes are at the same position, since no rotation or scale
    /// can be derived from that.
    pub fn transform(
        &self,
        left: Point2<f32>,
        right: Point2<f32>,
        width: u32,
    ) -> Option<Matrix3<f32>> {
        let left_to_right = right - left;
        let distance = left_to_right.norm();
        if !distance.is_finite() || distance < f32::EPSILON {
            return None;
        }

        let angle = Rotation2::rotation_between(&Vector2::x(), &left_to_right).angle();
        let desired_distance = (1.0 - 2.0 * self.config.left_eye_x) * width as f32;
        let scale = desired_distance / distance;

        let eyes_center = nalgebra::center(&left, &right);
        let target = Vector2::new(width as f32 * 0.5, width as f32 * self.config.eye_y);

        Some(
            (Matrix3::new_rotation(-angle) * Matrix3::new_translation(&-eyes_center.coords))
                .append_scaling(scale)
                .append_translation(&target),
        )
    }

    /// Produces a `width x width` canonical face from `face` and the eye centers found in it.
    ///
    /// Pixels that do not correspond to any pixel of `face` are set to the configured border value.
    /// Returns `None` (and logs a warning) if the eye positions are degenerate.
    pub fn align<V: AsImageView>(
        &self,
        face: &V,
        left: Point2<f32>,
        right: Point2<f32>,
        width: u32,
    ) -> Option<Image> {
        let face = face.as_view();
        let Some(inverse) = self
            .transform(left, right, width)
            .and_then(|transform| transform.try_inverse())
        else {
            log::warn!(
                "cannot align face: degenerate eye positions {:?} and {:?}",
                left,
                right
            );
            return None;
        };

        let border = self.config.border;
        Some(Image::from_fn(width, width, |x, y| {
            let src = inverse.transform_point(&Point2::new(x as f32, y as f32));
            sample_bilinear(face, src.x, src.y, border)
        }))
    }
}

/// Bilinearly interpolates `image` at a fractional position.
///
/// Neighbors outside of `image` contribute `border` instead of an image value.
fn sample_bilinear(image: ImageView<'_>, x: f32, y: f32, border: u8) -> u8 {
    let (x0, y0) = (x.floor(), y.floor());
    let (fx, fy) = (x - x0, y - y0);
    let (x0, y0) = (x0 as i64, y0 as i64);

    let pixel = |x: i64, y: i64| -> f32 {
        if x < 0 || y < 0 || x >= i64::from(image.width()) || y >= i64::from(image.height()) {
            f32::from(border)
        } else {
            f32::from(image.get(x as u32, y as u32))
        }
    };

    let top = pixel(x0, y0) * (1.0 - fx) + pixel(x0 + 1, y0) * fx;
    let bottom = pixel(x0, y0 + 1) * (1.0 - fx) + pixel(x0 + 1, y0 + 1) * fx;
    (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8
}
