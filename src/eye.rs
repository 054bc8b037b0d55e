//! Eye localization inside a face crop.
//!
//! Eyes are searched in two fixed sub-windows of the face, one per side, that skip the hairline,
//! the ears and the chin (where most false positives come from). Each side is searched with a
//! primary classifier first and, if that finds nothing, with an optional fallback classifier
//! (for example an eyeglasses cascade).

use nalgebra::Point2;

use crate::{
    detector::{Classifier, ObjectDetector},
    image::{AsImageView, ImageView, Rect},
};

/// Left edge of the left eye search window, as a fraction of the face width.
pub const EYE_SX: f32 = 0.16;
/// Top edge of both eye search windows, as a fraction of the face height.
pub const EYE_SY: f32 = 0.26;
/// Width of each eye search window, as a fraction of the face width.
pub const EYE_SW: f32 = 0.30;
/// Height of each eye search window, as a fraction of the face height.
pub const EYE_SH: f32 = 0.28;

/// Placement of the eye search windows relative to the face crop.
///
/// The defaults suit the stock eye and eyeglasses cascades, which find both eyes in roughly 40% of
/// detected faces but no closed eyes. Cascades trained on larger eye regions need larger windows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeSearchConfig {
    pub sx: f32,
    pub sy: f32,
    pub sw: f32,
    pub sh: f32,
}

impl Default for EyeSearchConfig {
    fn default() -> Self {
        Self {
            sx: EYE_SX,
            sy: EYE_SY,
            sw: EYE_SW,
            sh: EYE_SH,
        }
    }
}

impl EyeSearchConfig {
    /// Computes the left and right eye search windows for a face of the given size.
    ///
    /// The right window mirrors the left one.
    pub fn windows(&self, face_width: u32, face_height: u32) -> (Rect, Rect) {
        let (w, h) = (face_width as f32, face_height as f32);
        let left_x = (w * self.sx).round() as i32;
        let top_y = (h * self.sy).round() as i32;
        let width = (w * self.sw).round() as u32;
        let height = (h * self.sh).round() as u32;
        let right_x = (w * (1.0 - self.sx - self.sw)).round() as i32;

        (
            Rect::from_top_left(left_x, top_y, width, height),
            Rect::from_top_left(right_x, top_y, width, height),
        )
    }
}

/// Result of an eye search.
///
/// Coordinates are in the face crop's coordinate system. An eye that was not found is `None`;
/// left and right are independent of each other.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Eyes {
    pub left: Option<Point2<f32>>,
    pub right: Option<Point2<f32>>,
    /// Where the left eye was searched. For diagnostics only.
    pub left_window: Rect,
    /// Where the right eye was searched. For diagnostics only.
    pub right_window: Rect,
}

impl Eyes {
    /// Returns both eye centers if both eyes were found.
    pub fn both(&self) -> Option<(Point2<f32>, Point2<f32>)> {
        Some((self.left?, self.right?))
    }
}

/// Locates the left and right eye in grayscale face crops.
pub struct EyeLocator {
    config: EyeSearchConfig,
}

impl EyeLocator {
    pub fn new(config: EyeSearchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EyeSearchConfig {
        &self.config
    }

    /// Searches for both eyes in `face`.
    ///
    /// Eyes are searched at full resolution, since eye detection needs all the detail it can get.
    /// An empty face crop yields no eyes and never reaches the classifiers.
    pub fn locate<V: AsImageView>(
        &self,
        detector: &mut ObjectDetector,
        face: &V,
        primary: &dyn Classifier,
        fallback: Option<&dyn Classifier>,
    ) -> Eyes {
        let face = face.as_view();
        let (left_window, right_window) = self.config.windows(face.width(), face.height());

        let left = locate_one(detector, face.view(left_window), primary, fallback)
            .map(|rect| eye_center(rect, left_window));
        let right = locate_one(detector, face.view(right_window), primary, fallback)
            .map(|rect| eye_center(rect, right_window));

        log::trace!("eyes: left={:?} right={:?}", left, right);

        Eyes {
            left,
            right,
            left_window,
            right_window,
        }
    }
}

fn locate_one(
    detector: &mut ObjectDetector,
    window: ImageView<'_>,
    primary: &dyn Classifier,
    fallback: Option<&dyn Classifier>,
) -> Option<Rect> {
    let width = window.width();
    detector
        .detect_largest(&window, primary, width)
        .or_else(|| {
            let fallback = fallback?;
            log::trace!("primary eye classifier failed, trying fallback");
            detector.detect_largest(&window, fallback, width)
        })
}

/// Maps an eye rectangle found in a search window back to face coordinates and returns its center.
fn eye_center(rect: Rect, window: Rect) -> Point2<f32> {
    let (x, y) = rect.move_by(window.x(), window.y()).center();
    Point2::new(x as f32, y as f32)
}
