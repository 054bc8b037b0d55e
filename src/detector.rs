//! Adapter around opaque object classifiers (cascade detectors for faces and eyes).
//!
//! The actual sliding-window classification is performed by an external [`Classifier`]. This module
//! prepares its input (downscaling and contrast equalization), maps its results back into the
//! coordinate system of the original image, and picks the largest detection when only one object
//! is wanted.

use crate::{
    image::{equalize_histogram, AsImageView, Image, ImageView, Rect},
    timer::Timer,
};

/// Smallest object size the classifier should report, in pixels of the (scaled) input.
pub const MIN_FEATURE_SIZE: (u32, u32) = (20, 20);

/// Scale step between two consecutive classifier passes. Must be larger than 1.0.
pub const SEARCH_SCALE_FACTOR: f32 = 1.1;

/// How many overlapping raw hits a detection needs to be reported.
///
/// 2 yields lots of good and bad detections, 6 only yields good ones but misses some.
pub const MIN_NEIGHBORS: u32 = 4;

/// Default width that frames are shrunk to before looking for faces.
pub const DEFAULT_SCALED_WIDTH: u32 = 320;

/// Parameters forwarded to a [`Classifier`].
#[derive(Debug, Clone, PartialEq)]
pub struct DetectParams {
    pub min_feature_size: (u32, u32),
    pub scale_factor: f32,
    pub min_neighbors: u32,
    /// If `true`, the caller only needs the biggest object and the classifier may stop early.
    pub find_biggest_object: bool,
}

impl Default for DetectParams {
    fn default() -> Self {
        Self {
            min_feature_size: MIN_FEATURE_SIZE,
            scale_factor: SEARCH_SCALE_FACTOR,
            min_neighbors: MIN_NEIGHBORS,
            find_biggest_object: false,
        }
    }
}

impl DetectParams {
    pub fn min_feature_size(mut self, width: u32, height: u32) -> Self {
        self.min_feature_size = (width, height);
        self
    }

    pub fn scale_factor(mut self, scale_factor: f32) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    pub fn min_neighbors(mut self, min_neighbors: u32) -> Self {
        self.min_neighbors = min_neighbors;
        self
    }
}

/// A pretrained object classifier, such as a Haar or LBP cascade.
///
/// Implementations receive a grayscale, histogram-equalized image and report candidate rectangles
/// in the coordinates of that image. They do not need to clamp their results to the image bounds.
///
/// Closures of the form `Fn(&Image, &DetectParams) -> Vec<Rect>` implement this trait, which is
/// convenient for wrapping foreign detectors.
pub trait Classifier {
    fn detect(&self, image: &Image, params: &DetectParams) -> Vec<Rect>;
}

impl<F> Classifier for F
where
    F: Fn(&Image, &DetectParams) -> Vec<Rect>,
{
    fn detect(&self, image: &Image, params: &DetectParams) -> Vec<Rect> {
        self(image, params)
    }
}

/// Runs [`Classifier`]s on images and post-processes their detections.
pub struct ObjectDetector {
    params: DetectParams,
    t_resize: Timer,
    t_equalize: Timer,
    t_classify: Timer,
}

impl Default for ObjectDetector {
    fn default() -> Self {
        Self::new(DetectParams::default())
    }
}

impl ObjectDetector {
    /// Creates an object detector that passes `params` to every classifier invocation.
    pub fn new(params: DetectParams) -> Self {
        Self {
            params,
            t_resize: Timer::new("resize"),
            t_equalize: Timer::new("equalize"),
            t_classify: Timer::new("classify"),
        }
    }

    pub fn params(&self) -> &DetectParams {
        &self.params
    }

    /// Searches for the single largest object in `image`.
    ///
    /// If `image` is wider than `scaled_width`, it is temporarily shrunk to that width (keeping
    /// its aspect ratio) to speed up the search. The returned rectangle is always in the
    /// coordinates of `image` and lies completely inside of it.
    ///
    /// Returns `None` if nothing was found.
    pub fn detect_largest<V: AsImageView>(
        &mut self,
        image: &V,
        classifier: &dyn Classifier,
        scaled_width: u32,
    ) -> Option<Rect> {
        let params = DetectParams {
            find_biggest_object: true,
            ..self.params.clone()
        };
        self.detect_impl(image.as_view(), classifier, scaled_width, &params)
            .into_iter()
            .max_by_key(|rect| rect.area())
    }

    /// Searches for all objects in `image`.
    ///
    /// See [`ObjectDetector::detect_largest`] for how `scaled_width` is used.
    pub fn detect_many<V: AsImageView>(
        &mut self,
        image: &V,
        classifier: &dyn Classifier,
        scaled_width: u32,
    ) -> Vec<Rect> {
        let params = self.params.clone();
        self.detect_impl(image.as_view(), classifier, scaled_width, &params)
    }

    fn detect_impl(
        &mut self,
        image: ImageView<'_>,
        classifier: &dyn Classifier,
        scaled_width: u32,
        params: &DetectParams,
    ) -> Vec<Rect> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            log::trace!("skipping detection on empty {:?}", image);
            return Vec::new();
        }

        let scaled_width = scaled_width.max(1);
        let scale = width as f32 / scaled_width as f32;
        let shrink = width > scaled_width;

        // Every buffer below is owned by this call.
        let mut input = self.t_resize.time(|| {
            let full = image.to_image();
            if shrink {
                let scaled_height = ((height as f32 / scale).round() as u32).max(1);
                full.resize(scaled_width, scaled_height)
            } else {
                full
            }
        });
        self.t_equalize.time(|| equalize_histogram(&mut input));

        let raw = self.t_classify.time(|| classifier.detect(&input, params));
        log::trace!("classifier returned {} raw detections", raw.len());

        raw.into_iter()
            .map(|rect| if shrink { rect.scale(scale) } else { rect })
            .map(|rect| rect.fit_inside(width, height))
            .filter(|rect| !rect.is_empty())
            .collect()
    }

    /// Returns profiling timers for image resizing, equalization and classification.
    pub fn timers(&self) -> impl IntoIterator<Item = &Timer> + '_ {
        [&self.t_resize, &self.t_equalize, &self.t_classify]
    }
}
