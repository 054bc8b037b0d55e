//! The face preprocessing pipeline.
//!
//! Turns camera frames into canonical faces suitable for recognition: the largest face is detected,
//! its eyes are located, and the face is aligned, illumination-normalized and masked.

use nalgebra::Point2;

use crate::{
    align::{AlignConfig, FaceAligner},
    detector::{Classifier, DetectParams, ObjectDetector, DEFAULT_SCALED_WIDTH},
    eye::{EyeLocator, EyeSearchConfig, Eyes},
    illumination::{equalize_illumination, Illumination},
    image::{draw_marker, draw_rect, AsImageView, Image, Rect},
    mask::{FaceMasker, MaskConfig},
    timer::Timer,
    Error, Result,
};

/// Default width (and height) of preprocessed faces.
///
/// Eigenfaces and Fisherfaces work well with small faces; 70x70 is a good compromise between
/// recognition accuracy and training time.
pub const DEFAULT_FACE_WIDTH: u32 = 70;

/// Configuration of a [`FacePreprocessor`].
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessConfig {
    /// Width and height of the produced canonical faces.
    pub face_width: u32,
    pub illumination: Illumination,
    /// Frames wider than this are shrunk to this width before looking for faces.
    pub scaled_width: u32,
    pub detect: DetectParams,
    pub eye_search: EyeSearchConfig,
    pub align: AlignConfig,
    pub mask: MaskConfig,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            face_width: DEFAULT_FACE_WIDTH,
            illumination: Illumination::default(),
            scaled_width: DEFAULT_SCALED_WIDTH,
            detect: DetectParams::default(),
            eye_search: EyeSearchConfig::default(),
            align: AlignConfig::default(),
            mask: MaskConfig::default(),
        }
    }
}

impl PreprocessConfig {
    pub fn face_width(mut self, face_width: u32) -> Self {
        self.face_width = face_width;
        self
    }

    pub fn illumination(mut self, illumination: Illumination) -> Self {
        self.illumination = illumination;
        self
    }

    pub fn scaled_width(mut self, scaled_width: u32) -> Self {
        self.scaled_width = scaled_width;
        self
    }

    pub fn detect(mut self, detect: DetectParams) -> Self {
        self.detect = detect;
        self
    }

    pub fn eye_search(mut self, eye_search: EyeSearchConfig) -> Self {
        self.eye_search = eye_search;
        self
    }

    pub fn align(mut self, align: AlignConfig) -> Self {
        self.align = align;
        self
    }

    pub fn mask(mut self, mask: MaskConfig) -> Self {
        self.mask = mask;
        self
    }
}

/// The classifiers used to find faces and eyes.
#[derive(Clone, Copy)]
pub struct Classifiers<'a> {
    pub face: &'a dyn Classifier,
    pub eye: &'a dyn Classifier,
    /// Tried for each eye the primary eye classifier cannot find (for example, an eyeglasses
    /// cascade).
    pub eye_fallback: Option<&'a dyn Classifier>,
}

/// Result of [`FacePreprocessor::preprocess`].
#[derive(Debug, Clone, Default)]
pub struct Preprocessed {
    /// The canonical face, if a face and both of its eyes were found.
    pub face: Option<Image>,
    /// The detected face, in frame coordinates.
    pub face_rect: Option<Rect>,
    /// Eye search results, in the coordinates of the face crop. `None` if no face was found.
    pub eyes: Option<Eyes>,
}

impl Preprocessed {
    /// Draws the detected face, the eye search windows and the eye centers onto `frame`.
    ///
    /// `frame` should be the frame passed to [`FacePreprocessor::preprocess`].
    pub fn draw(&self, frame: &mut Image) {
        let Some(face_rect) = self.face_rect else {
            return;
        };
        draw_rect(frame, face_rect);

        let Some(eyes) = &self.eyes else {
            return;
        };
        let (x, y) = (face_rect.x(), face_rect.y());
        for window in [eyes.left_window, eyes.right_window] {
            draw_rect(frame, window.move_by(x, y)).color(160);
        }
        for eye in [eyes.left, eyes.right].into_iter().flatten() {
            draw_marker(frame, x + eye.x.round() as i32, y + eye.y.round() as i32);
        }
    }
}

/// Turns camera frames into canonical faces.
///
/// All intermediate images are owned by the call that creates them; the preprocessor itself only
/// keeps its configuration and profiling timers between frames.
pub struct FacePreprocessor {
    config: PreprocessConfig,
    detector: ObjectDetector,
    eye_locator: EyeLocator,
    aligner: FaceAligner,
    masker: FaceMasker,
    t_align: Timer,
    t_equalize: Timer,
    t_mask: Timer,
}

impl FacePreprocessor {
    /// Creates a preprocessor.
    ///
    /// Fails with [`Error::InvalidConfig`] if the face width or the detection width is zero.
    pub fn new(config: PreprocessConfig) -> Result<Self> {
        if config.face_width == 0 {
            return Err(Error::InvalidConfig("face width must be non-zero".into()));
        }
        if config.scaled_width == 0 {
            return Err(Error::InvalidConfig(
                "face detection width must be non-zero".into(),
            ));
        }

        Ok(Self {
            detector: ObjectDetector::new(config.detect.clone()),
            eye_locator: EyeLocator::new(config.eye_search),
            aligner: FaceAligner::new(config.align.clone()),
            masker: FaceMasker::new(config.mask.clone()),
            config,
            t_align: Timer::new("align"),
            t_equalize: Timer::new("equalize"),
            t_mask: Timer::new("mask"),
        })
    }

    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    /// Looks for the largest face in a grayscale `frame` and preprocesses it.
    ///
    /// Not finding a face or one of its eyes is not an error: [`Preprocessed::face`] is `None`
    /// then, and the diagnostics describe how far the search got.
    pub fn preprocess<V: AsImageView>(
        &mut self,
        frame: &V,
        classifiers: &Classifiers<'_>,
    ) -> Preprocessed {
        let frame = frame.as_view();
        let Some(face_rect) =
            self.detector
                .detect_largest(&frame, classifiers.face, self.config.scaled_width)
        else {
            log::trace!("no face found");
            return Preprocessed::default();
        };

        let face = frame.view(face_rect);
        let eyes = self.eye_locator.locate(
            &mut self.detector,
            &face,
            classifiers.eye,
            classifiers.eye_fallback,
        );
        let canonical = match eyes.both() {
            Some((left, right)) => self.normalize(&face, left, right),
            None => {
                log::trace!("eyes not found: {:?}", eyes);
                None
            }
        };

        Preprocessed {
            face: canonical,
            face_rect: Some(face_rect),
            eyes: Some(eyes),
        }
    }

    /// Aligns, equalizes and masks a face crop whose eye positions are already known.
    ///
    /// Eye positions are in the coordinates of `face`. Returns `None` if they are degenerate.
    pub fn normalize<V: AsImageView>(
        &mut self,
        face: &V,
        left: Point2<f32>,
        right: Point2<f32>,
    ) -> Option<Image> {
        let width = self.config.face_width;
        let canonical = self
            .t_align
            .time(|| self.aligner.align(face, left, right, width))?;
        Some(self.standardize(canonical))
    }

    /// Equalizes and masks a face that is already in the canonical pose.
    pub fn standardize(&mut self, mut canonical: Image) -> Image {
        let mode = self.config.illumination;
        self.t_equalize
            .time(|| equalize_illumination(&mut canonical, mode));
        self.t_mask.time(|| self.masker.mask(&canonical))
    }

    /// Returns profiling timers for all pipeline stages.
    pub fn timers(&self) -> impl IntoIterator<Item = &Timer> + '_ {
        self.detector
            .timers()
            .into_iter()
            .chain([&self.t_align, &self.t_equalize, &self.t_mask])
    }
}
