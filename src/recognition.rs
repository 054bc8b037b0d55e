//! Face recognition with linear appearance models.
//!
//! A [`Trainer`] turns a [`TrainingSet`] of preprocessed faces into an [`AppearanceModel`]
//! (Eigenfaces or Fisherfaces). Faces can then be projected into the model's subspace and
//! reconstructed from it; a face the model "knows" reconstructs with little error, which
//! [`identify`] uses to reject unknown people before trusting the nearest-neighbour label.

mod model;
mod subspace;
mod train;

use std::{fmt, str::FromStr};

use crate::{image::Image, Error, Result};

pub use model::*;
pub use subspace::*;

/// Distance reported by [`similarity`] for images that cannot be compared.
pub const UNRANKABLE_DISTANCE: f64 = 1e8;

/// Reconstruction error above which a face is considered to belong to an unknown person.
///
/// Sensible values lie between 0.3 and 1.0 for 70x70 faces; lower values reject more faces.
pub const DEFAULT_UNKNOWN_THRESHOLD: f64 = 0.7;

/// The method used to learn the subspace of an [`AppearanceModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    /// Principal component analysis (Turk and Pentland, 1991).
    #[default]
    Eigenfaces,
    /// Linear discriminant analysis on top of PCA (Belhumeur et al., 1997).
    Fisherfaces,
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Eigenfaces" | "FaceRecognizer.Eigenfaces" => Ok(Self::Eigenfaces),
            "Fisherfaces" | "FaceRecognizer.Fisherfaces" => Ok(Self::Fisherfaces),
            _ => Err(Error::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Eigenfaces => "Eigenfaces",
            Self::Fisherfaces => "Fisherfaces",
        })
    }
}

/// The closest training face to a query, as found by [`FaceRecognizer::predict`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub label: i32,
    /// Distance between the query and the matched training face, in subspace coordinates.
    pub distance: f64,
}

/// Interface of trained face recognizers.
pub trait FaceRecognizer {
    /// Returns the label of the training face closest to `face`, or `None` if no training face is
    /// close enough.
    fn predict(&self, face: &Image) -> Result<Option<Prediction>>;

    /// Returns the linear subspace of this recognizer, if it has one.
    ///
    /// Only recognizers backed by a subspace support reconstruction (and thus [`identify`]).
    fn subspace(&self) -> Option<&Subspace> {
        None
    }
}

/// Compares two images by their per-pixel L2 error.
///
/// The result is the L2 norm of the pixel-wise difference, divided by the number of pixels. It is
/// 0.0 for identical images and grows with their difference. Images that differ in size (or that
/// are empty) cannot be compared and yield [`UNRANKABLE_DISTANCE`].
pub fn similarity(a: &Image, b: &Image) -> f64 {
    if a.is_empty() || a.width() != b.width() || a.height() != b.height() {
        return UNRANKABLE_DISTANCE;
    }

    let sum = a
        .data()
        .iter()
        .zip(b.data())
        .map(|(&a, &b)| {
            let diff = f64::from(a) - f64::from(b);
            diff * diff
        })
        .sum::<f64>();
    sum.sqrt() / a.num_pixels() as f64
}

/// Approximately reconstructs a preprocessed `face` by projecting it into the subspace of
/// `recognizer` and back.
///
/// Recognizers without a subspace cannot reconstruct anything. For them, a warning is logged and
/// an empty image is returned. Faces whose size does not match the model result in an error.
pub fn reconstruct_face<R: FaceRecognizer + ?Sized>(recognizer: &R, face: &Image) -> Result<Image> {
    let Some(subspace) = recognizer.subspace() else {
        log::warn!("face recognizer has no subspace, cannot reconstruct faces");
        return Ok(Image::new(0, 0));
    };

    let projection = subspace.project_image(face)?;
    subspace.reconstruct_image(&projection, face.width(), face.height())
}

/// Outcome of [`identify`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Identity {
    /// The face belongs to a person the recognizer was trained on.
    Known(Prediction),
    /// The face is too different from everything the recognizer was trained on.
    Unknown {
        /// Reconstruction error of the face.
        similarity: f64,
    },
}

/// Determines who `face` belongs to, or whether it is an unknown person.
///
/// The face is first reconstructed from the recognizer's subspace. If the reconstruction differs
/// from the face by `unknown_threshold` or more (see [`DEFAULT_UNKNOWN_THRESHOLD`]), the person is
/// unknown. Otherwise the recognizer's prediction is returned.
pub fn identify<R: FaceRecognizer + ?Sized>(
    recognizer: &R,
    face: &Image,
    unknown_threshold: f64,
) -> Result<Identity> {
    let reconstructed = reconstruct_face(recognizer, face)?;
    let similarity = similarity(face, &reconstructed);
    log::trace!("reconstruction error: {similarity:.4}");

    if similarity >= unknown_threshold {
        return Ok(Identity::Unknown { similarity });
    }

    Ok(match recognizer.predict(face)? {
        Some(prediction) => Identity::Known(prediction),
        None => Identity::Unknown { similarity },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algorithm_names() {
        assert_eq!("Eigenfaces".parse::<Algorithm>().unwrap(), Algorithm::Eigenfaces);
        assert_eq!(
            "FaceRecognizer.Fisherfaces".parse::<Algorithm>().unwrap(),
            Algorithm::Fisherfaces
        );
        assert!(matches!(
            "FaceRecognizer.LBPH".parse::<Algorithm>(),
            Err(Error::UnsupportedAlgorithm(name)) if name == "FaceRecognizer.LBPH"
        ));
        assert_eq!(
            Algorithm::Fisherfaces.to_string().parse::<Algorithm>().unwrap(),
            Algorithm::Fisherfaces
        );
    }

    #[test]
    fn similarity_properties() {
        let mut rng = fastrand::Rng::with_seed(11);
        let a = Image::from_fn(10, 10, |_, _| rng.u8(..));
        let b = Image::from_fn(10, 10, |_, _| rng.u8(..));
        assert_eq!(similarity(&a, &a), 0.0);
        assert_eq!(similarity(&a, &b), similarity(&b, &a));
        assert!(similarity(&a, &b) > 0.0);

        let big = Image::new(20, 20);
        assert_eq!(similarity(&a, &big), UNRANKABLE_DISTANCE);
        assert_eq!(similarity(&big, &a), UNRANKABLE_DISTANCE);
        let empty = Image::new(0, 0);
        assert_eq!(similarity(&empty, &empty), UNRANKABLE_DISTANCE);
    }

    #[test]
    fn similarity_scale() {
        let a = Image::filled(4, 4, 10);
        let b = Image::filled(4, 4, 12);
        // sqrt(16 * 2^2) / 16
        assert_eq!(similarity(&a, &b), 0.5);
    }

    struct NoSubspace;

    impl FaceRecognizer for NoSubspace {
        fn predict(&self, _: &Image) -> Result<Option<Prediction>> {
            Ok(Some(Prediction {
                label: 3,
                distance: 0.0,
            }))
        }
    }

    #[test]
    fn reconstruction_unavailable() {
        let face = Image::filled(8, 8, 100);
        let reconstructed = reconstruct_face(&NoSubspace, &face).unwrap();
        assert!(reconstructed.is_empty());

        let identity = identify(&NoSubspace, &face, DEFAULT_UNKNOWN_THRESHOLD).unwrap();
        assert_eq!(
            identity,
            Identity::Unknown {
                similarity: UNRANKABLE_DISTANCE
            }
        );
    }
}
