use nalgebra::{DMatrix, DVector, RowDVector};

use crate::{image::Image, Error, Result};

use super::{
    normalized_row_image, row_to_image, train, Algorithm, FaceRecognizer, Prediction, Subspace,
};

/// An ordered collection of labeled, preprocessed faces.
#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    samples: Vec<(Image, i32)>,
}

impl TrainingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a face of the person identified by `label`.
    pub fn push(&mut self, face: Image, label: i32) {
        self.samples.push((face, label));
    }

    /// Adds a face together with its horizontal mirror image.
    ///
    /// Faces are roughly symmetric, so this doubles the amount of training data for free.
    pub fn push_mirrored(&mut self, face: Image, label: i32) {
        let mirrored = face.flip_horizontal();
        self.push(face, label);
        self.push(mirrored, label);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Image, i32)> + '_ {
        self.samples.iter().map(|(face, label)| (face, *label))
    }

    pub fn labels(&self) -> impl Iterator<Item = i32> + '_ {
        self.samples.iter().map(|(_, label)| *label)
    }
}

/// Trains [`AppearanceModel`]s.
#[derive(Debug, Clone)]
pub struct Trainer {
    algorithm: Algorithm,
    num_components: usize,
    threshold: f64,
}

impl Trainer {
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            num_components: 0,
            threshold: f64::MAX,
        }
    }

    /// Sets the number of subspace components to keep.
    ///
    /// By default (or when set to 0), all meaningful components are kept.
    pub fn num_components(mut self, num_components: usize) -> Self {
        self.num_components = num_components;
        self
    }

    /// Sets the maximum subspace distance at which [`AppearanceModel::predict`] still reports a
    /// match.
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Trains a model on all faces in `set`.
    ///
    /// All faces must have the same, non-zero size. Training is a single batch operation; to add
    /// faces, retrain on the extended set and replace the old model as a whole.
    pub fn train(&self, set: &TrainingSet) -> Result<AppearanceModel> {
        let (first, _) = set.samples.first().ok_or(Error::EmptyTrainingSet)?;
        let (width, height) = (first.width(), first.height());
        if first.is_empty() {
            return Err(Error::EmptyImage);
        }
        if let Some((face, _)) = set
            .samples
            .iter()
            .find(|(face, _)| face.width() != width || face.height() != height)
        {
            return Err(Error::ShapeMismatch {
                context: "training face",
                expected: first.num_pixels(),
                actual: face.num_pixels(),
            });
        }

        log::debug!(
            "training {} model on {} faces of {}x{} pixels",
            self.algorithm,
            set.len(),
            width,
            height
        );

        let labels = set.labels().collect::<Vec<_>>();
        let data = DMatrix::from_row_iterator(
            set.len(),
            first.num_pixels(),
            set.samples
                .iter()
                .flat_map(|(face, _)| face.data().iter().map(|&p| f64::from(p))),
        );

        let decomposition = match self.algorithm {
            Algorithm::Eigenfaces => train::pca(&data, self.num_components),
            Algorithm::Fisherfaces => train::fisher(&data, &labels, self.num_components)?,
        };
        let subspace = Subspace::new(decomposition.basis, Some(decomposition.mean))?;
        let projections = subspace.project(&data)?;

        Ok(AppearanceModel {
            algorithm: self.algorithm,
            width,
            height,
            subspace,
            eigenvalues: decomposition.eigenvalues,
            projections,
            labels,
            threshold: self.threshold,
        })
    }
}

/// A trained Eigenfaces or Fisherfaces model.
///
/// Models are immutable once trained and can be shared between threads.
#[derive(Debug, Clone)]
pub struct AppearanceModel {
    algorithm: Algorithm,
    width: u32,
    height: u32,
    subspace: Subspace,
    eigenvalues: DVector<f64>,
    /// `n x k`, the projection of every training face.
    projections: DMatrix<f64>,
    labels: Vec<i32>,
    threshold: f64,
}

impl AppearanceModel {
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Returns the width and height of the faces this model was trained on.
    pub fn face_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn subspace(&self) -> &Subspace {
        &self.subspace
    }

    /// Returns the eigenvalue belonging to each basis vector, in decreasing order.
    pub fn eigenvalues(&self) -> &DVector<f64> {
        &self.eigenvalues
    }

    /// Returns the subspace coordinates of every training face, one per row.
    pub fn projections(&self) -> &DMatrix<f64> {
        &self.projections
    }

    /// Returns the label of every training face, in training order.
    pub fn labels(&self) -> &[i32] {
        &self.labels
    }

    /// Projects a face of the model's size into the model's subspace.
    pub fn project(&self, face: &Image) -> Result<RowDVector<f64>> {
        self.subspace.project_image(face)
    }

    /// Reconstructs a face image of the model's size from subspace coordinates.
    pub fn reconstruct(&self, projection: &RowDVector<f64>) -> Result<Image> {
        self.subspace
            .reconstruct_image(projection, self.width, self.height)
    }

    /// Returns the average training face.
    pub fn mean_image(&self) -> Option<Image> {
        let mean = self.subspace.mean()?;
        row_to_image(mean.iter().copied(), self.width, self.height).ok()
    }

    /// Renders basis vector `index` (an "eigenface" or "fisherface") as a contrast-stretched image.
    ///
    /// Returns `None` if the model has fewer than `index + 1` basis vectors.
    pub fn basis_image(&self, index: usize) -> Option<Image> {
        if index >= self.subspace.num_components() {
            return None;
        }
        let values = self
            .subspace
            .basis()
            .column(index)
            .iter()
            .copied()
            .collect::<Vec<_>>();
        normalized_row_image(&values, self.width, self.height).ok()
    }

    /// Returns the label of the training face closest to `face` in subspace coordinates.
    ///
    /// Returns `None` if even the closest face is farther away than the configured threshold.
    pub fn predict(&self, face: &Image) -> Result<Option<Prediction>> {
        let query = self.project(face)?;

        let nearest = self
            .projections
            .row_iter()
            .zip(&self.labels)
            .map(|(row, &label)| Prediction {
                label,
                distance: (row - &query).norm(),
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance));

        Ok(nearest.filter(|prediction| prediction.distance <= self.threshold))
    }
}

impl FaceRecognizer for AppearanceModel {
    fn predict(&self, face: &Image) -> Result<Option<Prediction>> {
        AppearanceModel::predict(self, face)
    }

    fn subspace(&self) -> Option<&Subspace> {
        Some(&self.subspace)
    }
}
