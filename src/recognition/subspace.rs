//! Linear subspace projection and reconstruction.

use nalgebra::{DMatrix, RowDVector};

use crate::{image::Image, Error, Result};

/// Projects the rows of `src` into the subspace spanned by the columns of `basis`.
///
/// `basis` is a `d x k` matrix (`d` being the number of pixels, `k` the number of components) and
/// `src` is `n x d`, one sample per row. If `mean` is given, it is subtracted from every row first.
/// The result is `n x k`.
pub fn subspace_project(
    basis: &DMatrix<f64>,
    mean: Option<&RowDVector<f64>>,
    src: &DMatrix<f64>,
) -> Result<DMatrix<f64>> {
    let d = src.ncols();
    if basis.nrows() != d {
        return Err(Error::ShapeMismatch {
            context: "projected sample",
            expected: basis.nrows(),
            actual: d,
        });
    }

    let mut x = src.clone();
    if let Some(mean) = mean {
        if mean.len() != d {
            return Err(Error::ShapeMismatch {
                context: "mean of projected data",
                expected: d,
                actual: mean.len(),
            });
        }
        for mut row in x.row_iter_mut() {
            row -= mean;
        }
    }

    Ok(x * basis)
}

/// Maps the rows of `src` (coefficients in the subspace spanned by `basis`) back into sample space.
///
/// `src` is `n x k` for a `d x k` basis. If `mean` is given, it is added to every reconstructed row.
/// The result is `n x d`.
pub fn subspace_reconstruct(
    basis: &DMatrix<f64>,
    mean: Option<&RowDVector<f64>>,
    src: &DMatrix<f64>,
) -> Result<DMatrix<f64>> {
    if basis.ncols() != src.ncols() {
        return Err(Error::ShapeMismatch {
            context: "subspace coefficients",
            expected: basis.ncols(),
            actual: src.ncols(),
        });
    }
    if let Some(mean) = mean {
        if mean.len() != basis.nrows() {
            return Err(Error::ShapeMismatch {
                context: "mean of reconstructed data",
                expected: basis.nrows(),
                actual: mean.len(),
            });
        }
    }

    let mut x = src * basis.transpose();
    if let Some(mean) = mean {
        for mut row in x.row_iter_mut() {
            row += mean;
        }
    }
    Ok(x)
}

/// A learned linear subspace: an orthogonal-ish basis plus the mean it is centered on.
#[derive(Debug, Clone)]
pub struct Subspace {
    /// `d x k`, one basis vector per column.
    basis: DMatrix<f64>,
    mean: Option<RowDVector<f64>>,
}

impl Subspace {
    /// Creates a subspace from a `d x k` basis and an optional mean of length `d`.
    pub fn new(basis: DMatrix<f64>, mean: Option<RowDVector<f64>>) -> Result<Self> {
        if let Some(mean) = &mean {
            if mean.len() != basis.nrows() {
                return Err(Error::ShapeMismatch {
                    context: "subspace mean",
                    expected: basis.nrows(),
                    actual: mean.len(),
                });
            }
        }
        Ok(Self { basis, mean })
    }

    /// Returns the dimension `d` of the sample space (the number of pixels per face).
    pub fn dimension(&self) -> usize {
        self.basis.nrows()
    }

    /// Returns the number `k` of basis vectors.
    pub fn num_components(&self) -> usize {
        self.basis.ncols()
    }

    pub fn basis(&self) -> &DMatrix<f64> {
        &self.basis
    }

    pub fn mean(&self) -> Option<&RowDVector<f64>> {
        self.mean.as_ref()
    }

    /// Projects `n x d` samples, see [`subspace_project`].
    pub fn project(&self, samples: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        subspace_project(&self.basis, self.mean.as_ref(), samples)
    }

    /// Reconstructs `n x k` coefficients, see [`subspace_reconstruct`].
    pub fn reconstruct(&self, coefficients: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        subspace_reconstruct(&self.basis, self.mean.as_ref(), coefficients)
    }

    /// Projects a single face image into the subspace.
    pub fn project_image(&self, face: &Image) -> Result<RowDVector<f64>> {
        let row = image_to_row(face);
        let projected = self.project(&DMatrix::from_row_slice(1, row.len(), row.as_slice()))?;
        Ok(projected.row(0).into_owned())
    }

    /// Reconstructs a `width x height` face image from its subspace coefficients.
    ///
    /// Reconstructed values are rounded and saturated to 8 bits without any other rescaling.
    pub fn reconstruct_image(
        &self,
        projection: &RowDVector<f64>,
        width: u32,
        height: u32,
    ) -> Result<Image> {
        let coefficients = DMatrix::from_row_slice(1, projection.len(), projection.as_slice());
        let row = self.reconstruct(&coefficients)?;
        row_to_image(row.row(0).iter().copied(), width, height)
    }
}

/// Flattens a face image into a row vector, in row-major order.
pub fn image_to_row(face: &Image) -> RowDVector<f64> {
    RowDVector::from_iterator(face.num_pixels(), face.data().iter().map(|&p| f64::from(p)))
}

/// Reshapes row-major values into an image, rounding and saturating them to 8 bits.
pub fn row_to_image(
    values: impl ExactSizeIterator<Item = f64>,
    width: u32,
    height: u32,
) -> Result<Image> {
    let expected = width as usize * height as usize;
    if values.len() != expected {
        return Err(Error::ShapeMismatch {
            context: "reshaped image",
            expected,
            actual: values.len(),
        });
    }
    let mut values = values.map(|v| v.round().clamp(0.0, 255.0) as u8);
    Ok(Image::from_fn(width, height, |_, _| values.next().unwrap_or(0)))
}

/// Renders a row of arbitrary values as an image, stretching the smallest value to 0 and the
/// largest one to 255.
///
/// Useful to look at means and basis vectors. A constant row yields a black image.
pub fn normalized_row_image(values: &[f64], width: u32, height: u32) -> Result<Image> {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &v| {
            (min.min(v), max.max(v))
        });
    let scale = if max - min > f64::EPSILON {
        255.0 / (max - min)
    } else {
        0.0
    };
    row_to_image(values.iter().map(|&v| (v - min) * scale), width, height)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn basis() -> DMatrix<f64> {
        // Orthonormal basis of a 2D subspace of R^4.
        DMatrix::from_column_slice(4, 2, &[1.0, 0.0, 0.0, 0.0, 0.0, 0.6, 0.8, 0.0])
    }

    #[test]
    fn project_subtracts_mean() {
        let mean = RowDVector::from_row_slice(&[1.0, 1.0, 1.0, 1.0]);
        let src = DMatrix::from_row_slice(2, 4, &[3.0, 1.0, 1.0, 9.0, 1.0, 1.6, 1.8, 1.0]);
        let projected = subspace_project(&basis(), Some(&mean), &src).unwrap();
        assert_eq!(projected.shape(), (2, 2));
        assert_relative_eq!(
            projected,
            DMatrix::from_row_slice(2, 2, &[2.0, 0.0, 0.0, 1.0]),
            epsilon = 1e-12
        );

        let without_mean = subspace_project(&basis(), None, &src).unwrap();
        assert_relative_eq!(without_mean[(0, 0)], 3.0);
    }

    #[test]
    fn reconstruct_adds_mean() {
        let mean = RowDVector::from_row_slice(&[1.0, 2.0, 3.0, 4.0]);
        let coefficients = DMatrix::from_row_slice(1, 2, &[2.0, 5.0]);
        let row = subspace_reconstruct(&basis(), Some(&mean), &coefficients).unwrap();
        assert_relative_eq!(
            row,
            DMatrix::from_row_slice(1, 4, &[3.0, 5.0, 7.0, 4.0]),
            epsilon = 1e-12
        );
    }

    #[test]
    fn in_subspace_round_trip() {
        let subspace = Subspace::new(basis(), None).unwrap();
        let src = DMatrix::from_row_slice(1, 4, &[7.0, 3.0, 4.0, 0.0]);
        let back = subspace.reconstruct(&subspace.project(&src).unwrap()).unwrap();
        assert_relative_eq!(back, src, epsilon = 1e-12);
    }

    #[test]
    fn shape_mismatch() {
        let src = DMatrix::from_row_slice(1, 3, &[1.0, 2.0, 3.0]);
        let err = subspace_project(&basis(), None, &src).unwrap_err();
        assert!(matches!(
            err,
            Error::ShapeMismatch {
                expected: 4,
                actual: 3,
                ..
            }
        ));

        let src = DMatrix::from_row_slice(1, 4, &[1.0, 2.0, 3.0, 4.0]);
        let short_mean = RowDVector::from_row_slice(&[0.0; 3]);
        assert!(subspace_project(&basis(), Some(&short_mean), &src).is_err());

        let coefficients = DMatrix::from_row_slice(1, 3, &[1.0, 2.0, 3.0]);
        assert!(subspace_reconstruct(&basis(), None, &coefficients).is_err());
        let coefficients = DMatrix::from_row_slice(1, 2, &[1.0, 2.0]);
        assert!(subspace_reconstruct(&basis(), Some(&short_mean), &coefficients).is_err());

        assert!(Subspace::new(basis(), Some(short_mean)).is_err());
    }

    #[test]
    fn image_conversion_saturates() {
        let image = row_to_image([-3.0, 0.4, 127.5, 300.0].into_iter(), 2, 2).unwrap();
        assert_eq!(image.data(), &[0, 0, 128, 255]);
        assert!(matches!(
            row_to_image([1.0].into_iter(), 2, 2),
            Err(Error::ShapeMismatch {
                expected: 4,
                actual: 1,
                ..
            })
        ));

        let wide = row_to_image([1.0, 2.0, 3.0, 4.0, 5.0, 6.0].into_iter(), 3, 2).unwrap();
        assert_eq!(wide.data(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(wide.get(0, 1), 4);

        let face = Image::from_fn(3, 2, |x, y| (x + 10 * y) as u8);
        assert_eq!(image_to_row(&face).as_slice(), &[0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
    }

    #[test]
    fn normalized_rows() {
        let values = [-1.0, 0.0, 1.0, 3.0];
        let image = normalized_row_image(&values, 4, 1).unwrap();
        assert_eq!(image.data(), &[0, 64, 128, 255]);

        let flat = [5.0; 4];
        let image = normalized_row_image(&flat, 2, 2).unwrap();
        assert_eq!(image.data(), &[0; 4]);
    }
}
