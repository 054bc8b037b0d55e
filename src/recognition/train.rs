//! Batch training of Eigenfaces (PCA) and Fisherfaces (PCA followed by LDA) subspaces.

use itertools::Itertools;
use nalgebra::{Cholesky, DMatrix, DVector, RowDVector, SymmetricEigen};

use crate::{Error, Result};

/// Eigenvalues below this fraction of the largest one are treated as zero.
const EIGENVALUE_EPSILON: f64 = 1e-10;

/// Relative ridge added to the within-class scatter so that it can always be factorized.
const SCATTER_RIDGE: f64 = 1e-9;

/// Output of a training run.
#[derive(Debug, Clone)]
pub(crate) struct Decomposition {
    /// `d x k`, one unit-length basis vector per column, sorted by decreasing eigenvalue.
    pub basis: DMatrix<f64>,
    pub eigenvalues: DVector<f64>,
    pub mean: RowDVector<f64>,
}

/// Principal component analysis of the rows of `data` (`n x d`).
///
/// Keeps at most `max_components` components (0 keeps all of them). Components with (numerically)
/// zero variance are always dropped, so at most `n - 1` remain.
pub(crate) fn pca(data: &DMatrix<f64>, max_components: usize) -> Decomposition {
    let (n, d) = data.shape();
    let mean = RowDVector::from_iterator(d, data.column_iter().map(|column| column.mean()));

    let mut centered = data.clone();
    for mut row in centered.row_iter_mut() {
        row -= &mean;
    }

    // The `d x d` covariance shares its non-zero eigenvalues with the `n x n` Gram matrix, and
    // `n` is tiny compared to the number of pixels.
    let gram = &centered * centered.transpose();
    let eigen = SymmetricEigen::new(gram);
    let order = sorted_descending(&eigen.eigenvalues);

    let largest = order.first().map_or(0.0, |&i| eigen.eigenvalues[i]);
    let limit = if max_components == 0 {
        n
    } else {
        max_components.min(n)
    };
    let keep = order
        .into_iter()
        .filter(|&i| eigen.eigenvalues[i] > largest * EIGENVALUE_EPSILON && largest > 0.0)
        .take(limit)
        .collect::<Vec<_>>();

    let mut basis = DMatrix::zeros(d, keep.len());
    for (col, &i) in keep.iter().enumerate() {
        let mut u = centered.transpose() * eigen.eigenvectors.column(i);
        let norm = u.norm();
        if norm > 0.0 {
            u /= norm;
        }
        basis.set_column(col, &u);
    }
    let eigenvalues =
        DVector::from_iterator(keep.len(), keep.iter().map(|&i| eigen.eigenvalues[i] / n as f64));

    log::debug!("PCA: {} samples, {} pixels, {} components", n, d, keep.len());

    Decomposition {
        basis,
        eigenvalues,
        mean,
    }
}

/// Fisher linear discriminant analysis of the rows of `data`, with class labels `labels`.
///
/// The data is first reduced to `n - c` dimensions with PCA (`c` being the number of classes), so
/// that the within-class scatter becomes invertible. At most `c - 1` discriminant components exist;
/// `max_components` can reduce that further (0 keeps all of them).
pub(crate) fn fisher(
    data: &DMatrix<f64>,
    labels: &[i32],
    max_components: usize,
) -> Result<Decomposition> {
    let n = data.nrows();
    if labels.len() != n {
        return Err(Error::ShapeMismatch {
            context: "training labels",
            expected: n,
            actual: labels.len(),
        });
    }

    let classes = labels.iter().copied().sorted().dedup().collect::<Vec<_>>();
    let c = classes.len();
    if c < 2 {
        return Err(Error::NotEnoughClasses {
            found: c,
            required: 2,
        });
    }
    if n <= c {
        return Err(Error::NotEnoughSamples {
            samples: n,
            classes: c,
        });
    }

    let pca = pca(data, n - c);
    let reduced = super::subspace_project(&pca.basis, Some(&pca.mean), data)?;
    let m = reduced.ncols();
    if m == 0 {
        return Err(Error::DegenerateData("all training samples are identical"));
    }

    let total_mean = RowDVector::from_iterator(m, reduced.column_iter().map(|col| col.mean()));
    let mut within = DMatrix::<f64>::zeros(m, m);
    let mut between = DMatrix::<f64>::zeros(m, m);
    for &class in &classes {
        let members = labels
            .iter()
            .positions(|&label| label == class)
            .collect::<Vec<_>>();
        let class_data = reduced.select_rows(&members);
        let class_mean =
            RowDVector::from_iterator(m, class_data.column_iter().map(|col| col.mean()));

        for row in class_data.row_iter() {
            let diff = row - &class_mean;
            within += diff.transpose() * &diff;
        }
        let diff = &class_mean - &total_mean;
        between += diff.transpose() * &diff;
    }

    let ridge = (within.trace() / m as f64 * SCATTER_RIDGE).max(f64::MIN_POSITIVE);
    within += DMatrix::identity(m, m) * ridge;

    // Solve `between * w = lambda * within * w` by whitening with the Cholesky factor of `within`.
    let l = Cholesky::new(within)
        .ok_or(Error::DegenerateData("within-class scatter is not positive definite"))?
        .l();
    let l_inv = l
        .solve_lower_triangular(&DMatrix::identity(m, m))
        .ok_or(Error::DegenerateData("within-class scatter is singular"))?;
    let whitened = &l_inv * between * l_inv.transpose();
    let whitened = (&whitened + whitened.transpose()) * 0.5;

    let eigen = SymmetricEigen::new(whitened);
    let limit = if max_components == 0 {
        c - 1
    } else {
        max_components.min(c - 1)
    };
    let keep = sorted_descending(&eigen.eigenvalues)
        .into_iter()
        .take(limit.min(m))
        .collect::<Vec<_>>();

    let mut lda = DMatrix::zeros(m, keep.len());
    for (col, &i) in keep.iter().enumerate() {
        lda.set_column(col, &(l_inv.transpose() * eigen.eigenvectors.column(i)));
    }

    let mut basis = &pca.basis * lda;
    for mut column in basis.column_iter_mut() {
        let norm = column.norm();
        if norm > 0.0 {
            column /= norm;
        }
    }
    let eigenvalues =
        DVector::from_iterator(keep.len(), keep.iter().map(|&i| eigen.eigenvalues[i]));

    log::debug!(
        "LDA: {} samples, {} classes, {} components",
        n,
        c,
        basis.ncols()
    );

    Ok(Decomposition {
        basis,
        eigenvalues,
        mean: pca.mean,
    })
}

/// Returns the indices of `values`, ordered from the largest value to the smallest.
fn sorted_descending(values: &DVector<f64>) -> Vec<usize> {
    (0..values.len())
        .sorted_by(|&a, &b| values[b].total_cmp(&values[a]))
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn pca_finds_dominant_direction() {
        // Points spread along (1, 1, 0), with a little noise along (0, 0, 1).
        let data = DMatrix::from_row_slice(
            4,
            3,
            &[
                -2.0, -2.0, 0.1, //
                -1.0, -1.0, -0.1, //
                1.0, 1.0, -0.1, //
                2.0, 2.0, 0.1, //
            ],
        );
        let pca = pca(&data, 0);
        assert_eq!(pca.basis.nrows(), 3);
        assert_eq!(pca.basis.ncols(), 2);
        assert_relative_eq!(
            pca.mean,
            RowDVector::from_row_slice(&[0.0, 0.0, 0.0]),
            epsilon = 1e-12
        );

        let first = pca.basis.column(0);
        let s = std::f64::consts::FRAC_1_SQRT_2;
        assert_relative_eq!(first[0].abs(), s, epsilon = 1e-6);
        assert_relative_eq!(first[1].abs(), s, epsilon = 1e-6);
        assert_relative_eq!(first[2], 0.0, epsilon = 1e-6);
        assert!(pca.eigenvalues[0] > pca.eigenvalues[1]);

        // Columns are orthonormal.
        let gram = pca.basis.transpose() * &pca.basis;
        assert_relative_eq!(gram, DMatrix::identity(2, 2), epsilon = 1e-9);

        let one = super::pca(&data, 1);
        assert_eq!(one.basis.ncols(), 1);
    }

    #[test]
    fn pca_of_identical_samples() {
        let data = DMatrix::from_element(3, 5, 4.0);
        let pca = pca(&data, 0);
        assert_eq!(pca.basis.shape(), (5, 0));
        assert_relative_eq!(pca.mean, RowDVector::from_element(5, 4.0));
    }

    #[test]
    fn fisher_separates_classes() {
        // Class 0 around x = 0, class 1 around x = 10. Variance along y is larger than the spread
        // within the classes along x, so PCA alone would pick the wrong axis first.
        env_logger::builder()
            .filter_module(env!("CARGO_CRATE_NAME"), log::LevelFilter::Trace)
            .try_init()
            .ok();

        let mut rng = fastrand::Rng::with_seed(3);
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..12 {
            let class = i % 2;
            rows.push(class as f64 * 10.0 + rng.f64() - 0.5);
            rows.push(rng.f64() * 60.0);
            rows.push(rng.f64());
            labels.push(class);
        }
        let data = DMatrix::from_row_slice(12, 3, &rows);
        let lda = fisher(&data, &labels, 0).unwrap();
        assert_eq!(lda.basis.ncols(), 1);

        let direction = lda.basis.column(0);
        assert!(direction[0].abs() > 0.9, "{direction}");
        assert_relative_eq!(direction.norm(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn fisher_preconditions() {
        let data = DMatrix::from_row_slice(3, 2, &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!(matches!(
            fisher(&data, &[1, 1, 1], 0),
            Err(Error::NotEnoughClasses { found: 1, .. })
        ));
        assert!(matches!(
            fisher(&data, &[1, 2, 3], 0),
            Err(Error::NotEnoughSamples {
                samples: 3,
                classes: 3
            })
        ));
        assert!(matches!(
            fisher(&data, &[1, 2], 0),
            Err(Error::ShapeMismatch { .. })
        ));
    }
}
