//! Standardization and whitening transforms

use crate::FeatureError;
use faer::{Mat, Side};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use tracing::debug;

/// Per-feature standardization to zero mean and unit variance
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardScaler {
    /// Fit on the rows of `x`; zero-variance features keep a scale of 1
    pub fn fit(x: ArrayView2<f64>) -> Result<Self, FeatureError> {
        let mean = x
            .mean_axis(Axis(0))
            .ok_or(FeatureError::TooFewTrainingRows { rows: 0, required: 1 })?;
        let scale = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s < 10.0 * f64::EPSILON { 1.0 } else { s });

        Ok(Self { mean, scale })
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn scale(&self) -> &Array1<f64> {
        &self.scale
    }

    pub fn transform(&self, x: ArrayView2<f64>) -> Array2<f64> {
        (&x - &self.mean) / &self.scale
    }

    pub fn transform_one(&self, x: ArrayView1<f64>) -> Array1<f64> {
        (&x - &self.mean) / &self.scale
    }
}

/// Principal-component whitening keeping every component.
///
/// Projects centered data onto the covariance eigenvectors (largest
/// variance first) and divides each projection by the square root of its
/// variance. Each component is sign-fixed so that its largest-magnitude
/// loading is positive.
#[derive(Debug, Clone, PartialEq)]
pub struct Whitening {
    mean: Array1<f64>,
    /// One component per row
    components: Array2<f64>,
    explained_variance: Array1<f64>,
    divisor: Array1<f64>,
}

impl Whitening {
    /// Fit on the rows of `x` (needs at least two rows)
    pub fn fit(x: ArrayView2<f64>) -> Result<Self, FeatureError> {
        let n = x.nrows();
        if n < 2 {
            return Err(FeatureError::TooFewTrainingRows { rows: n, required: 2 });
        }

        let mean = x
            .mean_axis(Axis(0))
            .ok_or(FeatureError::TooFewTrainingRows { rows: n, required: 2 })?;
        let centered = &x - &mean;
        let covariance = centered.t().dot(&centered) / (n as f64 - 1.0);

        let (eigenvalues, eigenvectors) = symmetric_eigen(&covariance)?;

        let mut order: Vec<usize> = (0..eigenvalues.len()).collect();
        order.sort_by(|&a, &b| eigenvalues[b].total_cmp(&eigenvalues[a]));

        let dim = eigenvalues.len();
        let mut components = Array2::<f64>::zeros((dim, dim));
        let mut explained_variance = Array1::<f64>::zeros(dim);

        for (k, &idx) in order.iter().enumerate() {
            let mut loading = eigenvectors.column(idx).to_owned();
            let dominant = loading
                .iter()
                .copied()
                .fold(0.0_f64, |best, v| if v.abs() > best.abs() { v } else { best });
            if dominant < 0.0 {
                loading.mapv_inplace(|v| -v);
            }
            components.row_mut(k).assign(&loading);
            explained_variance[k] = eigenvalues[idx].max(0.0);
        }

        // Directions with no variance (e.g. complementary one-hot pairs)
        // would otherwise divide by zero.
        let largest = explained_variance.iter().copied().fold(0.0_f64, f64::max);
        let floor = (largest * dim as f64 * f64::EPSILON).max(f64::EPSILON);
        let divisor = explained_variance.mapv(|v| v.max(floor).sqrt());

        debug!("Whitening fitted: explained variance {:?}", explained_variance.to_vec());

        Ok(Self {
            mean,
            components,
            explained_variance,
            divisor,
        })
    }

    pub fn components(&self) -> &Array2<f64> {
        &self.components
    }

    pub fn explained_variance(&self) -> &Array1<f64> {
        &self.explained_variance
    }

    pub fn transform(&self, x: ArrayView2<f64>) -> Array2<f64> {
        let centered = &x - &self.mean;
        centered.dot(&self.components.t()) / &self.divisor
    }

    pub fn transform_one(&self, x: ArrayView1<f64>) -> Array1<f64> {
        let centered = &x - &self.mean;
        self.components.dot(&centered) / &self.divisor
    }
}

/// Eigen-decomposition of a symmetric matrix via faer's self-adjoint solver.
///
/// Returns eigenvalues and a matrix whose columns are the matching
/// unit eigenvectors.
pub(crate) fn symmetric_eigen(matrix: &Array2<f64>) -> Result<(Array1<f64>, Array2<f64>), FeatureError> {
    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(FeatureError::Decomposition(
            "covariance contains non-finite entries".to_string(),
        ));
    }

    let (rows, cols) = matrix.dim();
    let mat = Mat::<f64>::from_fn(rows, cols, |i, j| matrix[[i, j]]);
    let eig = mat
        .as_ref()
        .self_adjoint_eigen(Side::Lower)
        .map_err(|e| FeatureError::Decomposition(format!("{:?}", e)))?;

    let diag = eig.S();
    let eigenvalues = Array1::from_shape_fn(diag.dim(), |k| diag[k]);
    let u = eig.U();
    let eigenvectors = Array2::from_shape_fn((u.nrows(), u.ncols()), |(i, j)| u[(i, j)]);

    Ok((eigenvalues, eigenvectors))
}
