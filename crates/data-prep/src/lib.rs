//! Dataset Preparation
//!
//! Loads the semicolon-delimited student dataset and reshapes it for
//! transform fitting: header normalization, z-score outlier removal and
//! one-hot expansion of categorical columns.

mod encoder;
mod error;
mod filter;
mod frame;
mod normalizer;
mod stats;

pub use encoder::{CategoricalEncoder, STUDENT_CATEGORICAL_COLUMNS};
pub use error::PrepError;
pub use filter::{OutlierFilter, DEFAULT_Z_THRESHOLD};
pub use frame::{Column, ColumnData, Frame};
pub use normalizer::ColumnNormalizer;
pub use stats::Moments;

/// Run the full preparation chain on a raw frame:
/// normalize headers, drop outliers, expand categoricals.
pub fn prepare(
    raw: Frame,
    filter: &OutlierFilter,
    encoder: &CategoricalEncoder,
) -> Result<Frame, PrepError> {
    let normalized = ColumnNormalizer::new().apply(raw)?;
    let filtered = filter.apply(&normalized);
    encoder.apply(filtered)
}
