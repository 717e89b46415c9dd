//! Z-score Outlier Removal

use crate::frame::Frame;
use crate::stats::Moments;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Default z-score magnitude above which a row is dropped
pub const DEFAULT_Z_THRESHOLD: f64 = 3.0;

/// Drops rows where any numeric column lies more than `threshold`
/// population standard deviations from that column's mean.
///
/// Text columns are ignored. A zero-variance column never marks a row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlierFilter {
    threshold: f64,
}

impl OutlierFilter {
    /// Create a filter with the given z-score threshold
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Per-row flag, true where the row is an outlier
    pub fn outlier_mask(&self, frame: &Frame) -> Vec<bool> {
        let mut mask = vec![false; frame.n_rows()];

        for values in frame.columns().iter().filter_map(|c| c.as_numeric()) {
            let moments = Moments::compute(values);
            for (flag, &value) in mask.iter_mut().zip(values) {
                if let Some(z) = moments.z_score(value) {
                    if z.abs() > self.threshold {
                        *flag = true;
                    }
                }
            }
        }

        mask
    }

    /// Return the frame without outlier rows, preserving row order
    pub fn apply(&self, frame: &Frame) -> Frame {
        let keep: Vec<bool> = self.outlier_mask(frame).iter().map(|&o| !o).collect();
        let filtered = frame.retain_rows(&keep);

        info!(
            "Outlier filter (|z| > {}): kept {} of {} rows",
            self.threshold,
            filtered.n_rows(),
            frame.n_rows()
        );

        filtered
    }
}

impl Default for OutlierFilter {
    fn default() -> Self {
        Self::new(DEFAULT_Z_THRESHOLD)
    }
}
