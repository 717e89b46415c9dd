//! Column moments

/// Population mean and standard deviation of a column
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Moments {
    /// Mean value
    pub mean: f64,
    /// Standard deviation (divisor N)
    pub std_dev: f64,
}

impl Moments {
    /// Compute moments from a slice of values
    pub fn compute(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let m2: f64 = values.iter().map(|&v| (v - mean) * (v - mean)).sum();

        Self {
            mean,
            std_dev: (m2 / n).sqrt(),
        }
    }

    /// Z-score of a value, `None` when the column has no spread
    pub fn z_score(&self, value: f64) -> Option<f64> {
        let z = (value - self.mean) / self.std_dev;
        z.is_finite().then_some(z)
    }
}
