//! One-hot Expansion of Categorical Columns

use crate::error::PrepError;
use crate::frame::{Column, ColumnData, Frame};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Categorical columns of the student dataset, in expansion order
pub const STUDENT_CATEGORICAL_COLUMNS: [&str; 9] = [
    "marital_status",
    "daytime_evening_attendance",
    "tuition_fees_up_to_date",
    "educational_special_needs",
    "displaced",
    "scholarship_holder",
    "gender",
    "debtor",
    "international",
];

/// Replaces categorical columns with one 0/1 indicator per observed code.
///
/// Indicators are named `{column}_{code}` and appended after the
/// untouched columns, grouped by source column and sorted by code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalEncoder {
    columns: Vec<String>,
}

impl CategoricalEncoder {
    /// Create an encoder for the given column names
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Encoder for the student dataset's categorical columns
    pub fn student_dataset() -> Self {
        Self::new(STUDENT_CATEGORICAL_COLUMNS)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Expand every configured column present in the frame
    pub fn apply(&self, frame: Frame) -> Result<Frame, PrepError> {
        let mut remaining = frame.into_columns();
        let mut indicators = Vec::new();

        for name in &self.columns {
            let Some(pos) = remaining.iter().position(|c| &c.name == name) else {
                debug!("Categorical column {} not present, skipping", name);
                continue;
            };
            let source = remaining.remove(pos);
            let codes = category_codes(&source)?;
            let expanded = expand(name, &codes);
            debug!("Expanded {} into {} indicator columns", name, expanded.len());
            indicators.extend(expanded);
        }

        remaining.extend(indicators);
        Frame::new(remaining)
    }
}

impl Default for CategoricalEncoder {
    fn default() -> Self {
        Self::student_dataset()
    }
}

/// Integer code per cell; fractional values are truncated toward zero
fn category_codes(column: &Column) -> Result<Vec<i64>, PrepError> {
    match &column.data {
        ColumnData::Numeric(values) => Ok(values.iter().map(|v| v.trunc() as i64).collect()),
        ColumnData::Text(values) => values
            .iter()
            .map(|raw| {
                raw.trim()
                    .parse::<f64>()
                    .map(|v| v.trunc() as i64)
                    .map_err(|_| PrepError::InvalidCategory {
                        column: column.name.clone(),
                        value: raw.clone(),
                    })
            })
            .collect(),
    }
}

fn expand(name: &str, codes: &[i64]) -> Vec<Column> {
    let observed: BTreeSet<i64> = codes.iter().copied().collect();

    observed
        .into_iter()
        .map(|category| {
            let indicator = codes
                .iter()
                .map(|&code| if code == category { 1.0 } else { 0.0 })
                .collect();
            Column::numeric(format!("{}_{}", name, category), indicator)
        })
        .collect()
}
