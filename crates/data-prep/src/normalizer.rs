//! Column Header Normalization

use crate::error::PrepError;
use crate::frame::{Column, Frame};
use tracing::debug;

/// Rewrites raw dataset headers into lowercase, underscore-separated names.
///
/// `"Mother's qualification"` becomes `mother_qualification` and
/// `"Daytime/evening attendance\t"` becomes `daytime_evening_attendance`.
/// Normalizing an already normalized header returns it unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnNormalizer;

impl ColumnNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize a single header
    pub fn normalize_header(&self, raw: &str) -> String {
        let mut name: String = raw
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(c, '\t' | '(' | ')'))
            .map(|c| if c == ' ' || c == '/' { '_' } else { c })
            .collect();

        // Stripping one marker can expose another ("''ss" -> "'s")
        while name.contains("'s") {
            name = name.replace("'s", "");
        }

        name
    }

    /// Normalize every header of a frame.
    ///
    /// Fails if two headers collapse to the same name.
    pub fn apply(&self, frame: Frame) -> Result<Frame, PrepError> {
        let columns: Vec<Column> = frame
            .into_columns()
            .into_iter()
            .map(|column| {
                let name = self.normalize_header(&column.name);
                if name != column.name {
                    debug!("Renamed column {:?} -> {}", column.name, name);
                }
                Column { name, ..column }
            })
            .collect();

        Frame::new(columns)
    }
}
