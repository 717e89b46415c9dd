//! Column-oriented dataset frame

use crate::error::PrepError;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Cell storage for one column
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    /// Every cell parsed as a float
    Numeric(Vec<f64>),
    /// At least one cell was not numeric
    Text(Vec<String>),
}

impl ColumnData {
    /// Number of cells
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(values) => values.len(),
            ColumnData::Text(values) => values.len(),
        }
    }

    /// Whether the column has no cells
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn select(&self, rows: &[usize]) -> Self {
        match self {
            ColumnData::Numeric(values) => {
                ColumnData::Numeric(rows.iter().map(|&i| values[i]).collect())
            }
            ColumnData::Text(values) => {
                ColumnData::Text(rows.iter().map(|&i| values[i].clone()).collect())
            }
        }
    }

    /// Infer the column type from raw cells
    fn infer(cells: Vec<String>) -> Self {
        let parsed: Option<Vec<f64>> = cells
            .iter()
            .map(|cell| cell.trim().parse::<f64>().ok())
            .collect();

        match parsed {
            Some(values) => ColumnData::Numeric(values),
            None => ColumnData::Text(cells),
        }
    }
}

/// A named column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    /// Create a numeric column
    pub fn numeric(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Numeric(values),
        }
    }

    /// Create a text column
    pub fn text(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Text(values),
        }
    }

    /// Numeric cells, if this is a numeric column
    pub fn as_numeric(&self) -> Option<&[f64]> {
        match &self.data {
            ColumnData::Numeric(values) => Some(values),
            ColumnData::Text(_) => None,
        }
    }

    /// Text cells, if this is a text column
    pub fn as_text(&self) -> Option<&[String]> {
        match &self.data {
            ColumnData::Text(values) => Some(values),
            ColumnData::Numeric(_) => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.data, ColumnData::Numeric(_))
    }
}

/// Table of dataset rows stored column by column.
///
/// Column names are unique and every column has the same number of rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    columns: Vec<Column>,
    n_rows: usize,
}

impl Frame {
    /// Build a frame, rejecting duplicate names and ragged columns
    pub fn new(columns: Vec<Column>) -> Result<Self, PrepError> {
        let n_rows = columns.first().map(|c| c.data.len()).unwrap_or(0);
        let mut seen = HashSet::with_capacity(columns.len());

        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(PrepError::DuplicateColumn(column.name.clone()));
            }
            if column.data.len() != n_rows {
                return Err(PrepError::RaggedColumn {
                    column: column.name.clone(),
                    expected: n_rows,
                    actual: column.data.len(),
                });
            }
        }

        Ok(Self { columns, n_rows })
    }

    /// Read a semicolon-delimited CSV file with a header row
    pub fn read_csv(path: impl AsRef<Path>) -> Result<Self, PrepError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| PrepError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let frame = Self::from_reader(file)?;
        info!(
            "Loaded dataset {}: {} rows x {} columns",
            path.display(),
            frame.n_rows(),
            frame.n_columns()
        );
        Ok(frame)
    }

    /// Parse semicolon-delimited CSV from any reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, PrepError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
        let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];

        for record in reader.records() {
            let record = record?;
            for (column, value) in cells.iter_mut().zip(record.iter()) {
                column.push(value.to_string());
            }
        }

        let columns = headers
            .into_iter()
            .zip(cells)
            .map(|(name, values)| Column {
                name,
                data: ColumnData::infer(values),
            })
            .collect();

        Self::new(columns)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in frame order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Consume the frame and return its columns
    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    /// Keep the rows at the given indices, in the given order
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        debug!("Selecting {} of {} rows", rows.len(), self.n_rows);
        Self {
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    data: c.data.select(rows),
                })
                .collect(),
            n_rows: rows.len(),
        }
    }

    /// Keep rows where `keep` is true, preserving order
    pub fn retain_rows(&self, keep: &[bool]) -> Self {
        let rows: Vec<usize> = keep
            .iter()
            .enumerate()
            .filter_map(|(i, &k)| k.then_some(i))
            .collect();
        self.select_rows(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Age;Course;Target\n20;33;Graduate\n19;171;Dropout\n25;9500;Enrolled\n";

    #[test]
    fn test_read_semicolon_csv() {
        let frame = Frame::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(frame.n_rows(), 3);
        assert_eq!(frame.column_names(), vec!["Age", "Course", "Target"]);
        assert_eq!(frame.column("Age").unwrap().as_numeric(), Some(&[20.0, 19.0, 25.0][..]));
        assert!(!frame.column("Target").unwrap().is_numeric());
    }

    #[test]
    fn test_mixed_column_is_text() {
        let frame = Frame::from_reader("a;b\n1;x\n2;3\n".as_bytes()).unwrap();
        assert!(frame.column("a").unwrap().is_numeric());
        assert!(!frame.column("b").unwrap().is_numeric());
    }

    #[test]
    fn test_ragged_row_rejected() {
        let result = Frame::from_reader("a;b\n1;2\n3\n".as_bytes());
        assert!(matches!(result, Err(PrepError::Csv(_))));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = Frame::new(vec![
            Column::numeric("x", vec![1.0]),
            Column::numeric("x", vec![2.0]),
        ]);
        assert!(matches!(result, Err(PrepError::DuplicateColumn(name)) if name == "x"));
    }

    #[test]
    fn test_retain_rows_preserves_order() {
        let frame = Frame::from_reader(SAMPLE.as_bytes()).unwrap();
        let kept = frame.retain_rows(&[true, false, true]);
        assert_eq!(kept.n_rows(), 2);
        assert_eq!(
            kept.column("Target").unwrap().as_text().unwrap(),
            &["Graduate".to_string(), "Enrolled".to_string()]
        );
    }
}
