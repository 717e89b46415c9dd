//! Enrolled-student bulk loader
//!
//! Seeds the demo table from the raw dataset. Unlike the fitting pipeline,
//! this path is lossy on purpose: blank or unparseable cells become `0.0`.

use crate::record::{NewStudent, StudentProfile, PROFILE_LEN};
use crate::repository::StudentRepository;
use crate::StorageError;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// Dataset header → storage column, in `PROFILE_COLUMNS` order
pub const SOURCE_COLUMNS: [(&str, &str); PROFILE_LEN] = [
    ("Marital status", "estado_civil"),
    ("Application mode", "modo_aplicacion"),
    ("Application order", "orden_aplicacion"),
    ("Course", "curso"),
    ("Daytime/evening attendance", "asistencia"),
    ("Previous qualification", "calificacion_previa"),
    ("Previous qualification (grade)", "nota_previa"),
    ("Nacionality", "nacionalidad"),
    ("Mother's qualification", "estudios_madre"),
    ("Father's qualification", "estudios_padre"),
    ("Mother's occupation", "ocupacion_madre"),
    ("Father's occupation", "ocupacion_padre"),
    ("Admission grade", "nota_admision"),
    ("Displaced", "desplazado"),
    ("Educational special needs", "nee"),
    ("Debtor", "deudor"),
    ("Tuition fees up to date", "matricula_al_dia"),
    ("Gender", "genero"),
    ("Scholarship holder", "becado"),
    ("Age at enrollment", "edad"),
    ("International", "internacional"),
    ("Curricular units 1st sem (credited)", "cu1_creditos"),
    ("Curricular units 1st sem (enrolled)", "cu1_inscritas"),
    ("Curricular units 1st sem (evaluations)", "cu1_evaluaciones"),
    ("Curricular units 1st sem (approved)", "cu1_aprobadas"),
    ("Curricular units 1st sem (grade)", "cu1_nota"),
    ("Curricular units 1st sem (without evaluations)", "cu1_sin_eval"),
    ("Curricular units 2nd sem (credited)", "cu2_creditos"),
    ("Curricular units 2nd sem (enrolled)", "cu2_inscritas"),
    ("Curricular units 2nd sem (evaluations)", "cu2_evaluaciones"),
    ("Curricular units 2nd sem (approved)", "cu2_aprobadas"),
    ("Curricular units 2nd sem (grade)", "cu2_nota"),
    ("Curricular units 2nd sem (without evaluations)", "cu2_sin_eval"),
    ("Unemployment rate", "tasa_desempleo"),
    ("Inflation rate", "inflacion"),
    ("GDP", "pib"),
];

const TARGET_FIELD: &str = "Target";

/// Bulk loader settings
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Number of students to load
    pub max_students: usize,
    /// Label a row must carry to be loaded
    pub label: String,
    /// Delete existing students before loading
    pub force: bool,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            max_students: 20,
            label: "Enrolled".to_string(),
            force: false,
        }
    }
}

/// What the loader did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Table already populated and `force` was not set
    Skipped { existing: usize },
    /// Students were inserted
    Loaded { inserted: usize, deleted: u64 },
}

/// Load up to `max_students` rows labelled `label` from the dataset
pub async fn load_enrolled_students(
    repo: &StudentRepository,
    dataset: &Path,
    options: &LoaderOptions,
) -> Result<LoadOutcome, StorageError> {
    let existing = repo.count().await?;
    if !options.force && existing >= options.max_students {
        warn!(
            "{} demo students already stored; use --force to regenerate them",
            existing
        );
        return Ok(LoadOutcome::Skipped { existing });
    }

    let file = std::fs::File::open(dataset).map_err(|e| {
        StorageError::Dataset(format!("dataset not found at {}: {}", dataset.display(), e))
    })?;
    let students = read_enrolled(file, &options.label, options.max_students)?;

    let deleted = if options.force {
        let deleted = repo.clear().await?;
        warn!("Deleted {} existing student records", deleted);
        deleted
    } else {
        0
    };

    let ids = repo.insert_many(&students).await?;
    info!("Loaded {} demo students from {}", ids.len(), dataset.display());

    Ok(LoadOutcome::Loaded {
        inserted: ids.len(),
        deleted,
    })
}

/// Read the first `max_students` rows whose target equals `label`.
///
/// Fails if fewer than `max_students` qualifying rows exist.
pub fn read_enrolled<R: Read>(
    reader: R,
    label: &str,
    max_students: usize,
) -> Result<Vec<NewStudent>, StorageError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let position = |name: &str| headers.iter().position(|h| h == name);

    let target_idx = position(TARGET_FIELD);
    let source_idx: Vec<Option<usize>> = SOURCE_COLUMNS
        .iter()
        .map(|(source, _)| position(*source))
        .collect();

    let mut students = Vec::with_capacity(max_students);

    for (row_index, record) in reader.records().enumerate() {
        let record = record?;
        let cell = |idx: Option<usize>| idx.and_then(|i| record.get(i)).map(str::trim);

        if cell(target_idx) != Some(label) {
            continue;
        }

        let mut values = [0.0; PROFILE_LEN];
        for (value, &idx) in values.iter_mut().zip(&source_idx) {
            *value = parse_lossy(cell(idx).unwrap_or(""));
        }

        let n = students.len() + 1;
        students.push(NewStudent {
            full_name: format!("{} Student {}", label, n),
            email: format!("student{}@demo.edu", n),
            source_row: row_index as i64 + 1,
            profile: StudentProfile::from_values(values),
        });

        if students.len() == max_students {
            break;
        }
    }

    if students.len() < max_students {
        return Err(StorageError::InsufficientRecords {
            label: label.to_string(),
            found: students.len(),
            required: max_students,
        });
    }

    Ok(students)
}

/// Blank → 0, decimal comma accepted, anything unparseable → 0
fn parse_lossy(raw: &str) -> f64 {
    let raw = if raw.is_empty() { "0" } else { raw };
    raw.replace(',', ".").parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn dataset(rows: &[(&str, &str, &str)]) -> String {
        let mut csv = String::from("Marital status;Debtor;Curricular units 1st sem (grade);Target\n");
        for (i, (debtor, grade, target)) in rows.iter().enumerate() {
            csv.push_str(&format!("{};{};{};{}\n", i % 3 + 1, debtor, grade, target));
        }
        csv
    }

    #[test]
    fn test_parse_lossy() {
        assert_eq!(parse_lossy(""), 0.0);
        assert_eq!(parse_lossy("12,5"), 12.5);
        assert_eq!(parse_lossy("n/a"), 0.0);
        assert_eq!(parse_lossy("3"), 3.0);
    }

    #[test]
    fn test_selects_only_enrolled_rows() {
        let csv = dataset(&[
            ("0", "12.0", "Graduate"),
            ("1", "13,5", "Enrolled"),
            ("0", "", "Dropout"),
            ("0", "oops", "Enrolled"),
            ("1", "11", "Enrolled"),
        ]);

        let students = read_enrolled(csv.as_bytes(), "Enrolled", 2).unwrap();
        assert_eq!(students.len(), 2);

        assert_eq!(students[0].source_row, 2);
        assert_eq!(students[0].full_name, "Enrolled Student 1");
        assert_eq!(students[0].email, "student1@demo.edu");
        assert_eq!(students[0].profile.deudor, 1.0);
        assert_eq!(students[0].profile.cu1_nota, 13.5);

        assert_eq!(students[1].source_row, 4);
        assert_eq!(students[1].profile.cu1_nota, 0.0);
        // Columns absent from the file load as zero
        assert_eq!(students[1].profile.pib, 0.0);
    }

    #[test]
    fn test_insufficient_rows() {
        let csv = dataset(&[("0", "12.0", "Enrolled"), ("0", "10.0", "Graduate")]);
        let result = read_enrolled(csv.as_bytes(), "Enrolled", 20);
        assert!(matches!(
            result,
            Err(StorageError::InsufficientRecords { found: 1, required: 20, .. })
        ));
    }

    #[test]
    fn test_headers_and_cells_are_trimmed() {
        let csv = "Debtor ; Target\n 1 ; Enrolled \n";
        let students = read_enrolled(csv.as_bytes(), "Enrolled", 1).unwrap();
        assert_eq!(students[0].profile.deudor, 1.0);
    }

    #[tokio::test]
    async fn test_force_reload() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let rows: Vec<_> = (0..4).map(|_| ("0", "12.0", "Enrolled")).collect();
        file.write_all(dataset(&rows).as_bytes()).unwrap();

        let repo = StudentRepository::in_memory().await.unwrap();
        let options = LoaderOptions {
            max_students: 3,
            ..Default::default()
        };

        let first = load_enrolled_students(&repo, file.path(), &options).await.unwrap();
        assert_eq!(first, LoadOutcome::Loaded { inserted: 3, deleted: 0 });

        let second = load_enrolled_students(&repo, file.path(), &options).await.unwrap();
        assert_eq!(second, LoadOutcome::Skipped { existing: 3 });

        let forced = LoaderOptions {
            force: true,
            ..options
        };
        let third = load_enrolled_students(&repo, file.path(), &forced).await.unwrap();
        assert_eq!(third, LoadOutcome::Loaded { inserted: 3, deleted: 3 });
        assert_eq!(repo.count().await.unwrap(), 3);
    }
}
