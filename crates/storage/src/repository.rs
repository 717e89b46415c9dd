//! Repository Implementation

use crate::record::{NewStudent, StudentRecord, PROFILE_COLUMNS};
use crate::StorageError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info};

/// Repository for demo student records backed by SQLite
#[derive(Debug, Clone)]
pub struct StudentRepository {
    pool: SqlitePool,
}

impl StudentRepository {
    /// Connect to a SQLite database, creating the file and schema if missing
    pub async fn connect(url: &str) -> Result<Self, StorageError> {
        info!("Opening student database at {}", url);
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let repo = Self { pool };
        repo.migrate().await?;
        Ok(repo)
    }

    /// Private in-memory database (one pinned connection)
    pub async fn in_memory() -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let repo = Self { pool };
        repo.migrate().await?;
        Ok(repo)
    }

    async fn migrate(&self) -> Result<(), StorageError> {
        let attributes: Vec<String> = PROFILE_COLUMNS
            .iter()
            .map(|c| format!("{} REAL NOT NULL", c))
            .collect();
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS students (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                full_name TEXT NOT NULL,
                email TEXT NOT NULL,
                source_row INTEGER NOT NULL,
                {},
                created_at_ms INTEGER NOT NULL
            )",
            attributes.join(",\n                ")
        );

        sqlx::query(&ddl).execute(&self.pool).await?;
        debug!("Student schema ready");
        Ok(())
    }

    /// Insert students in one transaction, returning their new ids
    pub async fn insert_many(&self, students: &[NewStudent]) -> Result<Vec<i64>, StorageError> {
        let placeholders = vec!["?"; PROFILE_COLUMNS.len() + 4].join(", ");
        let sql = format!(
            "INSERT INTO students (full_name, email, source_row, {}, created_at_ms) VALUES ({})",
            PROFILE_COLUMNS.join(", "),
            placeholders
        );
        let created_at_ms = chrono::Utc::now().timestamp_millis();

        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(students.len());

        for student in students {
            let mut query = sqlx::query(&sql)
                .bind(student.full_name.as_str())
                .bind(student.email.as_str())
                .bind(student.source_row);
            for value in student.profile.values() {
                query = query.bind(value);
            }
            let result = query.bind(created_at_ms).execute(&mut *tx).await?;
            ids.push(result.last_insert_rowid());
        }

        tx.commit().await?;
        info!("Inserted {} student records", ids.len());
        Ok(ids)
    }

    /// Fetch one student by id
    pub async fn get(&self, id: i64) -> Result<Option<StudentRecord>, StorageError> {
        let record = sqlx::query_as::<_, StudentRecord>("SELECT * FROM students WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    /// First `limit` students in id order
    pub async fn list(&self, limit: usize) -> Result<Vec<StudentRecord>, StorageError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let records = sqlx::query_as::<_, StudentRecord>("SELECT * FROM students ORDER BY id LIMIT ?")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    /// Total stored students
    pub async fn count(&self) -> Result<usize, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as usize)
    }

    /// Delete every student, returning how many were removed
    pub async fn clear(&self) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM students").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
