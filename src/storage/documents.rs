//! Document metadata. Rows are only ever inserted; the blob itself lives in
//! object storage under `filename`.

use anyhow::Result;
use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::Serialize;

use super::Store;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentRecord {
    pub id: i64,
    pub student_email: String,
    pub filename: String,
    pub cert_type: Option<String>,
    /// UTC, as written by SQLite's `CURRENT_TIMESTAMP`.
    pub uploaded_at: Option<NaiveDateTime>,
}

fn document_from_row(row: &Row<'_>) -> rusqlite::Result<DocumentRecord> {
    Ok(DocumentRecord {
        id: row.get(0)?,
        student_email: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        filename: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        cert_type: row.get(3)?,
        uploaded_at: row.get(4)?,
    })
}

const DOC_COLUMNS: &str = "d.id, d.student_email, d.filename, d.cert_type, d.uploaded_at";

impl Store {
    pub fn insert_document(&self, student_email: &str, filename: &str, cert_type: Option<&str>) -> Result<i64> {
        self.conn().execute(
            "INSERT INTO documents (student_email, filename, cert_type) VALUES (?1, ?2, ?3)",
            params![student_email, filename, cert_type],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    pub fn documents_for_student(&self, student_email: &str) -> Result<Vec<DocumentRecord>> {
        let sql = format!("SELECT {DOC_COLUMNS} FROM documents d WHERE d.student_email = ?1 ORDER BY d.id");
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params![student_email], document_from_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Documents whose owner is currently mentored by `staff_email`.
    pub fn documents_for_mentor(&self, staff_email: &str) -> Result<Vec<DocumentRecord>> {
        // DISTINCT: duplicate student emails would otherwise repeat each document.
        let sql = format!(
            "SELECT DISTINCT {DOC_COLUMNS} FROM documents d \
             JOIN students s ON s.email = d.student_email \
             WHERE s.mentor_email = ?1 ORDER BY d.id"
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params![staff_email], document_from_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn count_documents(&self) -> Result<i64> {
        Ok(self.conn().query_row("SELECT COUNT(1) FROM documents", [], |r| r.get(0))?)
    }
}
