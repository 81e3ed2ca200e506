//! Account tables: credential lookups, staff/student CRUD and mentor mapping.

use anyhow::Result;
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;
use tracing::info;

use super::Store;
use crate::identity::Role;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaffRecord {
    pub id: i64,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentRecord {
    pub id: i64,
    pub email: String,
    pub mentor_email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapOutcome {
    Mapped,
    NotFound,
    AlreadyAssigned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnmapOutcome {
    Unmapped,
    NotFound,
    NotMentor,
}

fn table_for(role: Role) -> &'static str {
    match role {
        Role::Student => "students",
        Role::Staff => "staff",
        Role::Admin => "admins",
    }
}

fn staff_from_row(row: &Row<'_>) -> rusqlite::Result<StaffRecord> {
    Ok(StaffRecord { id: row.get(0)?, email: row.get::<_, Option<String>>(1)?.unwrap_or_default() })
}

fn student_from_row(row: &Row<'_>) -> rusqlite::Result<StudentRecord> {
    Ok(StudentRecord {
        id: row.get(0)?,
        email: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        mentor_email: row.get(2)?,
    })
}

impl Store {
    /// `(id, stored password)` for every row of the role's table with this
    /// email, oldest first.
    pub fn credentials_for(&self, role: Role, email: &str) -> Result<Vec<(i64, String)>> {
        let sql = format!("SELECT id, password FROM {} WHERE email = ?1 ORDER BY id", table_for(role));
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt
            .query_map(params![email], |r| Ok((r.get(0)?, r.get::<_, Option<String>>(1)?.unwrap_or_default())))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn create_admin(&self, email: &str, password_hash: &str) -> Result<i64> {
        self.conn().execute("INSERT INTO admins (email, password) VALUES (?1, ?2)", params![email, password_hash])?;
        Ok(self.conn().last_insert_rowid())
    }

    // ---- staff ----

    pub fn create_staff(&self, email: &str, password_hash: &str) -> Result<i64> {
        self.conn().execute("INSERT INTO staff (email, password) VALUES (?1, ?2)", params![email, password_hash])?;
        let id = self.conn().last_insert_rowid();
        info!(target: "certportal::storage", "created staff id={} email='{}'", id, email);
        Ok(id)
    }

    pub fn list_staff(&self) -> Result<Vec<StaffRecord>> {
        let mut stmt = self.conn().prepare("SELECT id, email FROM staff ORDER BY id")?;
        let rows = stmt.query_map([], staff_from_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn get_staff(&self, id: i64) -> Result<Option<StaffRecord>> {
        Ok(self
            .conn()
            .query_row("SELECT id, email FROM staff WHERE id = ?1", params![id], staff_from_row)
            .optional()?)
    }

    /// Change a staff email (and password when given). Mentees follow the
    /// rename unless another staff row keeps the old email. Returns false
    /// when the id does not exist.
    pub fn update_staff(&mut self, id: i64, email: &str, password_hash: Option<&str>) -> Result<bool> {
        let tx = self.conn_mut().transaction()?;
        let old: Option<Option<String>> = tx
            .query_row("SELECT email FROM staff WHERE id = ?1", params![id], |r| r.get(0))
            .optional()?;
        let Some(old_email) = old else { return Ok(false) };
        tx.execute("UPDATE staff SET email = ?1 WHERE id = ?2", params![email, id])?;
        if let Some(h) = password_hash {
            tx.execute("UPDATE staff SET password = ?1 WHERE id = ?2", params![h, id])?;
        }
        if let Some(old_email) = old_email.filter(|o| o != email) {
            // Mentees stay with a staff row that still carries the old email.
            let remaining: i64 = tx.query_row("SELECT COUNT(1) FROM staff WHERE email = ?1", params![old_email], |r| r.get(0))?;
            if remaining == 0 {
                tx.execute("UPDATE students SET mentor_email = ?1 WHERE mentor_email = ?2", params![email, old_email])?;
            }
        }
        tx.commit()?;
        info!(target: "certportal::storage", "updated staff id={} email='{}'", id, email);
        Ok(true)
    }

    /// Remove a staff record and release its mentees.
    pub fn delete_staff(&mut self, id: i64) -> Result<bool> {
        let tx = self.conn_mut().transaction()?;
        let old: Option<Option<String>> = tx
            .query_row("SELECT email FROM staff WHERE id = ?1", params![id], |r| r.get(0))
            .optional()?;
        let Some(old_email) = old else { return Ok(false) };
        tx.execute("DELETE FROM staff WHERE id = ?1", params![id])?;
        if let Some(old_email) = old_email {
            // Another staff row may share the email; only release mentees when none is left.
            let remaining: i64 = tx.query_row("SELECT COUNT(1) FROM staff WHERE email = ?1", params![old_email], |r| r.get(0))?;
            if remaining == 0 {
                tx.execute("UPDATE students SET mentor_email = NULL WHERE mentor_email = ?1", params![old_email])?;
            }
        }
        tx.commit()?;
        info!(target: "certportal::storage", "deleted staff id={}", id);
        Ok(true)
    }

    // ---- students ----

    pub fn create_student(&self, email: &str, password_hash: &str, mentor_email: Option<&str>) -> Result<i64> {
        self.conn().execute(
            "INSERT INTO students (email, password, mentor_email) VALUES (?1, ?2, ?3)",
            params![email, password_hash, mentor_email],
        )?;
        let id = self.conn().last_insert_rowid();
        info!(target: "certportal::storage", "created student id={} email='{}' mentor={:?}", id, email, mentor_email);
        Ok(id)
    }

    pub fn list_students(&self) -> Result<Vec<StudentRecord>> {
        let mut stmt = self.conn().prepare("SELECT id, email, mentor_email FROM students ORDER BY id")?;
        let rows = stmt.query_map([], student_from_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn get_student(&self, id: i64) -> Result<Option<StudentRecord>> {
        Ok(self
            .conn()
            .query_row("SELECT id, email, mentor_email FROM students WHERE id = ?1", params![id], student_from_row)
            .optional()?)
    }

    /// First student row with this email, if any.
    pub fn find_student_by_email(&self, email: &str) -> Result<Option<StudentRecord>> {
        Ok(self
            .conn()
            .query_row(
                "SELECT id, email, mentor_email FROM students WHERE email = ?1 ORDER BY id LIMIT 1",
                params![email],
                student_from_row,
            )
            .optional()?)
    }

    pub fn students_mentored_by(&self, staff_email: &str) -> Result<Vec<StudentRecord>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT id, email, mentor_email FROM students WHERE mentor_email = ?1 ORDER BY id")?;
        let rows = stmt.query_map(params![staff_email], student_from_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Change a student email (and password when given). The mentor is left
    /// untouched; document rows follow the rename.
    pub fn update_student(&mut self, id: i64, email: &str, password_hash: Option<&str>) -> Result<bool> {
        let tx = self.conn_mut().transaction()?;
        let old: Option<Option<String>> = tx
            .query_row("SELECT email FROM students WHERE id = ?1", params![id], |r| r.get(0))
            .optional()?;
        let Some(old_email) = old else { return Ok(false) };
        tx.execute("UPDATE students SET email = ?1 WHERE id = ?2", params![email, id])?;
        if let Some(h) = password_hash {
            tx.execute("UPDATE students SET password = ?1 WHERE id = ?2", params![h, id])?;
        }
        if let Some(old_email) = old_email.filter(|o| o != email) {
            tx.execute("UPDATE documents SET student_email = ?1 WHERE student_email = ?2", params![email, old_email])?;
        }
        tx.commit()?;
        info!(target: "certportal::storage", "updated student id={} email='{}'", id, email);
        Ok(true)
    }

    /// Remove a student record. Their document rows are kept.
    pub fn delete_student(&self, id: i64) -> Result<bool> {
        let n = self.conn().execute("DELETE FROM students WHERE id = ?1", params![id])?;
        if n > 0 {
            info!(target: "certportal::storage", "deleted student id={}", id);
        }
        Ok(n > 0)
    }

    /// Assign `staff_email` as mentor, only if the student has none.
    pub fn map_student(&self, id: i64, staff_email: &str) -> Result<MapOutcome> {
        let n = self.conn().execute(
            "UPDATE students SET mentor_email = ?1 WHERE id = ?2 AND mentor_email IS NULL",
            params![staff_email, id],
        )?;
        if n > 0 {
            info!(target: "certportal::storage", "student id={} mapped to '{}'", id, staff_email);
            return Ok(MapOutcome::Mapped);
        }
        Ok(if self.get_student(id)?.is_some() { MapOutcome::AlreadyAssigned } else { MapOutcome::NotFound })
    }

    /// Clear the mentor, only if it is `staff_email`.
    pub fn unmap_student(&self, id: i64, staff_email: &str) -> Result<UnmapOutcome> {
        let n = self.conn().execute(
            "UPDATE students SET mentor_email = NULL WHERE id = ?1 AND mentor_email = ?2",
            params![id, staff_email],
        )?;
        if n > 0 {
            info!(target: "certportal::storage", "student id={} unmapped from '{}'", id, staff_email);
            return Ok(UnmapOutcome::Unmapped);
        }
        Ok(if self.get_student(id)?.is_some() { UnmapOutcome::NotMentor } else { UnmapOutcome::NotFound })
    }
}
