//!
//! certportal storage module
//! -------------------------
//! The relational store for the portal: one SQLite file holding the tables
//! `admins`, `staff`, `students` and `documents` (see [`schema`]).
//!
//! Key responsibilities:
//! - Schema creation and first-run seeding (default admin, optional demo staff).
//! - Credential lookups and account CRUD ([`accounts`]).
//! - Mentor mapping with single-statement conditional updates.
//! - Document metadata inserts and role-scoped listings ([`documents`]).
//!
//! References between tables are by email value, not foreign keys. Writes that
//! touch more than one table run inside one transaction so those references
//! stay consistent. The public API centers around the `Store` type, which is
//! wrapped in a thread-safe `SharedStore` (`Arc<Mutex<Store>>`) by the server.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use tracing::{debug, info};

pub mod schema;
pub mod accounts;
pub mod documents;

pub use accounts::{MapOutcome, StaffRecord, StudentRecord, UnmapOutcome};
pub use documents::DocumentRecord;

/// Seed account created by the first-run demo seeding (mirrors the original
/// bootstrap script).
pub const DEMO_STAFF_EMAIL: &str = "mentor@college.com";
pub const DEMO_STAFF_PASSWORD: &str = "1234";

/// Handle over a single SQLite connection.
pub struct Store {
    conn: Connection,
    /// `None` for in-memory stores.
    path: Option<PathBuf>,
}

impl Store {
    /// Open (creating if needed) the database file and ensure all tables exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create database folder: {}", dir.display()))?;
            }
        }
        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let store = Self { conn, path: Some(path) };
        store.ensure_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let store = Self { conn: Connection::open_in_memory()?, path: None };
        store.ensure_schema()?;
        Ok(store)
    }

    pub fn path(&self) -> Option<&Path> { self.path.as_deref() }

    pub fn ensure_schema(&self) -> Result<()> {
        self.conn.execute_batch(schema::CREATE_TABLES).context("While creating portal tables")?;
        debug!(target: "certportal::storage", "schema ensured");
        Ok(())
    }

    /// Insert the default admin when the admins table is empty.
    /// Returns true when a row was created.
    pub fn ensure_default_admin(&mut self, email: &str, password_hash: &str) -> Result<bool> {
        let tx = self.conn.transaction()?;
        let existing: i64 = tx.query_row("SELECT COUNT(1) FROM admins", [], |r| r.get(0))?;
        if existing > 0 {
            return Ok(false);
        }
        tx.execute("INSERT INTO admins (email, password) VALUES (?1, ?2)", params![email, password_hash])?;
        tx.commit()?;
        info!(target: "certportal::storage", "Seeded default admin '{}'", email);
        Ok(true)
    }

    /// Insert the demo mentor when the staff table is empty.
    pub fn seed_demo_staff(&mut self, password_hash: &str) -> Result<bool> {
        let tx = self.conn.transaction()?;
        let existing: i64 = tx.query_row("SELECT COUNT(1) FROM staff", [], |r| r.get(0))?;
        if existing > 0 {
            return Ok(false);
        }
        tx.execute("INSERT INTO staff (email, password) VALUES (?1, ?2)", params![DEMO_STAFF_EMAIL, password_hash])?;
        tx.commit()?;
        info!(target: "certportal::storage", "Seeded demo staff '{}'", DEMO_STAFF_EMAIL);
        Ok(true)
    }

    pub(crate) fn conn(&self) -> &Connection { &self.conn }

    pub(crate) fn conn_mut(&mut self) -> &mut Connection { &mut self.conn }
}

#[derive(Clone)]
pub struct SharedStore(pub Arc<Mutex<Store>>);

impl SharedStore {
    pub fn new(store: Store) -> Self {
        Self(Arc::new(Mutex::new(store)))
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(Store::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Store::open_in_memory()?))
    }
}

#[cfg(test)]
#[path = "storage_tests.rs"]
mod storage_tests;
