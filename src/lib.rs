//! certportal: a multi-role certificate portal.
//!
//! Students upload certificates to Azure Blob Storage, staff mentors review
//! the documents of the students mapped to them, and admins manage accounts.

pub mod blob;
pub mod config;
pub mod error;
pub mod identity;
pub mod security;
pub mod server;
pub mod storage;
