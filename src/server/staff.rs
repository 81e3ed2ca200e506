//! Staff pages: student creation, mentor mapping and the mentee document list.

use axum::extract::rejection::{FormRejection, PathRejection};
use axum::extract::{Form, Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::info;

use super::{found, guard, views, AppState};
use crate::error::{AppError, AppResult};
use crate::identity::{Role, STAFF_ONLY, STAFF_OR_ADMIN};
use crate::security;
use crate::storage::{MapOutcome, UnmapOutcome};

const MANAGE_STUDENTS: &str = "/staff/manage_students";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AccountForm {
    pub email: String,
    pub password: String,
}

impl AccountForm {
    /// Trimmed email and password, or the 400 both create routes answer with.
    pub fn required(&self) -> AppResult<(&str, &str)> {
        let email = self.email.trim();
        if email.is_empty() || self.password.is_empty() {
            return Err(AppError::user("missing_fields", "Email and password required"));
        }
        Ok((email, self.password.as_str()))
    }
}

/// Staff create students mentored by themselves; admins create them unassigned.
pub async fn create_student(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: Result<Form<AccountForm>, FormRejection>,
) -> AppResult<Response> {
    let authed = guard(&state, &headers, STAFF_OR_ADMIN)?;
    let form = form.map(|Form(f)| f).unwrap_or_default();
    let (email, password) = form.required()?;
    let mentor = match authed.role() {
        Role::Staff => Some(authed.email()),
        _ => None,
    };
    let hash = security::hash_password_blocking(password.to_string()).await?;
    let id = state.store.0.lock().create_student(email, &hash, mentor)?;
    info!(target: "certportal::accounts", "{} '{}' created student id={} email='{}'", authed.role(), authed.email(), id, email);
    state.sessions.push_flash(&authed.sid, format!("Student {email} created"));
    Ok(found("/dashboard"))
}

pub async fn manage_students(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let authed = guard(&state, &headers, STAFF_ONLY)?;
    let flash = state.sessions.take_flash(&authed.sid);
    let students = state.store.0.lock().list_students()?;
    Ok(views::staff_students(&authed.principal, &flash, &students).into_response())
}

pub async fn map_student(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<Response> {
    let authed = guard(&state, &headers, STAFF_ONLY)?;
    let outcome = match id {
        Ok(Path(id)) => state.store.0.lock().map_student(id, authed.email())?,
        Err(_) => MapOutcome::NotFound,
    };
    let message = match outcome {
        MapOutcome::Mapped => "Student mapped to you",
        MapOutcome::NotFound => "Student not found",
        MapOutcome::AlreadyAssigned => "Student already assigned to a mentor",
    };
    state.sessions.push_flash(&authed.sid, message);
    Ok(found(MANAGE_STUDENTS))
}

pub async fn unmap_student(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<Response> {
    let authed = guard(&state, &headers, STAFF_ONLY)?;
    let outcome = match id {
        Ok(Path(id)) => state.store.0.lock().unmap_student(id, authed.email())?,
        Err(_) => UnmapOutcome::NotFound,
    };
    let message = match outcome {
        UnmapOutcome::Unmapped => "Student unmapped",
        UnmapOutcome::NotFound => "Student not found",
        UnmapOutcome::NotMentor => "You are not this student's mentor",
    };
    state.sessions.push_flash(&authed.sid, message);
    Ok(found(MANAGE_STUDENTS))
}

/// Documents of every student whose mentor is the signed-in staff member.
pub async fn manage_documents(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let authed = guard(&state, &headers, STAFF_ONLY)?;
    let flash = state.sessions.take_flash(&authed.sid);
    let docs = state.store.0.lock().documents_for_mentor(authed.email())?;
    Ok(views::documents("Mentee documents", &authed.principal, &flash, &docs).into_response())
}
