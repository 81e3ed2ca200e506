//! Admin account management: staff creation plus per-record edit/delete for
//! staff and students.

use axum::extract::rejection::{FormRejection, PathRejection};
use axum::extract::{Form, Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::info;

use super::staff::AccountForm;
use super::{found, guard, views, AppState};
use crate::error::{AppError, AppResult};
use crate::identity::{Role, ADMIN_ONLY};
use crate::security;

const MANAGE_STAFFS: &str = "/admin/manage_staffs";
const MANAGE_STUDENTS: &str = "/admin/manage_students";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditAction {
    #[default]
    Update,
    Delete,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EditForm {
    pub action: EditAction,
    pub email: String,
    pub password: String,
}

impl EditForm {
    /// New email and, when one was typed, the new password.
    fn changes(&self) -> AppResult<(&str, Option<&str>)> {
        let email = self.email.trim();
        if email.is_empty() {
            return Err(AppError::user("missing_email", "Email required"));
        }
        Ok((email, (!self.password.is_empty()).then_some(self.password.as_str())))
    }
}

async fn hash_if_set(password: Option<&str>) -> AppResult<Option<String>> {
    match password {
        Some(pw) => Ok(Some(security::hash_password_blocking(pw.to_string()).await?)),
        None => Ok(None),
    }
}

/// Drop the sessions of an email that no longer names any account in `role`.
fn end_orphaned_sessions(state: &AppState, role: Role, old_email: &str, new_email: Option<&str>) -> AppResult<()> {
    if new_email == Some(old_email) || !state.store.0.lock().credentials_for(role, old_email)?.is_empty() {
        return Ok(());
    }
    let revoked = state.sessions.revoke_email(role, old_email);
    if revoked > 0 {
        info!(target: "certportal::auth", "revoked {} session(s) of {} '{}'", revoked, role, old_email);
    }
    Ok(())
}

fn staff_not_found() -> AppError { AppError::not_found("staff_not_found", "Staff not found") }
fn student_not_found() -> AppError { AppError::not_found("student_not_found", "Student not found") }

pub async fn create_staff(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: Result<Form<AccountForm>, FormRejection>,
) -> AppResult<Response> {
    let authed = guard(&state, &headers, ADMIN_ONLY)?;
    let form = form.map(|Form(f)| f).unwrap_or_default();
    let (email, password) = form.required()?;
    let hash = security::hash_password_blocking(password.to_string()).await?;
    state.store.0.lock().create_staff(email, &hash)?;
    state.sessions.push_flash(&authed.sid, format!("Staff {email} created"));
    Ok(found(MANAGE_STAFFS))
}

pub async fn manage_staffs(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let authed = guard(&state, &headers, ADMIN_ONLY)?;
    let flash = state.sessions.take_flash(&authed.sid);
    let staff = state.store.0.lock().list_staff()?;
    Ok(views::admin_staff_list(&authed.principal, &flash, &staff).into_response())
}

pub async fn manage_students(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let authed = guard(&state, &headers, ADMIN_ONLY)?;
    let flash = state.sessions.take_flash(&authed.sid);
    let students = state.store.0.lock().list_students()?;
    Ok(views::admin_student_list(&authed.principal, &flash, &students).into_response())
}

pub async fn staff_detail(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<Response> {
    let authed = guard(&state, &headers, ADMIN_ONLY)?;
    let Ok(Path(id)) = id else { return Err(staff_not_found()) };
    let staff = state.store.0.lock().get_staff(id)?.ok_or_else(staff_not_found)?;
    let action = format!("/admin/staff/{}", staff.id);
    Ok(views::account_detail("Staff member", &action, &authed.principal, &staff.email, "").into_response())
}

pub async fn edit_staff(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<i64>, PathRejection>,
    form: Result<Form<EditForm>, FormRejection>,
) -> AppResult<Response> {
    let authed = guard(&state, &headers, ADMIN_ONLY)?;
    let Ok(Path(id)) = id else { return Err(staff_not_found()) };
    let form = form.map(|Form(f)| f).unwrap_or_default();
    let old_email = state.store.0.lock().get_staff(id)?.ok_or_else(staff_not_found)?.email;
    match form.action {
        EditAction::Delete => {
            if !state.store.0.lock().delete_staff(id)? {
                return Err(staff_not_found());
            }
            info!(target: "certportal::accounts", "admin '{}' deleted staff id={}", authed.email(), id);
            end_orphaned_sessions(&state, Role::Staff, &old_email, None)?;
            state.sessions.push_flash(&authed.sid, "Staff deleted");
        }
        EditAction::Update => {
            let (email, password) = form.changes()?;
            let hash = hash_if_set(password).await?;
            if !state.store.0.lock().update_staff(id, email, hash.as_deref())? {
                return Err(staff_not_found());
            }
            info!(target: "certportal::accounts", "admin '{}' updated staff id={}", authed.email(), id);
            end_orphaned_sessions(&state, Role::Staff, &old_email, Some(email))?;
            state.sessions.push_flash(&authed.sid, "Staff updated");
        }
    }
    Ok(found(MANAGE_STAFFS))
}

pub async fn student_detail(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<i64>, PathRejection>,
) -> AppResult<Response> {
    let authed = guard(&state, &headers, ADMIN_ONLY)?;
    let Ok(Path(id)) = id else { return Err(student_not_found()) };
    let student = state.store.0.lock().get_student(id)?.ok_or_else(student_not_found)?;
    let action = format!("/admin/student/{}", student.id);
    let mentor = format!(
        "<p>Mentor: {}</p>",
        views::escape(student.mentor_email.as_deref().unwrap_or("not assigned"))
    );
    Ok(views::account_detail("Student", &action, &authed.principal, &student.email, &mentor).into_response())
}

pub async fn edit_student(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<i64>, PathRejection>,
    form: Result<Form<EditForm>, FormRejection>,
) -> AppResult<Response> {
    let authed = guard(&state, &headers, ADMIN_ONLY)?;
    let Ok(Path(id)) = id else { return Err(student_not_found()) };
    let form = form.map(|Form(f)| f).unwrap_or_default();
    let old_email = state.store.0.lock().get_student(id)?.ok_or_else(student_not_found)?.email;
    match form.action {
        EditAction::Delete => {
            if !state.store.0.lock().delete_student(id)? {
                return Err(student_not_found());
            }
            info!(target: "certportal::accounts", "admin '{}' deleted student id={}", authed.email(), id);
            end_orphaned_sessions(&state, Role::Student, &old_email, None)?;
            state.sessions.push_flash(&authed.sid, "Student deleted");
        }
        EditAction::Update => {
            let (email, password) = form.changes()?;
            let hash = hash_if_set(password).await?;
            if !state.store.0.lock().update_student(id, email, hash.as_deref())? {
                return Err(student_not_found());
            }
            info!(target: "certportal::accounts", "admin '{}' updated student id={}", authed.email(), id);
            end_orphaned_sessions(&state, Role::Student, &old_email, Some(email))?;
            state.sessions.push_flash(&authed.sid, "Student updated");
        }
    }
    Ok(found(MANAGE_STUDENTS))
}
