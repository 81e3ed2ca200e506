//! Login, logout, the role dashboards and the profile page.

use axum::extract::rejection::FormRejection;
use axum::extract::{Form, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::{info, warn};

use super::{clear_session_cookie, current_principal, found, guard, parse_cookie, set_session_cookie, views, AppState, SESSION_COOKIE};
use crate::error::{AppError, AppResult};
use crate::identity::{Role, ANY_ROLE};
use crate::security;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub role: String,
    pub email: String,
    pub password: String,
}

pub async fn home(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match current_principal(&state, &headers) {
        Some(_) => found("/dashboard"),
        None => found("/login"),
    }
}

pub async fn login_page() -> Response {
    views::login(None).into_response()
}

pub async fn login(State(state): State<AppState>, form: Result<Form<LoginForm>, FormRejection>) -> AppResult<Response> {
    let form = form.map(|Form(f)| f).unwrap_or_default();
    let principal = match form.role.parse::<Role>() {
        Ok(role) => security::authenticate(&state.store, role, &form.email, &form.password).await?,
        Err(_) => None,
    };
    let Some(principal) = principal else {
        warn!(target: "certportal::auth", "login rejected role='{}' email='{}'", form.role, form.email);
        return Ok((StatusCode::UNAUTHORIZED, views::login(Some("Invalid credentials"))).into_response());
    };

    let session = state.sessions.issue(principal).map_err(|e| AppError::internal("session_id", e.to_string()))?;
    info!(target: "certportal::auth", "login role={} email='{}'", session.principal.role, session.principal.email);
    let cookie = set_session_cookie(&session.session_id, state.config.cookie_secure)?;
    Ok((
        StatusCode::FOUND,
        [(header::LOCATION, HeaderValue::from_static("/dashboard")), (header::SET_COOKIE, cookie)],
    )
        .into_response())
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(sid) = parse_cookie(&headers, SESSION_COOKIE) {
        if state.sessions.logout(&sid) {
            info!(target: "certportal::auth", "logout");
        }
    }
    (
        StatusCode::FOUND,
        [(header::LOCATION, HeaderValue::from_static("/login")), (header::SET_COOKIE, clear_session_cookie())],
    )
        .into_response()
}

pub async fn dashboard(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let authed = guard(&state, &headers, ANY_ROLE)?;
    let flash = state.sessions.take_flash(&authed.sid);
    let page = match authed.role() {
        Role::Student => {
            let (mentor, count) = {
                let store = state.store.0.lock();
                let mentor = store.find_student_by_email(authed.email())?.and_then(|s| s.mentor_email);
                (mentor, store.documents_for_student(authed.email())?.len())
            };
            views::student_dashboard(&authed.principal, &flash, mentor.as_deref(), count)
        }
        Role::Staff => {
            let mentees = state.store.0.lock().students_mentored_by(authed.email())?.len();
            views::staff_dashboard(&authed.principal, &flash, mentees)
        }
        Role::Admin => {
            let (staff, students) = {
                let store = state.store.0.lock();
                (store.list_staff()?.len(), store.list_students()?.len())
            };
            views::admin_dashboard(&authed.principal, &flash, staff, students)
        }
    };
    Ok(page.into_response())
}

pub async fn profile(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let authed = guard(&state, &headers, ANY_ROLE)?;
    let flash = state.sessions.take_flash(&authed.sid);
    let details: Vec<(&str, String)> = match authed.role() {
        Role::Student => {
            let mentor = state.store.0.lock().find_student_by_email(authed.email())?.and_then(|s| s.mentor_email);
            vec![("Mentor", mentor.unwrap_or_else(|| "not assigned".to_string()))]
        }
        Role::Staff => {
            let mentees = state.store.0.lock().students_mentored_by(authed.email())?;
            let list = mentees.iter().map(|s| s.email.as_str()).collect::<Vec<_>>().join(", ");
            vec![("Students", list)]
        }
        Role::Admin => Vec::new(),
    };
    Ok(views::profile(&authed.principal, &flash, &details).into_response())
}
