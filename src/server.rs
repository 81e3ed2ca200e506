//!
//! certportal HTTP server
//! ----------------------
//! Axum router for the certificate portal: login/logout, role dashboards,
//! account management for admins and staff, mentor mapping, certificate
//! upload and document listings.
//!
//! Responsibilities:
//! - Cookie-backed server-side sessions via the injected `SessionManager`.
//! - One role guard (`guard`) in front of every protected handler.
//! - No-cache headers on every response.
//! - Startup: open the SQLite store, seed accounts, build the blob adapter,
//!   serve until Ctrl+C / SIGTERM.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::{DefaultBodyLimit, Request};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tracing::{debug, info, warn};

use crate::blob::BlobStore;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::identity::{check_access, Access, Principal, Role, SessionId, SessionManager};
use crate::security;
use crate::storage::SharedStore;

mod admin;
mod auth;
mod staff;
mod student;
pub mod views;

pub const SESSION_COOKIE: &str = "portal_session";

/// Everything a handler can reach. Cloned per request; all fields are shared.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: SharedStore,
    pub sessions: Arc<SessionManager>,
    pub blobs: Arc<BlobStore>,
}

impl AppState {
    pub fn new(config: Config, store: SharedStore, blobs: BlobStore) -> Self {
        let sessions = Arc::new(SessionManager::new(config.session_ttl));
        Self { config: Arc::new(config), store, sessions, blobs: Arc::new(blobs) }
    }
}

/// A request that passed the role guard.
#[derive(Debug, Clone)]
pub struct Authed {
    pub sid: SessionId,
    pub principal: Principal,
}

impl Authed {
    pub fn email(&self) -> &str { &self.principal.email }
    pub fn role(&self) -> Role { self.principal.role }
}

pub async fn run_with_config(config: Config) -> anyhow::Result<()> {
    info!(target: "startup", "{}", config.summary());

    let store = SharedStore::open(&config.db_path)
        .with_context(|| format!("While opening database: {}", config.db_path))?;
    seed_accounts(&store, &config)?;

    let blobs = BlobStore::from_settings(config.storage.clone());
    let addr: SocketAddr = format!("{}:{}", config.bind_addr, config.http_port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.bind_addr, config.http_port))?;

    let app = build_router(AppState::new(config, store, blobs));

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    info!("Server stopped");
    Ok(())
}

/// Default admin always; the demo mentor only when asked for.
pub fn seed_accounts(store: &SharedStore, config: &Config) -> anyhow::Result<()> {
    let mut guard = store.0.lock();
    let admin_hash = security::hash_password(&config.admin_password)?;
    if guard.ensure_default_admin(&config.admin_email, &admin_hash)? {
        info!(target: "startup", "Created default admin '{}'", config.admin_email);
    }
    if config.seed_demo_staff {
        let staff_hash = security::hash_password(crate::storage::DEMO_STAFF_PASSWORD)?;
        if guard.seed_demo_staff(&staff_hash)? {
            info!(target: "startup", "Seeded demo staff '{}'", crate::storage::DEMO_STAFF_EMAIL);
        }
    }
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;
    Router::new()
        .route("/", get(auth::home))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/dashboard", get(auth::dashboard))
        .route("/profile", get(auth::profile))
        .route("/create_student", post(staff::create_student))
        .route("/upload", get(student::upload_page).post(student::upload))
        .route("/my-documents", get(student::my_documents))
        .route("/documents", get(staff::manage_documents))
        .route("/staff/manage_students", get(staff::manage_students))
        .route("/staff/map_student/{id}", post(staff::map_student))
        .route("/staff/unmap_student/{id}", post(staff::unmap_student))
        .route("/staff/manage_documents", get(staff::manage_documents))
        .route("/admin/create_staff", post(admin::create_staff))
        .route("/admin/staff/{id}", get(admin::staff_detail).post(admin::edit_staff))
        .route("/admin/student/{id}", get(admin::student_detail).post(admin::edit_student))
        .route("/admin/manage_staffs", get(admin::manage_staffs))
        .route("/admin/manage_students", get(admin::manage_students))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(no_cache))
        .with_state(state)
}

/// Resolve the session cookie and check its role against `allowed`.
pub(crate) fn guard(state: &AppState, headers: &HeaderMap, allowed: &[Role]) -> AppResult<Authed> {
    let sid = parse_cookie(headers, SESSION_COOKIE);
    let principal = sid.as_deref().and_then(|s| state.sessions.validate(s));
    match (check_access(principal, allowed), sid) {
        (Access::Granted(principal), Some(sid)) => Ok(Authed { sid, principal }),
        (Access::Forbidden(p), _) => {
            warn!(target: "certportal::http", "role {} not allowed here (email='{}')", p.role, p.email);
            Err(AppError::login_required("forbidden", "Role not allowed"))
        }
        _ => {
            debug!(target: "certportal::http", "no valid session");
            Err(AppError::login_required("unauthenticated", "Login required"))
        }
    }
}

/// Session lookup without a role requirement, for `/`.
pub(crate) fn current_principal(state: &AppState, headers: &HeaderMap) -> Option<Principal> {
    parse_cookie(headers, SESSION_COOKIE).and_then(|sid| state.sessions.validate(&sid))
}

/// 302 with a Location header. `Redirect::to` answers 303.
pub(crate) fn found(location: &'static str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

pub(crate) fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie = headers.get(header::COOKIE)?;
    let s = cookie.to_str().ok()?;
    for part in s.split(';') {
        let p = part.trim();
        if let Some((k, v)) = p.split_once('=') {
            if k == name && !v.is_empty() { return Some(v.to_string()); }
        }
    }
    None
}

pub(crate) fn set_session_cookie(sid: &str, secure: bool) -> AppResult<HeaderValue> {
    let secure = if secure { "; Secure" } else { "" };
    HeaderValue::from_str(&format!("{}={}; HttpOnly; SameSite=Strict; Path=/{}", SESSION_COOKIE, sid, secure))
        .map_err(|e| AppError::internal("cookie", e.to_string()))
}

pub(crate) fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static(
        "portal_session=deleted; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Max-Age=0; HttpOnly; SameSite=Strict; Path=/",
    )
}

async fn no_cache(req: Request, next: Next) -> Response {
    let mut resp = next.run(req).await;
    let headers = resp.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store, no-cache, must-revalidate"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    resp
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
