//! Shared harness: a portal on a temp SQLite file with an in-memory blob store,
//! driven through `tower::ServiceExt::oneshot`.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use object_store::memory::InMemory;
use tempfile::TempDir;
use tower::ServiceExt;

use certportal::blob::BlobStore;
use certportal::config::{Config, StorageSettings};
use certportal::server::{build_router, seed_accounts, AppState};
use certportal::storage::SharedStore;

pub const ADMIN_EMAIL: &str = "admin@college.com";
pub const ADMIN_PASSWORD: &str = "admin";
pub const CONTAINER: &str = "certs";
const BOUNDARY: &str = "certportal-test-boundary";

pub struct Portal {
    pub app: Router,
    pub state: AppState,
    _tmp: TempDir,
}

pub fn full_storage() -> StorageSettings {
    StorageSettings::new(Some("devaccount"), Some("devkey"), Some(CONTAINER))
}

impl Portal {
    pub fn new() -> Self {
        Self::with_storage(full_storage())
    }

    pub fn with_storage(storage: StorageSettings) -> Self {
        Self::with_config(|cfg| cfg.storage = storage)
    }

    pub fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let tmp = tempfile::tempdir().expect("tempdir");
        let db_path = tmp.path().join("auth.db");
        let mut config = Config { storage: full_storage(), ..Config::default() };
        adjust(&mut config);
        config.db_path = db_path.to_string_lossy().to_string();
        let storage = config.storage.clone();
        let store = SharedStore::open(&db_path).expect("open store");
        seed_accounts(&store, &config).expect("seed");
        let blobs = BlobStore::with_object_store(storage, Arc::new(InMemory::new()));
        let state = AppState::new(config, store, blobs);
        Self { app: build_router(state.clone()), state, _tmp: tmp }
    }

    pub async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(req).await.expect("router is infallible")
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        self.send(request("GET", uri, cookie).body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, cookie: Option<&str>, body: &str) -> Response<Body> {
        let req = request("POST", uri, cookie)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(req).await
    }

    /// Log in and return the `portal_session=...` pair, or None on a rejected login.
    pub async fn login(&self, role: &str, email: &str, password: &str) -> Option<String> {
        let resp = self.post_form("/login", None, &format!("role={role}&email={email}&password={password}")).await;
        if resp.status() != StatusCode::FOUND {
            return None;
        }
        session_cookie(&resp)
    }

    pub async fn admin(&self) -> String {
        self.login("admin", ADMIN_EMAIL, ADMIN_PASSWORD).await.expect("admin login")
    }

    pub async fn create_staff(&self, admin: &str, email: &str, password: &str) {
        let resp = self.post_form("/admin/create_staff", Some(admin), &format!("email={email}&password={password}")).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
    }

    pub async fn create_student(&self, creator: &str, email: &str, password: &str) {
        let resp = self.post_form("/create_student", Some(creator), &format!("email={email}&password={password}")).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
    }

    pub async fn upload(&self, cookie: &str, filename: Option<&str>, data: &[u8], cert_type: &str) -> Response<Body> {
        let mut body: Vec<u8> = Vec::new();
        if let Some(name) = filename {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\nContent-Type: application/pdf\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"cert_type\"\r\n\r\n{cert_type}\r\n--{BOUNDARY}--\r\n")
                .as_bytes(),
        );
        let req = request("POST", "/upload", Some(cookie))
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap();
        self.send(req).await
    }

    pub fn document_count(&self) -> i64 {
        self.state.store.0.lock().count_documents().unwrap()
    }
}

fn request(method: &str, uri: &str, cookie: Option<&str>) -> axum::http::request::Builder {
    let b = Request::builder().method(method).uri(uri);
    match cookie {
        Some(c) => b.header(header::COOKIE, c),
        None => b,
    }
}

pub fn session_cookie(resp: &Response<Body>) -> Option<String> {
    let raw = resp.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    let pair = raw.split(';').next()?.trim();
    pair.starts_with("portal_session=").then(|| pair.to_string())
}

pub fn location(resp: &Response<Body>) -> Option<String> {
    resp.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()).map(str::to_string)
}

pub async fn body_text(resp: Response<Body>) -> String {
    let bytes = resp.into_body().collect().await.expect("body").to_bytes();
    String::from_utf8_lossy(&bytes).to_string()
}

pub fn assert_redirect(resp: &Response<Body>, to: &str) {
    assert_eq!(resp.status(), StatusCode::FOUND, "expected redirect to {to}");
    assert_eq!(location(resp).as_deref(), Some(to));
}
