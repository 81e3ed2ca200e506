use super::*;

#[test]
fn http_status_mapping() {
    assert_eq!(AppError::user("bad_input", "oops").http_status(), 400);
    assert_eq!(AppError::not_found("not_found", "missing").http_status(), 404);
    assert_eq!(AppError::TooLarge { code: "big".into(), message: "too big".into() }.http_status(), 413);
    assert_eq!(AppError::login_required("login", "no session").http_status(), 302);
    assert_eq!(AppError::config("config", "unset").http_status(), 500);
    assert_eq!(AppError::internal("internal", "panic").http_status(), 500);
}

#[test]
fn display_carries_code_and_message() {
    let e = AppError::config("missing_account", "Server misconfigured: AZURE_STORAGE_ACCOUNT not set");
    assert_eq!(e.to_string(), "missing_account: Server misconfigured: AZURE_STORAGE_ACCOUNT not set");
}

#[test]
fn blob_errors_map_to_bad_gateway() {
    let e: AppError = BlobError::AlreadyExists("a.pdf".into()).into();
    assert_eq!(e.http_status(), 502);
    assert!(e.message().starts_with("Upload failed:"));
}

#[test]
fn unstorable_blob_names_are_bad_requests() {
    let e: AppError = BlobError::InvalidName("a//b.pdf".into()).into();
    assert_eq!(e.http_status(), 400);
    assert_eq!(e.code_str(), "invalid_filename");
}

#[test]
fn config_error_renders_plain_text_500() {
    let resp = AppError::config("missing_container", "Server misconfigured: AZURE_CONTAINER not set").into_response();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let ct = resp.headers().get(axum::http::header::CONTENT_TYPE).and_then(|v| v.to_str().ok()).unwrap_or("");
    assert!(ct.starts_with("text/plain"));
}

#[test]
fn login_required_redirects_to_login() {
    let resp = AppError::login_required("wrong_role", "staff only").into_response();
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(resp.headers().get(axum::http::header::LOCATION).unwrap(), "/login");
}
