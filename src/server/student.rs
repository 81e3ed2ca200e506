//! Student pages: certificate upload and the student's own document list.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use tracing::{error, info};

use super::{guard, views, AppState};
use crate::error::{AppError, AppResult};
use crate::identity::STUDENT_ONLY;

pub async fn upload_page(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let authed = guard(&state, &headers, STUDENT_ONLY)?;
    let flash = state.sessions.take_flash(&authed.sid);
    Ok(views::upload(&authed.principal, &flash).into_response())
}

/// The `file` and `cert_type` parts of an upload form.
#[derive(Debug, Default)]
struct UploadParts {
    filename: Option<String>,
    data: Bytes,
    cert_type: Option<String>,
}

async fn read_parts(mut multipart: Multipart) -> AppResult<UploadParts> {
    let mut parts = UploadParts::default();
    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("file") => {
                parts.filename = field.file_name().map(str::to_string).filter(|n| !n.is_empty());
                parts.data = field.bytes().await?;
            }
            Some("cert_type") => {
                let text = field.text().await?;
                let text = text.trim();
                parts.cert_type = (!text.is_empty()).then(|| text.to_string());
            }
            _ => {}
        }
    }
    Ok(parts)
}

/// Configuration first, then the file, then the blob put, then the row.
/// A row is only written after the blob is stored.
pub async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Response> {
    let authed = guard(&state, &headers, STUDENT_ONLY)?;

    let container = match state.blobs.preflight() {
        Ok(c) => c.to_string(),
        Err(missing) => {
            error!(target: "certportal::upload", "{} is not set; rejecting upload from '{}'", missing.env_var(), authed.email());
            return Err(AppError::config("storage_misconfigured", format!("Server misconfigured: {} not set", missing.env_var())));
        }
    };

    let no_file = || AppError::user("no_file", "No file provided");
    let Ok(multipart) = multipart else { return Err(no_file()) };
    let parts = read_parts(multipart).await?;
    let Some(filename) = parts.filename else { return Err(no_file()) };
    let size = parts.data.len();

    state.blobs.put(&container, &filename, parts.data, true).await?;

    let id = state.store.0.lock().insert_document(authed.email(), &filename, parts.cert_type.as_deref())?;
    info!(
        target: "certportal::upload",
        "stored '{}' ({} bytes) for '{}' document id={} type={:?}",
        filename, size, authed.email(), id, parts.cert_type
    );
    Ok((StatusCode::OK, "Uploaded successfully").into_response())
}

pub async fn my_documents(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let authed = guard(&state, &headers, STUDENT_ONLY)?;
    let flash = state.sessions.take_flash(&authed.sid);
    let docs = state.store.0.lock().documents_for_student(authed.email())?;
    Ok(views::documents("My documents", &authed.principal, &flash, &docs).into_response())
}
