//! HTTP handlers for uploading, serving, and randomly selecting images.
//! Streams bodies in and out to avoid buffering whole files in memory and
//! delegates storage concerns to `UploadService`.

use crate::{errors::AppError, services::upload_service::UploadService};
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use serde::Serialize;
use serde_json::json;
use std::io;
use tokio_util::io::ReaderStream;

/// The one multipart field the upload endpoint accepts.
const UPLOAD_FIELD: &str = "image";

/// Body returned on a successful upload.
#[derive(Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub filename: String,
    pub path: String,
}

/// Body returned by the random selector.
#[derive(Serialize)]
pub struct RandomImageResponse {
    pub url: String,
}

/// POST /upload — store the multipart field named `image`.
///
/// Other fields are drained and ignored. No MIME, size, or extension
/// validation happens here; whatever bytes arrive are stored as-is.
/// A body with no `image` field is a 400, and nothing is written.
pub async fn upload_image(
    State(service): State<UploadService>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(|err| {
        AppError::new(
            StatusCode::BAD_REQUEST,
            format!("malformed multipart body: {}", err),
        )
    })? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let original_name = field.file_name().unwrap_or(UPLOAD_FIELD).to_string();
        let stream = field.map(|chunk| chunk.map_err(|err| io::Error::new(io::ErrorKind::Other, err)));
        let stored = service.store_stream(&original_name, stream).await?;

        return Ok(Json(UploadResponse {
            message: "image uploaded successfully".into(),
            filename: stored.name,
            path: stored.url,
        })
        .into_response());
    }

    Ok((
        StatusCode::BAD_REQUEST,
        Json(json!({ "message": "no file was uploaded" })),
    )
        .into_response())
}

/// GET /images/{name} and /uploads/{name} — stream a stored file.
///
/// The path segment maps directly to a file name inside the upload
/// directory; the content type is inferred from the extension.
pub async fn serve_image(
    State(service): State<UploadService>,
    Path(name): Path<String>,
) -> Result<Response, AppError> {
    let file = service.open_stored(&name).await?;
    let stream = ReaderStream::new(file);

    let content_type = mime_guess::from_path(&name).first_or_octet_stream();
    let mut response = Response::new(Body::from_stream(stream));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type.as_ref())
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    Ok(response)
}

/// GET /random-cow — one stored file, uniformly at random.
pub async fn random_image(
    State(service): State<UploadService>,
) -> Result<Json<RandomImageResponse>, AppError> {
    let url = service.random_url().await?;
    Ok(Json(RandomImageResponse { url }))
}
