//! Like recorder handler.

use crate::services::upload_service::UploadService;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

/// POST /like/{image} — append one like row and return the generated id.
///
/// The image name is not checked against the stored files; liking a name
/// that was never uploaded still persists a row. Store failures are
/// logged server-side and answered with one generic body, not retried.
pub async fn like_image(
    State(service): State<UploadService>,
    Path(image): Path<String>,
) -> Response {
    match service.record_like(&image).await {
        Ok(id) => Json(json!({ "success": true, "id": id })).into_response(),
        Err(err) => {
            error!("failed to record like for `{}`: {}", image, err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": "failed to record like" })),
            )
                .into_response()
        }
    }
}
