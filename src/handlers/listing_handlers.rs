//! Directory listing handlers.
//!
//! One parameterized operation backs all the listing routes; the legacy
//! paths are aliases with fixed scopes:
//! - `GET /ls`         — the upload directory, or `?dir=<path>`
//! - `GET /ls-uploads` — always the upload directory
//! - `GET /ls-root`    — always `/`
//!
//! Paths outside the upload directory (including `/ls-root`) only work
//! with the explicit `--list-any-dir` opt-in. With that flag set there is
//! no containment check at all: ANY directory the process can read may be
//! listed. It is intentionally unsafe and off by default.

use crate::{errors::AppError, services::upload_service::UploadService};
use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::error;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub dir: Option<String>,
}

/// Body returned by every listing route.
#[derive(Serialize)]
pub struct ListingResponse {
    pub files: Vec<String>,
    pub directory: String,
}

/// GET /ls — list the upload directory, or an arbitrary `?dir=<path>`.
pub async fn list_directory(
    State(service): State<UploadService>,
    Query(q): Query<ListQuery>,
) -> Result<Json<ListingResponse>, AppError> {
    let target = match q.dir {
        Some(dir) => PathBuf::from(dir),
        None => service.upload_dir.clone(),
    };
    list_path(&service, &target).await
}

/// GET /ls-uploads — list the upload directory.
pub async fn list_uploads(
    State(service): State<UploadService>,
) -> Result<Json<ListingResponse>, AppError> {
    let target = service.upload_dir.clone();
    list_path(&service, &target).await
}

/// GET /ls-root — list the filesystem root.
pub async fn list_root(
    State(service): State<UploadService>,
) -> Result<Json<ListingResponse>, AppError> {
    list_path(&service, Path::new("/")).await
}

/// Shared listing flow: gate the target, read it, and answer with one
/// generic error body on any read failure — causes are not distinguished
/// for the client.
async fn list_path(
    service: &UploadService,
    target: &Path,
) -> Result<Json<ListingResponse>, AppError> {
    if !service.may_list(target) {
        return Err(AppError::forbidden(
            "listing outside the upload directory is disabled",
        ));
    }

    let files = service.list_dir(target).await.map_err(|err| {
        error!("could not list {}: {}", target.display(), err);
        AppError::internal("could not read directory")
    })?;

    Ok(Json(ListingResponse {
        files,
        directory: target.display().to_string(),
    }))
}
