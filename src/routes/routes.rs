//! Defines routes for all upload, serving, listing, and like operations.
//!
//! ## Structure
//! - **Upload & serving**
//!   - `POST /upload`          — store one multipart `image` field
//!   - `GET  /images/{name}`   — stream a stored file
//!   - `GET  /uploads/{name}`  — same handler, legacy prefix
//!   - `GET  /random-cow`      — URL of one stored file, picked at random
//!
//! - **Directory listing** (one handler, legacy aliases)
//!   - `GET  /ls`              — upload dir, or `?dir=<path>` with the opt-in
//!   - `GET  /ls-uploads`      — upload dir
//!   - `GET  /ls-root`         — filesystem root (needs the opt-in)
//!
//! - **Likes**
//!   - `POST /like/{image}`    — append a like row, return its id
//!
//! - **Health**
//!   - `GET  /`, `/healthz`, `/readyz`

use crate::{
    handlers::{
        health_handlers::{healthz, index, readyz},
        like_handlers::like_image,
        listing_handlers::{list_directory, list_root, list_uploads},
        upload_handlers::{random_image, serve_image, upload_image},
    },
    services::upload_service::UploadService,
};
use axum::{
    Router,
    routing::{get, post},
};

/// Build and return the router for all routes.
///
/// The router carries shared state (`UploadService`) to all handlers.
pub fn routes() -> Router<UploadService> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // upload & serving
        .route("/upload", post(upload_image))
        .route("/images/{name}", get(serve_image))
        .route("/uploads/{name}", get(serve_image))
        .route("/random-cow", get(random_image))
        // directory listing
        .route("/ls", get(list_directory))
        .route("/ls-uploads", get(list_uploads))
        .route("/ls-root", get(list_root))
        // likes
        .route("/like/{image}", post(like_image))
}
