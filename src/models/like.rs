#![allow(dead_code)]
//! Represents a persisted like event.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One like event for a named image.
///
/// Rows are append-only: created once per like request, never updated or
/// deleted. The image name is stored unvalidated and need not reference an
/// existing stored file — there is no referential integrity to enforce.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct LikeRecord {
    /// Auto-increment identifier assigned by the database.
    pub id: i64,

    /// Name of the liked image, exactly as supplied by the client.
    pub image_name: String,
}
