//! Core data models for the image upload service.
//!
//! These entities represent stored files and like events. They map to the
//! database via `sqlx::FromRow` where persisted and serialize naturally as
//! JSON via `serde`.

pub mod like;
pub mod stored_file;
