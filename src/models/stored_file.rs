//! Represents a file persisted by the upload handler.

use serde::{Deserialize, Serialize};

/// A single stored file, addressable by its generated name.
///
/// The struct carries the identifiers derived at upload time, not the
/// content bytes. The generated name is `{epoch-millis}-{original-name}`
/// with the client's original name taken verbatim, so uniqueness is only
/// probabilistic: two uploads of the same original name within the same
/// millisecond collide and the last writer wins.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StoredFile {
    /// Generated unique name the file was saved under.
    pub name: String,

    /// Public URL path the file is served from (`{url_prefix}/{name}`).
    pub url: String,

    /// Size of the stored content in bytes.
    pub size_bytes: i64,
}
