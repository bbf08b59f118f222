//! src/services/upload_service.rs
//!
//! UploadService — the filesystem and database operations behind the HTTP
//! handlers: storing uploads under generated names, opening stored files
//! for serving, listing directories, picking a random stored image, and
//! recording like events in SQLite. Handlers stay thin; every suspension
//! point (disk, database) lives here.

use crate::models::stored_file::StoredFile;
use bytes::Bytes;
use chrono::Utc;
use futures::{Stream, StreamExt, pin_mut};
use rand::Rng;
use sqlx::SqlitePool;
use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::debug;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("file `{name}` not found")]
    FileNotFound { name: String },
    #[error("no files available in the upload directory")]
    NoFilesAvailable,
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type UploadResult<T> = Result<T, UploadError>;

/// UploadService provides the operations the routes are built from:
/// - Store an upload (streamed write under a generated name)
/// - Open a stored file for serving
/// - List a directory's immediate entries
/// - Pick one stored file uniformly at random
/// - Record a like event (single parameterized insert)
///
/// Shared state is the upload directory and the SQLite pool; no handler
/// depends on another's in-memory state.
#[derive(Clone)]
pub struct UploadService {
    /// Shared SQLite connection pool used for like records.
    pub db: Arc<SqlitePool>,

    /// Directory all uploads are written to and served from.
    pub upload_dir: PathBuf,

    /// Prefix prepended to generated names when building public URLs.
    pub url_prefix: String,

    /// Whether listing endpoints may leave the upload directory. Off by
    /// default; enabling it exposes every directory the process can read.
    pub list_any_dir: bool,
}

impl UploadService {
    /// Create a new UploadService over the given pool, upload directory,
    /// and public URL prefix.
    pub fn new(
        db: Arc<SqlitePool>,
        upload_dir: impl Into<PathBuf>,
        url_prefix: impl Into<String>,
        list_any_dir: bool,
    ) -> Self {
        Self {
            db,
            upload_dir: upload_dir.into(),
            url_prefix: url_prefix.into(),
            list_any_dir,
        }
    }

    /// True when `target` may be listed: anything under the upload
    /// directory always, anything else only with the explicit opt-in.
    pub fn may_list(&self, target: &Path) -> bool {
        self.list_any_dir || target.starts_with(&self.upload_dir)
    }

    /// Generated name: current epoch millis, a hyphen, then the client's
    /// original file name verbatim, separators and all. Two uploads of the
    /// same original name in the same millisecond collide and overwrite.
    fn generate_name(original: &str) -> String {
        format!("{}-{}", Utc::now().timestamp_millis(), original)
    }

    /// Disk path a stored name maps to.
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.upload_dir.join(name)
    }

    /// Public URL path a stored name is served from.
    pub fn public_url(&self, name: &str) -> String {
        format!("{}/{}", self.url_prefix.trim_end_matches('/'), name)
    }

    /// Stream an upload to disk under a freshly generated name.
    ///
    /// Writes straight to the final path — no temp file, no atomic rename —
    /// so a colliding name is overwritten by the last writer. A partially
    /// written file is removed best-effort when the stream or the disk
    /// fails mid-write.
    pub async fn store_stream<S>(&self, original_name: &str, stream: S) -> UploadResult<StoredFile>
    where
        S: Stream<Item = io::Result<Bytes>> + Send,
    {
        let name = Self::generate_name(original_name);
        let path = self.file_path(&name);
        let mut file = File::create(&path).await?;

        let mut size_bytes: i64 = 0;
        pin_mut!(stream);
        while let Some(chunk_res) = stream.next().await {
            let chunk = match chunk_res {
                Ok(chunk) => chunk,
                Err(err) => {
                    let _ = fs::remove_file(&path).await;
                    return Err(UploadError::Io(err));
                }
            };
            size_bytes += chunk.len() as i64;
            if let Err(err) = file.write_all(&chunk).await {
                let _ = fs::remove_file(&path).await;
                return Err(UploadError::Io(err));
            }
        }
        if let Err(err) = file.flush().await {
            let _ = fs::remove_file(&path).await;
            return Err(UploadError::Io(err));
        }

        debug!("stored {} ({} bytes)", path.display(), size_bytes);

        Ok(StoredFile {
            url: self.public_url(&name),
            name,
            size_bytes,
        })
    }

    /// Open a stored file for streaming out.
    ///
    /// Returns FileNotFound when the name has no file behind it.
    pub async fn open_stored(&self, name: &str) -> UploadResult<File> {
        let path = self.file_path(name);
        File::open(&path).await.map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                UploadError::FileNotFound {
                    name: name.to_string(),
                }
            } else {
                UploadError::Io(err)
            }
        })
    }

    /// List a directory's immediate entries — file and directory names
    /// only, no recursion, no metadata. Sorted for stable output.
    pub async fn list_dir(&self, dir: &Path) -> UploadResult<Vec<String>> {
        let mut entries = fs::read_dir(dir).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    /// Pick one entry of the upload directory uniformly at random and
    /// return its public URL. Subdirectories and non-image files are
    /// candidates too; nothing is filtered. An empty directory is an
    /// explicit error, never a malformed URL.
    pub async fn random_url(&self) -> UploadResult<String> {
        let files = self.list_dir(&self.upload_dir).await?;
        if files.is_empty() {
            return Err(UploadError::NoFilesAvailable);
        }
        let idx = rand::rng().random_range(0..files.len());
        Ok(self.public_url(&files[idx]))
    }

    /// Insert one like row for the given image name and return the
    /// generated identifier. The name is bound as a parameter, never
    /// concatenated into the statement, and is not checked against the
    /// stored files.
    pub async fn record_like(&self, image_name: &str) -> UploadResult<i64> {
        let result = sqlx::query("INSERT INTO image_likes (image_name) VALUES (?)")
            .bind(image_name)
            .execute(&*self.db)
            .await?;
        Ok(result.last_insert_rowid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::like::LikeRecord;
    use anyhow::Result;
    use sqlx::sqlite::SqlitePoolOptions;
    use tokio::io::AsyncReadExt;

    async fn test_service() -> Result<(UploadService, tempfile::TempDir)> {
        let dir = tempfile::tempdir()?;
        // A single connection keeps the in-memory database shared across
        // queries in the test.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        sqlx::query(
            "CREATE TABLE image_likes (id INTEGER PRIMARY KEY AUTOINCREMENT, image_name TEXT NOT NULL)",
        )
        .execute(&pool)
        .await?;
        let service = UploadService::new(Arc::new(pool), dir.path(), "/images", false);
        Ok((service, dir))
    }

    fn one_chunk(bytes: &'static [u8]) -> impl Stream<Item = io::Result<Bytes>> + Send {
        futures::stream::iter([Ok(Bytes::from_static(bytes))])
    }

    #[tokio::test]
    async fn store_stream_writes_byte_identical_content() -> Result<()> {
        let (service, dir) = test_service().await?;

        let stored = service.store_stream("cow.png", one_chunk(b"not really a png")).await?;

        let (millis, rest) = stored.name.split_once('-').expect("name has a hyphen");
        assert!(millis.parse::<i64>()? > 0);
        assert_eq!(rest, "cow.png");
        assert_eq!(stored.url, format!("/images/{}", stored.name));
        assert_eq!(stored.size_bytes, 16);

        let on_disk = std::fs::read(dir.path().join(&stored.name))?;
        assert_eq!(on_disk, b"not really a png");
        Ok(())
    }

    #[tokio::test]
    async fn store_stream_keeps_original_name_verbatim() -> Result<()> {
        let (service, _dir) = test_service().await?;

        let stored = service
            .store_stream("we ird !name.PNG", one_chunk(b"x"))
            .await?;

        assert!(stored.name.ends_with("-we ird !name.PNG"));
        Ok(())
    }

    #[tokio::test]
    async fn store_stream_handles_multiple_chunks() -> Result<()> {
        let (service, dir) = test_service().await?;
        let chunks = futures::stream::iter([
            Ok(Bytes::from_static(b"first-")),
            Ok(Bytes::from_static(b"second")),
        ]);

        let stored = service.store_stream("split.bin", chunks).await?;

        let on_disk = std::fs::read(dir.path().join(&stored.name))?;
        assert_eq!(on_disk, b"first-second");
        Ok(())
    }

    #[tokio::test]
    async fn open_stored_round_trips_content() -> Result<()> {
        let (service, _dir) = test_service().await?;
        let stored = service.store_stream("pic.jpg", one_chunk(b"jpeg bytes")).await?;

        let mut file = service.open_stored(&stored.name).await?;
        let mut content = Vec::new();
        file.read_to_end(&mut content).await?;
        assert_eq!(content, b"jpeg bytes");
        Ok(())
    }

    #[tokio::test]
    async fn open_stored_unknown_name_is_not_found() -> Result<()> {
        let (service, _dir) = test_service().await?;

        let err = service.open_stored("never-uploaded.png").await.unwrap_err();
        assert!(matches!(err, UploadError::FileNotFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn list_dir_on_empty_upload_dir_is_empty() -> Result<()> {
        let (service, _dir) = test_service().await?;

        let files = service.list_dir(&service.upload_dir).await?;
        assert!(files.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn list_dir_returns_stored_names() -> Result<()> {
        let (service, _dir) = test_service().await?;
        let a = service.store_stream("a.png", one_chunk(b"a")).await?;
        let b = service.store_stream("b.png", one_chunk(b"b")).await?;

        let files = service.list_dir(&service.upload_dir).await?;
        assert_eq!(files.len(), 2);
        assert!(files.contains(&a.name));
        assert!(files.contains(&b.name));
        Ok(())
    }

    #[tokio::test]
    async fn list_dir_on_missing_directory_fails() -> Result<()> {
        let (service, dir) = test_service().await?;

        let result = service.list_dir(&dir.path().join("nonexistent")).await;
        assert!(matches!(result, Err(UploadError::Io(_))));
        Ok(())
    }

    #[tokio::test]
    async fn random_url_with_single_file_returns_it() -> Result<()> {
        let (service, dir) = test_service().await?;
        std::fs::write(dir.path().join("a.png"), b"a")?;

        let url = service.random_url().await?;
        assert_eq!(url, "/images/a.png");
        Ok(())
    }

    #[tokio::test]
    async fn random_url_on_empty_dir_fails() -> Result<()> {
        let (service, _dir) = test_service().await?;

        let err = service.random_url().await.unwrap_err();
        assert!(matches!(err, UploadError::NoFilesAvailable));
        Ok(())
    }

    #[tokio::test]
    async fn random_url_picks_from_all_entries() -> Result<()> {
        let (service, dir) = test_service().await?;
        std::fs::write(dir.path().join("a.png"), b"a")?;
        std::fs::write(dir.path().join("b.png"), b"b")?;

        let url = service.random_url().await?;
        assert!(url == "/images/a.png" || url == "/images/b.png");
        Ok(())
    }

    #[tokio::test]
    async fn record_like_returns_increasing_ids_and_persists() -> Result<()> {
        let (service, _dir) = test_service().await?;

        let first = service.record_like("cow.png").await?;
        let second = service.record_like("cow.png").await?;
        assert!(first > 0);
        assert!(second > first);

        let rows: Vec<LikeRecord> =
            sqlx::query_as("SELECT id, image_name FROM image_likes ORDER BY id")
                .fetch_all(&*service.db)
                .await?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].image_name, "cow.png");
        assert_eq!(rows[0].id, first);
        Ok(())
    }

    #[tokio::test]
    async fn record_like_accepts_names_never_uploaded() -> Result<()> {
        let (service, _dir) = test_service().await?;

        let id = service.record_like("ghost.png").await?;
        assert!(id > 0);
        Ok(())
    }

    #[tokio::test]
    async fn may_list_gates_paths_outside_the_upload_dir() -> Result<()> {
        let (service, dir) = test_service().await?;
        assert!(service.may_list(&dir.path().join("sub")));
        assert!(!service.may_list(Path::new("/")));

        let unrestricted = UploadService::new(service.db.clone(), dir.path(), "/images", true);
        assert!(unrestricted.may_list(Path::new("/")));
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_uploads_of_distinct_names_are_independent() -> Result<()> {
        let (service, dir) = test_service().await?;

        let (a, b) = tokio::join!(
            service.store_stream("left.png", one_chunk(b"left bytes")),
            service.store_stream("right.png", one_chunk(b"right bytes")),
        );
        let (a, b) = (a?, b?);

        assert_ne!(a.name, b.name);
        assert_eq!(std::fs::read(dir.path().join(&a.name))?, b"left bytes");
        assert_eq!(std::fs::read(dir.path().join(&b.name))?, b"right bytes");
        Ok(())
    }
}
