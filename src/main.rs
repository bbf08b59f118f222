use anyhow::Result;
use axum::Router;
use sqlx::sqlite::SqlitePoolOptions;
use std::{fs, io::ErrorKind, path::Path, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod handlers;
mod models;
mod routes;
mod services;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config + migrate flag ---
    let (cfg, migrate) = config::AppConfig::from_env_and_args()?;

    tracing::info!("Starting image-store with config: {:?}", cfg);

    // --- Ensure upload directory exists ---
    // Created non-recursively: a missing parent is a startup error.
    if !cfg.upload_dir.exists() {
        fs::create_dir(&cfg.upload_dir)?;
        tracing::info!("Created upload directory at {}", cfg.upload_dir.display());
    }

    // --- Initialize SQLite connection ---
    let db_url = &cfg.database_url;
    tracing::debug!("Connecting using raw URL => {}", db_url);

    // Extract the local file path SQLx will use
    let db_path = db_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("file:");
    tracing::debug!("Interpreted SQLite path => {}", db_path);

    // Create parent directory if needed
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
            tracing::info!("Created missing directory {:?}", parent);
        }
    }

    // SQLx does not create the database file on its own
    match fs::OpenOptions::new().create(true).write(true).open(db_path) {
        Ok(_) => tracing::debug!("Database file is present."),
        Err(e) => tracing::warn!("Failed to pre-create database file: {}", e),
    }

    let db: Arc<sqlx::Pool<sqlx::Sqlite>> = Arc::new(
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await?,
    );

    // --- Handle migration mode ---
    if migrate {
        run_migrations(&db).await?;
        tracing::info!("Database migration complete.");
        return Ok(()); // exit after migration
    }

    // --- Initialize core service ---
    let service = services::upload_service::UploadService::new(
        db.clone(),
        cfg.upload_dir.clone(),
        cfg.url_prefix.clone(),
        cfg.list_any_dir,
    );

    // --- Build router ---
    let app: Router = routes::routes::routes().with_state(service);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Run SQLite migrations manually from the embedded SQL file.
async fn run_migrations(db: &Arc<sqlx::Pool<sqlx::Sqlite>>) -> Result<()> {
    let path = "migrations/0001_init.sql";

    if !Path::new(path).exists() {
        anyhow::bail!("Migration file not found: {}", path);
    }

    let sql = fs::read_to_string(path)?;
    let statements = sql
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();

    tracing::info!("Running {} migration statements...", statements.len());

    for stmt in statements {
        tracing::debug!("Executing migration SQL: {}", stmt);
        sqlx::query(stmt).execute(&**db).await?;
    }

    Ok(())
}
