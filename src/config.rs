use anyhow::{Context, Result};
use clap::Parser;
use std::{
    env,
    path::{Path, PathBuf},
};

/// Directory name used when neither override is given. Joined to the
/// directory the executable lives in.
const DEFAULT_UPLOAD_DIR_NAME: &str = "uploads";

/// Centralized application configuration.
/// Combines environment variables and CLI arguments, resolved once at
/// startup and passed by handle into the service — no ambient globals.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Resolved path all uploads land in.
    pub upload_dir: PathBuf,
    /// Prefix prepended to generated names when building public URLs.
    pub url_prefix: String,
    pub database_url: String,
    /// Opt-in for listing directories outside the upload dir. Unsafe:
    /// exposes any directory readable by the process.
    pub list_any_dir: bool,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "HTTP image upload and serving service")]
pub struct Args {
    /// Host to bind to (overrides IMAGE_STORE_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides IMAGE_STORE_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Full path to the upload directory (overrides IMAGE_STORE_UPLOAD_DIR)
    #[arg(long)]
    pub upload_dir: Option<String>,

    /// Bare directory name joined to the executable's location
    /// (overrides IMAGE_STORE_UPLOAD_DIR_NAME; ignored if --upload-dir is set)
    #[arg(long)]
    pub upload_dir_name: Option<String>,

    /// URL prefix for served images (overrides IMAGE_STORE_URL_PREFIX)
    #[arg(long)]
    pub url_prefix: Option<String>,

    /// Database URL (overrides IMAGE_STORE_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Allow /ls?dir= and /ls-root to list directories outside the upload
    /// directory. UNSAFE: any directory readable by the process is exposed.
    #[arg(long)]
    pub list_any_dir: bool,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();

        let env_host = env::var("IMAGE_STORE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("IMAGE_STORE_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing IMAGE_STORE_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 3000,
            Err(err) => return Err(err).context("reading IMAGE_STORE_PORT"),
        };
        let env_upload_dir = env::var("IMAGE_STORE_UPLOAD_DIR").ok();
        let env_upload_dir_name = env::var("IMAGE_STORE_UPLOAD_DIR_NAME").ok();
        let env_url_prefix =
            env::var("IMAGE_STORE_URL_PREFIX").unwrap_or_else(|_| "/images".into());
        let env_db = env::var("IMAGE_STORE_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/image_store.db".into());
        let env_list_any = env::var("IMAGE_STORE_LIST_ANY_DIR")
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let exe_dir = executable_dir()?;
        let upload_dir = resolve_upload_dir(
            args.upload_dir.or(env_upload_dir).as_deref(),
            args.upload_dir_name.or(env_upload_dir_name).as_deref(),
            &exe_dir,
        );

        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            upload_dir,
            url_prefix: args.url_prefix.unwrap_or(env_url_prefix),
            database_url: args.database_url.unwrap_or(env_db),
            list_any_dir: args.list_any_dir || env_list_any,
        };

        Ok((cfg, args.migrate))
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Directory the running executable lives in, used as the base for
/// relative upload-directory names.
fn executable_dir() -> Result<PathBuf> {
    let exe = env::current_exe().context("locating current executable")?;
    Ok(exe
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(".")))
}

/// Resolution order: explicit full path wins, then a bare name joined to
/// the executable's directory, then the hard-coded default name.
fn resolve_upload_dir(full: Option<&str>, name: Option<&str>, exe_dir: &Path) -> PathBuf {
    match full {
        Some(path) => PathBuf::from(path),
        None => exe_dir.join(name.unwrap_or(DEFAULT_UPLOAD_DIR_NAME)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_path_override_wins() {
        let dir = resolve_upload_dir(Some("/srv/files"), Some("ignored"), Path::new("/opt/app"));
        assert_eq!(dir, PathBuf::from("/srv/files"));
    }

    #[test]
    fn bare_name_joins_executable_dir() {
        let dir = resolve_upload_dir(None, Some("pictures"), Path::new("/opt/app"));
        assert_eq!(dir, PathBuf::from("/opt/app/pictures"));
    }

    #[test]
    fn default_name_used_when_nothing_set() {
        let dir = resolve_upload_dir(None, None, Path::new("/opt/app"));
        assert_eq!(dir, PathBuf::from("/opt/app/uploads"));
    }
}
