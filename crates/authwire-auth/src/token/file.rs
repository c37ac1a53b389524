//! JSON file token persistence.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use authwire_core::config::TokenConfig;
use authwire_core::error::AppError;
use authwire_core::result::AppResult;
use authwire_core::traits::TokenStorage;
use authwire_core::types::Session;

use super::record::{PersistedSession, TokenLifetimes};

/// Persists the session as a JSON document.
///
/// Writes go to a sibling temp file and are renamed into place, so a
/// crash never leaves a half-written pair. With `secure` set the file is
/// readable by the owning user only.
#[derive(Debug)]
pub struct FileTokenStorage {
    /// Target file.
    path: PathBuf,
    /// Lifetimes stamped on every save.
    lifetimes: TokenLifetimes,
    /// Restrict file permissions.
    secure: bool,
    /// Serializes read-modify-write cycles.
    io: Mutex<()>,
}

impl FileTokenStorage {
    /// Creates a backend writing to `path`.
    pub fn new(path: impl Into<PathBuf>, lifetimes: TokenLifetimes, secure: bool) -> Self {
        Self {
            path: path.into(),
            lifetimes,
            secure,
            io: Mutex::new(()),
        }
    }

    /// Creates a backend from configuration.
    pub fn from_config(config: &TokenConfig) -> Self {
        Self::new(
            &config.file_path,
            TokenLifetimes::from_config(config),
            config.secure,
        )
    }

    /// The file this backend writes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_record(&self) -> AppResult<Option<PersistedSession>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(record) => Ok(Some(record)),
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "Discarding unreadable token file");
                    Ok(None)
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::with_source(
                authwire_core::error::ErrorKind::Storage,
                format!("Failed to read token file '{}'", self.path.display()),
                e,
            )),
        }
    }

    async fn write_record(&self, record: &PersistedSession) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        let json = serde_json::to_vec_pretty(record)?;
        // A leftover temp file keeps its old mode, so start from scratch.
        remove_if_exists(&tmp).await?;

        let mut file = self.temp_options().open(&tmp).await?;
        file.write_all(&json).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Options for the temp file; owner-only from creation when `secure`.
    fn temp_options(&self) -> OpenOptions {
        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        if self.secure {
            options.mode(0o600);
        }
        options
    }
}

#[async_trait]
impl TokenStorage for FileTokenStorage {
    async fn load(&self) -> AppResult<Option<Session>> {
        let _io = self.io.lock().await;
        let now = Utc::now();

        let Some(record) = self.read_record().await? else {
            return Ok(None);
        };

        if record.access_expired(now) {
            debug!(path = %self.path.display(), "Persisted access token is past its lifetime");
        }

        match record.into_session(now) {
            Some(session) => Ok(Some(session)),
            None => {
                debug!(path = %self.path.display(), "Persisted refresh token expired, removing");
                remove_if_exists(&self.path).await?;
                Ok(None)
            }
        }
    }

    async fn save(&self, session: &Session) -> AppResult<()> {
        let _io = self.io.lock().await;
        let previous = self.read_record().await?;
        let record = self.lifetimes.stamp(previous.as_ref(), session, Utc::now());
        self.write_record(&record).await
    }

    async fn clear(&self) -> AppResult<()> {
        let _io = self.io.lock().await;
        remove_if_exists(&self.path).await
    }

    fn backend_name(&self) -> &str {
        "file"
    }
}

async fn remove_if_exists(path: &Path) -> AppResult<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
