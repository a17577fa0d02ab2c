//! SQLite-backed authority for running without the REST API.
//!
//! Records live in a local database and uploaded files are copied into a
//! storage directory and referenced by `file://` URL. Transitions are checked
//! against the step catalog and the record's version token.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use jiff::Timestamp;
use log::{debug, info, warn};
use tokio::task;

use super::{PodAuthority, StatusUpdate, TransitionResponse, UploadResponse};
use crate::{
    db::{pod_queries::StatusWrite, Database},
    error::{IoResultExt, PodError, Result},
    models::{ClientPodRecord, StepCatalog, UploadFile},
};

/// Builder for creating and configuring [`LocalAuthority`] instances.
#[derive(Debug, Clone, Default)]
pub struct LocalAuthorityBuilder {
    database_path: Option<PathBuf>,
    storage_dir: Option<PathBuf>,
    catalog: Option<StepCatalog>,
}

impl LocalAuthorityBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a custom database file path.
    ///
    /// If not specified, uses XDG Base Directory specification:
    /// `$XDG_DATA_HOME/podtrack/podtrack.db`
    pub fn with_database_path<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        if let Some(path) = path {
            self.database_path = Some(path.as_ref().to_path_buf());
        }
        self
    }

    /// Sets the directory uploaded files are copied into.
    ///
    /// Defaults to a `documents` directory next to the database.
    pub fn with_storage_dir<P: AsRef<Path>>(mut self, dir: Option<P>) -> Self {
        if let Some(dir) = dir {
            self.storage_dir = Some(dir.as_ref().to_path_buf());
        }
        self
    }

    /// Sets the catalog transitions are checked against.
    pub fn with_catalog(mut self, catalog: StepCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Builds the configured authority.
    ///
    /// # Errors
    ///
    /// Returns `PodError::FileSystem` if the database or storage path is invalid
    /// Returns `PodError::Database` if database initialization fails
    pub async fn build(self) -> Result<LocalAuthority> {
        let db_path = match self.database_path {
            Some(path) => path,
            None => Self::default_database_path()?,
        };

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).fs_context(parent)?;
        }

        let storage_dir = match self.storage_dir {
            Some(dir) => dir,
            None => db_path
                .parent()
                .map(|parent| parent.join("documents"))
                .unwrap_or_else(|| PathBuf::from("documents")),
        };
        std::fs::create_dir_all(&storage_dir).fs_context(&storage_dir)?;

        let db_path_clone = db_path.clone();
        task::spawn_blocking(move || {
            let _db = Database::new(&db_path_clone)?;
            Ok::<(), PodError>(())
        })
        .await
        .map_err(join_error)??;

        Ok(LocalAuthority {
            db_path,
            storage_dir,
            catalog: self.catalog.unwrap_or_default(),
        })
    }

    /// Returns the default database path following XDG Base Directory
    /// specification.
    fn default_database_path() -> Result<PathBuf> {
        xdg::BaseDirectories::with_prefix("podtrack")
            .place_data_file("podtrack.db")
            .map_err(|e| PodError::XdgDirectory(e.to_string()))
    }
}

fn join_error(e: task::JoinError) -> PodError {
    PodError::Configuration {
        message: format!("Task join error: {e}"),
    }
}

/// [`PodAuthority`] backed by a local SQLite database.
#[derive(Debug, Clone)]
pub struct LocalAuthority {
    db_path: PathBuf,
    storage_dir: PathBuf,
    catalog: StepCatalog,
}

impl LocalAuthority {
    pub fn builder() -> LocalAuthorityBuilder {
        LocalAuthorityBuilder::new()
    }

    pub fn database_path(&self) -> &Path {
        &self.db_path
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Creates the POD record for a trip/client pair.
    ///
    /// # Errors
    ///
    /// Returns `PodError::UnknownStatus` if `status` is not a catalog key and
    /// `PodError::InvalidInput` if the record already exists.
    pub async fn register(
        &self,
        trip_id: &str,
        client_id: &str,
        status: Option<&str>,
    ) -> Result<ClientPodRecord> {
        if let Some(status) = status {
            if !self.catalog.contains(status) {
                return Err(PodError::UnknownStatus {
                    status: status.to_string(),
                });
            }
        }
        for (field, value) in [("trip_id", trip_id), ("client_id", client_id)] {
            if value.trim().is_empty() {
                return Err(PodError::invalid_input(field).with_reason("Cannot be empty"));
            }
        }

        let db_path = self.db_path.clone();
        let trip_id = trip_id.to_string();
        let client_id = client_id.to_string();
        let status = status.map(String::from);

        let record = task::spawn_blocking(move || {
            let mut db = Database::new(&db_path)?;
            db.register_client_pod(&trip_id, &client_id, status.as_deref())
        })
        .await
        .map_err(join_error)??;

        info!("Registered POD record for {}", record.key());
        Ok(record)
    }

    /// Copies a file into the storage directory and returns its path and URL.
    async fn store(&self, subdir: &Path, file: &UploadFile) -> Result<(PathBuf, String)> {
        let dir = self.storage_dir.join(subdir);
        tokio::fs::create_dir_all(&dir).await.fs_context(&dir)?;

        let path = dir.join(format!(
            "{}-{}",
            Timestamp::now().as_nanosecond(),
            sanitize(&file.file_name)
        ));
        tokio::fs::write(&path, &file.bytes).await.fs_context(&path)?;

        let absolute = tokio::fs::canonicalize(&path).await.fs_context(&path)?;
        debug!("Stored {} at {}", file.file_name, absolute.display());
        let url = format!("file://{}", absolute.display());
        Ok((absolute, url))
    }
}

/// Keeps a path component to a safe character set.
fn sanitize(component: &str) -> String {
    let cleaned: String = component
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    match cleaned.trim_matches('.') {
        "" => "file".to_string(),
        trimmed => trimmed.to_string(),
    }
}

#[async_trait]
impl PodAuthority for LocalAuthority {
    async fn fetch_client_pod(&self, trip_id: &str, client_id: &str) -> Result<ClientPodRecord> {
        let db_path = self.db_path.clone();
        let trip = trip_id.to_string();
        let client = client_id.to_string();

        task::spawn_blocking(move || {
            let db = Database::new(&db_path)?;
            db.get_client_pod(&trip, &client)
        })
        .await
        .map_err(join_error)??
        .ok_or_else(|| PodError::ClientPodNotFound {
            trip_id: trip_id.to_string(),
            client_id: client_id.to_string(),
        })
    }

    async fn update_status(
        &self,
        trip_id: &str,
        client_id: &str,
        update: &StatusUpdate,
    ) -> Result<TransitionResponse> {
        if !self.catalog.contains(&update.status) {
            return Ok(TransitionResponse::rejected(format!(
                "Unknown status '{}'",
                update.status
            )));
        }

        let db_path = self.db_path.clone();
        let trip = trip_id.to_string();
        let client = client_id.to_string();
        let update = update.clone();

        let write = task::spawn_blocking(move || {
            let mut db = Database::new(&db_path)?;
            db.update_status(&trip, &client, &update.status, update.version)
        })
        .await
        .map_err(join_error)??;

        Ok(match write {
            StatusWrite::Applied(version) => TransitionResponse::accepted(version),
            StatusWrite::Stale { current } => TransitionResponse::rejected(format!(
                "POD status was changed elsewhere (now at version {current}); reload and try again"
            )),
            StatusWrite::Missing => TransitionResponse::rejected(format!(
                "No POD record for trip {trip_id} / client {client_id}"
            )),
        })
    }

    async fn upload_document(
        &self,
        trip_id: &str,
        client_id: &str,
        step_key: &str,
        file: &UploadFile,
    ) -> Result<UploadResponse> {
        let db_path = self.db_path.clone();
        let trip = trip_id.to_string();
        let client = client_id.to_string();

        let exists = task::spawn_blocking(move || {
            let db = Database::new(&db_path)?;
            db.has_client_pod(&trip, &client)
        })
        .await
        .map_err(join_error)??;

        if !exists {
            return Ok(UploadResponse::rejected(format!(
                "No POD record for trip {trip_id} / client {client_id}"
            )));
        }

        let (path, url) = self
            .store(
                &Path::new(&sanitize(trip_id)).join(sanitize(client_id)),
                file,
            )
            .await?;

        let db_path = self.db_path.clone();
        let trip = trip_id.to_string();
        let client = client_id.to_string();
        let step_key = step_key.to_string();
        let file_type = file.extension().unwrap_or_else(|| "bin".to_string());

        let stored = task::spawn_blocking(move || {
            let mut db = Database::new(&db_path)?;
            db.add_document(&trip, &client, &step_key, &url, &file_type)
        })
        .await
        .map_err(join_error)
        .and_then(|inserted| inserted);

        match stored {
            Ok(document) => Ok(UploadResponse::stored(document)),
            Err(e) => {
                // No row points at the file
                if let Err(remove) = tokio::fs::remove_file(&path).await {
                    warn!("Failed to remove {}: {remove}", path.display());
                }
                match e {
                    PodError::ClientPodNotFound { trip_id, client_id } => {
                        Ok(UploadResponse::rejected(format!(
                            "No POD record for trip {trip_id} / client {client_id}"
                        )))
                    }
                    other => Err(other),
                }
            }
        }
    }

    async fn upload_file(&self, file: &UploadFile) -> Result<String> {
        let (_, url) = self.store(Path::new("uploads"), file).await?;
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path_components() {
        assert_eq!(sanitize("pod scan.pdf"), "pod_scan.pdf");
        assert_eq!(sanitize("../../etc/passwd"), "_.._etc_passwd");
        assert_eq!(sanitize(".."), "file");
        assert_eq!(sanitize("T-100_a"), "T-100_a");
    }
}
