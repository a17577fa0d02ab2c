//! POD record queries.

use jiff::Timestamp;
use rusqlite::{params, OptionalExtension};

use crate::{
    error::{DatabaseResultExt, PodError, Result},
    models::ClientPodRecord,
};

const CHECK_POD_EXISTS_SQL: &str =
    "SELECT EXISTS(SELECT 1 FROM client_pods WHERE trip_id = ?1 AND client_id = ?2)";
const INSERT_POD_SQL: &str = "INSERT INTO client_pods (trip_id, client_id, status, version, created_at, updated_at) VALUES (?1, ?2, ?3, 0, ?4, ?4)";
const SELECT_POD_SQL: &str =
    "SELECT status, version FROM client_pods WHERE trip_id = ?1 AND client_id = ?2";
const UPDATE_STATUS_VERSIONED_SQL: &str = "UPDATE client_pods SET status = ?1, version = version + 1, updated_at = ?2 WHERE trip_id = ?3 AND client_id = ?4 AND version = ?5";
const UPDATE_STATUS_SQL: &str = "UPDATE client_pods SET status = ?1, version = version + 1, updated_at = ?2 WHERE trip_id = ?3 AND client_id = ?4";
const SELECT_VERSION_SQL: &str =
    "SELECT version FROM client_pods WHERE trip_id = ?1 AND client_id = ?2";

/// Outcome of a status write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusWrite {
    /// Written; carries the new version
    Applied(u64),

    /// The stored version did not match the expected one
    Stale { current: u64 },

    /// No record for the pair
    Missing,
}

impl super::Database {
    /// Creates the POD record for a trip/client pair.
    pub fn register_client_pod(
        &mut self,
        trip_id: &str,
        client_id: &str,
        status: Option<&str>,
    ) -> Result<ClientPodRecord> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        let exists: bool = tx
            .query_row(CHECK_POD_EXISTS_SQL, params![trip_id, client_id], |row| {
                row.get(0)
            })
            .db_context("Failed to check POD record existence")?;

        if exists {
            return Err(PodError::invalid_input("trip_id").with_reason(format!(
                "POD record for trip {trip_id} / client {client_id} already exists"
            )));
        }

        let now_str = Timestamp::now().to_string();
        tx.execute(INSERT_POD_SQL, params![trip_id, client_id, status, &now_str])
            .db_context("Failed to insert POD record")?;

        tx.commit().db_context("Failed to commit transaction")?;

        Ok(ClientPodRecord {
            trip_id: trip_id.to_string(),
            client_id: client_id.to_string(),
            status: status.map(String::from),
            version: 0,
            documents: Vec::new(),
        })
    }

    /// Whether a record exists for the pair.
    pub fn has_client_pod(&self, trip_id: &str, client_id: &str) -> Result<bool> {
        self.connection
            .query_row(CHECK_POD_EXISTS_SQL, params![trip_id, client_id], |row| {
                row.get(0)
            })
            .db_context("Failed to check POD record existence")
    }

    /// Reads a POD record together with its documents.
    pub fn get_client_pod(&self, trip_id: &str, client_id: &str) -> Result<Option<ClientPodRecord>> {
        let row: Option<(Option<String>, i64)> = self
            .connection
            .query_row(SELECT_POD_SQL, params![trip_id, client_id], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .optional()
            .db_context("Failed to get POD record")?;

        let Some((status, version)) = row else {
            return Ok(None);
        };

        Ok(Some(ClientPodRecord {
            trip_id: trip_id.to_string(),
            client_id: client_id.to_string(),
            status,
            version: version as u64,
            documents: self.list_documents(trip_id, client_id)?,
        }))
    }

    /// Writes a new status, bumping the version.
    ///
    /// With `expected_version`, the write only applies if the stored version
    /// still matches; the check and the write are one statement.
    pub fn update_status(
        &mut self,
        trip_id: &str,
        client_id: &str,
        status: &str,
        expected_version: Option<u64>,
    ) -> Result<StatusWrite> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        let now_str = Timestamp::now().to_string();
        let rows_affected = match expected_version {
            Some(version) => tx.execute(
                UPDATE_STATUS_VERSIONED_SQL,
                params![status, &now_str, trip_id, client_id, version as i64],
            ),
            None => tx.execute(
                UPDATE_STATUS_SQL,
                params![status, &now_str, trip_id, client_id],
            ),
        }
        .db_context("Failed to update POD status")?;

        let current: Option<i64> = tx
            .query_row(SELECT_VERSION_SQL, params![trip_id, client_id], |row| {
                row.get(0)
            })
            .optional()
            .db_context("Failed to read POD version")?;

        tx.commit().db_context("Failed to commit transaction")?;

        Ok(match (rows_affected, current) {
            (_, None) => StatusWrite::Missing,
            (0, Some(current)) => StatusWrite::Stale {
                current: current as u64,
            },
            (_, Some(current)) => StatusWrite::Applied(current as u64),
        })
    }
}
