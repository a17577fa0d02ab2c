//! Evidence document queries.

use jiff::Timestamp;
use rusqlite::{params, types::Type};

use crate::{
    error::{DatabaseResultExt, PodError, Result},
    models::Document,
};

const CHECK_POD_EXISTS_SQL: &str =
    "SELECT EXISTS(SELECT 1 FROM client_pods WHERE trip_id = ?1 AND client_id = ?2)";
const INSERT_DOCUMENT_SQL: &str = "INSERT INTO pod_documents (trip_id, client_id, step_key, url, file_type, uploaded_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)";
const TOUCH_POD_SQL: &str =
    "UPDATE client_pods SET updated_at = ?1 WHERE trip_id = ?2 AND client_id = ?3";
const SELECT_DOCUMENTS_SQL: &str = "SELECT id, step_key, url, file_type, uploaded_at FROM pod_documents WHERE trip_id = ?1 AND client_id = ?2 ORDER BY id";

impl super::Database {
    /// Helper function to construct a Document from a database row
    fn build_document_from_row(row: &rusqlite::Row) -> rusqlite::Result<Document> {
        Ok(Document {
            id: row.get::<_, i64>(0)?.to_string(),
            step_key: row.get(1)?,
            url: row.get(2)?,
            file_type: row.get(3)?,
            uploaded_at: row.get::<_, String>(4)?.parse::<Timestamp>().map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e))
            })?,
        })
    }

    /// Records a stored document against a POD record.
    pub fn add_document(
        &mut self,
        trip_id: &str,
        client_id: &str,
        step_key: &str,
        url: &str,
        file_type: &str,
    ) -> Result<Document> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        let exists: bool = tx
            .query_row(CHECK_POD_EXISTS_SQL, params![trip_id, client_id], |row| {
                row.get(0)
            })
            .db_context("Failed to check POD record existence")?;

        if !exists {
            return Err(PodError::ClientPodNotFound {
                trip_id: trip_id.to_string(),
                client_id: client_id.to_string(),
            });
        }

        let now = Timestamp::now();
        let now_str = now.to_string();

        tx.execute(
            INSERT_DOCUMENT_SQL,
            params![trip_id, client_id, step_key, url, file_type, &now_str],
        )
        .db_context("Failed to insert document")?;

        let id = tx.last_insert_rowid();

        tx.execute(TOUCH_POD_SQL, params![&now_str, trip_id, client_id])
            .db_context("Failed to update POD timestamp")?;

        tx.commit().db_context("Failed to commit transaction")?;

        Ok(Document {
            id: id.to_string(),
            step_key: step_key.to_string(),
            url: url.to_string(),
            file_type: file_type.to_string(),
            uploaded_at: now,
        })
    }

    /// Lists documents of a POD record in upload order.
    pub fn list_documents(&self, trip_id: &str, client_id: &str) -> Result<Vec<Document>> {
        let mut stmt = self
            .connection
            .prepare(SELECT_DOCUMENTS_SQL)
            .db_context("Failed to prepare document query")?;

        let documents = stmt
            .query_map(params![trip_id, client_id], Self::build_document_from_row)
            .db_context("Failed to query documents")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .db_context("Failed to read documents")?;

        Ok(documents)
    }
}
