//! SQLite storage for the local authority.
//!
//! Holds POD records and evidence documents for
//! [`LocalAuthority`](crate::remote::LocalAuthority). Connections are opened
//! per operation from blocking tasks.

use std::{path::Path, time::Duration};

use rusqlite::Connection;

use crate::error::{DatabaseResultExt, Result};

pub mod document_queries;
pub mod pod_queries;

/// How long a writer waits for another process holding the database lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// One SQLite connection to the POD store.
pub struct Database {
    connection: Connection,
}

impl Database {
    /// Opens the store at `path`, creating the schema on first use.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let connection = Connection::open(path).db_context("Failed to open database connection")?;
        connection
            .busy_timeout(BUSY_TIMEOUT)
            .db_context("Failed to set busy timeout")?;

        let db = Self { connection };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Enables foreign keys and creates any missing tables.
    fn initialize_schema(&self) -> Result<()> {
        self.connection
            .execute("PRAGMA foreign_keys = ON", [])
            .db_context("Failed to enable foreign keys")?;

        self.connection
            .execute_batch(include_str!("../../assets/schema.sql"))
            .db_context("Failed to initialize database schema")
    }
}
