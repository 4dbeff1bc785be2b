use super::StoreError;
use crate::config::DbPrefs;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::{PgConnection, SqliteConnection};

/// A connection to whichever store our preferences point at.
///
/// Queries are written once against this type and run on either backend.
#[derive(diesel::MultiConnection)]
pub enum AnyConnection {
    Postgresql(PgConnection),
    Sqlite(SqliteConnection),
}

// How long SQLite waits on another writer before giving up.
const SQLITE_BUSY_TIMEOUT_MS: u32 = 5000;

impl AnyConnection {
    /// Connects to the store described by our preferences.
    ///
    /// We pick the backend ourselves rather than via `AnyConnection::establish`,
    /// as SQLite would otherwise happily create a file named after
    /// a PostgreSQL connection string.
    pub fn open(prefs: &DbPrefs) -> Result<Self, StoreError> {
        match prefs {
            DbPrefs::Postgres(postgres) => {
                let connection = PgConnection::establish(&postgres.conninfo())?;
                Ok(AnyConnection::Postgresql(connection))
            }
            DbPrefs::Sqlite(sqlite) => Self::open_sqlite(&sqlite.sqlite_path),
        }
    }

    /// Opens (creating if necessary) the SQLite database at the given path.
    pub fn open_sqlite(path: &str) -> Result<Self, StoreError> {
        let mut connection = SqliteConnection::establish(path)?;
        // Concurrent runs should wait on each other rather than fail outright.
        connection.batch_execute(&format!("PRAGMA busy_timeout = {SQLITE_BUSY_TIMEOUT_MS};"))?;
        Ok(AnyConnection::Sqlite(connection))
    }

    /// A short name for the backend in use, for logging.
    pub fn backend_name(&self) -> &'static str {
        match self {
            AnyConnection::Postgresql(_) => "postgresql",
            AnyConnection::Sqlite(_) => "sqlite",
        }
    }
}
