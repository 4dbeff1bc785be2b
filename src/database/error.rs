use diesel::ConnectionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unable to connect to database: {0}")]
    Connection(#[from] ConnectionError),
    #[error("database error: {0}")]
    Query(#[from] diesel::result::Error),
    #[error("gave up upserting device {id} after {attempts} conflicting inserts")]
    Contention { id: i32, attempts: u32 },
}
