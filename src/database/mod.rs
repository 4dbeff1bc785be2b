mod connections;
mod error;
mod escape;
mod models;
mod schema;
mod upsert;

pub use connections::AnyConnection;
pub use error::StoreError;
pub use upsert::*;
