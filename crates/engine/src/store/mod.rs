// Persistence: SQLite structure.db, versioned migrations, row stores.

pub mod db;
pub mod mappings;
pub mod sections;
pub mod templates;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use uuid::Uuid;

/// Decode a TEXT column holding a uuid.
pub(crate) fn uuid_from_column(index: usize, value: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error)))
}

/// Decode a TEXT column holding an RFC3339 timestamp.
pub(crate) fn timestamp_from_column(index: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    value
        .parse::<DateTime<Utc>>()
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error)))
}

/// Decode an INTEGER column holding a non-negative order index.
pub(crate) fn order_from_column(index: usize, value: i64) -> rusqlite::Result<u32> {
    u32::try_from(value).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Integer, Box::new(error))
    })
}
