//! Storage adapter for binwatch backed by a single SQLite connection.
//!
//! Every port method locks the connection, runs its statements synchronously, and releases
//! the lock before returning. Writes are therefore serialized, and the reward snapshot upsert
//! is a single `INSERT .. ON CONFLICT DO UPDATE` statement, so concurrent score-and-save calls
//! for one resident resolve as last-write-wins without torn rows.

mod accounts;
mod bins;
mod pickups;
mod rewards;
pub mod schema;

use std::path::Path;
use std::sync::Arc;

use binwatch_core::{Backend, PortError, UserId};
use rusqlite::types::Type;
use rusqlite::{Connection, ErrorCode, ffi};
use tokio::sync::Mutex;
use tracing::info;

/// SQLite implementation of every binwatch storage port.
///
/// Cloning is cheap; clones share the same connection.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) a database file and apply the schema.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the file cannot be opened or the schema fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PortError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(PortError::backend)?;
        info!(path = %path.display(), "opened sqlite database");
        Self::with_connection(conn)
    }

    /// Create a private in-memory database with the schema applied.
    ///
    /// # Errors
    ///
    /// Returns a [`PortError`] when the schema fails.
    pub fn open_in_memory() -> Result<Self, PortError> {
        let conn = Connection::open_in_memory().map_err(PortError::backend)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, PortError> {
        conn.execute_batch(schema::create_schema())
            .map_err(PortError::backend)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `query` with exclusive access to the connection.
    async fn with_conn<T, F>(&self, query: F) -> Result<T, PortError>
    where
        F: FnOnce(&mut Connection) -> rusqlite::Result<T> + Send,
    {
        let mut conn = self.conn.lock().await;
        query(&mut conn).map_err(port_error)
    }
}

/// Bundle the store into the ports a service runs against.
#[must_use]
pub fn backend(store: SqliteStore) -> Backend {
    let store = Arc::new(store);
    Backend {
        accounts: store.clone(),
        bins: store.clone(),
        rewards: store.clone(),
        pickups: store,
    }
}

fn port_error(err: rusqlite::Error) -> PortError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
                && failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            PortError::Duplicate("record")
        }
        rusqlite::Error::FromSqlConversionFailure(_, _, source) => {
            PortError::Corrupt(source.to_string())
        }
        _ => PortError::backend(err),
    }
}

/// Wrap a domain conversion failure so it can leave a row mapper.
fn conversion_error<E>(column: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err))
}

/// `?,?,?` for an `IN (..)` clause over `owners`.
fn placeholders(owners: &[UserId]) -> String {
    vec!["?"; owners.len()].join(",")
}

fn owner_params(owners: &[UserId]) -> impl Iterator<Item = i64> + '_ {
    owners.iter().map(|owner| owner.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_match_owner_count() {
        assert_eq!(placeholders(&[UserId(1), UserId(2), UserId(3)]), "?,?,?");
        assert_eq!(placeholders(&[]), "");
    }

    #[tokio::test]
    async fn clones_share_the_connection() {
        let store = SqliteStore::open_in_memory().expect("in-memory store");
        let clone = store.clone();
        store
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO users (name, email, password_hash, role) VALUES ('a', 'a@x.org', 'h', 'user')",
                    [],
                )
            })
            .await
            .expect("insert");
        let count: i64 = clone
            .with_conn(|conn| conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0)))
            .await
            .expect("count");
        assert_eq!(count, 1);
    }
}
