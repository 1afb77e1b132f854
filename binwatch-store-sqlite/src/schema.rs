//! SQL schema for the binwatch database.
//!
//! The schema is idempotent and applied as one batch whenever a store is opened.

/// Returns the full SQL schema as a single batch string.
///
/// Tables:
/// - `users` - accounts with role and optional assigned authority
/// - `houses` - one registered location per resident
/// - `waste_bins` - one bin per house with the latest fill levels and detector output
/// - `waste_entries` - log of handed-in waste
/// - `rewards` - latest reward snapshot per resident
/// - `pickup_requests` - extra pickup requests
#[must_use]
pub fn create_schema() -> &'static str {
    r"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL CHECK (role IN ('user', 'authority')),
        authority_id INTEGER REFERENCES users(id)
    );
    CREATE INDEX IF NOT EXISTS idx_users_authority ON users(authority_id);

    CREATE TABLE IF NOT EXISTS houses (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL UNIQUE REFERENCES users(id),
        address TEXT NOT NULL,
        latitude REAL NOT NULL,
        longitude REAL NOT NULL
    );

    CREATE TABLE IF NOT EXISTS waste_bins (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        house_id INTEGER NOT NULL UNIQUE REFERENCES houses(id),
        owner_id INTEGER NOT NULL REFERENCES users(id),
        organic_level REAL NOT NULL DEFAULT 0 CHECK (organic_level BETWEEN 0 AND 100),
        non_recyclable_level REAL NOT NULL DEFAULT 0 CHECK (non_recyclable_level BETWEEN 0 AND 100),
        hazardous_level REAL NOT NULL DEFAULT 0 CHECK (hazardous_level BETWEEN 0 AND 100),
        plastic_detected INTEGER NOT NULL DEFAULT 0,
        plastic_confidence REAL NOT NULL DEFAULT 0,
        last_updated TEXT NOT NULL,
        last_image_processed TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_bins_owner ON waste_bins(owner_id);

    CREATE TABLE IF NOT EXISTS waste_entries (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL REFERENCES users(id),
        kind TEXT NOT NULL CHECK (kind IN ('organic', 'nonRecyclable', 'hazardous')),
        quantity REAL NOT NULL CHECK (quantity > 0),
        location TEXT NOT NULL,
        collected_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_entries_owner_date ON waste_entries(owner_id, collected_at);

    CREATE TABLE IF NOT EXISTS rewards (
        owner_id INTEGER PRIMARY KEY REFERENCES users(id),
        organic_points INTEGER NOT NULL DEFAULT 0,
        non_recyclable_points INTEGER NOT NULL DEFAULT 0,
        plastic_penalty INTEGER NOT NULL DEFAULT 0,
        total_points INTEGER NOT NULL DEFAULT 0,
        last_calculated TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS pickup_requests (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL REFERENCES users(id),
        address TEXT NOT NULL,
        description TEXT,
        bin_details TEXT,
        status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'accepted')),
        created_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_pickups_owner ON pickup_requests(owner_id);
    "
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn schema_is_valid_sql() {
        let conn = Connection::open_in_memory().expect("in-memory db");
        conn.execute_batch(create_schema())
            .expect("Schema SQL should be valid");
    }

    #[test]
    fn schema_is_idempotent() {
        let conn = Connection::open_in_memory().expect("in-memory db");
        conn.execute_batch(create_schema()).expect("first run");
        conn.execute_batch(create_schema()).expect("second run");
    }

    #[test]
    fn schema_creates_all_tables() {
        let conn = Connection::open_in_memory().expect("in-memory db");
        conn.execute_batch(create_schema()).expect("schema");

        let expected_tables = [
            "users",
            "houses",
            "waste_bins",
            "waste_entries",
            "rewards",
            "pickup_requests",
        ];
        for table in expected_tables {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    [table],
                    |row| row.get(0),
                )
                .expect("query sqlite_master");
            assert_eq!(count, 1, "Table {table} should exist");
        }
    }

    #[test]
    fn levels_outside_range_violate_checks() {
        let conn = Connection::open_in_memory().expect("in-memory db");
        conn.execute_batch(create_schema()).expect("schema");
        conn.execute_batch(
            "INSERT INTO users (name, email, password_hash, role) VALUES ('a', 'a@x.org', 'h', 'user');
             INSERT INTO houses (owner_id, address, latitude, longitude) VALUES (1, 'x', 0, 0);",
        )
        .expect("seed");
        let result = conn.execute(
            "INSERT INTO waste_bins (house_id, owner_id, organic_level, last_updated) VALUES (1, 1, 101, 'now')",
            [],
        );
        assert!(result.is_err(), "organic level above 100 must be rejected");
    }
}
