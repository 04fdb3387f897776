//! Database module for user persistence
//!
//! Provides SQLite database initialization and connection management for
//! the users table.

use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Thread-safe database connection type
pub type DbConnection = Arc<Mutex<Connection>>;

/// Initialize the SQLite database
///
/// Opens (or creates) a SQLite database at the specified path, sets WAL
/// mode and runs schema migrations.
///
/// # Arguments
/// * `db_path` - Path to the SQLite database file
///
/// # Returns
/// * `Ok(DbConnection)` - Thread-safe connection on success
/// * `Err` - Database initialization error
pub fn init_database(db_path: &Path) -> Result<DbConnection, rusqlite::Error> {
    let conn = Connection::open(db_path)?;

    // pragma_update because PRAGMA journal_mode returns a row,
    // which execute() rejects.
    conn.pragma_update(None, "journal_mode", "WAL")?;

    migrate(&conn)?;

    Ok(Arc::new(Mutex::new(conn)))
}

/// In-memory database, mainly for tests
pub fn init_memory_database() -> Result<DbConnection, rusqlite::Error> {
    let conn = Connection::open_in_memory()?;
    migrate(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

fn migrate(conn: &Connection) -> Result<(), rusqlite::Error> {
    let schema_sql = include_str!("../migrations/001_users.sql");
    conn.execute_batch(schema_sql)
}
