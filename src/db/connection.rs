// src/db/connection.rs
//
// Database connection management
//
// PRINCIPLES:
// - Explicit connection pooling
// - No hidden connection creation
// - Clear error propagation
// - Thread-safe access

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Type alias for connection pool
pub type ConnectionPool = Pool<SqliteConnectionManager>;

/// Type alias for a pooled connection
pub type PooledConn = PooledConnection<SqliteConnectionManager>;

/// Get the database file path
///
/// Database is stored in the application data directory.
/// Path structure: {APP_DATA}/pawmatch/pawmatch.db
pub fn get_database_path() -> AppResult<PathBuf> {
    let app_data_dir = dirs::data_dir()
        .ok_or_else(|| AppError::Other("Could not determine app data directory".to_string()))?;

    let pawmatch_dir = app_data_dir.join("pawmatch");

    // Ensure directory exists
    std::fs::create_dir_all(&pawmatch_dir).map_err(AppError::Io)?;

    Ok(pawmatch_dir.join("pawmatch.db"))
}

/// Create the connection pool at the default application path
pub fn create_connection_pool() -> AppResult<ConnectionPool> {
    let db_path = get_database_path()?;
    create_pool_at(&db_path)
}

/// Create a connection pool for an explicit database file
///
/// Pool configuration:
/// - Max 15 connections
/// - SQLite in WAL mode so the sweeper and resolvers can run concurrently
/// - Foreign keys enabled
/// - Busy timeout set so a writer waiting on the exclusive resolve/sweep
///   transaction blocks instead of erroring immediately
pub fn create_pool_at(db_path: &Path) -> AppResult<ConnectionPool> {
    let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(())
    });

    let pool = Pool::builder()
        .max_size(15)
        .build(manager)
        .map_err(|e| AppError::Other(format!("Failed to create connection pool: {}", e)))?;

    Ok(pool)
}

/// Get a connection from the pool
///
/// This is a convenience wrapper that provides better error messages.
pub fn get_connection(pool: &ConnectionPool) -> AppResult<PooledConn> {
    pool.get()
        .map_err(|e| AppError::Other(format!("Failed to get database connection: {}", e)))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::db::migrations::initialize_database;
    use std::sync::Arc;
    use tempfile::TempDir;

    /// File-backed pool over a fresh schema, for repository and service
    /// tests. The TempDir must be kept alive by the caller.
    pub fn create_test_pool() -> (TempDir, Arc<ConnectionPool>) {
        let dir = TempDir::new().expect("create temp dir");
        let pool = create_pool_at(&dir.path().join("test.db")).expect("create pool");
        {
            let conn = pool.get().expect("get connection");
            initialize_database(&conn).expect("initialize schema");
        }
        (dir, Arc::new(pool))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_pool_creation_applies_pragmas() {
        let dir = TempDir::new().unwrap();
        let pool = create_pool_at(&dir.path().join("pragmas.db")).unwrap();
        let conn = get_connection(&pool).unwrap();

        let fk_enabled: i32 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk_enabled, 1);

        let journal_mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(journal_mode.to_lowercase(), "wal");
    }

    #[test]
    fn test_pool_hands_out_working_connections() {
        let dir = TempDir::new().unwrap();
        let pool = create_pool_at(&dir.path().join("working.db")).unwrap();
        let conn = get_connection(&pool).unwrap();

        let result: i32 = conn.query_row("SELECT 1 + 1", [], |row| row.get(0)).unwrap();
        assert_eq!(result, 2);
    }
}
