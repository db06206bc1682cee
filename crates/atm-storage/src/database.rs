//! Database connection and transaction boundaries

use parking_lot::Mutex;
use rusqlite::{Connection, TransactionBehavior};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::migrations::run_migrations;
use crate::{Result, StorageError};

/// How long a writer waits on a lock held by another process before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared handle to the ledger database.
///
/// Cloning is cheap and every clone talks to the same connection. The
/// connection mutex is the process-wide serialization point for writes.
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Enable foreign keys
        conn.pragma_update(None, "foreign_keys", "ON")?;

        // WAL mode for better concurrent performance
        let _: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    /// Run `f` inside an IMMEDIATE transaction.
    ///
    /// The SQLite write lock is taken at `BEGIN`, so a read-modify-write
    /// inside `f` cannot interleave with another writer, in this process or
    /// any other process sharing the file.
    ///
    /// The transaction commits only if `f` returns `Ok`. Any error drops the
    /// transaction, which rolls back every statement `f` executed. `f` may
    /// fail with its own error type as long as storage errors convert into it.
    pub fn transaction_immediate<F, T, E>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&Connection) -> std::result::Result<T, E>,
        E: From<StorageError> + std::fmt::Display,
    {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(StorageError::from)?;
        let result = match f(&tx) {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!(error = %e, "Rolling back transaction");
                return Err(e);
            }
        };
        tx.commit().map_err(StorageError::from)?;
        Ok(result)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert_user(conn: &Connection, pin: &str, balance: i64) -> Result<i64> {
        conn.execute(
            "INSERT INTO users (pin, balance) VALUES (?1, ?2)",
            rusqlite::params![pin, balance],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn balance_of(db: &Database, id: i64) -> i64 {
        db.with_connection(|conn| {
            Ok(conn.query_row("SELECT balance FROM users WHERE id = ?1", [id], |row| {
                row.get(0)
            })?)
        })
        .unwrap()
    }

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        db.with_connection(|conn| {
            let users: i32 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
            let log: i32 =
                conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
            assert_eq!(users, 0);
            assert_eq!(log, 0);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_transaction_commits_on_ok() {
        let db = Database::open_in_memory().unwrap();
        let id = db
            .transaction_immediate(|conn| insert_user(conn, "1234", 10))
            .unwrap();
        assert_eq!(balance_of(&db, id), 10);
    }

    #[test]
    fn test_transaction_rolls_back_on_err() {
        let db = Database::open_in_memory().unwrap();
        let id = db.with_connection(|conn| insert_user(conn, "1234", 10)).unwrap();

        let result: Result<()> = db.transaction_immediate(|conn| {
            conn.execute("UPDATE users SET balance = 500 WHERE id = ?1", [id])?;
            Err(StorageError::Migration("boom".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(balance_of(&db, id), 10);
    }

    #[test]
    fn test_unique_pin_violation_is_detected() {
        let db = Database::open_in_memory().unwrap();
        db.with_connection(|conn| insert_user(conn, "4623", 0)).unwrap();

        let err = db
            .with_connection(|conn| insert_user(conn, "4623", 0))
            .unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[test]
    fn test_open_file_runs_migrations_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atm.db");

        {
            let db = Database::open(&path).unwrap();
            db.with_connection(|conn| insert_user(conn, "1111", 42)).unwrap();
        }

        // Reopening must keep existing rows
        let db = Database::open(&path).unwrap();
        let count: i64 = db
            .with_connection(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?)
            })
            .unwrap();
        assert_eq!(count, 1);
    }
}
