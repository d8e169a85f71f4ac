//! Database connection handling
//!
//! A [`Connection`] exclusively owns one open `sqlite3` handle and releases
//! it exactly once, on explicit [`Connection::close`] or on drop. Prepared
//! statements borrow the connection, so the borrow checker rejects closing a
//! connection while statements derived from it are still alive.

use std::ffi::{CStr, CString};
use std::path::Path;
use std::ptr;

use libsqlite3_sys as ffi;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::statement::{Statement, Step};

/// Fallback when the engine has no message for the last failure.
const NO_ENGINE_MESSAGE: &str = "No error message provided from sqlite.";

/// Read the engine's last-error slot for `db` into an owned string.
///
/// The slot is only meaningful immediately after a failing call and may be
/// overwritten by any subsequent call, so callers must invoke this before
/// touching the handle again.
pub(crate) fn error_message(db: *mut ffi::sqlite3) -> String {
    if db.is_null() {
        return NO_ENGINE_MESSAGE.to_string();
    }
    let msg = unsafe { ffi::sqlite3_errmsg(db) };
    if msg.is_null() {
        NO_ENGINE_MESSAGE.to_string()
    } else {
        unsafe { CStr::from_ptr(msg) }.to_string_lossy().into_owned()
    }
}

/// An open database connection
///
/// Not `Send` or `Sync`: use one connection per thread. The wrapper provides
/// no internal locking, timeouts, or cancellation; every operation is a
/// direct blocking call into the engine.
#[derive(Debug)]
pub struct Connection {
    db: *mut ffi::sqlite3,
}

impl Connection {
    /// Open or create the database file at `path`.
    ///
    /// The path must name a writable location. On failure the partially
    /// allocated native handle is released before the error propagates, and
    /// the error carries the engine's message at the time of failure.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let c_path = path
            .to_str()
            .ok_or_else(|| Error::Open(format!("path is not valid UTF-8: {}", path.display())))
            .and_then(|s| {
                CString::new(s)
                    .map_err(|_| Error::Open("path contains an interior nul byte".to_string()))
            })?;

        let conn = Self::open_c(&c_path)?;
        debug!(path = %path.display(), "opened database connection");
        Ok(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        // CString over a fixed literal cannot fail.
        let c_path = CString::new(":memory:").unwrap();
        let conn = Self::open_c(&c_path)?;
        debug!("opened in-memory database connection");
        Ok(conn)
    }

    fn open_c(path: &CStr) -> Result<Self> {
        let mut db: *mut ffi::sqlite3 = ptr::null_mut();
        let rc = unsafe { ffi::sqlite3_open(path.as_ptr(), &mut db) };
        if rc == ffi::SQLITE_OK {
            Ok(Self { db })
        } else {
            // The engine allocates a handle even on most open failures so
            // the error message can be read from it. Capture the message
            // first, then release the handle before propagating.
            let message = error_message(db);
            if !db.is_null() {
                unsafe { ffi::sqlite3_close(db) };
            }
            Err(Error::Open(message))
        }
    }

    /// Compile `sql` into a prepared statement bound to this connection.
    ///
    /// No validation happens here beyond delegating to the engine.
    pub fn prepare(&self, sql: &str) -> Result<Statement<'_>> {
        let c_sql = CString::new(sql)
            .map_err(|_| Error::Prepare("SQL contains an interior nul byte".to_string()))?;

        let mut stmt: *mut ffi::sqlite3_stmt = ptr::null_mut();
        let rc = unsafe {
            ffi::sqlite3_prepare_v2(self.db, c_sql.as_ptr(), -1, &mut stmt, ptr::null_mut())
        };
        if rc != ffi::SQLITE_OK {
            return Err(Error::Prepare(self.last_error_message()));
        }
        if stmt.is_null() {
            // Whitespace or comment-only input compiles to nothing.
            return Err(Error::Prepare("no SQL statement to prepare".to_string()));
        }
        Ok(Statement::new(self, stmt))
    }

    /// Prepare `sql`, step it to completion, and finalize it.
    ///
    /// Convenience for statements whose rows (if any) are not of interest,
    /// such as CREATE TABLE or DML without parameters.
    pub fn execute(&self, sql: &str) -> Result<()> {
        let mut stmt = self.prepare(sql)?;
        while let Step::Row(_) = stmt.step()? {}
        Ok(())
    }

    /// Number of rows changed by the most recent INSERT, UPDATE, or DELETE.
    pub fn changes(&self) -> i64 {
        unsafe { ffi::sqlite3_changes(self.db) as i64 }
    }

    /// Rowid of the most recent successful INSERT on this connection.
    pub fn last_insert_rowid(&self) -> i64 {
        unsafe { ffi::sqlite3_last_insert_rowid(self.db) }
    }

    /// Explicitly release the connection.
    ///
    /// Equivalent to dropping it; all statements derived from this
    /// connection must already be finalized, which the borrow checker
    /// enforces.
    pub fn close(self) {
        // Drop performs the actual release.
    }

    /// Capture the engine's current error message for this connection.
    pub(crate) fn last_error_message(&self) -> String {
        error_message(self.db)
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        let rc = unsafe { ffi::sqlite3_close(self.db) };
        if rc != ffi::SQLITE_OK {
            warn!(code = rc, "connection closed with engine error code");
        } else {
            debug!("closed database connection");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE t (id INT)").unwrap();
        conn.close();
    }

    #[test]
    fn test_open_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.sqlite3");
        let conn = Connection::open(&path).unwrap();
        conn.execute("CREATE TABLE t (id INT)").unwrap();
        drop(conn);
        assert!(path.exists());
    }

    #[test]
    fn test_open_unwritable_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        // Parent directory does not exist, so the engine cannot create the file.
        let path = dir.path().join("missing").join("test.sqlite3");
        match Connection::open(&path) {
            Err(Error::Open(message)) => assert!(!message.is_empty()),
            other => panic!("expected Open error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_prepare_invalid_sql_fails() {
        let conn = Connection::open_in_memory().unwrap();
        match conn.prepare("SELCT 1") {
            Err(Error::Prepare(message)) => assert!(message.contains("syntax error")),
            other => panic!("expected Prepare error, got {:?}", other.map(|_| ())),
        }
        // The failed prepare leaves the connection usable.
        conn.execute("CREATE TABLE t (id INT)").unwrap();
    }

    #[test]
    fn test_prepare_empty_sql_fails() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(matches!(conn.prepare("   "), Err(Error::Prepare(_))));
    }

    #[test]
    fn test_changes_and_last_insert_rowid() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)")
            .unwrap();
        conn.execute("INSERT INTO t (name) VALUES ('a')").unwrap();
        assert_eq!(conn.changes(), 1);
        assert_eq!(conn.last_insert_rowid(), 1);
        conn.execute("INSERT INTO t (name) VALUES ('b')").unwrap();
        assert_eq!(conn.last_insert_rowid(), 2);
    }
}
