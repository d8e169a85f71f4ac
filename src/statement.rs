//! Prepared statements and result rows
//!
//! A [`Statement`] owns one native `sqlite3_stmt` handle for the lifetime of
//! the scope that prepared it. The handle is finalized exactly once on every
//! exit path: explicitly via [`Statement::finalize`] or implicitly on drop.
//!
//! Per statement the lifecycle is:
//! prepared -> (bound)* -> stepping -> {row ... row, done} -> finalized,
//! where any step may instead fail and the statement is then safe to
//! re-bind after a [`Statement::reset`] or to finalize.

use std::ffi::CStr;
use std::marker::PhantomData;
use std::os::raw::{c_char, c_int};
use std::ptr;

use libsqlite3_sys as ffi;
use tracing::trace;

use crate::connection::Connection;
use crate::error::{Error, Result};

/// Outcome of advancing a statement by one step
#[derive(Debug)]
pub enum Step<'stmt> {
    /// A result row is available for reading.
    Row(Row<'stmt>),
    /// The statement ran to completion; no further rows.
    Done,
}

/// A compiled SQL statement bound to one connection
///
/// The borrow of the [`Connection`] guarantees at compile time that the
/// connection outlives every statement prepared from it.
#[derive(Debug)]
pub struct Statement<'conn> {
    stmt: *mut ffi::sqlite3_stmt,
    conn: &'conn Connection,
    done: bool,
}

impl<'conn> Statement<'conn> {
    pub(crate) fn new(conn: &'conn Connection, stmt: *mut ffi::sqlite3_stmt) -> Self {
        Self {
            stmt,
            conn,
            done: false,
        }
    }

    /// The native handle, or a fail-fast error after finalize.
    fn handle(&self) -> Result<*mut ffi::sqlite3_stmt> {
        if self.stmt.is_null() {
            Err(Error::StatementFinalized)
        } else {
            Ok(self.stmt)
        }
    }

    /// Bind an integer to the 1-based parameter `index`.
    ///
    /// Must be called after prepare and before the first step; an index out
    /// of range is reported by the engine as a bind failure.
    pub fn bind_int(&mut self, index: i32, value: i64) -> Result<()> {
        let stmt = self.handle()?;
        let rc = unsafe { ffi::sqlite3_bind_int64(stmt, index, value) };
        if rc != ffi::SQLITE_OK {
            return Err(Error::Bind(self.conn.last_error_message()));
        }
        Ok(())
    }

    /// Bind a text value to the 1-based parameter `index`.
    ///
    /// The engine takes its own copy of the bytes, so `value` need not
    /// outlive the call.
    pub fn bind_text(&mut self, index: i32, value: &str) -> Result<()> {
        let stmt = self.handle()?;
        let rc = unsafe {
            ffi::sqlite3_bind_text(
                stmt,
                index,
                value.as_ptr() as *const c_char,
                value.len() as c_int,
                ffi::SQLITE_TRANSIENT(),
            )
        };
        if rc != ffi::SQLITE_OK {
            return Err(Error::Bind(self.conn.last_error_message()));
        }
        Ok(())
    }

    /// Bind SQL NULL to the 1-based parameter `index`.
    pub fn bind_null(&mut self, index: i32) -> Result<()> {
        let stmt = self.handle()?;
        let rc = unsafe { ffi::sqlite3_bind_null(stmt, index) };
        if rc != ffi::SQLITE_OK {
            return Err(Error::Bind(self.conn.last_error_message()));
        }
        Ok(())
    }

    /// Advance execution by one step.
    ///
    /// Queries yield [`Step::Row`] once per result row and then
    /// [`Step::Done`]; DML runs to completion in a single step. Once `Done`,
    /// further steps keep returning `Done` until [`Statement::reset`]. A
    /// failed step leaves the statement not advanced: re-bind and reset to
    /// retry, or finalize.
    pub fn step(&mut self) -> Result<Step<'_>> {
        let stmt = self.handle()?;
        if self.done {
            return Ok(Step::Done);
        }
        match unsafe { ffi::sqlite3_step(stmt) } {
            ffi::SQLITE_ROW => Ok(Step::Row(Row {
                stmt,
                _stmt: PhantomData,
            })),
            ffi::SQLITE_DONE => {
                self.done = true;
                Ok(Step::Done)
            }
            _ => Err(Error::Step(self.conn.last_error_message())),
        }
    }

    /// Rewind the statement so it can be re-executed with new bindings,
    /// without recompiling. Existing bindings are kept until overwritten.
    ///
    /// Infallible: the only error the engine reports here repeats the most
    /// recent failed step, which was already surfaced. No-op after finalize.
    pub fn reset(&mut self) {
        if self.stmt.is_null() {
            return;
        }
        unsafe { ffi::sqlite3_reset(self.stmt) };
        self.done = false;
    }

    /// Release the statement's native resources.
    ///
    /// Idempotent: the second and later calls are no-ops. Dropping the
    /// statement finalizes it as well, so error paths cannot leak the
    /// handle.
    pub fn finalize(&mut self) {
        if self.stmt.is_null() {
            return;
        }
        trace!("finalizing statement");
        unsafe { ffi::sqlite3_finalize(self.stmt) };
        self.stmt = ptr::null_mut();
    }

    /// Number of columns in the statement's result set; 0 for DML and for a
    /// finalized statement.
    pub fn column_count(&self) -> i32 {
        if self.stmt.is_null() {
            return 0;
        }
        unsafe { ffi::sqlite3_column_count(self.stmt) }
    }

    /// Name of the 0-based result column `col`, if it exists.
    pub fn column_name(&self, col: i32) -> Option<String> {
        if self.stmt.is_null() || col < 0 || col >= self.column_count() {
            return None;
        }
        let name = unsafe { ffi::sqlite3_column_name(self.stmt, col) };
        if name.is_null() {
            return None;
        }
        Some(unsafe { CStr::from_ptr(name) }.to_string_lossy().into_owned())
    }
}

impl Drop for Statement<'_> {
    fn drop(&mut self) {
        self.finalize();
    }
}

/// A transient view into the statement's current result row
///
/// Only obtainable from [`Step::Row`]. The view borrows the statement, so
/// the compiler rejects reading it after the next step, reset, or finalize;
/// accessors copy values out immediately.
#[derive(Debug)]
pub struct Row<'stmt> {
    stmt: *mut ffi::sqlite3_stmt,
    _stmt: PhantomData<&'stmt ()>,
}

impl Row<'_> {
    /// Read the 0-based column `col` as an integer.
    ///
    /// `col` must be less than [`Row::column_count`]; NULL reads as 0.
    pub fn column_int(&self, col: i32) -> i64 {
        unsafe { ffi::sqlite3_column_int64(self.stmt, col) }
    }

    /// Read the 0-based column `col` as text, copied out of the engine's
    /// buffer. SQL NULL yields `None`; other types are converted to text by
    /// the engine.
    pub fn column_text(&self, col: i32) -> Option<String> {
        unsafe {
            if ffi::sqlite3_column_type(self.stmt, col) == ffi::SQLITE_NULL {
                return None;
            }
            let text = ffi::sqlite3_column_text(self.stmt, col);
            if text.is_null() {
                return None;
            }
            Some(
                CStr::from_ptr(text as *const c_char)
                    .to_string_lossy()
                    .into_owned(),
            )
        }
    }

    /// Number of columns in this row.
    pub fn column_count(&self) -> i32 {
        unsafe { ffi::sqlite3_column_count(self.stmt) }
    }
}
