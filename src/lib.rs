//! Steplite - A safe statement-lifecycle wrapper over the SQLite C API
//!
//! This library wraps the raw connection and statement handles of the
//! embedded SQLite engine in ownership-tagged resource types:
//! - Connection open/close, released exactly once
//! - Statement prepare/bind/step/reset/finalize, with guaranteed cleanup
//!   on every exit path
//! - Structured errors carrying the engine's message captured at failure time
//!
//! SQL parsing, query planning, storage, and transactions all belong to the
//! engine itself; the wrapper is a direct, synchronous pass-through.
//!
//! Not thread-safe: `Connection` and `Statement` are neither `Send` nor
//! `Sync`. Use one connection per thread.

pub mod connection;
pub mod error;
pub mod statement;
pub mod table;

pub use connection::Connection;
pub use error::{Error, Result};
pub use statement::{Row, Statement, Step};
pub use table::SqlTable;
