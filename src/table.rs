//! Typed table creation
//!
//! A type that implements [`SqlTable`] carries its own CREATE TABLE
//! statement, so callers can create the tables a record type needs without
//! scattering SQL strings around.

use crate::connection::Connection;
use crate::error::Result;

/// A record type that knows how to create its backing table
pub trait SqlTable {
    /// The CREATE TABLE statement for this type's table.
    const CREATE_SQL: &'static str;
}

impl Connection {
    /// Create the backing table for `T`.
    ///
    /// Delegates entirely to the engine; fails with a prepare or step error
    /// if the table already exists or the SQL is invalid.
    pub fn create_table<T: SqlTable>(&self) -> Result<()> {
        self.execute(T::CREATE_SQL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::statement::Step;

    struct Contact {
        id: i64,
        name: String,
    }

    impl SqlTable for Contact {
        const CREATE_SQL: &'static str =
            "CREATE TABLE Contact (Id INT PRIMARY KEY NOT NULL, Name CHAR(255))";
    }

    #[test]
    fn test_create_table_and_use_it() {
        let conn = Connection::open_in_memory().unwrap();
        conn.create_table::<Contact>().unwrap();

        let contact = Contact {
            id: 1,
            name: "Ray".to_string(),
        };
        let mut insert = conn
            .prepare("INSERT INTO Contact (Id, Name) VALUES (?, ?)")
            .unwrap();
        insert.bind_int(1, contact.id).unwrap();
        insert.bind_text(2, &contact.name).unwrap();
        assert!(matches!(insert.step().unwrap(), Step::Done));
    }

    #[test]
    fn test_create_table_twice_fails() {
        let conn = Connection::open_in_memory().unwrap();
        conn.create_table::<Contact>().unwrap();
        match conn.create_table::<Contact>() {
            Err(Error::Prepare(message)) => assert!(message.contains("already exists")),
            other => panic!("expected Prepare error, got {:?}", other),
        }
    }
}
