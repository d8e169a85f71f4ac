use steplite::{Connection, Error, SqlTable, Step};

struct Contact;

impl SqlTable for Contact {
    const CREATE_SQL: &'static str =
        "CREATE TABLE Contact (Id INT PRIMARY KEY NOT NULL, Name CHAR(255))";
}

#[test]
fn test_full_lifecycle_against_database_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("contacts.sqlite3");

    // Open, create, insert with bound parameters.
    let conn = Connection::open(&path).unwrap();
    conn.create_table::<Contact>().unwrap();

    let mut insert = conn
        .prepare("INSERT INTO Contact (Id, Name) VALUES (?, ?)")
        .unwrap();
    insert.bind_int(1, 1).unwrap();
    insert.bind_text(2, "Ray").unwrap();
    assert!(matches!(insert.step().unwrap(), Step::Done));

    // Reset and re-execute with fresh bindings, no recompile.
    insert.reset();
    insert.bind_int(1, 2).unwrap();
    insert.bind_text(2, "Maysara").unwrap();
    assert!(matches!(insert.step().unwrap(), Step::Done));
    insert.finalize();

    // Query back the first row.
    let mut query = conn
        .prepare("SELECT Id, Name FROM Contact WHERE Id = ?")
        .unwrap();
    query.bind_int(1, 1).unwrap();
    match query.step().unwrap() {
        Step::Row(row) => {
            assert_eq!(row.column_int(0), 1);
            assert_eq!(row.column_text(1).as_deref(), Some("Ray"));
        }
        Step::Done => panic!("expected exactly one row"),
    }
    assert!(matches!(query.step().unwrap(), Step::Done));
    query.finalize();

    // Close and reopen: the rows persisted in the file.
    conn.close();
    let conn = Connection::open(&path).unwrap();
    let mut count = conn.prepare("SELECT COUNT(*) FROM Contact").unwrap();
    match count.step().unwrap() {
        Step::Row(row) => assert_eq!(row.column_int(0), 2),
        Step::Done => panic!("expected a count row"),
    }
}

#[test]
fn test_open_failure_reports_engine_message() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("does-not-exist").join("contacts.sqlite3");
    match Connection::open(&path) {
        Err(Error::Open(message)) => assert!(!message.is_empty()),
        Ok(_) => panic!("open of an unwritable path should fail"),
        Err(other) => panic!("expected Open error, got {}", other),
    }
}

#[test]
fn test_statement_drop_releases_resources() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("contacts.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.create_table::<Contact>().unwrap();

    {
        // Early exit from this scope never finalizes explicitly; Drop does.
        let mut stmt = conn.prepare("SELECT * FROM Contact").unwrap();
        let _ = stmt.step().unwrap();
    }

    // The connection is still fully usable afterwards.
    conn.execute("INSERT INTO Contact (Id, Name) VALUES (1, 'Ray')")
        .unwrap();
    assert_eq!(conn.changes(), 1);
}

#[test]
fn test_finalize_on_error_path() {
    let conn = Connection::open_in_memory().unwrap();
    conn.create_table::<Contact>().unwrap();
    conn.execute("INSERT INTO Contact (Id, Name) VALUES (1, 'Ray')")
        .unwrap();

    let mut dup = conn
        .prepare("INSERT INTO Contact (Id, Name) VALUES (?, ?)")
        .unwrap();
    dup.bind_int(1, 1).unwrap();
    dup.bind_text(2, "Adam").unwrap();
    let err = dup.step().unwrap_err();
    assert!(matches!(err, Error::Step(_)));

    // Finalize on the error path, twice for good measure.
    dup.finalize();
    dup.finalize();

    // Other statements on the connection are unaffected.
    let mut count = conn.prepare("SELECT COUNT(*) FROM Contact").unwrap();
    match count.step().unwrap() {
        Step::Row(row) => assert_eq!(row.column_int(0), 1),
        Step::Done => panic!("expected a count row"),
    }
}
