//! Steplite - Interactive Shell
//!
//! A small REPL that drives the statement-lifecycle wrapper: SQL typed at
//! the prompt is prepared, stepped row by row, and finalized, with result
//! rows rendered as an ASCII table.

use std::env;

use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::EnvFilter;

use steplite::{Connection, Step};

/// Print welcome banner
fn print_banner(database: &str) {
    println!(
        r#"
 Steplite - a statement-lifecycle shell for SQLite
 Connected to: {}
 Type '.help' for help, '.quit' to exit
"#,
        database
    );
}

/// Print help message
fn print_help() {
    println!(
        r#"
Commands:
  .help              Show this help message
  .quit              Exit the shell
  .tables            List all tables
  .schema <table>    Show the CREATE statement for a table
  .clear             Clear screen

SQL statements end with a semicolon and may span multiple lines:
  CREATE TABLE Contact (Id INT PRIMARY KEY NOT NULL, Name CHAR(255));
  INSERT INTO Contact (Id, Name) VALUES (1, 'Ray');
  SELECT * FROM Contact WHERE Id = 1;
"#
    );
}

/// Format query results as a table
fn format_results(columns: &[String], rows: &[Vec<String>]) -> String {
    if columns.is_empty() && rows.is_empty() {
        return String::new();
    }

    // Calculate column widths
    let mut widths: Vec<usize> = columns.iter().map(|c| c.len()).collect();

    for row in rows {
        for (i, value) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(value.len());
            }
        }
    }

    let mut output = String::new();

    // Header separator
    let separator: String = widths
        .iter()
        .map(|w| "-".repeat(*w + 2))
        .collect::<Vec<_>>()
        .join("+");
    let separator = format!("+{}+\n", separator);

    // Header
    output.push_str(&separator);
    let header: String = columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!(" {:^width$} ", c, width = *w))
        .collect::<Vec<_>>()
        .join("|");
    output.push_str(&format!("|{}|\n", header));
    output.push_str(&separator);

    // Rows
    for row in rows {
        let row_str: String = row
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!(" {:>width$} ", v, width = *w))
            .collect::<Vec<_>>()
            .join("|");
        output.push_str(&format!("|{}|\n", row_str));
    }

    if !rows.is_empty() {
        output.push_str(&separator);
    }

    output.push_str(&format!("{} row(s) returned\n", rows.len()));

    output
}

/// Execute a SQL statement through the wrapper and print its results
fn execute_sql(conn: &Connection, sql: &str) {
    let sql = sql.trim();
    if sql.is_empty() {
        return;
    }

    // Prepare
    let mut stmt = match conn.prepare(sql) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e);
            return;
        }
    };

    let columns: Vec<String> = (0..stmt.column_count())
        .map(|i| stmt.column_name(i).unwrap_or_default())
        .collect();

    if columns.is_empty() {
        // DDL or DML: a single step runs it to completion.
        loop {
            match stmt.step() {
                Ok(Step::Done) => break,
                Ok(Step::Row(_)) => {}
                Err(e) => {
                    eprintln!("{}", e);
                    return;
                }
            }
        }
        let affected = conn.changes();
        if affected > 0 {
            println!("{} row(s) affected", affected);
        } else {
            println!("Ok");
        }
    } else {
        // Query: step once per row, copying values out as display strings.
        let mut rows: Vec<Vec<String>> = Vec::new();
        loop {
            match stmt.step() {
                Ok(Step::Row(row)) => {
                    let mut values = Vec::with_capacity(columns.len());
                    for i in 0..columns.len() as i32 {
                        values.push(row.column_text(i).unwrap_or_else(|| "NULL".to_string()));
                    }
                    rows.push(values);
                }
                Ok(Step::Done) => break,
                Err(e) => {
                    eprintln!("{}", e);
                    return;
                }
            }
        }
        print!("{}", format_results(&columns, &rows));
    }
}

/// List the user tables in the database
fn list_tables(conn: &Connection) -> steplite::Result<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
    let mut tables = Vec::new();
    while let Step::Row(row) = stmt.step()? {
        if let Some(name) = row.column_text(0) {
            tables.push(name);
        }
    }
    Ok(tables)
}

/// Print the CREATE statement for one table
fn show_schema(conn: &Connection, table: &str) -> steplite::Result<()> {
    let mut stmt = conn.prepare("SELECT sql FROM sqlite_master WHERE name = ?")?;
    stmt.bind_text(1, table)?;
    match stmt.step()? {
        Step::Row(row) => println!("{}", row.column_text(0).unwrap_or_default()),
        Step::Done => eprintln!("Error: table '{}' not found", table),
    }
    Ok(())
}

/// Handle special dot commands; returns true when the shell should exit
fn handle_special_command(cmd: &str, conn: &Connection) -> bool {
    let parts: Vec<&str> = cmd.split_whitespace().collect();

    match parts.first().copied() {
        Some(".help") => print_help(),
        Some(".quit") | Some(".exit") => {
            return true;
        }
        Some(".tables") => match list_tables(conn) {
            Ok(tables) if tables.is_empty() => println!("No tables found."),
            Ok(tables) => {
                println!("Tables:");
                for table in tables {
                    println!("  {}", table);
                }
            }
            Err(e) => eprintln!("Error: {}", e),
        },
        Some(".schema") => {
            if let Some(table) = parts.get(1) {
                if let Err(e) = show_schema(conn, table) {
                    eprintln!("Error: {}", e);
                }
            } else {
                eprintln!("Usage: .schema <table>");
            }
        }
        Some(".clear") => {
            // Clear screen (ANSI escape code)
            print!("\x1B[2J\x1B[1;1H");
        }
        Some(cmd) => {
            eprintln!("Unknown command: {}", cmd);
            eprintln!("Type '.help' for available commands.");
        }
        None => {}
    }
    false
}

/// Main REPL loop
fn run_repl(conn: &Connection) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let mut input_buffer = String::new();

    loop {
        let prompt = if input_buffer.is_empty() {
            "steplite> "
        } else {
            "...> "
        };

        let line = match rl.readline(prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                input_buffer.clear();
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };

        let trimmed = line.trim();

        // Handle special commands
        if input_buffer.is_empty() && trimmed.starts_with('.') {
            rl.add_history_entry(trimmed)?;
            if handle_special_command(trimmed, conn) {
                break;
            }
            continue;
        }

        if trimmed.is_empty() {
            continue;
        }

        // Accumulate input until the statement ends with a semicolon
        input_buffer.push_str(&line);
        input_buffer.push('\n');

        if trimmed.ends_with(';') {
            let sql = input_buffer.clone();
            input_buffer.clear();
            rl.add_history_entry(sql.trim())?;
            execute_sql(conn, &sql);
        }
    }

    println!("Goodbye!");
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let path = env::args().nth(1);
    let (conn, database) = match path {
        Some(p) => (Connection::open(&p)?, p),
        None => (Connection::open_in_memory()?, ":memory:".to_string()),
    };

    print_banner(&database);
    run_repl(&conn)
}
