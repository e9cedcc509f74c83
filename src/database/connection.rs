//! SQLite connection management.

use rusqlite::Connection;
use std::path::Path;

use super::migrations;

/// Owns the SQLite connection and keeps the schema current.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens (or creates) a database file and runs pending migrations.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        migrations::run_all(&conn)?;
        Ok(Self { conn })
    }

    /// In-memory database, discarded on drop.
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        migrations::run_all(&conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}
