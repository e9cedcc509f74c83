//! Tabloop database layer.
//!
//! Provides the SQLite connection and schema migrations behind the persistent
//! key-value store that holds `tab_<id>` snapshots and `nudge_<id>` records.
//!
//! # Usage
//!
//! ```no_run
//! use tabloop::database::Database;
//!
//! let db = Database::open("tabloop.db").expect("failed to open database");
//! let scratch = Database::open_in_memory().expect("failed to open in-memory database");
//! ```

pub mod connection;
pub mod migrations;

pub use connection::Database;
