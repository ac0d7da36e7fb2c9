//! SQLite database handle and schema migrations.

mod connection;
mod migrations;

pub use connection::Database;
