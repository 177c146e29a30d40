//! SQLite access: connection helpers and embedded migrations.

pub mod connection;
pub mod migrate;
