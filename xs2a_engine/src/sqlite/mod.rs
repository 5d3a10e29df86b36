//! SQLite storage backend for the XS2A engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
