//! SQLite bootstrap for the joke store.
//!
//! # Responsibility
//! - Open joke databases and bring them to the latest schema.
//! - Report which database or migration step failed.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - No joke is read or written before migrations succeed.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Bootstrap failures. All of them leave the caller without a connection.
#[derive(Debug)]
pub enum DbError {
    /// The database could not be opened; `target` is the file path or `:memory:`.
    Open {
        target: String,
        source: rusqlite::Error,
    },
    /// A registered migration failed and was rolled back.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
    /// Pragmas, schema probes and other statements outside a single migration.
    Sqlite(rusqlite::Error),
    /// The file was written by a newer binary.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { target, source } => {
                write!(f, "cannot open joke database `{target}`: {source}")
            }
            Self::Migration { version, source } => {
                write!(f, "joke schema migration {version} failed: {source}")
            }
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "joke database schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. } | Self::Migration { source, .. } => Some(source),
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
