//! Joke repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide list/lookup/insert/conditional-update/delete over `jokes`.
//! - Keep SQL details inside core persistence boundary.
//!
//! # Invariants
//! - Updates only land when the caller's version matches the stored one.
//! - Every successful update bumps `version` by exactly one.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::joke::{Joke, JokeDraft, JokeEdit, JokeId};
use rusqlite::{
    params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior,
};
use std::error::Error;
use std::fmt::{Display, Formatter};

const JOKE_SELECT_SQL: &str = "SELECT
    id,
    question,
    answer,
    version
FROM jokes";

const REQUIRED_COLUMNS: [&str; 6] = [
    "id",
    "question",
    "answer",
    "version",
    "created_at",
    "updated_at",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage-layer failures for joke persistence. All of them are fatal to
/// the request that hit them.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Persisted data cannot be converted to a valid `Joke`.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted joke data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "joke repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "joke repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "joke repository requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredTable(_) => None,
            Self::MissingRequiredColumn { .. } => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Result of a version-guarded write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The row matched the expected version and now holds the new values.
    Written(Joke),
    /// No row matched `(id, version)`: it was changed or removed since the
    /// caller read it, or it never existed.
    Stale,
}

/// Repository interface for joke persistence.
pub trait JokeRepository {
    /// Returns every joke in insertion order.
    fn list_jokes(&self) -> RepoResult<Vec<Joke>>;
    /// Looks up one joke by id.
    fn find_joke(&self, id: JokeId) -> RepoResult<Option<Joke>>;
    /// Reports whether a row with `id` currently exists.
    fn joke_exists(&self, id: JokeId) -> RepoResult<bool>;
    /// Inserts a new joke; the store assigns `id` and starts at version 1.
    fn insert_joke(&self, draft: &JokeDraft) -> RepoResult<Joke>;
    /// Overwrites question/answer only if `edit.version` is still current.
    fn update_joke(&self, edit: &JokeEdit) -> RepoResult<WriteOutcome>;
    /// Removes a joke; returns whether a row was actually removed.
    fn delete_joke(&self, id: JokeId) -> RepoResult<bool>;
}

/// SQLite-backed joke repository.
pub struct SqliteJokeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteJokeRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    ///
    /// Connections that did not go through `open_db*` are rejected here so
    /// schema drift surfaces before any request touches data.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_joke_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl JokeRepository for SqliteJokeRepository<'_> {
    fn list_jokes(&self) -> RepoResult<Vec<Joke>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{JOKE_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut jokes = Vec::new();

        while let Some(row) = rows.next()? {
            jokes.push(parse_joke_row(row)?);
        }

        Ok(jokes)
    }

    fn find_joke(&self, id: JokeId) -> RepoResult<Option<Joke>> {
        let found = self
            .conn
            .query_row(
                &format!("{JOKE_SELECT_SQL} WHERE id = ?1;"),
                [id],
                |row| Ok(parse_joke_row(row)),
            )
            .optional()?;

        found.transpose()
    }

    fn joke_exists(&self, id: JokeId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM jokes WHERE id = ?1);",
            [id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn insert_joke(&self, draft: &JokeDraft) -> RepoResult<Joke> {
        let tx = begin_write(self.conn)?;
        // Row conversion errors ride inside the closure's Ok so they keep
        // their `InvalidData` meaning.
        let joke = tx.query_row(
            "INSERT INTO jokes (question, answer, version)
             VALUES (?1, ?2, 1)
             RETURNING id, question, answer, version;",
            params![draft.question.as_str(), draft.answer.as_str()],
            |row| Ok(parse_joke_row(row)),
        )??;
        tx.commit()?;
        Ok(joke)
    }

    fn update_joke(&self, edit: &JokeEdit) -> RepoResult<WriteOutcome> {
        let tx = begin_write(self.conn)?;
        let written = tx
            .query_row(
                "UPDATE jokes
                 SET
                    question = ?1,
                    answer = ?2,
                    version = version + 1,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?3
                   AND version = ?4
                 RETURNING id, question, answer, version;",
                params![
                    edit.question.as_str(),
                    edit.answer.as_str(),
                    edit.id,
                    edit.version,
                ],
                |row| Ok(parse_joke_row(row)),
            )
            .optional()?;

        // Stale: dropping `tx` rolls back, so nothing of this call persists.
        match written {
            Some(joke) => {
                let joke = joke?;
                tx.commit()?;
                Ok(WriteOutcome::Written(joke))
            }
            None => Ok(WriteOutcome::Stale),
        }
    }

    fn delete_joke(&self, id: JokeId) -> RepoResult<bool> {
        let tx = begin_write(self.conn)?;
        let changed = tx.execute("DELETE FROM jokes WHERE id = ?1;", [id])?;
        tx.commit()?;
        Ok(changed > 0)
    }
}

// Takes the write lock up front so the busy timeout covers lock waits and a
// WAL snapshot can never go stale between read and write.
fn begin_write(conn: &Connection) -> RepoResult<Transaction<'_>> {
    Ok(Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?)
}

fn parse_joke_row(row: &Row<'_>) -> RepoResult<Joke> {
    let id: JokeId = row.get("id")?;
    let version: i64 = row.get("version")?;
    if version < 1 {
        return Err(RepoError::InvalidData(format!(
            "invalid version `{version}` in jokes.version for id {id}"
        )));
    }

    Ok(Joke {
        id,
        question: row.get("question")?,
        answer: row.get("answer")?,
        version,
    })
}

fn ensure_joke_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "jokes")? {
        return Err(RepoError::MissingRequiredTable("jokes"));
    }

    for column in REQUIRED_COLUMNS {
        if !table_has_column(conn, "jokes", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "jokes",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
