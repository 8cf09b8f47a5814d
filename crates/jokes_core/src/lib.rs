//! Core domain logic for the joke store.
//! This crate is the single source of truth for record invariants and the
//! optimistic-concurrency mutation protocol.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging};
pub use model::joke::{
    Joke, JokeDraft, JokeEdit, JokeField, JokeId, JokeValidationError, JokeVersion,
    MAX_FIELD_CHARS,
};
pub use repo::joke_repo::{
    JokeRepository, RepoError, RepoResult, SqliteJokeRepository, WriteOutcome,
};
pub use service::joke_service::{CreateOutcome, JokeService, UpdateOutcome};
