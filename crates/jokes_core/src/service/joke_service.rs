//! Joke use-case service.
//!
//! # Responsibility
//! - Provide the list/details/create/edit/delete entry points used by
//!   request handlers.
//! - Turn version-guarded writes into explicit request outcomes.
//!
//! # Invariants
//! - Missing, mismatched and concurrently deleted ids all resolve to
//!   not-found; none of them is an error.
//! - A stale write is never retried and never silently dropped.
//! - Storage failures propagate unchanged and are logged at `error`.

use crate::model::joke::{Joke, JokeDraft, JokeEdit, JokeId, JokeValidationError, JokeVersion};
use crate::repo::joke_repo::{JokeRepository, RepoResult, WriteOutcome};
use log::{debug, error, info, warn};

/// Result of a create request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The joke was persisted with a fresh id.
    Created(Joke),
    /// Nothing was inserted; `draft` is handed back for correction.
    ValidationFailed {
        draft: JokeDraft,
        error: JokeValidationError,
    },
}

/// Result of an edit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The edit was committed; the joke carries its new version.
    Updated(Joke),
    /// Ids did not match, or the joke does not exist (any more).
    NotFound,
    /// Another writer changed the joke after `stale_version` was read.
    ///
    /// This is not recoverable here: the caller must restart the edit from
    /// a fresh read.
    Conflict {
        id: JokeId,
        stale_version: JokeVersion,
    },
    /// Nothing was written; `edit` is handed back for correction.
    ValidationFailed {
        edit: JokeEdit,
        error: JokeValidationError,
    },
}

/// Use-case service wrapper for joke requests.
pub struct JokeService<R: JokeRepository> {
    repo: R,
}

impl<R: JokeRepository> JokeService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists all jokes.
    pub fn list(&self) -> RepoResult<Vec<Joke>> {
        log_storage_failure("joke_list", None, self.repo.list_jokes())
    }

    /// Looks up one joke for display.
    ///
    /// A missing id is treated as not-found without touching storage.
    pub fn details(&self, id: Option<JokeId>) -> RepoResult<Option<Joke>> {
        self.lookup("joke_details", id)
    }

    /// Validates and inserts a new joke.
    ///
    /// # Contract
    /// - On validation failure nothing is inserted and the draft is echoed.
    /// - Identical drafts are not deduplicated; each one gets its own id.
    pub fn create(&self, draft: JokeDraft) -> RepoResult<CreateOutcome> {
        if let Err(error) = draft.validate() {
            debug!("event=joke_create module=service status=invalid reason={error}");
            return Ok(CreateOutcome::ValidationFailed { draft, error });
        }

        let joke = log_storage_failure("joke_create", None, self.repo.insert_joke(&draft))?;
        info!(
            "event=joke_create module=service status=ok id={} version={}",
            joke.id, joke.version
        );
        Ok(CreateOutcome::Created(joke))
    }

    /// Applies an edit submitted for the joke addressed by `path_id`.
    ///
    /// # Contract
    /// - `path_id` must equal `edit.id`, otherwise `NotFound` without any
    ///   storage access.
    /// - Invalid input yields `ValidationFailed` without any write.
    /// - A stale write is followed by an existence check: gone means
    ///   `NotFound`, still present means `Conflict`.
    pub fn edit(&self, path_id: JokeId, edit: JokeEdit) -> RepoResult<UpdateOutcome> {
        if path_id != edit.id {
            debug!(
                "event=joke_update module=service status=not_found reason=id_mismatch path_id={} body_id={}",
                path_id, edit.id
            );
            return Ok(UpdateOutcome::NotFound);
        }

        if let Err(error) = edit.validate() {
            debug!(
                "event=joke_update module=service status=invalid id={} reason={error}",
                edit.id
            );
            return Ok(UpdateOutcome::ValidationFailed { edit, error });
        }

        let written =
            log_storage_failure("joke_update", Some(edit.id), self.repo.update_joke(&edit))?;
        match written {
            WriteOutcome::Written(joke) => {
                info!(
                    "event=joke_update module=service status=ok id={} version={}",
                    joke.id, joke.version
                );
                Ok(UpdateOutcome::Updated(joke))
            }
            WriteOutcome::Stale => self.resolve_stale_write(&edit),
        }
    }

    /// Confirmation read before a destructive delete.
    pub fn delete_confirm(&self, id: Option<JokeId>) -> RepoResult<Option<Joke>> {
        self.lookup("joke_delete_confirm", id)
    }

    /// Deletes a joke after confirmation.
    ///
    /// Already-absent ids succeed, so a racing second delete is a no-op.
    pub fn delete_commit(&self, id: JokeId) -> RepoResult<()> {
        let removed = log_storage_failure("joke_delete", Some(id), self.repo.delete_joke(id))?;
        if removed {
            info!("event=joke_delete module=service status=ok id={id}");
        } else {
            debug!("event=joke_delete module=service status=noop reason=already_absent id={id}");
        }
        Ok(())
    }

    fn lookup(&self, event: &str, id: Option<JokeId>) -> RepoResult<Option<Joke>> {
        let Some(id) = id else {
            debug!("event={event} module=service status=not_found reason=missing_id");
            return Ok(None);
        };

        let found = log_storage_failure(event, Some(id), self.repo.find_joke(id))?;
        if found.is_none() {
            debug!("event={event} module=service status=not_found id={id}");
        }
        Ok(found)
    }

    fn resolve_stale_write(&self, edit: &JokeEdit) -> RepoResult<UpdateOutcome> {
        let exists =
            log_storage_failure("joke_update", Some(edit.id), self.repo.joke_exists(edit.id))?;
        if !exists {
            debug!(
                "event=joke_update module=service status=not_found reason=vanished id={}",
                edit.id
            );
            return Ok(UpdateOutcome::NotFound);
        }

        warn!(
            "event=joke_update module=service status=conflict id={} stale_version={}",
            edit.id, edit.version
        );
        Ok(UpdateOutcome::Conflict {
            id: edit.id,
            stale_version: edit.version,
        })
    }
}

fn log_storage_failure<T>(
    event: &str,
    id: Option<JokeId>,
    result: RepoResult<T>,
) -> RepoResult<T> {
    if let Err(err) = &result {
        match id {
            Some(id) => error!("event={event} module=service status=error id={id} error={err}"),
            None => error!("event={event} module=service status=error error={err}"),
        }
    }
    result
}
