//! Joke domain model.
//!
//! # Responsibility
//! - Define the persisted question/answer record and its write inputs.
//! - Provide validation for create and edit forms.
//!
//! # Invariants
//! - `id` is assigned by the store and never changes afterwards.
//! - `version` starts at 1 and grows by exactly one per committed update.
//! - Validation never mutates the input it inspects.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned identity of a joke.
pub type JokeId = i64;

/// Row-version token used for optimistic concurrency checks.
pub type JokeVersion = i64;

/// Maximum length of `question` and `answer`, counted in chars.
pub const MAX_FIELD_CHARS: usize = 1000;

/// Persisted joke record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Joke {
    pub id: JokeId,
    pub question: String,
    pub answer: String,
    /// Version committed by the last successful write.
    pub version: JokeVersion,
}

impl Joke {
    /// Builds an edit form pre-filled from this record, carrying its version.
    pub fn to_edit(&self) -> JokeEdit {
        JokeEdit {
            id: self.id,
            question: self.question.clone(),
            answer: self.answer.clone(),
            version: self.version,
        }
    }
}

/// Create form input. Identity and version are always assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JokeDraft {
    pub question: String,
    pub answer: String,
}

impl JokeDraft {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }

    /// Checks both fields against the default domain rules.
    pub fn validate(&self) -> Result<(), JokeValidationError> {
        validate_fields(&self.question, &self.answer)
    }
}

/// Edit form body as submitted by an editor.
///
/// `version` is the token the editor observed when the edit started; the
/// store rejects the write if the row moved on since then.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JokeEdit {
    pub id: JokeId,
    pub question: String,
    pub answer: String,
    pub version: JokeVersion,
}

impl JokeEdit {
    /// Checks both mutable fields against the default domain rules.
    ///
    /// Identity is not checked here; matching it against the request path
    /// is the caller's first step.
    pub fn validate(&self) -> Result<(), JokeValidationError> {
        validate_fields(&self.question, &self.answer)
    }
}

/// Field name used in validation diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JokeField {
    Question,
    Answer,
}

impl JokeField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Question => "question",
            Self::Answer => "answer",
        }
    }
}

/// Validation failures for joke input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JokeValidationError {
    /// Field is empty or whitespace only.
    EmptyField(JokeField),
    /// Field exceeds `max_chars` characters.
    FieldTooLong { field: JokeField, max_chars: usize },
    /// Field contains NUL or a control character other than line breaks/tabs.
    InvalidCharacters(JokeField),
}

impl Display for JokeValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "{} must not be empty", field.as_str()),
            Self::FieldTooLong { field, max_chars } => {
                write!(f, "{} must be at most {max_chars} characters", field.as_str())
            }
            Self::InvalidCharacters(field) => {
                write!(f, "{} contains unsupported control characters", field.as_str())
            }
        }
    }
}

impl Error for JokeValidationError {}

fn validate_fields(question: &str, answer: &str) -> Result<(), JokeValidationError> {
    validate_field(JokeField::Question, question)?;
    validate_field(JokeField::Answer, answer)
}

fn validate_field(field: JokeField, value: &str) -> Result<(), JokeValidationError> {
    if value.trim().is_empty() {
        return Err(JokeValidationError::EmptyField(field));
    }
    if value.chars().count() > MAX_FIELD_CHARS {
        return Err(JokeValidationError::FieldTooLong {
            field,
            max_chars: MAX_FIELD_CHARS,
        });
    }
    if value
        .chars()
        .any(|ch| ch.is_control() && !matches!(ch, '\n' | '\r' | '\t'))
    {
        return Err(JokeValidationError::InvalidCharacters(field));
    }
    Ok(())
}
