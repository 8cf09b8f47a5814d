//! Command-line front end for the joke store.
//!
//! # Responsibility
//! - Map subcommands onto `JokeService` requests, one connection per run.
//! - Render records as text or JSON and report outcomes through exit codes.
//!
//! # Invariants
//! - Not-found and validation outcomes are ordinary results, not errors.
//! - A successful mutation ends with the index listing ("redirect to index").

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use jokes_core::db::open_db;
use jokes_core::{
    default_log_level, init_logging, CreateOutcome, Joke, JokeDraft, JokeEdit, JokeId,
    JokeService, JokeVersion, SqliteJokeRepository, UpdateOutcome,
};
use log::error;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const EXIT_NOT_FOUND: u8 = 1;
const EXIT_VALIDATION_FAILED: u8 = 2;
const EXIT_CONFLICT: u8 = 3;
/// Storage and bootstrap failures; never shared with an expected outcome.
const EXIT_FATAL: u8 = 4;
/// Malformed command line (sysexits `EX_USAGE`); clap's own default would be 2.
const EXIT_USAGE: u8 = 64;

#[derive(Debug, Parser)]
#[command(name = "jokes", version, about = "Keep a collection of question/answer jokes")]
struct Cli {
    /// SQLite database file.
    #[arg(long, env = "JOKES_DB", default_value = "jokes.sqlite3", global = true)]
    db: PathBuf,

    /// trace|debug|info|warn|error; defaults by build mode.
    #[arg(long, env = "JOKES_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    /// Directory for rolling log files. Logging is off when unset.
    #[arg(long, env = "JOKES_LOG_DIR", global = true)]
    log_dir: Option<PathBuf>,

    /// Print JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every joke.
    List,
    /// Show one joke.
    Show { id: Option<JokeId> },
    /// Add a new joke.
    Create { question: String, answer: String },
    /// Replace question and answer of an existing joke.
    Edit {
        id: JokeId,
        /// Version shown when you read the joke.
        #[arg(long)]
        row_version: JokeVersion,
        #[arg(long)]
        question: String,
        #[arg(long)]
        answer: String,
        /// Identity carried by the submitted body; defaults to ID.
        #[arg(long)]
        body_id: Option<JokeId>,
    },
    /// Show a joke for confirmation; delete it with --yes.
    Delete {
        id: Option<JokeId>,
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::from(EXIT_USAGE)
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            error!("event=cli_run module=cli status=error error={err:#}");
            eprintln!("error: {err:#}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        let log_dir = absolute(log_dir)?;
        init_logging(level, &log_dir).map_err(anyhow::Error::msg)?;
    }

    let conn = open_db(&cli.db)
        .with_context(|| format!("failed to open database `{}`", cli.db.display()))?;
    let service = JokeService::new(SqliteJokeRepository::try_new(&conn)?);
    let out = Output { json: cli.json };

    match cli.command {
        Command::List => {
            out.index(&service.list()?)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Show { id } => match service.details(id)? {
            Some(joke) => {
                out.joke(&joke)?;
                Ok(ExitCode::SUCCESS)
            }
            None => Ok(not_found(id)),
        },
        Command::Create { question, answer } => {
            match service.create(JokeDraft::new(question, answer))? {
                CreateOutcome::Created(joke) => {
                    out.note(&format!("Created joke #{} (v{}).", joke.id, joke.version));
                    out.index(&service.list()?)?;
                    Ok(ExitCode::SUCCESS)
                }
                CreateOutcome::ValidationFailed { draft, error } => {
                    out.rejected(&draft, &error)?;
                    Ok(ExitCode::from(EXIT_VALIDATION_FAILED))
                }
            }
        }
        Command::Edit {
            id,
            row_version,
            question,
            answer,
            body_id,
        } => {
            let edit = JokeEdit {
                id: body_id.unwrap_or(id),
                question,
                answer,
                version: row_version,
            };
            match service.edit(id, edit)? {
                UpdateOutcome::Updated(joke) => {
                    out.note(&format!("Updated joke #{} (v{}).", joke.id, joke.version));
                    out.index(&service.list()?)?;
                    Ok(ExitCode::SUCCESS)
                }
                UpdateOutcome::NotFound => Ok(not_found(Some(id))),
                UpdateOutcome::Conflict { id, stale_version } => {
                    eprintln!(
                        "joke #{id} changed since version {stale_version}; reload it and edit again"
                    );
                    Ok(ExitCode::from(EXIT_CONFLICT))
                }
                UpdateOutcome::ValidationFailed { edit, error } => {
                    out.rejected(&edit, &error)?;
                    Ok(ExitCode::from(EXIT_VALIDATION_FAILED))
                }
            }
        }
        Command::Delete { id, yes: false } => match service.delete_confirm(id)? {
            Some(joke) => {
                out.joke(&joke)?;
                out.note(&format!("Run again with --yes to delete joke #{}.", joke.id));
                Ok(ExitCode::SUCCESS)
            }
            None => Ok(not_found(id)),
        },
        Command::Delete { id: None, yes: true } => Ok(not_found(None)),
        Command::Delete {
            id: Some(id),
            yes: true,
        } => {
            service.delete_commit(id)?;
            out.note(&format!("Deleted joke #{id}."));
            out.index(&service.list()?)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("failed to resolve current directory")?;
    Ok(cwd.join(path))
}

fn not_found(id: Option<JokeId>) -> ExitCode {
    match id {
        Some(id) => eprintln!("joke #{id} not found"),
        None => eprintln!("joke not found: no id given"),
    }
    ExitCode::from(EXIT_NOT_FOUND)
}

struct Output {
    json: bool,
}

impl Output {
    fn joke(&self, joke: &Joke) -> Result<()> {
        if self.json {
            return print_json(joke);
        }
        println!("#{} (v{})", joke.id, joke.version);
        println!("Q: {}", joke.question);
        println!("A: {}", joke.answer);
        Ok(())
    }

    fn index(&self, jokes: &[Joke]) -> Result<()> {
        if self.json {
            return print_json(jokes);
        }
        if jokes.is_empty() {
            println!("No jokes yet.");
        }
        for joke in jokes {
            println!("#{:<4} v{:<3} {} / {}", joke.id, joke.version, joke.question, joke.answer);
        }
        Ok(())
    }

    /// Echoes rejected input so the caller can correct and resubmit it.
    fn rejected<T: Serialize>(&self, input: &T, error: &impl std::fmt::Display) -> Result<()> {
        eprintln!("invalid input: {error}");
        if self.json {
            return print_json(input);
        }
        let echoed = serde_json::to_string(input)?;
        eprintln!("submitted: {echoed}");
        Ok(())
    }

    // Status lines stay off stdout so JSON output remains parseable.
    fn note(&self, message: &str) {
        eprintln!("{message}");
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{
        Cli, Command, EXIT_CONFLICT, EXIT_FATAL, EXIT_NOT_FOUND, EXIT_USAGE,
        EXIT_VALIDATION_FAILED,
    };
    use clap::{CommandFactory, Parser};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn exit_codes_are_pairwise_distinct_and_nonzero() {
        let codes = [
            EXIT_NOT_FOUND,
            EXIT_VALIDATION_FAILED,
            EXIT_CONFLICT,
            EXIT_FATAL,
            EXIT_USAGE,
        ];
        for (index, code) in codes.iter().enumerate() {
            assert_ne!(*code, 0);
            assert!(!codes[index + 1..].contains(code), "exit code {code} reused");
        }
    }

    #[test]
    fn help_is_not_reported_as_a_usage_error() {
        let help = Cli::try_parse_from(["jokes", "--help"]).unwrap_err();
        assert!(!help.use_stderr());

        let missing = Cli::try_parse_from(["jokes", "edit", "1"]).unwrap_err();
        assert!(missing.use_stderr());
    }

    #[test]
    fn edit_body_id_is_optional() {
        let cli = Cli::try_parse_from([
            "jokes",
            "edit",
            "5",
            "--row-version",
            "2",
            "--question",
            "q",
            "--answer",
            "a",
        ])
        .unwrap();

        match cli.command {
            Command::Edit {
                id,
                row_version,
                body_id,
                ..
            } => {
                assert_eq!(id, 5);
                assert_eq!(row_version, 2);
                assert_eq!(body_id, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn delete_without_yes_is_a_confirmation() {
        let cli = Cli::try_parse_from(["jokes", "--json", "delete", "3"]).unwrap();
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Command::Delete {
                id: Some(3),
                yes: false
            }
        ));
    }
}
