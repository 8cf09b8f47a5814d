use jokes_core::db::migrations::latest_version;
use jokes_core::db::open_db_in_memory;
use jokes_core::{
    JokeDraft, JokeEdit, JokeRepository, RepoError, SqliteJokeRepository, WriteOutcome,
};
use rusqlite::Connection;

#[test]
fn insert_assigns_sequential_ids_and_first_version() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteJokeRepository::try_new(&conn).unwrap();

    let first = repo.insert_joke(&JokeDraft::new("q1", "a1")).unwrap();
    let second = repo.insert_joke(&JokeDraft::new("q2", "a2")).unwrap();

    assert_eq!(first.id, 1);
    assert_eq!(second.id, 2);
    assert_eq!(first.version, 1);
    assert_eq!(second.question, "q2");
}

#[test]
fn insert_and_find_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteJokeRepository::try_new(&conn).unwrap();

    let created = repo
        .insert_joke(&JokeDraft::new("Knock knock", "Who's there?"))
        .unwrap();

    let loaded = repo.find_joke(created.id).unwrap().unwrap();
    assert_eq!(loaded, created);
    assert!(repo.joke_exists(created.id).unwrap());
    assert!(repo.find_joke(created.id + 1).unwrap().is_none());
}

#[test]
fn identical_drafts_become_distinct_records() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteJokeRepository::try_new(&conn).unwrap();

    let draft = JokeDraft::new("same", "same");
    let first = repo.insert_joke(&draft).unwrap();
    let second = repo.insert_joke(&draft).unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(repo.list_jokes().unwrap().len(), 2);
}

#[test]
fn list_returns_insertion_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteJokeRepository::try_new(&conn).unwrap();

    for n in 1..=3 {
        repo.insert_joke(&JokeDraft::new(format!("q{n}"), format!("a{n}")))
            .unwrap();
    }

    let questions: Vec<_> = repo
        .list_jokes()
        .unwrap()
        .into_iter()
        .map(|joke| joke.question)
        .collect();
    assert_eq!(questions, ["q1", "q2", "q3"]);
}

#[test]
fn update_with_current_version_bumps_version() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteJokeRepository::try_new(&conn).unwrap();

    let created = repo.insert_joke(&JokeDraft::new("q", "a")).unwrap();
    let mut edit = created.to_edit();
    edit.answer = "new answer".to_string();

    let updated = match repo.update_joke(&edit).unwrap() {
        WriteOutcome::Written(joke) => joke,
        WriteOutcome::Stale => panic!("expected written outcome"),
    };
    assert_eq!(updated.version, created.version + 1);
    assert_eq!(updated.answer, "new answer");
    assert_eq!(repo.find_joke(created.id).unwrap().unwrap(), updated);
}

#[test]
fn update_with_stale_version_leaves_row_untouched() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteJokeRepository::try_new(&conn).unwrap();

    let created = repo.insert_joke(&JokeDraft::new("q", "a")).unwrap();
    let mut first = created.to_edit();
    first.answer = "first".to_string();
    let mut second = created.to_edit();
    second.answer = "second".to_string();

    assert!(matches!(
        repo.update_joke(&first).unwrap(),
        WriteOutcome::Written(_)
    ));
    assert_eq!(repo.update_joke(&second).unwrap(), WriteOutcome::Stale);

    let stored = repo.find_joke(created.id).unwrap().unwrap();
    assert_eq!(stored.answer, "first");
    assert_eq!(stored.version, 2);
}

#[test]
fn update_of_missing_row_is_stale() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteJokeRepository::try_new(&conn).unwrap();

    let created = repo.insert_joke(&JokeDraft::new("q", "a")).unwrap();
    let mut edit = created.to_edit();
    edit.id = 999;

    assert_eq!(repo.update_joke(&edit).unwrap(), WriteOutcome::Stale);
    assert!(!repo.joke_exists(999).unwrap());
}

#[test]
fn update_on_empty_store_is_stale_and_inserts_nothing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteJokeRepository::try_new(&conn).unwrap();

    let edit = JokeEdit {
        id: 42,
        question: "q".to_string(),
        answer: "a".to_string(),
        version: 1,
    };

    assert_eq!(repo.update_joke(&edit).unwrap(), WriteOutcome::Stale);
    assert!(repo.find_joke(42).unwrap().is_none());
    assert!(repo.list_jokes().unwrap().is_empty());
}

#[test]
fn stale_update_keeps_version_and_timestamp() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteJokeRepository::try_new(&conn).unwrap();

    let created = repo.insert_joke(&JokeDraft::new("q", "a")).unwrap();
    conn.execute(
        "UPDATE jokes SET updated_at = 1234567890000 WHERE id = ?1;",
        [created.id],
    )
    .unwrap();

    let mut stale = created.to_edit();
    stale.version = created.version + 5;
    stale.answer = "never stored".to_string();
    assert_eq!(repo.update_joke(&stale).unwrap(), WriteOutcome::Stale);

    let (answer, version, updated_at): (String, i64, i64) = conn
        .query_row(
            "SELECT answer, version, updated_at FROM jokes WHERE id = ?1;",
            [created.id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(answer, "a");
    assert_eq!(version, created.version);
    assert_eq!(updated_at, 1_234_567_890_000);
}

#[test]
fn delete_reports_whether_a_row_was_removed() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteJokeRepository::try_new(&conn).unwrap();

    let created = repo.insert_joke(&JokeDraft::new("q", "a")).unwrap();

    assert!(repo.delete_joke(created.id).unwrap());
    assert!(!repo.delete_joke(created.id).unwrap());
    assert!(repo.find_joke(created.id).unwrap().is_none());
}

#[test]
fn deleted_ids_are_never_reused() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteJokeRepository::try_new(&conn).unwrap();

    let first = repo.insert_joke(&JokeDraft::new("q1", "a1")).unwrap();
    let last = repo.insert_joke(&JokeDraft::new("q2", "a2")).unwrap();
    assert!(repo.delete_joke(last.id).unwrap());
    let next = repo.insert_joke(&JokeDraft::new("q3", "a3")).unwrap();

    // Deleting the highest id is the case plain rowid allocation would reuse.
    assert!(next.id > last.id);
    assert!(next.id > first.id);
}

#[test]
fn read_rejects_invalid_persisted_version() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteJokeRepository::try_new(&conn).unwrap();

    // CHECK (version >= 1) blocks this through SQL, so drop the check first.
    conn.execute_batch("PRAGMA ignore_check_constraints = ON;")
        .unwrap();
    conn.execute(
        "INSERT INTO jokes (question, answer, version) VALUES ('q', 'a', 0);",
        [],
    )
    .unwrap();

    let err = repo.list_jokes().unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("version")));

    let id = conn.last_insert_rowid();
    assert!(matches!(repo.find_joke(id), Err(RepoError::InvalidData(_))));
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let result = SqliteJokeRepository::try_new(&conn);
    match result {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_jokes_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteJokeRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("jokes"))
    ));
}

#[test]
fn repository_rejects_jokes_table_without_version_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE jokes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            question TEXT NOT NULL,
            answer TEXT NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteJokeRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "jokes",
            column: "version"
        })
    ));
}
