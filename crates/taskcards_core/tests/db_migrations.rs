use rusqlite::{params, Connection};
use taskcards_core::db::migrations::latest_version;
use taskcards_core::db::{open_db, open_db_in_memory, DbError};

const TASK_COLUMNS: [&str; 8] = [
    "seq",
    "id",
    "name",
    "priority",
    "due_date",
    "completed",
    "list_name",
    "created_at",
];

fn insert_row(
    conn: &Connection,
    id: &str,
    name: &str,
    priority: i64,
    completed: i64,
) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO tasks (id, name, priority, completed, created_at)
         VALUES (?1, ?2, ?3, ?4, '2026-10-19T08:00:00.000000Z');",
        params![id, name, priority, completed],
    )
}

fn task_columns(conn: &Connection) -> Vec<String> {
    let mut stmt = conn.prepare("PRAGMA table_info(tasks);").unwrap();
    stmt.query_map([], |row| row.get::<_, String>("name"))
        .unwrap()
        .collect::<rusqlite::Result<Vec<_>>>()
        .unwrap()
}

fn task_indexes(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = 'tasks';")
        .unwrap();
    stmt.query_map([], |row| row.get::<_, String>(0))
        .unwrap()
        .collect::<rusqlite::Result<Vec<_>>>()
        .unwrap()
}

fn user_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn fresh_database_has_task_table_and_created_at_index() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(user_version(&conn), latest_version());
    assert_eq!(task_columns(&conn), TASK_COLUMNS);
    assert!(task_indexes(&conn).contains(&"tasks_created_at_idx".to_string()));
}

#[test]
fn task_schema_enforces_field_constraints() {
    let conn = open_db_in_memory().unwrap();

    assert!(insert_row(&conn, "a", "Buy milk", 4, 0).is_err());
    assert!(insert_row(&conn, "b", "Buy milk", 0, 0).is_err());
    assert!(insert_row(&conn, "c", "Buy milk", 1, 2).is_err());
    assert!(insert_row(&conn, "d", "   ", 1, 0).is_err());
    insert_row(&conn, "e", "Buy milk", 3, 1).unwrap();
    assert!(insert_row(&conn, "e", "Call dentist", 1, 0).is_err());

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM tasks;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn task_rows_survive_reopening_nested_database_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("taskcards").join("tasks.db");

    let conn = open_db(&path).unwrap();
    insert_row(&conn, "kept", "Renew passport", 2, 0).unwrap();
    drop(conn);
    assert!(path.exists());

    let reopened = open_db(&path).unwrap();
    assert_eq!(user_version(&reopened), latest_version());
    let name: String = reopened
        .query_row("SELECT name FROM tasks WHERE id = 'kept';", [], |row| row.get(0))
        .unwrap();
    assert_eq!(name, "Renew passport");
}

#[test]
fn task_database_from_newer_release_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.db");
    let newer = latest_version() + 1;

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {newer};"))
        .unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, newer);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}
