use rusqlite::Connection;
use std::path::Path;

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("schoold.sqlite3");
    let conn = Connection::open(db_path)?;

    // One generic table of JSON document bodies keyed by (collection, id).
    // Relationships between documents are denormalized identifier strings;
    // nothing here enforces them unless a rule checks explicitly.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS records(
            collection TEXT NOT NULL,
            id TEXT NOT NULL,
            body TEXT NOT NULL,
            created_at TEXT NOT NULL,
            PRIMARY KEY(collection, id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_records_collection ON records(collection)",
        [],
    )?;

    // Atomic sequences backing generated codes and bill numbers.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS counters(
            key TEXT PRIMARY KEY,
            value INTEGER NOT NULL
        )",
        [],
    )?;

    Ok(conn)
}
