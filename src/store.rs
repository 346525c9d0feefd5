//! Generic document CRUD over the `records` table.
//!
//! Every entity family (students, teachers, fees, attendance, ...) is a named
//! collection of JSON bodies. Handlers parameterize the shared read/write
//! paths here instead of repeating fetch/check/branch/write per resource.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use serde_json::Value;

pub fn insert(conn: &Connection, collection: &str, id: &str, body: &Value) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO records(collection, id, body, created_at) VALUES(?, ?, ?, ?)",
        (
            collection,
            id,
            serde_json::to_string(body)?,
            Utc::now().to_rfc3339(),
        ),
    )?;
    Ok(())
}

pub fn get(conn: &Connection, collection: &str, id: &str) -> anyhow::Result<Option<Value>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT body FROM records WHERE collection = ? AND id = ?",
            (collection, id),
            |r| r.get(0),
        )
        .optional()?;
    match raw {
        Some(s) => Ok(Some(serde_json::from_str(&s)?)),
        None => Ok(None),
    }
}

/// Overwrite an existing body. Returns false when the id is absent.
pub fn replace(conn: &Connection, collection: &str, id: &str, body: &Value) -> anyhow::Result<bool> {
    let n = conn.execute(
        "UPDATE records SET body = ? WHERE collection = ? AND id = ?",
        (serde_json::to_string(body)?, collection, id),
    )?;
    Ok(n > 0)
}

pub fn remove(conn: &Connection, collection: &str, id: &str) -> anyhow::Result<bool> {
    let n = conn.execute(
        "DELETE FROM records WHERE collection = ? AND id = ?",
        (collection, id),
    )?;
    Ok(n > 0)
}

/// Full collection scan in insertion order. Collections here are small;
/// filtering happens in the handlers over parsed bodies.
pub fn list(conn: &Connection, collection: &str) -> anyhow::Result<Vec<Value>> {
    let mut stmt =
        conn.prepare("SELECT body FROM records WHERE collection = ? ORDER BY rowid")?;
    let raw = stmt
        .query_map([collection], |r| r.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    let mut out = Vec::with_capacity(raw.len());
    for s in raw {
        out.push(serde_json::from_str(&s)?);
    }
    Ok(out)
}

/// Atomic increment-and-fetch. Sequences never reuse or skip under
/// interleaved writers, unlike deriving the next code from a collection count.
pub fn next_sequence(conn: &Connection, key: &str) -> anyhow::Result<i64> {
    let v = conn.query_row(
        "INSERT INTO counters(key, value) VALUES(?, 1)
         ON CONFLICT(key) DO UPDATE SET value = value + 1
         RETURNING value",
        [key],
        |r| r.get(0),
    )?;
    Ok(v)
}

/// Human-readable entity code: prefix plus zero-padded sequence.
pub fn format_code(prefix: &str, seq: i64) -> String {
    format!("{}{:04}", prefix, seq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mem_conn() -> Connection {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        conn.execute(
            "CREATE TABLE records(
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                body TEXT NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY(collection, id)
            )",
            [],
        )
        .expect("records table");
        conn.execute(
            "CREATE TABLE counters(key TEXT PRIMARY KEY, value INTEGER NOT NULL)",
            [],
        )
        .expect("counters table");
        conn
    }

    #[test]
    fn round_trips_documents_per_collection() {
        let conn = mem_conn();
        insert(&conn, "students", "s1", &json!({ "firstName": "Ada" })).unwrap();
        insert(&conn, "teachers", "s1", &json!({ "firstName": "Grace" })).unwrap();

        let got = get(&conn, "students", "s1").unwrap().unwrap();
        assert_eq!(got["firstName"], "Ada");
        assert_eq!(get(&conn, "teachers", "s1").unwrap().unwrap()["firstName"], "Grace");

        assert!(replace(&conn, "students", "s1", &json!({ "firstName": "Ida" })).unwrap());
        assert_eq!(get(&conn, "students", "s1").unwrap().unwrap()["firstName"], "Ida");

        assert!(remove(&conn, "students", "s1").unwrap());
        assert!(!remove(&conn, "students", "s1").unwrap());
        assert!(get(&conn, "students", "s1").unwrap().is_none());
    }

    #[test]
    fn list_preserves_insertion_order() {
        let conn = mem_conn();
        for i in 0..5 {
            insert(&conn, "exams", &format!("e{}", i), &json!({ "n": i })).unwrap();
        }
        let all = list(&conn, "exams").unwrap();
        let ns: Vec<i64> = all.iter().map(|v| v["n"].as_i64().unwrap()).collect();
        assert_eq!(ns, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn sequences_are_independent_and_monotonic() {
        let conn = mem_conn();
        assert_eq!(next_sequence(&conn, "seq:students").unwrap(), 1);
        assert_eq!(next_sequence(&conn, "seq:students").unwrap(), 2);
        assert_eq!(next_sequence(&conn, "seq:teachers").unwrap(), 1);
        assert_eq!(next_sequence(&conn, "seq:students").unwrap(), 3);
    }

    #[test]
    fn codes_zero_pad_to_four_digits() {
        assert_eq!(format_code("STU", 1), "STU0001");
        assert_eq!(format_code("TCH", 42), "TCH0042");
        assert_eq!(format_code("STU", 12345), "STU12345");
    }
}
