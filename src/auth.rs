//! Demo credential check and self-contained signed tokens.
//!
//! There is deliberately no ambient "current user": handlers that need
//! identity take a token in their params and verify it here.

use crate::store;
use rusqlite::Connection;
use sha2::{Digest, Sha256};

const DEMO_USERNAME: &str = "admin";
const DEMO_PASSWORD: &str = "admin123";
const DEMO_ROLE: &str = "SuperAdmin";

// Demo stand-in for real session issuance, which is an external collaborator.
const TOKEN_SECRET: &str = "schoold-demo-token-secret";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub username: String,
    pub role: String,
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

fn sign(payload: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(TOKEN_SECRET.as_bytes());
    hasher.update(b"|");
    hasher.update(payload.as_bytes());
    hex(hasher.finalize().as_slice())
}

pub fn issue_token(username: &str, role: &str, issued_at: i64) -> String {
    let payload = format!("{}:{}:{}", username, role, issued_at);
    format!("{}:{}", payload, sign(&payload))
}

/// Fixed demo credential pair; anything else is rejected.
pub fn login(username: &str, password: &str) -> Option<AuthUser> {
    if username == DEMO_USERNAME && password == DEMO_PASSWORD {
        Some(AuthUser {
            username: DEMO_USERNAME.to_string(),
            role: DEMO_ROLE.to_string(),
        })
    } else {
        None
    }
}

pub fn verify_token(token: &str) -> Option<AuthUser> {
    let parts: Vec<&str> = token.split(':').collect();
    if parts.len() != 4 {
        return None;
    }
    let (username, role, issued_at, sig) = (parts[0], parts[1], parts[2], parts[3]);
    let payload = format!("{}:{}:{}", username, role, issued_at);
    if sign(&payload) != sig {
        return None;
    }
    Some(AuthUser {
        username: username.to_string(),
        role: role.to_string(),
    })
}

/// "Does user U have access to class C": SuperAdmin reaches every class;
/// a Teacher-role caller only the class naming them as incharge.
pub fn can_access_class(conn: &Connection, user: &AuthUser, class_id: &str) -> anyhow::Result<bool> {
    if user.role == DEMO_ROLE {
        return Ok(true);
    }
    let Some(class) = store::get(conn, "classes", class_id)? else {
        return Ok(false);
    };
    Ok(class
        .get("inchargeTeacherId")
        .and_then(|v| v.as_str())
        .map(|incharge| incharge == user.username)
        .unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;
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
        conn
    }

    fn teacher(username: &str) -> AuthUser {
        AuthUser {
            username: username.to_string(),
            role: "Teacher".to_string(),
        }
    }

    #[test]
    fn demo_pair_logs_in_with_super_admin_role() {
        let user = login("admin", "admin123").expect("demo login");
        assert_eq!(user.username, "admin");
        assert_eq!(user.role, "SuperAdmin");
        assert!(login("admin", "wrong").is_none());
        assert!(login("root", "admin123").is_none());
    }

    #[test]
    fn issued_tokens_verify_round_trip() {
        let token = issue_token("admin", "SuperAdmin", 1_700_000_000);
        let user = verify_token(&token).expect("verify");
        assert_eq!(user.username, "admin");
        assert_eq!(user.role, "SuperAdmin");
    }

    #[test]
    fn super_admin_reaches_every_class() {
        let conn = mem_conn();
        store::insert(
            &conn,
            "classes",
            "c1",
            &json!({ "name": "Grade 5", "section": "A", "inchargeTeacherId": "t-meera" }),
        )
        .unwrap();

        let admin = AuthUser {
            username: "admin".to_string(),
            role: "SuperAdmin".to_string(),
        };
        assert!(can_access_class(&conn, &admin, "c1").unwrap());
        // The role check short-circuits before any class lookup.
        assert!(can_access_class(&conn, &admin, "no-such-class").unwrap());
    }

    #[test]
    fn only_the_incharge_teacher_reaches_a_class() {
        let conn = mem_conn();
        store::insert(
            &conn,
            "classes",
            "c1",
            &json!({ "name": "Grade 5", "section": "A", "inchargeTeacherId": "t-meera" }),
        )
        .unwrap();
        store::insert(
            &conn,
            "classes",
            "c2",
            &json!({ "name": "Grade 6", "section": "B" }),
        )
        .unwrap();

        assert!(can_access_class(&conn, &teacher("t-meera"), "c1").unwrap());
        assert!(!can_access_class(&conn, &teacher("t-rohan"), "c1").unwrap());
        // No incharge on record denies everyone but SuperAdmin.
        assert!(!can_access_class(&conn, &teacher("t-meera"), "c2").unwrap());
        assert!(!can_access_class(&conn, &teacher("t-meera"), "no-such-class").unwrap());
    }

    #[test]
    fn tampered_tokens_fail_verification() {
        let token = issue_token("admin", "SuperAdmin", 1_700_000_000);
        let forged = token.replace("SuperAdmin", "Teacher");
        assert!(verify_token(&forged).is_none());
        assert!(verify_token("garbage").is_none());
        assert!(verify_token("a:b:c").is_none());
    }
}
