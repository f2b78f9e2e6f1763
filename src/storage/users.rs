//! User accounts
//!
//! Accounts live in a `users` table next to the events. Callers go through
//! the [`UserRepository`] trait so the auth layer never touches SQL.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::store::EventStore;
use super::types::millis_to_datetime;
use super::StorageResult;

/// A registered account
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    /// Lowercased, unique
    pub email: String,
    pub name: String,
    /// Encoded argon2 hash
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Persistence for user accounts
pub trait UserRepository: Send + Sync {
    /// Insert a user; returns false when the email is already taken
    fn create_user(&self, user: &User) -> StorageResult<bool>;

    fn find_user_by_email(&self, email: &str) -> StorageResult<Option<User>>;

    fn find_user_by_id(&self, id: &str) -> StorageResult<Option<User>>;
}

const USER_COLUMNS: &str = "id, email, name, password_hash, created_at";

pub(super) fn init_schema(conn: &Connection) -> StorageResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id            TEXT PRIMARY KEY,
            email         TEXT NOT NULL UNIQUE,
            name          TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            created_at    INTEGER NOT NULL
        )",
        [],
    )?;
    Ok(())
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: millis_to_datetime(row.get(4)?),
    })
}

impl UserRepository for EventStore {
    fn create_user(&self, user: &User) -> StorageResult<bool> {
        let conn = self.lock()?;
        let inserted = conn.execute(
            &format!(
                "INSERT OR IGNORE INTO users ({}) VALUES (?, ?, ?, ?, ?)",
                USER_COLUMNS
            ),
            params![
                user.id,
                user.email,
                user.name,
                user.password_hash,
                user.created_at.timestamp_millis(),
            ],
        )?;
        Ok(inserted == 1)
    }

    fn find_user_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare_cached(&format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS))?;
        Ok(stmt.query_row([email], user_from_row).optional()?)
    }

    fn find_user_by_id(&self, id: &str) -> StorageResult<Option<User>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare_cached(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))?;
        Ok(stmt.query_row([id], user_from_row).optional()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::EventPredicate;
    use tempfile::tempdir;

    fn user(email: &str) -> User {
        User {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.to_string(),
            name: "Ada".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            created_at: millis_to_datetime(1_714_557_600_000),
        }
    }

    #[test]
    fn test_create_and_find() {
        let store = EventStore::open_in_memory().unwrap();
        let ada = user("ada@example.com");

        assert!(store.create_user(&ada).unwrap());
        assert_eq!(
            store.find_user_by_email("ada@example.com").unwrap(),
            Some(ada.clone())
        );
        assert_eq!(store.find_user_by_id(&ada.id).unwrap(), Some(ada));
        assert!(store.find_user_by_email("bob@example.com").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let store = EventStore::open_in_memory().unwrap();
        assert!(store.create_user(&user("ada@example.com")).unwrap());
        assert!(!store.create_user(&user("ada@example.com")).unwrap());
    }

    #[test]
    fn test_users_do_not_count_as_events() {
        let store = EventStore::open_in_memory().unwrap();
        store.create_user(&user("ada@example.com")).unwrap();
        assert_eq!(store.count(&EventPredicate::default()).unwrap(), 0);
    }

    #[test]
    fn test_users_persist_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("accounts.db");
        let ada = user("ada@example.com");

        EventStore::open(&path).unwrap().create_user(&ada).unwrap();

        let store = EventStore::open(&path).unwrap();
        assert_eq!(store.find_user_by_id(&ada.id).unwrap(), Some(ada));
    }
}
