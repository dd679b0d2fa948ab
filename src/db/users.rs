//! Account rows.

use rusqlite::{params, ErrorCode, OptionalExtension};

use super::Db;
use crate::error::StoreError;

#[derive(Clone, Debug)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
}

impl Db {
    /// Returns the new user id; a taken username is [`StoreError::Conflict`].
    pub fn create_user(&self, username: &str, password_hash: &str) -> Result<i64, StoreError> {
        self.with_conn(|conn| {
            match conn.execute(
                "INSERT INTO users (username, password_hash) VALUES (?1, ?2)",
                params![username, password_hash],
            ) {
                Ok(_) => Ok(conn.last_insert_rowid()),
                Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                    Err(StoreError::Conflict(format!("username '{username}' is already taken")))
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn find_user(&self, username: &str) -> Result<Option<UserRow>, StoreError> {
        self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    "SELECT id, username, password_hash FROM users WHERE username = ?1",
                    [username],
                    |row| Ok(UserRow { id: row.get(0)?, username: row.get(1)?, password_hash: row.get(2)? }),
                )
                .optional()?)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_usernames_conflict() {
        let db = Db::open_in_memory().unwrap();
        let id = db.create_user("ada", "h1").unwrap();
        assert!(matches!(db.create_user("ada", "h2"), Err(StoreError::Conflict(_))));

        let row = db.find_user("ada").unwrap().unwrap();
        assert_eq!(row.id, id);
        assert_eq!(row.password_hash, "h1");
        assert!(db.find_user("bob").unwrap().is_none());
    }
}
