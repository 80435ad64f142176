// src/repositories/profile_directory.rs
//
// Profile Directory port
//
// The profile/photo service is an external collaborator; the engine only
// needs "give me presentation data for this user". The SQLite-backed
// implementation reads the shared store's profiles table; hosts may plug
// in their own directory behind the trait.

use std::sync::Arc;

use crate::db::ConnectionPool;
use crate::domain::connection::UserId;
use crate::domain::profile::ProfileCard;
use crate::error::{AppError, AppResult};

#[cfg_attr(test, mockall::automock)]
pub trait ProfileDirectory: Send + Sync {
    /// Presentation data for one user; `AppError::NotFound` if the user
    /// has no profile (deleted account, unsynced directory)
    fn lookup(&self, user: &UserId) -> AppResult<ProfileCard>;
}

pub struct SqliteProfileDirectory {
    pool: Arc<ConnectionPool>,
}

impl SqliteProfileDirectory {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }
}

impl ProfileDirectory for SqliteProfileDirectory {
    fn lookup(&self, user: &UserId) -> AppResult<ProfileCard> {
        let conn = self.pool.get()?;
        let result = conn.query_row(
            "SELECT display_name, dog_name, photo_ref FROM profiles WHERE user_id = ?1",
            rusqlite::params![user.as_str()],
            |row| {
                Ok(ProfileCard {
                    display_name: row.get(0)?,
                    dog_name: row.get(1)?,
                    photo_ref: row.get(2)?,
                })
            },
        );

        match result {
            Ok(card) => Ok(card),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(AppError::NotFound),
            Err(e) => Err(AppError::Database(e)),
        }
    }
}

#[cfg(test)]
pub(crate) fn insert_profile(
    pool: &ConnectionPool,
    user: &UserId,
    display_name: &str,
    dog_name: &str,
    photo_ref: Option<&str>,
) {
    let conn = pool.get().unwrap();
    conn.execute(
        "INSERT OR REPLACE INTO profiles (user_id, display_name, dog_name, photo_ref)
         VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![user.as_str(), display_name, dog_name, photo_ref],
    )
    .unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::test_support::create_test_pool;

    #[test]
    fn test_lookup_existing_profile() {
        let (_dir, pool) = create_test_pool();
        let user = UserId::from("alice");
        insert_profile(&pool, &user, "Alice", "Rex", Some("photo-1"));

        let directory = SqliteProfileDirectory::new(pool);
        let card = directory.lookup(&user).unwrap();
        assert_eq!(card.display_name, "Alice");
        assert_eq!(card.dog_name, "Rex");
        assert_eq!(card.photo_ref.as_deref(), Some("photo-1"));
    }

    #[test]
    fn test_lookup_missing_profile_is_not_found() {
        let (_dir, pool) = create_test_pool();
        let directory = SqliteProfileDirectory::new(pool);

        let result = directory.lookup(&UserId::from("ghost"));
        assert!(matches!(result, Err(AppError::NotFound)));
    }
}
