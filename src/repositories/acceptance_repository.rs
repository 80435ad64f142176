// src/repositories/acceptance_repository.rs
//
// Lane Acceptance Repository
//
// Swipe ingestion durably records accept decisions here BEFORE calling the
// registrar; the resolution engine itself only reads (reciprocity lookup).
// Rejections are not recorded — absence of a row is the negative.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::db::{to_db_timestamp, ConnectionPool};
use crate::domain::connection::{Lane, UserId};
use crate::error::AppResult;

// ---------------------------------------------------------------------
// Repository contract
// ---------------------------------------------------------------------
pub trait AcceptanceRepository: Send + Sync {
    /// Record that `actor` accepted `candidate` within `lane`.
    /// Re-swipes are a no-op (triple primary key).
    fn record_accept(
        &self,
        actor: &UserId,
        candidate: &UserId,
        lane: Lane,
        at: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Whether `actor` has an accept of `candidate` on record within `lane`
    fn has_accepted(&self, actor: &UserId, candidate: &UserId, lane: Lane) -> AppResult<bool>;
}

// ---------------------------------------------------------------------
// SQLite implementation
// ---------------------------------------------------------------------
pub struct SqliteAcceptanceRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteAcceptanceRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }
}

impl AcceptanceRepository for SqliteAcceptanceRepository {
    fn record_accept(
        &self,
        actor: &UserId,
        candidate: &UserId,
        lane: Lane,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT OR IGNORE INTO lane_accepts (actor_id, candidate_id, lane, accepted_at)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                actor.as_str(),
                candidate.as_str(),
                lane.as_str(),
                to_db_timestamp(at),
            ],
        )?;
        Ok(())
    }

    fn has_accepted(&self, actor: &UserId, candidate: &UserId, lane: Lane) -> AppResult<bool> {
        let conn = self.pool.get()?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(
                 SELECT 1 FROM lane_accepts
                 WHERE actor_id = ?1 AND candidate_id = ?2 AND lane = ?3
             )",
            rusqlite::params![actor.as_str(), candidate.as_str(), lane.as_str()],
            |row| row.get(0),
        )?;
        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::test_support::create_test_pool;

    #[test]
    fn test_record_and_lookup_are_lane_scoped() {
        let (_dir, pool) = create_test_pool();
        let repo = SqliteAcceptanceRepository::new(pool);
        let alice = UserId::from("alice");
        let bob = UserId::from("bob");

        repo.record_accept(&alice, &bob, Lane::Pals, Utc::now())
            .unwrap();

        assert!(repo.has_accepted(&alice, &bob, Lane::Pals).unwrap());
        // Same pair, other lane: no accept on record
        assert!(!repo.has_accepted(&alice, &bob, Lane::Match).unwrap());
        // Direction matters
        assert!(!repo.has_accepted(&bob, &alice, Lane::Pals).unwrap());
    }

    #[test]
    fn test_re_swipe_is_a_no_op() {
        let (_dir, pool) = create_test_pool();
        let repo = SqliteAcceptanceRepository::new(pool);
        let alice = UserId::from("alice");
        let bob = UserId::from("bob");

        repo.record_accept(&alice, &bob, Lane::Match, Utc::now())
            .unwrap();
        repo.record_accept(&alice, &bob, Lane::Match, Utc::now())
            .unwrap();

        assert!(repo.has_accepted(&alice, &bob, Lane::Match).unwrap());
    }
}
