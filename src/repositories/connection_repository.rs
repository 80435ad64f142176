// src/repositories/connection_repository.rs
//
// CrossLaneConnection Repository
//
// The store-facing half of the resolution engine. Every method is a
// short-lived transaction against the pooled SQLite database; there is no
// in-process caching of rows, correctness depends on always observing the
// latest committed state.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row, TransactionBehavior};
use std::str::FromStr;
use std::sync::Arc;

use crate::db::{from_db_timestamp, to_db_timestamp, ConnectionPool};
use crate::domain::connection::{
    CrossLaneConnection, Lane, PairKey, ResolutionAttempt, ResolvedBy, UserId,
};
use crate::error::{AppError, AppResult};

const CONNECTION_COLUMNS: &str = "user_low, user_high, chooser_id, created_at, expires_at, \
     chosen_lane, resolved_at, resolved_by, updated_at";

// ---------------------------------------------------------------------
// Repository contract
// ---------------------------------------------------------------------
pub trait ConnectionRepository: Send + Sync {
    /// Insert a new pending row; no-op if the pair already has one.
    /// Returns whether a row was actually created.
    fn insert_pending(&self, connection: &CrossLaneConnection) -> AppResult<bool>;

    fn get_by_pair(&self, pair: &PairKey) -> AppResult<Option<CrossLaneConnection>>;

    /// Pending rows where the given user is the chooser, newest first
    fn list_pending_for_chooser(
        &self,
        chooser: &UserId,
        limit: u32,
    ) -> AppResult<Vec<CrossLaneConnection>>;

    /// Resolved rows where the given user is either pair member,
    /// most recently resolved first (read path for conversation listing)
    fn list_resolved_for_user(&self, user: &UserId) -> AppResult<Vec<CrossLaneConnection>>;

    /// The chooser's resolve, executed as ONE exclusive transaction:
    /// lock, re-observe the row, branch, update, commit. Re-observing
    /// under the lock is what absorbs races against a concurrent resolve
    /// or the expiry sweep.
    fn resolve_exclusive(
        &self,
        pair: &PairKey,
        caller: &UserId,
        chosen: Lane,
        now: DateTime<Utc>,
    ) -> AppResult<ResolutionAttempt>;

    /// Set-based auto-resolution of every pending row whose decision
    /// window has elapsed. Returns the number of rows transitioned.
    fn sweep_expired(&self, now: DateTime<Utc>) -> AppResult<usize>;
}

// ---------------------------------------------------------------------
// SQLite implementation
// ---------------------------------------------------------------------
pub struct SqliteConnectionRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteConnectionRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_connection(row: &Row) -> rusqlite::Result<CrossLaneConnection> {
        let user_low: String = row.get("user_low")?;
        let user_high: String = row.get("user_high")?;
        let chooser_id: String = row.get("chooser_id")?;
        let created_at_raw: String = row.get("created_at")?;
        let expires_at_raw: String = row.get("expires_at")?;
        let chosen_lane_raw: Option<String> = row.get("chosen_lane")?;
        let resolved_at_raw: Option<String> = row.get("resolved_at")?;
        let resolved_by_raw: Option<String> = row.get("resolved_by")?;
        let updated_at_raw: String = row.get("updated_at")?;

        let pair = PairKey::canonical(&UserId::from(user_low), &UserId::from(user_high))
            .map_err(|e| conversion_error(0, e.to_string()))?;

        let chosen_lane = chosen_lane_raw
            .map(|raw| Lane::from_str(&raw))
            .transpose()
            .map_err(|e| conversion_error(5, e.to_string()))?;

        let resolved_by = resolved_by_raw
            .map(|raw| ResolvedBy::from_str(&raw))
            .transpose()
            .map_err(|e| conversion_error(7, e.to_string()))?;

        Ok(CrossLaneConnection {
            pair,
            chooser_id: UserId::from(chooser_id),
            created_at: parse_ts_column(3, &created_at_raw)?,
            expires_at: parse_ts_column(4, &expires_at_raw)?,
            chosen_lane,
            resolved_at: resolved_at_raw
                .map(|raw| parse_ts_column(6, &raw))
                .transpose()?,
            resolved_by,
            updated_at: parse_ts_column(8, &updated_at_raw)?,
        })
    }
}

/// Wrap a parse failure as an explicit conversion error, never a default
fn conversion_error(index: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        index,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            message,
        )),
    )
}

fn parse_ts_column(index: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    from_db_timestamp(raw).map_err(|e| conversion_error(index, e.to_string()))
}

impl ConnectionRepository for SqliteConnectionRepository {
    fn insert_pending(&self, connection: &CrossLaneConnection) -> AppResult<bool> {
        let conn = self.pool.get()?;

        // INSERT OR IGNORE rides on the canonical-pair primary key:
        // simultaneous registrations from both sides converge to one row
        // without error.
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO cross_lane_connections (
                user_low, user_high, chooser_id, created_at, expires_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                connection.pair.user_low().as_str(),
                connection.pair.user_high().as_str(),
                connection.chooser_id.as_str(),
                to_db_timestamp(connection.created_at),
                to_db_timestamp(connection.expires_at),
                to_db_timestamp(connection.updated_at),
            ],
        )?;
        Ok(inserted == 1)
    }

    fn get_by_pair(&self, pair: &PairKey) -> AppResult<Option<CrossLaneConnection>> {
        let conn = self.pool.get()?;
        let result = conn
            .query_row(
                &format!(
                    "SELECT {} FROM cross_lane_connections
                     WHERE user_low = ?1 AND user_high = ?2",
                    CONNECTION_COLUMNS
                ),
                rusqlite::params![pair.user_low().as_str(), pair.user_high().as_str()],
                Self::row_to_connection,
            )
            .optional()?;
        Ok(result)
    }

    fn list_pending_for_chooser(
        &self,
        chooser: &UserId,
        limit: u32,
    ) -> AppResult<Vec<CrossLaneConnection>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM cross_lane_connections
             WHERE chooser_id = ?1 AND resolved_at IS NULL
             ORDER BY created_at DESC
             LIMIT ?2",
            CONNECTION_COLUMNS
        ))?;

        let connections = stmt
            .query_map(
                rusqlite::params![chooser.as_str(), limit],
                Self::row_to_connection,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(connections)
    }

    fn list_resolved_for_user(&self, user: &UserId) -> AppResult<Vec<CrossLaneConnection>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM cross_lane_connections
             WHERE resolved_at IS NOT NULL AND (user_low = ?1 OR user_high = ?1)
             ORDER BY resolved_at DESC",
            CONNECTION_COLUMNS
        ))?;

        let connections = stmt
            .query_map(rusqlite::params![user.as_str()], Self::row_to_connection)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(connections)
    }

    fn resolve_exclusive(
        &self,
        pair: &PairKey,
        caller: &UserId,
        chosen: Lane,
        now: DateTime<Utc>,
    ) -> AppResult<ResolutionAttempt> {
        let mut conn = self.pool.get()?;

        // BEGIN IMMEDIATE takes the write lock up front, so a concurrent
        // resolve or sweep cannot commit between our read and our update.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing = tx
            .query_row(
                &format!(
                    "SELECT {} FROM cross_lane_connections
                     WHERE user_low = ?1 AND user_high = ?2",
                    CONNECTION_COLUMNS
                ),
                rusqlite::params![pair.user_low().as_str(), pair.user_high().as_str()],
                Self::row_to_connection,
            )
            .optional()?;

        let attempt = match existing {
            None => ResolutionAttempt::NotFound,
            Some(connection) => {
                if let Some(lane) = connection.chosen_lane {
                    // Re-observed under the lock: a concurrent transaction
                    // won the race. Idempotent success, not an error.
                    ResolutionAttempt::AlreadyResolved(lane)
                } else if &connection.chooser_id != caller {
                    ResolutionAttempt::NotChooser
                } else {
                    let updated = tx.execute(
                        "UPDATE cross_lane_connections
                         SET chosen_lane = ?1, resolved_at = ?2,
                             resolved_by = ?3, updated_at = ?2
                         WHERE user_low = ?4 AND user_high = ?5
                           AND resolved_at IS NULL",
                        rusqlite::params![
                            chosen.as_str(),
                            to_db_timestamp(now),
                            ResolvedBy::Chooser.as_str(),
                            pair.user_low().as_str(),
                            pair.user_high().as_str(),
                        ],
                    )?;
                    if updated != 1 {
                        return Err(AppError::Other(format!(
                            "Resolve updated {} rows under an exclusive lock",
                            updated
                        )));
                    }
                    ResolutionAttempt::Resolved(chosen)
                }
            }
        };

        tx.commit()?;
        Ok(attempt)
    }

    fn sweep_expired(&self, now: DateTime<Utc>) -> AppResult<usize> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        // Set-based update: the default outcome and actor are uniform, no
        // per-row branching needed. The `resolved_at IS NULL` predicate
        // excludes rows a concurrent resolve already committed.
        let transitioned = tx.execute(
            "UPDATE cross_lane_connections
             SET chosen_lane = ?1, resolved_at = ?2, resolved_by = ?3, updated_at = ?2
             WHERE resolved_at IS NULL AND expires_at <= ?2",
            rusqlite::params![
                Lane::DEFAULT_ON_EXPIRY.as_str(),
                to_db_timestamp(now),
                ResolvedBy::Auto.as_str(),
            ],
        )?;

        tx.commit()?;
        Ok(transitioned)
    }
}
