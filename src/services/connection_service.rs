// src/services/connection_service.rs
//
// Connection Service - Cross-Lane Match Resolution
//
// Detects mutual cross-lane acceptance, serves the chooser's inbox and
// executes the chooser's decision.
//
// CRITICAL RULES:
// - The registrar is a fire-and-forget hook: invalid input and conflicts
//   are silent no-ops, it must never block the swipe-ingestion path
// - The resolver surfaces a typed failure per taxonomy entry; callers
//   handle each kind explicitly
// - Profile enrichment happens AFTER the store query returns, outside
//   any transaction; a failed lookup omits the row, never the call
// - No notifications, no compatibility scoring, no caller authentication

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::connection::{
    CrossLaneConnection, Lane, PairKey, ResolutionAttempt, UserId,
};
use crate::domain::validate_connection;
use crate::error::{AppError, AppResult};
use crate::repositories::{AcceptanceRepository, ConnectionRepository, ProfileDirectory};

/// Outcome of one registrar invocation (observability only; the swipe
/// path ignores it)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// A new pending connection was created
    Created,
    /// The pair already had a row (pending or resolved)
    AlreadyRegistered,
    /// The candidate has not accepted back in the opposite lane
    NoMutualAccept,
    /// Invalid input, silently dropped
    Skipped,
}

/// One chooser-inbox entry, enriched for presentation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingDecision {
    pub other_user: UserId,
    pub pending_since: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub display_name: String,
    pub dog_name: String,
    pub photo_ref: Option<String>,
}

/// Successful resolution result. `already_resolved` marks the idempotent
/// path: a retry or double-tap observed an earlier committed decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub chosen_lane: Lane,
    pub already_resolved: bool,
}

/// Resolver failure taxonomy. None of these are process-fatal; a failed
/// resolve leaves the row pending for a retry or the expiry sweep.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("No calling identity")]
    NotAuthenticated,

    #[error("Target user is missing or self-referential")]
    InvalidTarget,

    #[error("Chosen lane is not a valid lane")]
    InvalidChoice,

    #[error("No connection exists for this pair")]
    NotFound,

    #[error("Caller is not the chooser for this pair")]
    NotChooser,

    #[error(transparent)]
    Storage(#[from] AppError),
}

pub struct ConnectionService {
    connection_repo: Arc<dyn ConnectionRepository>,
    acceptance_repo: Arc<dyn AcceptanceRepository>,
    profile_directory: Arc<dyn ProfileDirectory>,
}

impl ConnectionService {
    pub fn new(
        connection_repo: Arc<dyn ConnectionRepository>,
        acceptance_repo: Arc<dyn AcceptanceRepository>,
        profile_directory: Arc<dyn ProfileDirectory>,
    ) -> Self {
        Self {
            connection_repo,
            acceptance_repo,
            profile_directory,
        }
    }

    /// Pending-Connection Registrar.
    ///
    /// Called by swipe ingestion immediately after it durably records that
    /// `acting` accepted `candidate` in `lane`. If the candidate already
    /// accepted back in the opposite lane, creates the pair's pending
    /// connection exactly once. The chooser is whichever user accepted in
    /// the pals lane.
    ///
    /// Store failures propagate; everything else is a quiet outcome.
    pub fn register_if_mutual(
        &self,
        acting: &UserId,
        candidate: &UserId,
        lane: Lane,
    ) -> AppResult<RegisterOutcome> {
        if acting.is_empty() || candidate.is_empty() || acting == candidate {
            log::debug!(
                "Registrar skipped invalid input: acting='{}' candidate='{}'",
                acting,
                candidate
            );
            return Ok(RegisterOutcome::Skipped);
        }

        // Reciprocity check: did the candidate accept us in the OTHER lane?
        if !self
            .acceptance_repo
            .has_accepted(candidate, acting, lane.opposite())?
        {
            return Ok(RegisterOutcome::NoMutualAccept);
        }

        let Ok(pair) = PairKey::canonical(acting, candidate) else {
            return Ok(RegisterOutcome::Skipped);
        };

        let chooser = if lane == Lane::Pals {
            acting.clone()
        } else {
            candidate.clone()
        };

        let connection = CrossLaneConnection::new_pending(pair, chooser, Utc::now())
            .map_err(AppError::Domain)?;
        validate_connection(&connection).map_err(AppError::Domain)?;

        if self.connection_repo.insert_pending(&connection)? {
            log::debug!(
                "Pending connection created for pair ({}, {})",
                connection.pair.user_low(),
                connection.pair.user_high()
            );
            Ok(RegisterOutcome::Created)
        } else {
            // Lost the race against the other side's registrar call, or a
            // repeat invocation. Converged on one row either way.
            Ok(RegisterOutcome::AlreadyRegistered)
        }
    }

    /// Chooser Inbox Reader.
    ///
    /// Up to `limit` pending connections where `caller` is the designated
    /// decision-maker, newest first, enriched with presentation data. A
    /// row whose profile lookup fails is omitted, not fatal.
    pub fn list_pending_for_chooser(
        &self,
        caller: &UserId,
        limit: u32,
    ) -> AppResult<Vec<PendingDecision>> {
        if caller.is_empty() {
            return Ok(Vec::new());
        }

        let rows = self
            .connection_repo
            .list_pending_for_chooser(caller, limit)?;

        let mut decisions = Vec::with_capacity(rows.len());
        for row in rows {
            // chooser_id == caller, so the pair always has an "other" here
            let Some(other) = row.pair.other(caller) else {
                continue;
            };
            match self.profile_directory.lookup(other) {
                Ok(card) => decisions.push(PendingDecision {
                    other_user: other.clone(),
                    pending_since: row.created_at,
                    expires_at: row.expires_at,
                    display_name: card.display_name,
                    dog_name: card.dog_name,
                    photo_ref: card.photo_ref,
                }),
                Err(e) => {
                    log::warn!("Omitting pending decision for '{}': {}", other, e);
                }
            }
        }
        Ok(decisions)
    }

    /// Resolver: the chooser's explicit decision.
    ///
    /// Validation happens before the store is touched; the branch logic
    /// itself runs inside the repository's exclusive transaction so a
    /// concurrent resolve or sweep cannot interleave.
    pub fn resolve(
        &self,
        caller: &UserId,
        other: &UserId,
        chosen: Lane,
    ) -> Result<Resolution, ResolveError> {
        if caller.is_empty() {
            return Err(ResolveError::NotAuthenticated);
        }
        if other.is_empty() || caller == other {
            return Err(ResolveError::InvalidTarget);
        }
        let pair = PairKey::canonical(caller, other).map_err(|_| ResolveError::InvalidTarget)?;

        let attempt = self
            .connection_repo
            .resolve_exclusive(&pair, caller, chosen, Utc::now())
            .map_err(ResolveError::Storage)?;

        match attempt {
            ResolutionAttempt::NotFound => Err(ResolveError::NotFound),
            ResolutionAttempt::NotChooser => Err(ResolveError::NotChooser),
            ResolutionAttempt::AlreadyResolved(lane) => Ok(Resolution {
                chosen_lane: lane,
                already_resolved: true,
            }),
            ResolutionAttempt::Resolved(lane) => {
                log::info!(
                    "Pair ({}, {}) resolved to '{}' by chooser",
                    pair.user_low(),
                    pair.user_high(),
                    lane
                );
                Ok(Resolution {
                    chosen_lane: lane,
                    already_resolved: false,
                })
            }
        }
    }

    /// Boundary shim for hosts that carry the lane as text (UI payloads).
    /// An out-of-range lane value fails with `InvalidChoice`.
    pub fn resolve_with_lane_name(
        &self,
        caller: &UserId,
        other: &UserId,
        lane_name: &str,
    ) -> Result<Resolution, ResolveError> {
        let chosen = Lane::from_str(lane_name).map_err(|_| ResolveError::InvalidChoice)?;
        self.resolve(caller, other, chosen)
    }

    /// Read path for the external conversation listing: every resolved
    /// connection the user is a member of, chooser or not. This is the
    /// only way resolved state reaches the non-chooser.
    pub fn list_resolved_for_user(&self, user: &UserId) -> AppResult<Vec<CrossLaneConnection>> {
        if user.is_empty() {
            return Ok(Vec::new());
        }
        self.connection_repo.list_resolved_for_user(user)
    }
}
