use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::{DomainError, DomainResult};

/// Decision window granted to the chooser before auto-resolution kicks in
pub const DECISION_WINDOW_HOURS: i64 = 72;

/// Opaque user identifier, assigned by the backend.
///
/// The engine never interprets the contents; it only needs a total order
/// over identifiers (lexicographic) to canonicalize pairs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Generate a fresh identifier (tests, fixtures)
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl From<String> for UserId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for UserId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One of the two mutually exclusive matching contexts.
///
/// Product-named: `Pals` (friendship lane) and `Match` (dating lane).
/// The engine is hard-coded to exactly two lanes; canonical-pair and
/// chooser-assignment logic both depend on that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lane {
    Pals,
    Match,
}

impl Lane {
    /// Outcome applied by the expiry sweeper when the chooser never decides
    pub const DEFAULT_ON_EXPIRY: Lane = Lane::Pals;

    pub fn opposite(self) -> Lane {
        match self {
            Lane::Pals => Lane::Match,
            Lane::Match => Lane::Pals,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Lane::Pals => "pals",
            Lane::Match => "match",
        }
    }
}

impl FromStr for Lane {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        match s {
            "pals" => Ok(Lane::Pals),
            "match" => Ok(Lane::Match),
            other => Err(DomainError::InvalidLane(other.to_string())),
        }
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Records how a connection reached its resolved state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedBy {
    Chooser,
    Auto,
}

impl ResolvedBy {
    pub fn as_str(self) -> &'static str {
        match self {
            ResolvedBy::Chooser => "chooser",
            ResolvedBy::Auto => "auto",
        }
    }
}

impl FromStr for ResolvedBy {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        match s {
            "chooser" => Ok(ResolvedBy::Chooser),
            "auto" => Ok(ResolvedBy::Auto),
            other => Err(DomainError::InvariantViolation(format!(
                "'{}' is not a valid resolver actor",
                other
            ))),
        }
    }
}

/// Canonical unordered pair of users.
///
/// Construction sorts the two identifiers so that `user_low < user_high`
/// always holds; registering (A, B) and (B, A) yields the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairKey {
    user_low: UserId,
    user_high: UserId,
}

impl PairKey {
    /// Build the canonical key for two distinct users.
    /// A self-pair is a domain error.
    pub fn canonical(a: &UserId, b: &UserId) -> DomainResult<Self> {
        if a == b {
            return Err(DomainError::SelfReference);
        }
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        Ok(Self {
            user_low: low.clone(),
            user_high: high.clone(),
        })
    }

    pub fn user_low(&self) -> &UserId {
        &self.user_low
    }

    pub fn user_high(&self) -> &UserId {
        &self.user_high
    }

    pub fn contains(&self, user: &UserId) -> bool {
        &self.user_low == user || &self.user_high == user
    }

    /// The pair member that is not `user`, if `user` is a member at all
    pub fn other(&self, user: &UserId) -> Option<&UserId> {
        if user == &self.user_low {
            Some(&self.user_high)
        } else if user == &self.user_high {
            Some(&self.user_low)
        } else {
            None
        }
    }
}

/// The sole entity of the resolution engine.
///
/// One row exists per unordered pair of users with mutual cross-lane
/// acceptance. Created pending; mutated exactly once (chooser decision or
/// expiry sweep); immutable thereafter; never deleted by this engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossLaneConnection {
    /// Canonical pair, `user_low < user_high`
    pub pair: PairKey,

    /// The pair member entitled to pick the final lane.
    /// Always the user who accepted in the pals lane; fixed at creation.
    pub chooser_id: UserId,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Creation timestamp plus the decision window
    pub expires_at: DateTime<Utc>,

    /// Final lane; set only on resolution
    pub chosen_lane: Option<Lane>,

    /// Resolution timestamp; a row with `None` here is pending
    pub resolved_at: Option<DateTime<Utc>>,

    /// How resolution happened; set together with `chosen_lane`
    pub resolved_by: Option<ResolvedBy>,

    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
}

impl CrossLaneConnection {
    /// Create a new pending connection.
    /// The chooser MUST be a pair member (checked here).
    pub fn new_pending(pair: PairKey, chooser_id: UserId, now: DateTime<Utc>) -> DomainResult<Self> {
        if !pair.contains(&chooser_id) {
            return Err(DomainError::InvariantViolation(format!(
                "Chooser '{}' is not a member of the pair",
                chooser_id
            )));
        }
        Ok(Self {
            pair,
            chooser_id,
            created_at: now,
            expires_at: now + Duration::hours(DECISION_WINDOW_HOURS),
            chosen_lane: None,
            resolved_at: None,
            resolved_by: None,
            updated_at: now,
        })
    }

    pub fn is_pending(&self) -> bool {
        self.resolved_at.is_none()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved_at.is_some()
    }

    /// Whether the decision window has elapsed (meaningful for pending rows)
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Apply the one permitted mutation: pending -> resolved.
    /// A resolved connection is immutable; re-resolution is a domain error.
    pub fn resolve(
        &mut self,
        lane: Lane,
        by: ResolvedBy,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if self.is_resolved() {
            return Err(DomainError::InvalidStateTransition(
                "Connection is already resolved".to_string(),
            ));
        }
        self.chosen_lane = Some(lane);
        self.resolved_at = Some(now);
        self.resolved_by = Some(by);
        self.updated_at = now;
        Ok(())
    }
}

/// Outcome of one locked resolve attempt against the store.
///
/// Produced inside the repository's exclusive transaction, after the row
/// state has been re-observed under the lock; the service layer maps it to
/// the caller-facing result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionAttempt {
    /// No row exists for the pair
    NotFound,
    /// Row was already resolved; carries the committed lane
    AlreadyResolved(Lane),
    /// Caller is a pair member without resolution rights
    NotChooser,
    /// This attempt resolved the row
    Resolved(Lane),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_key_is_canonical_in_both_orders() {
        let a = UserId::from("user-aaa");
        let b = UserId::from("user-zzz");

        let key_ab = PairKey::canonical(&a, &b).unwrap();
        let key_ba = PairKey::canonical(&b, &a).unwrap();

        assert_eq!(key_ab, key_ba);
        assert_eq!(key_ab.user_low(), &a);
        assert_eq!(key_ab.user_high(), &b);
        assert!(key_ab.user_low() < key_ab.user_high());
    }

    #[test]
    fn test_self_pair_is_rejected() {
        let a = UserId::from("user-aaa");
        let result = PairKey::canonical(&a, &a);
        assert!(matches!(result, Err(DomainError::SelfReference)));
    }

    #[test]
    fn test_pair_other_member() {
        let a = UserId::from("alpha");
        let b = UserId::from("beta");
        let key = PairKey::canonical(&a, &b).unwrap();

        assert_eq!(key.other(&a), Some(&b));
        assert_eq!(key.other(&b), Some(&a));
        assert_eq!(key.other(&UserId::from("gamma")), None);
    }

    #[test]
    fn test_random_identifiers_still_canonicalize() {
        let a = UserId::random();
        let b = UserId::random();

        let k1 = PairKey::canonical(&a, &b).unwrap();
        let k2 = PairKey::canonical(&b, &a).unwrap();
        assert_eq!(k1, k2);
        assert!(k1.user_low() < k1.user_high());
    }

    #[test]
    fn test_lane_opposite() {
        assert_eq!(Lane::Pals.opposite(), Lane::Match);
        assert_eq!(Lane::Match.opposite(), Lane::Pals);
    }

    #[test]
    fn test_lane_parse_round_trip() {
        assert_eq!("pals".parse::<Lane>().unwrap(), Lane::Pals);
        assert_eq!("match".parse::<Lane>().unwrap(), Lane::Match);
        assert!(matches!(
            "romance".parse::<Lane>(),
            Err(DomainError::InvalidLane(_))
        ));
    }

    #[test]
    fn test_new_pending_sets_decision_window() {
        let a = UserId::from("alpha");
        let b = UserId::from("beta");
        let key = PairKey::canonical(&a, &b).unwrap();
        let now = Utc::now();

        let conn = CrossLaneConnection::new_pending(key, a.clone(), now).unwrap();

        assert!(conn.is_pending());
        assert_eq!(conn.expires_at - conn.created_at, Duration::hours(72));
        assert!(!conn.is_expired(now));
        assert!(conn.is_expired(now + Duration::hours(73)));
    }

    #[test]
    fn test_new_pending_rejects_outside_chooser() {
        let a = UserId::from("alpha");
        let b = UserId::from("beta");
        let key = PairKey::canonical(&a, &b).unwrap();

        let result = CrossLaneConnection::new_pending(key, UserId::from("gamma"), Utc::now());
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_is_single_shot() {
        let a = UserId::from("alpha");
        let b = UserId::from("beta");
        let key = PairKey::canonical(&a, &b).unwrap();
        let now = Utc::now();
        let mut conn = CrossLaneConnection::new_pending(key, a, now).unwrap();

        conn.resolve(Lane::Match, ResolvedBy::Chooser, now).unwrap();
        assert!(conn.is_resolved());
        assert_eq!(conn.chosen_lane, Some(Lane::Match));
        assert_eq!(conn.resolved_by, Some(ResolvedBy::Chooser));

        // Second resolution must be refused, state untouched
        let second = conn.resolve(Lane::Pals, ResolvedBy::Auto, Utc::now());
        assert!(second.is_err());
        assert_eq!(conn.chosen_lane, Some(Lane::Match));
        assert_eq!(conn.resolved_by, Some(ResolvedBy::Chooser));
    }
}
