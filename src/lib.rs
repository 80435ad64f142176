// src/lib.rs
// PawMatch - Cross-lane match resolution engine
//
// Detects mutual cross-lane acceptance between two users, creates exactly
// one pending connection per unordered pair, lets the designated chooser
// pick the final relationship lane, and auto-resolves stale pairs after
// the decision window elapses.
//
// Architecture:
// - Domain-centric: entities and invariants live in `domain`
// - Store-backed: one shared SQLite store, pooled, no in-process caching
// - Explicit: typed results for every failure a caller must handle
// - Narrow collaborators: swipe ingestion, profile directory, conversation
//   listing and the scheduler all connect through small trait seams

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod db;
pub mod domain;
pub mod error;
pub mod repositories;
pub mod services;

// ============================================================================
// PUBLIC API - Domain
// ============================================================================

pub use domain::{
    validate_connection,
    CrossLaneConnection,
    DomainError,
    DomainResult,
    Lane,
    PairKey,
    ProfileCard,
    ResolutionAttempt,
    ResolvedBy,
    UserId,
    DECISION_WINDOW_HOURS,
};

// ============================================================================
// PUBLIC API - Error Types
// ============================================================================

pub use error::{AppError, AppResult};

// ============================================================================
// PUBLIC API - Database
// ============================================================================

pub use db::{create_connection_pool, create_pool_at, initialize_database, ConnectionPool};

// ============================================================================
// PUBLIC API - Repositories
// ============================================================================

pub use repositories::{
    AcceptanceRepository,
    ConnectionRepository,
    ProfileDirectory,
    SqliteAcceptanceRepository,
    SqliteConnectionRepository,
    SqliteProfileDirectory,
};

// ============================================================================
// PUBLIC API - Services
// ============================================================================

pub use services::{
    ConnectionService,
    ExpirySweeper,
    PendingDecision,
    RegisterOutcome,
    Resolution,
    ResolveError,
};
