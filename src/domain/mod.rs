// src/domain/mod.rs
//
// Domain Root - The Single Source of Truth for Domain API
//
// This file declares all domain modules and re-exports their public API.
// All other modules import from `crate::domain::*`

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod connection;
pub mod profile;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Connection Domain
pub use connection::{
    validate_connection, CrossLaneConnection, Lane, PairKey, ResolutionAttempt, ResolvedBy,
    UserId, DECISION_WINDOW_HOURS,
};

// Profile Domain (presentation enrichment)
pub use profile::ProfileCard;

// ============================================================================
// DOMAIN ERROR TYPES
// ============================================================================

use thiserror::Error;

/// Domain-level errors
/// These represent violations of business rules and invariants
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("'{0}' is not a valid lane")]
    InvalidLane(String),

    #[error("A user cannot pair with themselves")]
    SelfReference,

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),
}

/// Domain result type
pub type DomainResult<T> = Result<T, DomainError>;
