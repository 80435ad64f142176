pub mod entity;
pub mod invariants;

pub use entity::{
    CrossLaneConnection, Lane, PairKey, ResolutionAttempt, ResolvedBy, UserId,
    DECISION_WINDOW_HOURS,
};
pub use invariants::validate_connection;
