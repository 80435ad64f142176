use super::entity::CrossLaneConnection;
use crate::domain::{DomainError, DomainResult};

/// Validates all CrossLaneConnection invariants
pub fn validate_connection(connection: &CrossLaneConnection) -> DomainResult<()> {
    validate_chooser_membership(connection)?;
    validate_resolution_fields(connection)?;
    validate_window(connection)?;
    Ok(())
}

/// The chooser MUST be one of the two pair members
fn validate_chooser_membership(connection: &CrossLaneConnection) -> DomainResult<()> {
    if !connection.pair.contains(&connection.chooser_id) {
        return Err(DomainError::InvariantViolation(format!(
            "Chooser '{}' is not a member of the pair",
            connection.chooser_id
        )));
    }
    Ok(())
}

/// `chosen_lane`, `resolved_at` and `resolved_by` are either all unset
/// (pending) or all set (resolved) — never independently
fn validate_resolution_fields(connection: &CrossLaneConnection) -> DomainResult<()> {
    let set = [
        connection.chosen_lane.is_some(),
        connection.resolved_at.is_some(),
        connection.resolved_by.is_some(),
    ];
    if set.iter().any(|s| *s != set[0]) {
        return Err(DomainError::InvariantViolation(
            "Resolution fields must be set together or not at all".to_string(),
        ));
    }
    Ok(())
}

/// The decision window always ends after creation
fn validate_window(connection: &CrossLaneConnection) -> DomainResult<()> {
    if connection.expires_at <= connection.created_at {
        return Err(DomainError::InvariantViolation(
            "Decision window must end after creation".to_string(),
        ));
    }
    Ok(())
}

/// Critical CrossLaneConnection Invariants:
///
/// 1. Exactly one row per unordered pair (canonical primary key)
/// 2. user_low < user_high (enforced by PairKey construction + SQL CHECK)
/// 3. chooser_id is a pair member and never changes
/// 4. Pending means resolved_at unset; resolved rows are immutable
/// 5. chosen_lane / resolved_at / resolved_by are set atomically
/// 6. Rows are never deleted by this engine

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::connection::{Lane, PairKey, ResolvedBy, UserId};
    use chrono::Utc;

    fn pending_connection() -> CrossLaneConnection {
        let a = UserId::from("alpha");
        let b = UserId::from("beta");
        let pair = PairKey::canonical(&a, &b).unwrap();
        CrossLaneConnection::new_pending(pair, a, Utc::now()).unwrap()
    }

    #[test]
    fn test_valid_pending_connection() {
        let connection = pending_connection();
        assert!(validate_connection(&connection).is_ok());
    }

    #[test]
    fn test_valid_resolved_connection() {
        let mut connection = pending_connection();
        connection
            .resolve(Lane::Match, ResolvedBy::Chooser, Utc::now())
            .unwrap();
        assert!(validate_connection(&connection).is_ok());
    }

    #[test]
    fn test_foreign_chooser_fails() {
        let mut connection = pending_connection();
        connection.chooser_id = UserId::from("gamma");
        assert!(validate_connection(&connection).is_err());
    }

    #[test]
    fn test_partial_resolution_fields_fail() {
        let mut connection = pending_connection();
        connection.chosen_lane = Some(Lane::Pals);
        // resolved_at / resolved_by left unset
        assert!(validate_connection(&connection).is_err());

        let mut connection = pending_connection();
        connection.resolved_at = Some(Utc::now());
        assert!(validate_connection(&connection).is_err());
    }

    #[test]
    fn test_inverted_window_fails() {
        let mut connection = pending_connection();
        connection.expires_at = connection.created_at;
        assert!(validate_connection(&connection).is_err());
    }
}
