// src/repositories/mod.rs
//
// Repository layer
//
// CRITICAL RULES:
// - Repositories are data mappers over the shared store
// - NO event emission
// - NO cross-repository calls
// - Explicit SQL only
// - The ONE exception to "no branching": ConnectionRepository::resolve_exclusive
//   evaluates the resolve branches inside its own transaction, because the
//   read-lock-write sequence must be atomic against the sweeper

pub mod acceptance_repository;
pub mod connection_repository;
pub mod profile_directory;

pub use acceptance_repository::{AcceptanceRepository, SqliteAcceptanceRepository};
pub use connection_repository::{ConnectionRepository, SqliteConnectionRepository};
pub use profile_directory::{ProfileDirectory, SqliteProfileDirectory};

#[cfg(test)]
pub use profile_directory::MockProfileDirectory;
