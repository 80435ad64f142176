// src/services/mod.rs
//
// Services Module - Orchestration Layer

pub mod connection_service;
pub mod expiry_sweeper;


// Re-export all services and their types
pub use connection_service::{
    ConnectionService, PendingDecision, RegisterOutcome, Resolution, ResolveError,
};

pub use expiry_sweeper::ExpirySweeper;
