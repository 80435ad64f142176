// src/services/expiry_sweeper.rs
//
// Expiry Sweeper - Timer-Invoked Auto-Resolution
//
// CRITICAL RULES:
// - Invoked by an EXTERNAL scheduler (recommended every 15 minutes);
//   this crate contains no scheduling loop and keeps no state between runs
// - Never invoked by an end-user action
// - The sweep is one set-based update; concurrent chooser resolves are
//   excluded by the store's pending predicate, no extra coordination

use chrono::Utc;
use std::sync::Arc;

use crate::error::AppResult;
use crate::repositories::ConnectionRepository;

pub struct ExpirySweeper {
    connection_repo: Arc<dyn ConnectionRepository>,
}

impl ExpirySweeper {
    pub fn new(connection_repo: Arc<dyn ConnectionRepository>) -> Self {
        Self { connection_repo }
    }

    /// Auto-resolve every pending connection whose decision window has
    /// elapsed, with the fixed default outcome (pals lane, resolved_by
    /// auto). Returns the number of rows transitioned, for observability.
    pub fn sweep_expired(&self) -> AppResult<usize> {
        let transitioned = self.connection_repo.sweep_expired(Utc::now())?;
        if transitioned > 0 {
            log::info!("Expiry sweep auto-resolved {} connection(s)", transitioned);
        }
        Ok(transitioned)
    }
}
