//! Periodic purge of dead refresh token rows
//!
//! Rotation and logout only flip `is_revoked`; the rows stay behind so
//! replay detection can still match them. Once a revoked row is also past
//! its expiry it can never match a token that verifies, so the sweeper
//! deletes it. Live rows are never touched, expired or not: an unrevoked
//! expired row still has the revoke-on-presentation path to go through.
use crate::db::RefreshTokenRepo;
use crate::error::Result;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub struct ExpirySweeper {
    repo: Arc<dyn RefreshTokenRepo>,
    period: Duration,
}

impl ExpirySweeper {
    pub fn new(repo: Arc<dyn RefreshTokenRepo>, period: Duration) -> Self {
        Self { repo, period }
    }

    /// One sweep pass; returns the number of rows removed
    pub async fn run_once(&self) -> Result<u64> {
        let removed = self.repo.delete_swept(Utc::now()).await?;
        if removed > 0 {
            info!(removed, "swept dead refresh token rows");
        } else {
            debug!("sweep pass removed nothing");
        }
        Ok(removed)
    }

    /// Run sweeps forever on the configured period
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.period);
            loop {
                ticker.tick().await;
                if let Err(err) = self.run_once().await {
                    warn!(error = %err, "sweep pass failed; will retry next period");
                }
            }
        })
    }
}
