//! External-provider linking correlator
//!
//! A linking state ties the start of an external identity-provider flow to
//! its callback. States are opaque single-use values: resolution deletes the
//! record in the same step that reads it, so a state can never correlate two
//! callbacks.
use crate::db::LinkingStateRepo;
use crate::error::{AuthError, Result};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

#[derive(Clone)]
pub struct LinkingStateService {
    repo: Arc<dyn LinkingStateRepo>,
    state_ttl: Duration,
}

impl LinkingStateService {
    pub fn new(repo: Arc<dyn LinkingStateRepo>, state_ttl: Duration) -> Self {
        Self { repo, state_ttl }
    }

    /// Mint an opaque state bound to a user, valid for the configured window
    pub async fn create(&self, user_id: Uuid) -> Result<String> {
        let state = Uuid::new_v4().to_string();
        let expires_at = Utc::now() + self.state_ttl;

        self.repo.insert(&state, user_id, expires_at).await?;
        debug!(user_id = %user_id, "linking state created");
        Ok(state)
    }

    /// Resolve a state back to the user who started the flow
    ///
    /// The record is consumed whether or not it is still in its window; an
    /// expired state is rejected after removal rather than left to linger.
    pub async fn resolve(&self, state: &str) -> Result<Uuid> {
        let record = self
            .repo
            .take(state)
            .await?
            .ok_or(AuthError::LinkingStateNotFound)?;

        if record.expires_at < Utc::now() {
            return Err(AuthError::LinkingStateExpired);
        }

        Ok(record.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryLinkingStateRepo;

    fn service(ttl: Duration) -> LinkingStateService {
        LinkingStateService::new(Arc::new(MemoryLinkingStateRepo::default()), ttl)
    }

    #[tokio::test]
    async fn test_state_roundtrip() {
        // Scenario: start a provider flow, resolve its callback.
        let service = service(Duration::minutes(10));
        let user_id = Uuid::new_v4();

        let state = service.create(user_id).await.unwrap();
        let resolved = service.resolve(&state).await.unwrap();
        assert_eq!(resolved, user_id);
    }

    #[tokio::test]
    async fn test_state_is_single_use() {
        let service = service(Duration::minutes(10));
        let state = service.create(Uuid::new_v4()).await.unwrap();

        service.resolve(&state).await.unwrap();
        let second = service.resolve(&state).await;
        assert!(matches!(second, Err(AuthError::LinkingStateNotFound)));
    }

    #[tokio::test]
    async fn test_expired_state_is_rejected() {
        let service = service(Duration::seconds(-1));
        let state = service.create(Uuid::new_v4()).await.unwrap();

        let result = service.resolve(&state).await;
        assert!(matches!(result, Err(AuthError::LinkingStateExpired)));
    }

    #[tokio::test]
    async fn test_unknown_state_is_not_found() {
        let service = service(Duration::minutes(10));
        let result = service.resolve("no-such-state").await;
        assert!(matches!(result, Err(AuthError::LinkingStateNotFound)));
    }

    #[tokio::test]
    async fn test_states_are_unique_per_flow() {
        let service = service(Duration::minutes(10));
        let user_id = Uuid::new_v4();

        let first = service.create(user_id).await.unwrap();
        let second = service.create(user_id).await.unwrap();
        assert_ne!(first, second);

        // Both resolve independently.
        assert_eq!(service.resolve(&first).await.unwrap(), user_id);
        assert_eq!(service.resolve(&second).await.unwrap(), user_id);
    }
}
