//! In-memory repository doubles for protocol tests
use crate::db::{LinkingStateRepo, OtpRequestRepo, RefreshTokenRepo, UserDirectory};
use crate::error::Result;
use crate::models::{LinkingStateRecord, OtpRequestRecord, RefreshTokenRecord, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryUserDirectory {
    users: Vec<User>,
}

impl MemoryUserDirectory {
    pub fn new(users: Vec<User>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.iter().find(|u| u.id == id).cloned())
    }
}

#[derive(Default)]
pub struct MemoryRefreshTokenRepo {
    rows: Mutex<Vec<RefreshTokenRecord>>,
}

impl MemoryRefreshTokenRepo {
    pub fn rows(&self) -> Vec<RefreshTokenRecord> {
        self.rows.lock().unwrap().clone()
    }

    /// Seed a row directly, e.g. an already-expired one.
    pub fn push(&self, record: RefreshTokenRecord) {
        self.rows.lock().unwrap().push(record);
    }
}

#[async_trait]
impl RefreshTokenRepo for MemoryRefreshTokenRepo {
    async fn insert(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshTokenRecord> {
        let record = RefreshTokenRecord {
            id: Uuid::new_v4(),
            user_id,
            token_hash: token_hash.to_string(),
            expires_at,
            is_revoked: false,
            last_used_at: None,
            created_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn all_for_user(&self, user_id: Uuid) -> Result<Vec<RefreshTokenRecord>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn mark_revoked(&self, id: Uuid) -> Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|r| r.id == id && !r.is_revoked) {
            Some(row) => {
                row.is_revoked = true;
                row.last_used_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn touch_last_used(&self, id: Uuid) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|r| r.id == id) {
            row.last_used_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn delete_swept(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| !(r.is_revoked && r.expires_at < now));
        Ok((before - rows.len()) as u64)
    }
}

#[derive(Default)]
pub struct MemoryOtpRequestRepo {
    rows: Mutex<Vec<OtpRequestRecord>>,
}

impl MemoryOtpRequestRepo {
    pub fn rows(&self) -> Vec<OtpRequestRecord> {
        self.rows.lock().unwrap().clone()
    }

    pub fn push(&self, record: OtpRequestRecord) {
        self.rows.lock().unwrap().push(record);
    }
}

#[async_trait]
impl OtpRequestRepo for MemoryOtpRequestRepo {
    async fn insert(
        &self,
        user_id: Uuid,
        code_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<OtpRequestRecord> {
        let record = OtpRequestRecord {
            id: Uuid::new_v4(),
            user_id,
            code_hash: code_hash.to_string(),
            expires_at,
            consumed: false,
            created_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn latest_for_user(&self, user_id: Uuid) -> Result<Option<OtpRequestRecord>> {
        // Insertion order stands in for created_at ordering.
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|r| r.user_id == user_id)
            .cloned())
    }

    async fn mark_consumed(&self, id: Uuid) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|r| r.id == id) {
            row.consumed = true;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryLinkingStateRepo {
    rows: Mutex<Vec<LinkingStateRecord>>,
}

#[async_trait]
impl LinkingStateRepo for MemoryLinkingStateRepo {
    async fn insert(&self, state: &str, user_id: Uuid, expires_at: DateTime<Utc>) -> Result<()> {
        self.rows.lock().unwrap().push(LinkingStateRecord {
            state: state.to_string(),
            user_id,
            expires_at,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn take(&self, state: &str) -> Result<Option<LinkingStateRecord>> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter().position(|r| r.state == state) {
            Some(index) => Ok(Some(rows.remove(index))),
            None => Ok(None),
        }
    }
}
