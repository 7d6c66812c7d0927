use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use hope_shared::clients::redis::RedisClient;
use hope_shared::errors::AppResult;

use crate::services::phone::PhoneNumber;

/// Proof that `code` was approved by the provider for a phone number at
/// `verified_at`. Bridges verify-otp to the register and reset-password calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingVerification {
    pub code: String,
    pub verified_at: DateTime<Utc>,
}

impl PendingVerification {
    pub fn new(code: impl Into<String>, verified_at: DateTime<Utc>) -> Self {
        Self {
            code: code.into(),
            verified_at,
        }
    }

    /// Same code, verified no more than `window` before `now`.
    pub fn is_valid_for(&self, code: &str, now: DateTime<Utc>, window: Duration) -> bool {
        let age = now - self.verified_at;
        self.code == code && age >= Duration::zero() && age < window
    }
}

/// Keyed store for pending verifications. Entries must expire on their own;
/// callers still check `verified_at` since expiry may lag.
#[async_trait]
pub trait VerificationStore: Send + Sync {
    async fn record(&self, phone: &PhoneNumber, entry: &PendingVerification) -> AppResult<()>;
    async fn get(&self, phone: &PhoneNumber) -> AppResult<Option<PendingVerification>>;
    async fn remove(&self, phone: &PhoneNumber) -> AppResult<()>;
}

/// Redis-backed store, visible to every instance of the service.
pub struct RedisVerificationStore {
    redis: RedisClient,
    ttl_secs: u64,
}

impl RedisVerificationStore {
    pub fn new(redis: RedisClient, ttl_secs: u64) -> Self {
        Self { redis, ttl_secs }
    }

    fn key(phone: &PhoneNumber) -> String {
        format!("otp:verified:{}", phone.digits())
    }
}

#[async_trait]
impl VerificationStore for RedisVerificationStore {
    async fn record(&self, phone: &PhoneNumber, entry: &PendingVerification) -> AppResult<()> {
        self.redis.put_expiring(&Self::key(phone), entry, self.ttl_secs).await
    }

    async fn get(&self, phone: &PhoneNumber) -> AppResult<Option<PendingVerification>> {
        self.redis.get_json(&Self::key(phone)).await
    }

    async fn remove(&self, phone: &PhoneNumber) -> AppResult<()> {
        if !self.redis.remove(&Self::key(phone)).await? {
            tracing::debug!(phone = %phone.masked(), "verification already gone");
        }
        Ok(())
    }
}
