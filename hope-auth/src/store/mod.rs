use async_trait::async_trait;
use uuid::Uuid;

use hope_shared::errors::AppResult;

use crate::models::{NewPermission, NewUser, PermissionRow, User};

mod postgres;
#[cfg(test)]
pub mod memory;

pub use postgres::PgUserStore;

/// Persistence for user accounts and their permission records. Phone number
/// and email are unique across users; each user has at most one permission
/// record.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_phone(&self, phone_number: &str) -> AppResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Insert the user and its permission record together; neither is kept if
    /// either insert fails. A uniqueness clash is `UserAlreadyExists`.
    async fn create_with_permissions(&self, user: NewUser, permission: NewPermission) -> AppResult<User>;

    async fn record_login(&self, id: Uuid) -> AppResult<()>;

    async fn update_password(&self, id: Uuid, password_hash: &str) -> AppResult<()>;

    async fn permissions_for(&self, user_id: Uuid) -> AppResult<Option<PermissionRow>>;

    async fn ping(&self) -> AppResult<()>;
}
