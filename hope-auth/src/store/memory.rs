use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use hope_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{NewPermission, NewUser, PermissionRow, User};
use crate::store::UserStore;

/// Same uniqueness rules as the `users` / `permissions` tables.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
    permissions: Mutex<HashMap<Uuid, PermissionRow>>,
}

impl MemoryUserStore {
    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn set_active(&self, id: Uuid, active: bool) {
        if let Some(user) = self.users.lock().unwrap().get_mut(&id) {
            user.is_active = active;
        }
    }

    pub fn delete(&self, id: Uuid) {
        self.users.lock().unwrap().remove(&id);
        self.permissions.lock().unwrap().remove(&id);
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_phone(&self, phone_number: &str) -> AppResult<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.values().find(|u| u.phone_number == phone_number).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn create_with_permissions(&self, user: NewUser, permission: NewPermission) -> AppResult<User> {
        let mut users = self.users.lock().unwrap();
        let clash = users.values().any(|u| {
            u.id == user.id || u.phone_number == user.phone_number || u.email == user.email
        });
        if clash {
            return Err(AppError::new(ErrorCode::UserAlreadyExists, "User already exists"));
        }

        let now = Utc::now();
        let created = User {
            id: user.id,
            phone_number: user.phone_number,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            is_active: user.is_active,
            last_login: user.last_login,
            created_at: now,
            updated_at: now,
        };
        users.insert(created.id, created.clone());

        self.permissions.lock().unwrap().insert(
            permission.user_id,
            PermissionRow {
                id: Uuid::now_v7(),
                user_id: permission.user_id,
                microphone: permission.microphone,
                camera: permission.camera,
                audio: permission.audio,
                location_name: permission.location_name,
                latitude: permission.latitude,
                longitude: permission.longitude,
                full_address: permission.full_address,
                created_at: now,
                updated_at: now,
            },
        );

        Ok(created)
    }

    async fn record_login(&self, id: Uuid) -> AppResult<()> {
        if let Some(user) = self.users.lock().unwrap().get_mut(&id) {
            user.last_login = Some(Utc::now());
        }
        Ok(())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(&id)
            .ok_or_else(|| AppError::new(ErrorCode::UserNotFound, "User not found"))?;
        user.password_hash = password_hash.to_string();
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn permissions_for(&self, user_id: Uuid) -> AppResult<Option<PermissionRow>> {
        Ok(self.permissions.lock().unwrap().get(&user_id).cloned())
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
