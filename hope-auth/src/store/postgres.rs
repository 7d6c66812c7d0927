use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use uuid::Uuid;

use hope_shared::clients::db::{checkout, DbPool};
use hope_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{NewPermission, NewUser, PermissionRow, User};
use crate::schema::{permissions, users};
use crate::store::UserStore;

pub struct PgUserStore {
    db: DbPool,
}

impl PgUserStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_phone(&self, phone_number: &str) -> AppResult<Option<User>> {
        let mut conn = checkout(&self.db)?;
        let user = users::table
            .filter(users::phone_number.eq(phone_number))
            .first::<User>(&mut conn)
            .optional()?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let mut conn = checkout(&self.db)?;
        let user = users::table
            .filter(users::email.eq(email))
            .first::<User>(&mut conn)
            .optional()?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let mut conn = checkout(&self.db)?;
        let user = users::table
            .filter(users::id.eq(id))
            .first::<User>(&mut conn)
            .optional()?;
        Ok(user)
    }

    async fn create_with_permissions(&self, user: NewUser, permission: NewPermission) -> AppResult<User> {
        let mut conn = checkout(&self.db)?;

        let result = conn.transaction::<User, DieselError, _>(|conn| {
            let created: User = diesel::insert_into(users::table)
                .values(&user)
                .get_result(conn)?;

            diesel::insert_into(permissions::table)
                .values(&permission)
                .execute(conn)?;

            Ok(created)
        });

        result.map_err(|e| match e {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                tracing::debug!(constraint = ?info.constraint_name(), "unique violation on register");
                AppError::new(ErrorCode::UserAlreadyExists, "User already exists")
            }
            other => AppError::Database(other),
        })
    }

    async fn record_login(&self, id: Uuid) -> AppResult<()> {
        let mut conn = checkout(&self.db)?;
        let now = Utc::now();
        diesel::update(users::table.filter(users::id.eq(id)))
            .set((users::last_login.eq(Some(now)), users::updated_at.eq(now)))
            .execute(&mut conn)?;
        Ok(())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        let mut conn = checkout(&self.db)?;
        let updated = diesel::update(users::table.filter(users::id.eq(id)))
            .set((
                users::password_hash.eq(password_hash),
                users::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        if updated == 0 {
            return Err(AppError::new(ErrorCode::UserNotFound, "User not found"));
        }
        Ok(())
    }

    async fn permissions_for(&self, user_id: Uuid) -> AppResult<Option<PermissionRow>> {
        let mut conn = checkout(&self.db)?;
        let row = permissions::table
            .filter(permissions::user_id.eq(user_id))
            .first::<PermissionRow>(&mut conn)
            .optional()?;
        Ok(row)
    }

    async fn ping(&self) -> AppResult<()> {
        let mut conn = checkout(&self.db)?;
        diesel::sql_query("SELECT 1").execute(&mut conn)?;
        Ok(())
    }
}
