use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError, PooledConnection};

use crate::errors::AppError;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;
pub type DbConn = PooledConnection<ConnectionManager<PgConnection>>;

/// Pool with `max_size` connections, keeping a fifth of them (at least one)
/// warm.
pub fn create_pool(database_url: &str, max_size: u32) -> Result<DbPool, PoolError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let min_idle = (max_size / 5).max(1);
    let pool = Pool::builder()
        .max_size(max_size)
        .min_idle(Some(min_idle))
        .test_on_check_out(true)
        .build(manager)?;

    tracing::info!(max_size, min_idle, "database connection pool created");
    Ok(pool)
}

pub fn checkout(pool: &DbPool) -> Result<DbConn, AppError> {
    pool.get().map_err(|e| AppError::internal(format!("database pool exhausted: {e}")))
}
