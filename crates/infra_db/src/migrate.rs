//! Embedded schema migrations

use tracing::info;

use crate::error::DatabaseError;
use crate::pool::DatabasePool;

/// Applies any pending migrations from `migrations/`
pub async fn run_migrations(pool: &DatabasePool) -> Result<(), DatabaseError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}
