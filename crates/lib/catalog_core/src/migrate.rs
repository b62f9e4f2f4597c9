//! Schema migrations for the Postgres store.

use sqlx::PgPool;
use tracing::info;

/// Apply the embedded migrations (`catalog_core/migrations/`).
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    let migrator = sqlx::migrate!("./migrations");
    migrator.run(pool).await?;
    info!(count = migrator.iter().count(), "database migrations applied");
    Ok(())
}
