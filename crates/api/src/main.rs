use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use tradeerp_api::app::{build_app, AppServices};
use tradeerp_infra::{
    migrated_catalog, AppConfig, InMemoryNotificationStore, InMemoryTableStore, LogMailer, Migrator,
    PgDatabaseNotificationStore,
};
use tradeerp_notifications::DatabaseNotificationStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tradeerp_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;

    let notification_store: Arc<dyn DatabaseNotificationStore> = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .context("failed to connect to DATABASE_URL")?;
            let applied = Migrator::new(pool.clone()).run().await.context("migrations failed")?;
            tracing::info!(count = applied.len(), "migrations applied");
            Arc::new(PgDatabaseNotificationStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; notifications are kept in memory");
            Arc::new(InMemoryNotificationStore::new())
        }
    };

    let services = AppServices::new(
        Arc::new(InMemoryTableStore::new()),
        Arc::new(migrated_catalog().context("schema catalog")?),
        Arc::new(LogMailer::new(config.mail_from.clone())),
        notification_store,
        config.app_url.clone(),
    );
    let app = build_app(Arc::new(services), config.jwt_secret.clone());

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
