use crate::config::{DatabaseConfig, SessionStoreConfig};
use crate::session::SessionManager;
use crate::session::store::RedisSessionStore;
use rocket::fairing::AdHoc;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

async fn init_pool(db_config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(db_config.max_connections)
        .min_connections(db_config.min_connections)
        .acquire_timeout(Duration::from_secs(db_config.acquire_timeout))
        .idle_timeout(Duration::from_secs(30))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&db_config.url)
        .await?;

    sqlx::migrate!().run(&pool).await?;

    Ok(pool)
}

pub fn stage_db(db_config: DatabaseConfig) -> AdHoc {
    AdHoc::try_on_ignite("Postgres (sqlx)", |rocket| async move {
        match init_pool(&db_config).await {
            Ok(pool) => {
                tracing::info!("Database pool initialized successfully");
                Ok(rocket.manage(pool))
            }
            Err(e) => {
                tracing::error!("Failed to initialize database pool: {}", e);
                Err(rocket)
            }
        }
    })
}

pub fn stage_session_store(config: SessionStoreConfig) -> AdHoc {
    AdHoc::try_on_ignite("Session store (Redis)", |rocket| async move {
        match RedisSessionStore::connect(&config.redis_url).await {
            Ok(store) => {
                tracing::info!("Session store connection established");
                Ok(rocket.manage(SessionManager::new(Arc::new(store))))
            }
            Err(e) => {
                tracing::error!("Failed to connect to the session store: {}", e);
                Err(rocket)
            }
        }
    })
}
