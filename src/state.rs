use crate::config::AppConfig;
use crate::db;
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = db::connect(&config).await?;
        db::migrate(&db).await?;
        Ok(Self::from_parts(db, config))
    }

    pub fn from_parts(db: SqlitePool, config: Arc<AppConfig>) -> Self {
        Self { db, config }
    }

    /// In-memory database with the schema applied.
    #[cfg(test)]
    pub async fn fake() -> Self {
        use crate::config::SessionConfig;
        use sqlx::sqlite::SqlitePoolOptions;

        // a single connection that never idles out: each in-memory connection is its own database
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool ok");
        db::migrate(&db).await.expect("migrations ok");

        let config = Arc::new(AppConfig {
            database_url: "sqlite::memory:".into(),
            max_connections: 1,
            host: "127.0.0.1".into(),
            port: 0,
            session: SessionConfig {
                secure_cookie: false,
                max_age_hours: 24 * 7,
            },
        });

        Self::from_parts(db, config)
    }
}
