use std::sync::Arc;

use crate::config::AppConfig;
use crate::db;
use crate::users::{memory::InMemoryUserRepository, repo::PgUserRepository, UserRepository};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let users = match config.database_url.as_deref() {
            Some(url) => {
                let pool = db::connect(url, config.db_max_connections).await?;
                db::migrate(&pool).await?;
                Arc::new(PgUserRepository::new(pool)) as Arc<dyn UserRepository>
            }
            None => {
                tracing::warn!("DATABASE_URL not set; users are kept in memory only");
                Arc::new(InMemoryUserRepository::new()) as Arc<dyn UserRepository>
            }
        };

        Ok(Self { users, config })
    }

    pub fn from_parts(users: Arc<dyn UserRepository>, config: Arc<AppConfig>) -> Self {
        Self { users, config }
    }

    /// In-memory state for tests.
    pub fn fake() -> Self {
        Self::from_parts(
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(AppConfig::for_tests()),
        )
    }
}
