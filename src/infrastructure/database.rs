//! 数据库基础设施

use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    Error,
};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::config::DatabaseConfig;

const CREATE_USERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        first_name VARCHAR(50) NOT NULL,
        last_name VARCHAR(50) NOT NULL,
        email VARCHAR(120) NOT NULL UNIQUE,
        age INTEGER NOT NULL CHECK (age >= 1 AND age <= 150),
        city VARCHAR(50) NOT NULL,
        created_at TIMESTAMP NOT NULL
    )
"#;

#[derive(Clone)]
pub struct DatabaseManager {
    pool: SqlitePool,
}

impl DatabaseManager {
    pub async fn new(config: &DatabaseConfig) -> Result<Self, Error> {
        let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);

        let pool_options = if config.is_in_memory() {
            // 连接一旦关闭，内存库就没了
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
                .max_connections(config.max_connections)
                .min_connections(config.min_connections)
                .idle_timeout(Duration::from_secs(600))
        };

        let pool = pool_options
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_with(options)
            .await?;

        info!(
            in_memory = config.is_in_memory(),
            max_connections = config.max_connections,
            "数据库连接池已建立"
        );

        Ok(Self { pool })
    }

    /// 测试用的独立内存库，已建表
    pub async fn in_memory() -> Result<Self, Error> {
        let manager = Self::new(&DatabaseConfig::in_memory()).await?;
        manager.init_schema().await?;
        Ok(manager)
    }

    /// 创建数据库表
    pub async fn init_schema(&self) -> Result<(), Error> {
        sqlx::query(CREATE_USERS_TABLE).execute(&self.pool).await?;
        info!("数据库表已就绪");
        Ok(())
    }

    pub fn get_pool(&self) -> &SqlitePool {
        &self.pool
    }
}
