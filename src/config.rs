//! 应用配置
//!
//! 查找顺序：`config.toml` → `./config/config.toml` → 默认值。
//! 环境变量 `DATABASE_URL` 会覆盖 `database.url`，`SECRET_KEY` 会覆盖
//! `session.secret_key`。

use axum_extra::extract::cookie::Key;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const CONFIG_PATHS: [&str; 2] = ["config.toml", "./config/config.toml"];

/// 应用配置结构
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP 服务配置
    pub http: HttpConfig,
    /// 数据库配置
    pub database: DatabaseConfig,
    /// 日志配置
    pub logging: LoggingConfig,
    /// 会话 cookie 配置
    pub session: SessionConfig,
}

/// HTTP 服务配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// 绑定地址
    pub bind_address: String,
    /// HTTP 服务端口
    pub port: u16,
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// 连接串，例如 `sqlite://users.db` 或 `sqlite::memory:`
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// 获取连接的超时时间（秒）
    pub acquire_timeout_secs: u64,
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别 (trace, debug, info, warn, error)
    pub level: String,
    /// 是否启用控制台输出
    pub console_output: bool,
    /// 日志文件目录，不设置则不写文件
    pub log_dir: Option<PathBuf>,
    /// 日志文件名前缀
    pub file_prefix: String,
}

/// 会话 cookie 配置
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// 加密 cookie 的主密钥，至少 32 字节；不设置则每次启动随机生成
    pub secret_key: Option<String>,
}

impl SessionConfig {
    pub const MIN_KEY_LEN: usize = 32;

    fn check_secret(&self) -> Result<(), ConfigError> {
        match &self.secret_key {
            Some(secret) if secret.len() < Self::MIN_KEY_LEN => {
                Err(ConfigError::Validation(format!(
                    "session.secret_key 至少需要 {} 字节，当前 {} 字节",
                    Self::MIN_KEY_LEN,
                    secret.len()
                )))
            }
            _ => Ok(()),
        }
    }

    /// 由主密钥派生 cookie 密钥
    pub fn cookie_key(&self) -> Result<Key, ConfigError> {
        self.check_secret()?;
        match &self.secret_key {
            Some(secret) => Ok(Key::derive_from(secret.as_bytes())),
            None => {
                warn!("未配置 session.secret_key，使用临时密钥，重启后提示 cookie 失效");
                Ok(Key::generate())
            }
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://users.db".to_string(),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout_secs: 8,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console_output: true,
            log_dir: None,
            file_prefix: "user-crud".to_string(),
        }
    }
}

impl DatabaseConfig {
    /// 内存数据库每个连接都是独立的库，只能用单连接
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }

    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            ..Self::default()
        }
    }
}

impl AppConfig {
    /// 从配置文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::FileRead(e.to_string()))?;

        let config: AppConfig =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        Ok(config)
    }

    /// 用环境变量覆盖
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            if !url.is_empty() {
                self.database.url = url;
            }
        }
        if let Ok(secret) = std::env::var("SECRET_KEY") {
            if !secret.is_empty() {
                self.session.secret_key = Some(secret);
            }
        }
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.bind_address.is_empty() {
            return Err(ConfigError::Validation("绑定地址不能为空".to_string()));
        }
        if self.http.port == 0 {
            return Err(ConfigError::Validation("HTTP端口必须大于0".to_string()));
        }

        if self.database.url.is_empty() {
            return Err(ConfigError::Validation("数据库连接串不能为空".to_string()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Validation("最大连接数必须大于0".to_string()));
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Validation(
                "最小连接数不能大于最大连接数".to_string(),
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "无效的日志级别: {}，有效值: {:?}",
                self.logging.level, valid_levels
            )));
        }

        self.session.check_secret()?;

        Ok(())
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.http.bind_address, self.http.port)
    }
}

/// 已加载的配置及其来源
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AppConfig,
    /// `None` 表示使用默认配置
    pub source: Option<PathBuf>,
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("文件读取错误: {0}")]
    FileRead(String),
    #[error("配置解析错误: {0}")]
    Parse(String),
    #[error("配置验证错误: {0}")]
    Validation(String),
}

/// 从文件或默认值加载配置，应用环境变量覆盖后校验
pub fn load_config() -> Result<LoadedConfig, ConfigError> {
    let source = CONFIG_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists());

    let mut config = match &source {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::default(),
    };
    config.apply_env_overrides();
    config.validate()?;

    Ok(LoadedConfig { config, source })
}
