use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::auth::{JwtConfig, JwtError};

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JWT 配置错误: {0}")]
    Jwt(#[from] JwtError),

    /// 事务预算必须 > 0 且小于请求超时，否则 408 可能与已提交的订单同时出现
    #[error(
        "ORDER_TX_BUDGET_MS ({budget_ms}) 必须大于 0 且小于 REQUEST_TIMEOUT_MS ({request_timeout_ms})"
    )]
    InvalidTxBudget { budget_ms: u64, request_timeout_ms: u64 },
}

/// 服务器配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 (数据库、日志) |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | ORDER_TX_BUDGET_MS | 2000 | 单个写事务时间预算(毫秒)，须小于 REQUEST_TIMEOUT_MS |
/// | REQUEST_TIMEOUT_MS | 30000 | 请求超时(毫秒) |
/// | NOTIFY_WEBHOOK_URL | - | 顾客通知 webhook，未设置时只写日志 |
/// | NOTIFY_TIMEOUT_MS | 5000 | webhook 超时(毫秒) |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | - | 日志目录，未设置时输出到 stdout |
/// | JWT_SECRET | - | JWT 密钥，非开发环境必填 (≥32 字符) |
/// | JWT_ISSUER / JWT_AUDIENCE / JWT_EXPIRATION_MINUTES | | JWT 校验参数 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/orders HTTP_PORT=8080 cargo run -p order-server
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 写事务时间预算 (毫秒)
    pub order_tx_budget_ms: u64,
    /// 请求超时时间 (毫秒)
    pub request_timeout_ms: u64,
    /// 顾客通知 webhook
    pub notify_webhook_url: Option<String>,
    /// webhook 超时 (毫秒)
    pub notify_timeout_ms: u64,
    pub log_level: String,
    pub log_dir: Option<String>,
    /// JWT 认证配置
    pub jwt: JwtConfig,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 未设置的变量使用默认值；非开发环境缺少 JWT_SECRET 时报错。
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = env_or("ENVIRONMENT", "development");
        let jwt = JwtConfig::from_env(environment == "development")?;

        Self {
            work_dir: env_or("WORK_DIR", "./data"),
            http_port: env_parse("HTTP_PORT", 3000),
            environment,
            order_tx_budget_ms: env_parse("ORDER_TX_BUDGET_MS", 2000),
            request_timeout_ms: env_parse("REQUEST_TIMEOUT_MS", 30_000),
            notify_webhook_url: std::env::var("NOTIFY_WEBHOOK_URL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            notify_timeout_ms: env_parse("NOTIFY_TIMEOUT_MS", 5000),
            log_level: env_or("LOG_LEVEL", "info"),
            log_dir: std::env::var("LOG_DIR").ok().filter(|s| !s.trim().is_empty()),
            jwt,
        }
        .validate()
    }

    /// 启动前校验：事务预算必须落在请求超时之内
    fn validate(self) -> Result<Self, ConfigError> {
        if self.order_tx_budget_ms == 0 || self.order_tx_budget_ms >= self.request_timeout_ms {
            return Err(ConfigError::InvalidTxBudget {
                budget_ms: self.order_tx_budget_ms,
                request_timeout_ms: self.request_timeout_ms,
            });
        }
        Ok(self)
    }

    /// 配置构建器 (测试常用)
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// redb 数据库文件路径
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir)
            .join("database")
            .join("orders.redb")
    }

    pub fn tx_budget(&self) -> Duration {
        Duration::from_millis(self.order_tx_budget_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_millis(self.notify_timeout_ms)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Builder for [`Config`]; unset fields take the `from_env` defaults
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    work_dir: Option<String>,
    http_port: Option<u16>,
    environment: Option<String>,
    order_tx_budget_ms: Option<u64>,
    request_timeout_ms: Option<u64>,
    notify_webhook_url: Option<String>,
    log_level: Option<String>,
    log_dir: Option<String>,
    jwt_secret: Option<String>,
}

impl ConfigBuilder {
    pub fn work_dir(mut self, work_dir: impl Into<String>) -> Self {
        self.work_dir = Some(work_dir.into());
        self
    }

    pub fn http_port(mut self, port: u16) -> Self {
        self.http_port = Some(port);
        self
    }

    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn order_tx_budget_ms(mut self, ms: u64) -> Self {
        self.order_tx_budget_ms = Some(ms);
        self
    }

    pub fn request_timeout_ms(mut self, ms: u64) -> Self {
        self.request_timeout_ms = Some(ms);
        self
    }

    pub fn notify_webhook_url(mut self, url: impl Into<String>) -> Self {
        self.notify_webhook_url = Some(url.into());
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    pub fn log_dir(mut self, dir: impl Into<String>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.jwt_secret = Some(secret.into());
        self
    }

    /// Build the config; a missing JWT secret is replaced by a random one
    pub fn build(self) -> Result<Config, ConfigError> {
        let secret = match self.jwt_secret {
            Some(secret) => secret,
            None => crate::auth::jwt::generate_secure_jwt_secret()?,
        };

        Config {
            work_dir: self.work_dir.unwrap_or_else(|| "./data".to_string()),
            http_port: self.http_port.unwrap_or(3000),
            environment: self
                .environment
                .unwrap_or_else(|| "development".to_string()),
            order_tx_budget_ms: self.order_tx_budget_ms.unwrap_or(2000),
            request_timeout_ms: self.request_timeout_ms.unwrap_or(30_000),
            notify_webhook_url: self.notify_webhook_url,
            notify_timeout_ms: 5000,
            log_level: self.log_level.unwrap_or_else(|| "info".to_string()),
            log_dir: self.log_dir,
            jwt: JwtConfig::with_secret(secret),
        }
        .validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = Config::builder().build().unwrap();
        assert_eq!(config.http_port, 3000);
        assert_eq!(config.order_tx_budget_ms, 2000);
        assert!(config.is_development());
        assert!(!config.is_production());
        assert!(config.notify_webhook_url.is_none());
        assert_eq!(config.jwt.secret.len(), 64);
        assert_eq!(config.log_level, "info");
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn test_tx_budget_must_fit_inside_request_timeout() {
        let result = Config::builder()
            .order_tx_budget_ms(30_000)
            .request_timeout_ms(30_000)
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidTxBudget {
                budget_ms: 30_000,
                request_timeout_ms: 30_000
            })
        ));

        let result = Config::builder()
            .order_tx_budget_ms(5_000)
            .request_timeout_ms(1_000)
            .build();
        assert!(matches!(result, Err(ConfigError::InvalidTxBudget { .. })));

        let config = Config::builder()
            .order_tx_budget_ms(999)
            .request_timeout_ms(1_000)
            .build()
            .unwrap();
        assert_eq!(config.tx_budget(), Duration::from_millis(999));
    }

    #[test]
    fn test_zero_tx_budget_is_rejected() {
        let result = Config::builder().order_tx_budget_ms(0).build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidTxBudget { budget_ms: 0, .. })
        ));
    }

    #[test]
    fn test_builder_overrides() {
        let config = Config::builder()
            .work_dir("/tmp/orders")
            .http_port(8080)
            .environment("production")
            .order_tx_budget_ms(500)
            .log_level("debug")
            .log_dir("/tmp/orders/logs")
            .jwt_secret("s".repeat(40))
            .build()
            .unwrap();

        assert_eq!(config.http_port, 8080);
        assert!(config.is_production());
        assert_eq!(config.tx_budget(), Duration::from_millis(500));
        assert_eq!(config.jwt.secret, "s".repeat(40));
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_dir.as_deref(), Some("/tmp/orders/logs"));
        assert_eq!(
            config.database_path(),
            PathBuf::from("/tmp/orders/database/orders.redb")
        );
    }
}
