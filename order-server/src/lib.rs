//! Order Server - 电商订单与库存服务
//!
//! # 架构概述
//!
//! - **订单** (`orders`): 下单事务、状态机、删除回补，redb 存储
//! - **库存** (`inventory`): 预留 / 释放 / 补货，与订单写入同一事务
//! - **骑手** (`rider`): 骑手令牌、二维码载荷、扫码改状态
//! - **通知** (`notify`): 订单确认 / 送达后异步通知顾客
//! - **认证** (`auth`): 外部身份服务签发的 JWT 校验
//! - **HTTP API** (`api`): RESTful 接口
//!
//! # 模块结构
//!
//! ```text
//! order-server/src/
//! ├── core/          # 配置、状态、服务器
//! ├── auth/          # JWT 认证、权限
//! ├── api/           # HTTP 路由和处理器
//! ├── orders/        # 订单存储、管理器、状态机、事件
//! ├── inventory/     # 库存账本
//! ├── rider/         # 骑手网关与令牌
//! ├── notify/        # 顾客通知
//! └── utils/         # 错误、日志、校验
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod inventory;
pub mod notify;
pub mod orders;
pub mod rider;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use orders::{OrderStorage, OrdersManager};
pub use rider::RiderGateway;
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::init_logger_with_file;

// Security logging macro
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// 设置运行环境: 加载 `.env`，读取配置，按配置初始化日志
pub fn setup_environment() -> anyhow::Result<Config> {
    // .env 不存在时忽略
    let _ = dotenv::dotenv();

    let config = Config::from_env()?;
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());
    Ok(config)
}

pub fn print_banner() {
    println!(
        r#"
   ____           __
  / __ \_________/ /__  _____
 / / / / ___/ __  / _ \/ ___/
/ /_/ / /  / /_/ /  __/ /
\____/_/   \__,_/\___/_/
    "#
    );
}
