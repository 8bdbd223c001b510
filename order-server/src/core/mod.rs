//! 核心模块 - 配置、状态、服务器
//!
//! # 结构
//!
//! - [`config`] - 环境变量配置
//! - [`state`] - 共享服务器状态
//! - [`server`] - HTTP 服务器与后台任务
//! - [`error`] - 启动错误

pub mod config;
pub mod error;
pub mod server;
pub mod state;

pub use config::{Config, ConfigBuilder, ConfigError};
pub use error::{Result, ServerError};
pub use server::Server;
pub use state::ServerState;
