use thiserror::Error;

use crate::core::config::ConfigError;
use crate::notify::NotifyError;
use crate::orders::ManagerError;

/// 服务启动阶段的错误
///
/// 请求处理中的错误走 [`crate::utils::AppError`]，这里只覆盖配置、存储和监听。
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    #[error("存储初始化失败: {0}")]
    Storage(#[from] ManagerError),

    #[error("通知器初始化失败: {0}")]
    Notify(#[from] NotifyError),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("内部服务器错误: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
