use std::sync::Arc;

use crate::auth::JwtService;
use crate::core::{Config, Result};
use crate::notify::{CustomerNotifier, LogNotifier, NotificationWorker, WebhookNotifier};
use crate::orders::OrdersManager;
use crate::rider::RiderGateway;

/// 服务器状态 - 持有所有服务的共享引用
///
/// 使用 Arc 实现浅拷贝，clone 成本极低。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | orders | Arc<OrdersManager> | 订单生命周期 + 库存 (redb) |
/// | riders | RiderGateway | 骑手令牌校验与状态扫描 |
/// | jwt_service | Arc<JwtService> | JWT 认证服务 |
#[derive(Clone, Debug)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 订单管理器
    pub orders: Arc<OrdersManager>,
    /// 骑手网关 (与 orders 共享同一个管理器)
    pub riders: RiderGateway,
    /// JWT 认证服务 (Arc 共享所有权)
    pub jwt_service: Arc<JwtService>,
}

impl ServerState {
    /// 创建服务器状态 (手动构造)
    ///
    /// 通常使用 [`ServerState::initialize`] 代替
    pub fn new(config: Config, orders: Arc<OrdersManager>, jwt_service: Arc<JwtService>) -> Self {
        Self {
            riders: RiderGateway::new(orders.clone()),
            config,
            orders,
            jwt_service,
        }
    }

    /// 初始化服务器状态
    ///
    /// 1. 创建工作目录
    /// 2. 打开 redb 数据库 (`{work_dir}/database/orders.redb`)
    /// 3. 创建 JWT 服务
    pub async fn initialize(config: &Config) -> Result<Self> {
        let db_path = config.database_path();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tx_budget = config.tx_budget();
        let orders = tokio::task::spawn_blocking(move || OrdersManager::new(db_path, tx_budget))
            .await
            .map_err(anyhow::Error::from)??;

        let jwt_service = JwtService::with_config(config.jwt.clone());

        tracing::info!(
            work_dir = %config.work_dir,
            environment = %config.environment,
            "Server state initialized"
        );

        Ok(Self::new(config.clone(), Arc::new(orders), Arc::new(jwt_service)))
    }

    /// 启动后台任务
    ///
    /// 目前只有顾客通知 worker：配置了 `NOTIFY_WEBHOOK_URL` 时走 webhook，
    /// 否则只写日志。
    pub fn start_background_tasks(&self) -> Result<()> {
        let notifier: Arc<dyn CustomerNotifier> = match &self.config.notify_webhook_url {
            Some(url) => {
                tracing::info!(url = %url, "Customer notifications via webhook");
                Arc::new(WebhookNotifier::new(url.clone(), self.config.notify_timeout())?)
            }
            None => {
                tracing::info!("No webhook configured, customer notifications are logged only");
                Arc::new(LogNotifier)
            }
        };

        let worker = NotificationWorker::new(notifier);
        tokio::spawn(worker.run(self.orders.subscribe()));
        Ok(())
    }
}
