//! Notification Worker - 订单状态通知
//!
//! 订阅 OrdersManager 的广播通道，对进入 `confirm` / `delivered` 的订单
//! 异步发送顾客通知。发送失败只记录日志。

use std::sync::Arc;

use tokio::sync::{Semaphore, broadcast};
use tokio::sync::broadcast::error::RecvError;

use super::{CustomerNotification, CustomerNotifier};
use crate::orders::event::OrderEvent;
use crate::orders::transitions::notifies_customer;

/// Concurrent in-flight notifications
const NOTIFY_CONCURRENCY: usize = 16;

pub struct NotificationWorker {
    notifier: Arc<dyn CustomerNotifier>,
    semaphore: Arc<Semaphore>,
}

impl NotificationWorker {
    pub fn new(notifier: Arc<dyn CustomerNotifier>) -> Self {
        Self {
            notifier,
            semaphore: Arc::new(Semaphore::new(NOTIFY_CONCURRENCY)),
        }
    }

    /// Run until the event channel closes
    pub async fn run(self, mut event_rx: broadcast::Receiver<OrderEvent>) {
        tracing::info!("NotificationWorker started");

        loop {
            match event_rx.recv().await {
                Ok(event) => {
                    if let Some(notification) = notification_for(&event) {
                        self.dispatch(notification).await;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "NotificationWorker lagged, events dropped");
                }
                Err(RecvError::Closed) => {
                    tracing::info!("Order event channel closed, shutting down NotificationWorker");
                    break;
                }
            }
        }
    }

    async fn dispatch(&self, notification: CustomerNotification) {
        let Ok(permit) = self.semaphore.clone().acquire_owned().await else {
            return;
        };
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            let _permit = permit;
            match notifier.notify(&notification).await {
                Ok(()) => tracing::debug!(
                    order_id = %notification.order_id,
                    status = %notification.status,
                    "Customer notified"
                ),
                Err(e) => tracing::warn!(
                    order_id = %notification.order_id,
                    status = %notification.status,
                    error = %e,
                    "Customer notification failed"
                ),
            }
        });
    }
}

/// Notification for an event, if it should produce one
fn notification_for(event: &OrderEvent) -> Option<CustomerNotification> {
    let status = event.new_status()?;
    if !notifies_customer(status) {
        return None;
    }
    Some(CustomerNotification {
        phone: event.phone.clone(),
        order_id: event.order_id.clone(),
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NotifyError;
    use crate::orders::event::OrderEventKind;
    use crate::orders::transitions::TransitionSource;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use shared::models::OrderStatus;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<CustomerNotification>>,
        fail: bool,
    }

    #[async_trait]
    impl CustomerNotifier for RecordingNotifier {
        async fn notify(&self, notification: &CustomerNotification) -> Result<(), NotifyError> {
            self.sent.lock().push(notification.clone());
            if self.fail {
                return Err(NotifyError::Rejected("transport down".to_string()));
            }
            Ok(())
        }
    }

    fn status_event(order_id: &str, from: OrderStatus, to: OrderStatus) -> OrderEvent {
        OrderEvent::new(
            order_id,
            "600111222",
            OrderEventKind::StatusChanged {
                from,
                to,
                source: TransitionSource::Admin,
            },
        )
    }

    async fn wait_for(notifier: &RecordingNotifier, count: usize) {
        for _ in 0..100 {
            if notifier.sent.lock().len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[test]
    fn test_only_confirm_and_delivered_notify() {
        let created = OrderEvent::new("o", "1", OrderEventKind::Created);
        assert!(notification_for(&created).is_none());

        for (to, expected) in [
            (OrderStatus::Confirm, true),
            (OrderStatus::Delivered, true),
            (OrderStatus::InTransit, false),
            (OrderStatus::Cancelled, false),
            (OrderStatus::Completed, false),
        ] {
            let event = status_event("o", OrderStatus::Pending, to);
            assert_eq!(notification_for(&event).is_some(), expected, "{to}");
        }
    }

    #[tokio::test]
    async fn test_worker_dispatches_matching_events() {
        let notifier = Arc::new(RecordingNotifier::default());
        let (tx, rx) = broadcast::channel(16);
        let handle = tokio::spawn(NotificationWorker::new(notifier.clone()).run(rx));

        tx.send(status_event("o-1", OrderStatus::Pending, OrderStatus::InTransit))
            .unwrap();
        tx.send(status_event("o-2", OrderStatus::Pending, OrderStatus::Confirm))
            .unwrap();
        wait_for(&notifier, 1).await;
        drop(tx);
        handle.await.unwrap();

        let sent = notifier.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].order_id, "o-2");
        assert_eq!(sent[0].status, OrderStatus::Confirm);
        assert_eq!(sent[0].phone, "600111222");
    }

    #[tokio::test]
    async fn test_worker_survives_failed_notifications() {
        let notifier = Arc::new(RecordingNotifier {
            fail: true,
            ..Default::default()
        });
        let (tx, rx) = broadcast::channel(16);
        let handle = tokio::spawn(NotificationWorker::new(notifier.clone()).run(rx));

        tx.send(status_event("o-1", OrderStatus::Pending, OrderStatus::Confirm))
            .unwrap();
        wait_for(&notifier, 1).await;
        tx.send(status_event("o-1", OrderStatus::Confirm, OrderStatus::Delivered))
            .unwrap();
        wait_for(&notifier, 2).await;
        drop(tx);
        handle.await.unwrap();

        assert_eq!(notifier.sent.lock().len(), 2);
    }
}
