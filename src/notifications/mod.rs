use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::{AsyncCommands, Client};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Represents an outbound notification
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Notification {
    pub id: Uuid,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub created_at: DateTime<Utc>,
}

/// Types of notifications
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum NotificationType {
    OrderConfirmation,
    AdminNewOrder,
    DemoRequest,
    ContactMessage,
}

/// Notification delivery errors
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Trait for notification delivery backends.
///
/// Callers on the checkout path use `best_effort_send`: a notification
/// failure is logged and swallowed, it never fails the purchase that
/// triggered it.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, notification: Notification) -> Result<(), NotificationError>;

    async fn best_effort_send(&self, notification: Notification) {
        let notification_type = notification.notification_type.clone();
        let recipient = notification.recipient.clone();
        if let Err(e) = self.deliver(notification).await {
            warn!(
                "Notification delivery failed: type={:?}, recipient={}, error={}",
                notification_type, recipient, e
            );
        }
    }
}

/// Sink that writes notifications to the application log. Default in
/// development where no delivery infrastructure exists.
#[derive(Debug, Clone, Default)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn deliver(&self, notification: Notification) -> Result<(), NotificationError> {
        info!(
            "Notification: type={:?}, recipient={}, subject={:?}",
            notification.notification_type, notification.recipient, notification.subject
        );
        Ok(())
    }
}

/// Redis-backed sink. Pushes serialized notifications onto a list for an
/// external worker to drain and deliver.
#[derive(Clone)]
pub struct RedisSink {
    redis: Arc<Client>,
    queue_key: String,
}

impl RedisSink {
    pub fn new(client: Arc<Client>, queue_key: impl Into<String>) -> Self {
        Self {
            redis: client,
            queue_key: queue_key.into(),
        }
    }
}

#[async_trait]
impl NotificationSink for RedisSink {
    #[instrument(skip(self, notification), fields(id = %notification.id))]
    async fn deliver(&self, notification: Notification) -> Result<(), NotificationError> {
        let mut conn = self.redis.get_async_connection().await?;
        let json = serde_json::to_string(&notification)?;

        let _: i64 = conn.lpush(&self.queue_key, json).await?;

        info!(
            "Notification queued: type={:?}",
            notification.notification_type
        );
        Ok(())
    }
}

/// Notification creation helpers
pub struct NotificationBuilder;

impl NotificationBuilder {
    pub fn order_confirmation(recipient: &str, order_id: Uuid, total: Decimal) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            recipient: recipient.to_string(),
            subject: format!("Order Confirmation #{} - DravTech", order_id),
            body: format!(
                "Your order #{} has been received. Order total: KES {}.",
                order_id, total
            ),
            notification_type: NotificationType::OrderConfirmation,
            created_at: Utc::now(),
        }
    }

    pub fn admin_new_order(admin_email: &str, order_id: Uuid, total: Decimal) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            recipient: admin_email.to_string(),
            subject: format!("New Order #{} - DravTech", order_id),
            body: format!("A new order #{} came in. Order total: KES {}.", order_id, total),
            notification_type: NotificationType::AdminNewOrder,
            created_at: Utc::now(),
        }
    }

    pub fn demo_request(admin_email: &str, product_title: &str, requester: &str) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            recipient: admin_email.to_string(),
            subject: format!("Demo request: {}", product_title),
            body: format!("{} requested a demo of {}.", requester, product_title),
            notification_type: NotificationType::DemoRequest,
            created_at: Utc::now(),
        }
    }

    pub fn contact_message(admin_email: &str, subject: &str, sender_name: &str) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            recipient: admin_email.to_string(),
            subject: format!("Contact form: {}", subject),
            body: format!("New contact message from {}.", sender_name),
            notification_type: NotificationType::ContactMessage,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    struct FailingSink {
        attempts: Mutex<u32>,
    }

    #[async_trait]
    impl NotificationSink for FailingSink {
        async fn deliver(&self, _notification: Notification) -> Result<(), NotificationError> {
            *self.attempts.lock().unwrap() += 1;
            Err(NotificationError::Internal("delivery down".to_string()))
        }
    }

    #[tokio::test]
    async fn best_effort_send_swallows_delivery_failures() {
        let sink = FailingSink {
            attempts: Mutex::new(0),
        };
        let notification =
            NotificationBuilder::order_confirmation("buyer@example.com", Uuid::new_v4(), dec!(370.00));

        // Must not panic or propagate the error
        sink.best_effort_send(notification).await;

        assert_eq!(*sink.attempts.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn log_sink_always_succeeds() {
        let sink = LogSink;
        let notification =
            NotificationBuilder::admin_new_order("admin@dravtech.com", Uuid::new_v4(), dec!(100.00));

        assert!(sink.deliver(notification).await.is_ok());
    }

    #[test]
    fn builder_stamps_subject_with_order_id() {
        let order_id = Uuid::new_v4();
        let notification =
            NotificationBuilder::order_confirmation("buyer@example.com", order_id, dec!(370.00));

        assert!(notification.subject.contains(&order_id.to_string()));
        assert_eq!(
            notification.notification_type,
            NotificationType::OrderConfirmation
        );
    }
}
