use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging delivery failures instead of surfacing
    /// them. Event delivery never fails a request.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            error!("Event delivery failed: {}", e);
        }
    }
}

// Define the various events that can occur in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Cart events
    CartItemAdded {
        session_id: String,
        product_id: i64,
        quantity: u32,
    },
    CartItemRemoved {
        session_id: String,
        product_id: i64,
    },
    CartQuantityUpdated {
        session_id: String,
        product_id: i64,
        quantity: u32,
    },
    CartCleared(String),

    // Checkout events
    CheckoutCompleted {
        session_id: String,
        order_id: Uuid,
    },

    // Order events
    OrderCreated(Uuid),
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },
    PaymentStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },

    // Fulfillment events
    DownloadGranted {
        order_id: Uuid,
        product_id: i64,
    },
    DownloadConsumed {
        order_id: Uuid,
        product_id: i64,
        remaining: i32,
    },

    // Engagement events
    DemoRequested {
        inquiry_id: i64,
        product_id: Option<i64>,
    },
    ContactMessageReceived(i64),
}

// Define a trait for handling events. Handlers implementing this trait will process events asynchronously.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle_event(&self, event: Event) -> Result<(), String>;
}

// Function to process incoming events and distribute them to registered event handlers.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        info!("Received event: {:?}", event);

        match event {
            Event::OrderCreated(order_id) => {
                if let Err(e) = handle_order_created(order_id).await {
                    error!(
                        "Failed to handle order created event: order_id={}, error={}",
                        order_id, e
                    );
                }
            }
            Event::CheckoutCompleted {
                session_id,
                order_id,
            } => {
                if let Err(e) = handle_checkout_completed(&session_id, order_id).await {
                    error!(
                        "Failed to handle checkout completed event: order_id={}, error={}",
                        order_id, e
                    );
                }
            }
            Event::PaymentStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(
                    "Payment status changed for order {}: {} -> {}",
                    order_id, old_status, new_status
                );
            }
            Event::DownloadConsumed {
                order_id,
                product_id,
                remaining,
            } => {
                if remaining == 0 {
                    warn!(
                        "Download quota exhausted: order={}, product={}",
                        order_id, product_id
                    );
                } else {
                    info!(
                        "Download delivered: order={}, product={}, remaining={}",
                        order_id, product_id, remaining
                    );
                }
            }
            // Add more event handlers as needed
            _ => {
                info!("No specific handler for event: {:?}", event);
            }
        }
    }

    warn!("Event processing loop has ended");
}

// Handler functions for specific events
async fn handle_order_created(order_id: Uuid) -> Result<(), String> {
    // Downstream systems (fulfillment, analytics) hook in here
    info!("Processing order created event for order {}", order_id);

    Ok(())
}

async fn handle_checkout_completed(session_id: &str, order_id: Uuid) -> Result<(), String> {
    info!(
        "Checkout completed: session={}, order={}",
        session_id, order_id
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_to_receiver() {
        let (tx, mut rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);

        sender.send(Event::OrderCreated(Uuid::new_v4())).await.unwrap();

        assert!(matches!(rx.recv().await, Some(Event::OrderCreated(_))));
    }

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        // Must not panic or error out
        sender
            .send_or_log(Event::CartCleared("session-1".to_string()))
            .await;
    }

    #[tokio::test]
    async fn send_fails_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        let result = sender.send(Event::OrderCreated(Uuid::new_v4())).await;
        assert!(result.is_err());
    }
}
