pub mod carts;
pub mod checkout;
pub mod common;
pub mod downloads;
pub mod engagement;
pub mod health;
pub mod orders;
pub mod products;
pub mod session;

use crate::cart::CartStore;
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::notifications::NotificationSink;
use crate::services;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub catalogue: Arc<services::CatalogueService>,
    pub cart: Arc<services::CartService>,
    pub checkout: Arc<services::CheckoutService>,
    pub orders: Arc<services::OrderService>,
    pub fulfillment: Arc<services::FulfillmentService>,
    pub engagement: Arc<services::EngagementService>,
}

impl AppServices {
    /// Wire every service against the shared pool, event channel, cart
    /// store, and notification sink.
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        config: Arc<AppConfig>,
        cart_store: Arc<dyn CartStore>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        let catalogue = Arc::new(services::CatalogueService::new(db_pool.clone()));
        let cart = Arc::new(services::CartService::new(
            db_pool.clone(),
            cart_store.clone(),
            event_sender.clone(),
        ));
        let checkout = Arc::new(services::CheckoutService::new(
            db_pool.clone(),
            cart_store,
            notifier.clone(),
            event_sender.clone(),
            config.clone(),
        ));
        let orders = Arc::new(services::OrderService::new(
            db_pool.clone(),
            event_sender.clone(),
            config.clone(),
        ));
        let fulfillment = Arc::new(services::FulfillmentService::new(
            db_pool.clone(),
            event_sender.clone(),
            config.clone(),
        ));
        let engagement = Arc::new(services::EngagementService::new(
            db_pool,
            notifier,
            event_sender,
            config,
        ));

        Self {
            catalogue,
            cart,
            checkout,
            orders,
            fulfillment,
            engagement,
        }
    }
}
