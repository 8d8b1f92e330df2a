use crate::{
    cart::{CartEntry, CartStore, SessionCart},
    config::AppConfig,
    db::DbPool,
    entities::{
        order, order_item, shipping_address, OrderItemModel, OrderModel, OrderStatus,
        PaymentStatus, Product, ProductModel,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    notifications::{NotificationBuilder, NotificationSink},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Checkout orchestrator: validates the session cart, conditionally collects
/// a shipping address, snapshots the cart into an Order + OrderItems inside
/// one transaction, clears the cart, and fires best-effort notifications.
#[derive(Clone)]
pub struct CheckoutService {
    db_pool: Arc<DbPool>,
    cart_store: Arc<dyn CartStore>,
    notifier: Arc<dyn NotificationSink>,
    event_sender: Arc<EventSender>,
    config: Arc<AppConfig>,
}

/// Buyer-submitted checkout form.
///
/// `email` rides along for guest receipts; the address fields are only
/// mandatory when the cart holds anything that ships (checked against the
/// cart, not here, since the requirement is conditional).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CheckoutRequest {
    pub customer_id: Option<Uuid>,
    #[validate(email(message = "Enter a valid email address"))]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address_1: Option<String>,
    #[serde(default)]
    pub address_2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub county: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// Computed totals shown on the checkout page before submission.
#[derive(Debug, Serialize)]
pub struct CheckoutPreview {
    pub items: Vec<CartEntry>,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
    pub has_physical_items: bool,
    pub currency: String,
}

/// The committed order with its snapshotted line items.
#[derive(Debug, Serialize)]
pub struct CheckoutConfirmation {
    pub order: OrderModel,
    pub items: Vec<OrderItemModel>,
}

impl CheckoutService {
    pub fn new(
        db_pool: Arc<DbPool>,
        cart_store: Arc<dyn CartStore>,
        notifier: Arc<dyn NotificationSink>,
        event_sender: Arc<EventSender>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            db_pool,
            cart_store,
            notifier,
            event_sender,
            config,
        }
    }

    /// Computes the checkout totals for the current cart.
    ///
    /// Fails with `InvalidOperation` when the cart is empty so the client
    /// can bounce back to the cart page.
    #[instrument(skip(self))]
    pub async fn preview(&self, session_id: &str) -> Result<CheckoutPreview, ServiceError> {
        let cart = self.cart_store.load(session_id).await?;
        if cart.is_empty() {
            return Err(ServiceError::InvalidOperation("Cart is empty".to_string()));
        }
        self.cart_store.save(session_id, &cart).await?;

        Ok(preview_for(
            &cart,
            self.config.shipping_flat_fee,
            &self.config.currency,
        ))
    }

    /// Commits the checkout: one transaction covering the shipping address
    /// (when needed), the order, and every order item. Cart entries whose
    /// product has since been deleted are skipped, and the order's totals
    /// are computed from the entries that actually made it in.
    ///
    /// After the commit the session cart is cleared and two notifications
    /// go out (customer confirmation, admin alert); neither step can fail
    /// the checkout.
    #[instrument(skip(self, request), fields(customer_id = ?request.customer_id))]
    pub async fn submit(
        &self,
        session_id: &str,
        request: CheckoutRequest,
    ) -> Result<CheckoutConfirmation, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let cart = self.cart_store.load(session_id).await?;
        if cart.is_empty() {
            return Err(ServiceError::InvalidOperation("Cart is empty".to_string()));
        }

        if cart.has_physical_items() {
            let missing = missing_shipping_fields(&request);
            if !missing.is_empty() {
                return Err(ServiceError::ValidationError(format!(
                    "Please complete all required shipping fields: {}",
                    missing.join(", ")
                )));
            }
        }

        let db = &*self.db_pool;
        let now = Utc::now();
        let order_id = Uuid::new_v4();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start checkout transaction");
            ServiceError::DatabaseError(e)
        })?;

        // Entries whose product vanished since add are dropped here, not
        // fatal; the order totals come from what actually survives.
        let mut survivors: Vec<(CartEntry, ProductModel)> = Vec::new();
        for entry in cart.entries() {
            let product = Product::find_by_id(entry.id).one(&txn).await.map_err(|e| {
                error!(error = %e, product_id = entry.id, "Failed to resolve cart product");
                ServiceError::DatabaseError(e)
            })?;
            match product {
                Some(product) => survivors.push((entry.clone(), product)),
                None => {
                    warn!(product_id = entry.id, "Skipping cart entry: product no longer exists");
                }
            }
        }

        let subtotal = survivors
            .iter()
            .map(|(entry, _)| entry.line_total())
            .sum::<Decimal>()
            .round_dp(2);
        let has_physical = survivors.iter().any(|(entry, _)| entry.needs_shipping);
        let shipping_cost = if has_physical {
            self.config.shipping_flat_fee
        } else {
            Decimal::ZERO
        };
        let total = subtotal + shipping_cost;

        let shipping_address_id = if has_physical {
            let address = shipping_address::ActiveModel {
                id: Set(Uuid::new_v4()),
                full_name: Set(required_text(&request.full_name)),
                phone: Set(required_text(&request.phone)),
                email: Set(required_text(&request.email)),
                address_1: Set(required_text(&request.address_1)),
                address_2: Set(clean(&request.address_2)),
                city: Set(required_text(&request.city)),
                county: Set(clean(&request.county)),
                postal_code: Set(clean(&request.postal_code)),
                country: Set(clean(&request.country).unwrap_or_else(|| "Kenya".to_string())),
                created_at: Set(now),
            };
            let address = address.insert(&txn).await.map_err(|e| {
                error!(error = %e, "Failed to create shipping address");
                ServiceError::DatabaseError(e)
            })?;
            Some(address.id)
        } else {
            None
        };

        let order = order::ActiveModel {
            id: Set(order_id),
            customer_id: Set(request.customer_id),
            email: Set(required_text(&request.email)),
            status: Set(OrderStatus::Pending),
            payment_status: Set(PaymentStatus::Pending),
            payment_reference: Set(None),
            subtotal: Set(subtotal),
            shipping_cost: Set(shipping_cost),
            total: Set(total),
            has_physical_items: Set(has_physical),
            shipping_address_id: Set(shipping_address_id),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let order = order.insert(&txn).await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to create order");
            ServiceError::DatabaseError(e)
        })?;

        let mut items = Vec::with_capacity(survivors.len());
        for (entry, product) in &survivors {
            let item = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(Some(product.id)),
                product_title: Set(entry.name.clone()),
                product_type: Set(entry.product_type.clone()),
                unit_price: Set(entry.price),
                quantity: Set(entry.quantity.min(i32::MAX as u32) as i32),
                created_at: Set(now),
            };
            let item = item.insert(&txn).await.map_err(|e| {
                error!(error = %e, order_id = %order_id, product_id = product.id, "Failed to create order item");
                ServiceError::DatabaseError(e)
            })?;
            items.push(item);
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit checkout transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            order_id = %order_id,
            subtotal = %subtotal,
            total = %total,
            item_count = items.len(),
            "Checkout committed"
        );

        // The order is committed; a failure to clear the cart only leaves
        // stale session state behind, so log it and move on.
        if let Err(e) = self.cart_store.clear(session_id).await {
            error!(error = %e, order_id = %order_id, "Failed to clear cart after checkout");
        }

        self.notifier
            .best_effort_send(NotificationBuilder::order_confirmation(
                &order.email,
                order.id,
                order.total,
            ))
            .await;
        self.notifier
            .best_effort_send(NotificationBuilder::admin_new_order(
                &self.config.admin_email,
                order.id,
                order.total,
            ))
            .await;

        self.event_sender
            .send_or_log(Event::CheckoutCompleted {
                session_id: session_id.to_string(),
                order_id,
            })
            .await;
        self.event_sender.send_or_log(Event::OrderCreated(order_id)).await;

        Ok(CheckoutConfirmation { order, items })
    }
}

fn preview_for(cart: &SessionCart, flat_fee: Decimal, currency: &str) -> CheckoutPreview {
    let subtotal = cart.total();
    let has_physical_items = cart.has_physical_items();
    let shipping_cost = if has_physical_items {
        flat_fee
    } else {
        Decimal::ZERO
    };

    CheckoutPreview {
        items: cart.entries().cloned().collect(),
        subtotal,
        shipping_cost,
        total: subtotal + shipping_cost,
        has_physical_items,
        currency: currency.to_string(),
    }
}

/// Names of the address fields left blank, in form order.
fn missing_shipping_fields(request: &CheckoutRequest) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if is_blank(&request.full_name) {
        missing.push("full_name");
    }
    if is_blank(&request.phone) {
        missing.push("phone");
    }
    if is_blank(&request.email) {
        missing.push("email");
    }
    if is_blank(&request.address_1) {
        missing.push("address_1");
    }
    if is_blank(&request.city) {
        missing.push("city");
    }
    missing
}

fn is_blank(value: &Option<String>) -> bool {
    value
        .as_deref()
        .map(|v| v.trim().is_empty())
        .unwrap_or(true)
}

/// Trimmed value of a field the caller has already checked is present.
fn required_text(value: &Option<String>) -> String {
    value.as_deref().unwrap_or_default().trim().to_string()
}

/// Trimmed optional field, with blank collapsing to `None`.
fn clean(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
