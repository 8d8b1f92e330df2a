use crate::{
    cart::{CartEntry, CartStore},
    db::DbPool,
    entities::{product, Product},
    errors::ServiceError,
    events::{Event, EventSender},
};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

/// Session cart operations: add/remove/update/count/view.
///
/// Cart state lives in the [`CartStore`] keyed by session id; the database
/// is only consulted to snapshot product facts at add time. Loading always
/// sanitizes, and every mutation persists the sanitized cart back, so
/// corrupted session payloads heal on the next touch.
#[derive(Clone)]
pub struct CartService {
    db_pool: Arc<DbPool>,
    store: Arc<dyn CartStore>,
    event_sender: Arc<EventSender>,
}

/// Cart payload for the cart page.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartEntry>,
    pub total: Decimal,
    pub cart_count: u32,
    pub has_physical_items: bool,
}

/// Result of an add or remove, phrased for the storefront toast.
#[derive(Debug, Serialize)]
pub struct CartMutation {
    pub cart_count: u32,
    pub message: String,
}

/// Result of a quantity update.
#[derive(Debug, Serialize)]
pub struct QuantityUpdate {
    pub cart_count: u32,
    pub quantity: u32,
    pub line_total: Decimal,
}

impl CartService {
    pub fn new(
        db_pool: Arc<DbPool>,
        store: Arc<dyn CartStore>,
        event_sender: Arc<EventSender>,
    ) -> Self {
        Self {
            db_pool,
            store,
            event_sender,
        }
    }

    /// Returns the cart contents, persisting the sanitized state back.
    #[instrument(skip(self))]
    pub async fn view_cart(&self, session_id: &str) -> Result<CartView, ServiceError> {
        let cart = self.store.load(session_id).await?;
        self.store.save(session_id, &cart).await?;

        Ok(CartView {
            total: cart.total(),
            cart_count: cart.item_count(),
            has_physical_items: cart.has_physical_items(),
            items: cart.entries().cloned().collect(),
        })
    }

    /// Adds a product to the cart, incrementing quantity on repeat adds.
    ///
    /// The entry snapshots the product's title, price (or zero when unpriced),
    /// and shipping/download facts at add time; repeat adds keep the original
    /// snapshot and only bump quantity.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        session_id: &str,
        product_id: i64,
        quantity: u32,
    ) -> Result<CartMutation, ServiceError> {
        if quantity < 1 {
            return Err(ServiceError::ValidationError("Invalid quantity.".to_string()));
        }

        let product = Product::find_by_id(product_id)
            .filter(product::Column::IsActive.eq(true))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        if !product.can_add_to_cart() {
            return Err(ServiceError::InvalidOperation(
                "This product cannot be added to cart.".to_string(),
            ));
        }

        let mut cart = self.store.load(session_id).await?;
        let mut entry = CartEntry::from_product(&product);
        entry.quantity = quantity;
        let new_quantity = cart.add(entry);
        self.store.save(session_id, &cart).await?;

        self.event_sender
            .send_or_log(Event::CartItemAdded {
                session_id: session_id.to_string(),
                product_id,
                quantity: new_quantity,
            })
            .await;

        info!(product_id, new_quantity, "Added product to cart");
        Ok(CartMutation {
            cart_count: cart.item_count(),
            message: format!("{} added to cart!", product.title),
        })
    }

    /// Removes a product from the cart. Removing an absent product is a
    /// no-op that still succeeds, with a generic label in the message.
    #[instrument(skip(self))]
    pub async fn remove_item(
        &self,
        session_id: &str,
        product_id: i64,
    ) -> Result<CartMutation, ServiceError> {
        let mut cart = self.store.load(session_id).await?;
        let removed = cart.remove(product_id);
        self.store.save(session_id, &cart).await?;

        if removed.is_some() {
            self.event_sender
                .send_or_log(Event::CartItemRemoved {
                    session_id: session_id.to_string(),
                    product_id,
                })
                .await;
        }

        let removed_name = removed
            .map(|entry| entry.name)
            .unwrap_or_else(|| "Product".to_string());

        Ok(CartMutation {
            cart_count: cart.item_count(),
            message: format!("{} removed from cart.", removed_name),
        })
    }

    /// Sets the quantity for a cart line. Quantities below 1 are rejected;
    /// use [`remove_item`](Self::remove_item) to drop a line.
    #[instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        session_id: &str,
        product_id: i64,
        quantity: u32,
    ) -> Result<QuantityUpdate, ServiceError> {
        if quantity < 1 {
            return Err(ServiceError::ValidationError("Invalid quantity.".to_string()));
        }

        let mut cart = self.store.load(session_id).await?;
        let line_total = match cart.set_quantity(product_id, quantity) {
            Some(entry) => entry.line_total().round_dp(2),
            None => {
                return Err(ServiceError::NotFound("Item not in cart.".to_string()));
            }
        };
        self.store.save(session_id, &cart).await?;

        self.event_sender
            .send_or_log(Event::CartQuantityUpdated {
                session_id: session_id.to_string(),
                product_id,
                quantity,
            })
            .await;

        Ok(QuantityUpdate {
            cart_count: cart.item_count(),
            quantity,
            line_total,
        })
    }

    /// Total quantity across all lines, for the header badge.
    #[instrument(skip(self))]
    pub async fn cart_count(&self, session_id: &str) -> Result<u32, ServiceError> {
        let cart = self.store.load(session_id).await?;
        Ok(cart.item_count())
    }

    /// Drops the whole cart for a session.
    #[instrument(skip(self))]
    pub async fn clear(&self, session_id: &str) -> Result<(), ServiceError> {
        self.store.clear(session_id).await?;
        self.event_sender
            .send_or_log(Event::CartCleared(session_id.to_string()))
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutation_payload_shape() {
        let mutation = CartMutation {
            cart_count: 3,
            message: "Logo Pack added to cart!".to_string(),
        };
        let json = serde_json::to_value(&mutation).unwrap();
        assert_eq!(json["cart_count"], 3);
        assert_eq!(json["message"], "Logo Pack added to cart!");
    }

    #[test]
    fn quantity_update_serializes_line_total_as_string() {
        use rust_decimal_macros::dec;

        let update = QuantityUpdate {
            cart_count: 4,
            quantity: 4,
            line_total: dec!(102.00),
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["line_total"], "102.00");
        assert_eq!(json["quantity"], 4);
    }
}
