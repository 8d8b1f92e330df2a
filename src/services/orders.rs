use crate::{
    config::AppConfig,
    db::DbPool,
    entities::{
        order, order_item, purchased_download, Order, OrderItem, OrderItemModel, OrderModel,
        OrderStatus, PaymentStatus, Product, PurchasedDownload, ShippingAddress,
        ShippingAddressModel,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

/// Order ledger: lookups, history, status transitions, and total upkeep.
///
/// Orders are immutable snapshots apart from their status fields and the
/// recomputed totals; nothing here edits line items.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    config: Arc<AppConfig>,
}

/// An order with its line items and shipping address, as shown on the
/// confirmation and detail pages.
#[derive(Debug, Serialize)]
pub struct OrderDetail {
    pub order: OrderModel,
    pub items: Vec<OrderItemModel>,
    pub shipping_address: Option<ShippingAddressModel>,
}

#[derive(Debug, Serialize)]
pub struct OrderHistory {
    pub orders: Vec<OrderModel>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, config: Arc<AppConfig>) -> Self {
        Self {
            db_pool,
            event_sender,
            config,
        }
    }

    /// Fetches an order with its items and shipping address.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderDetail, ServiceError> {
        let db = &*self.db_pool;

        let order = Order::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let items = OrderItem::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .order_by_desc(order_item::Column::CreatedAt)
            .all(db)
            .await?;

        let shipping_address = match order.shipping_address_id {
            Some(address_id) => ShippingAddress::find_by_id(address_id).one(db).await?,
            None => None,
        };

        Ok(OrderDetail {
            order,
            items,
            shipping_address,
        })
    }

    /// Order history for a buyer email, newest first.
    #[instrument(skip(self))]
    pub async fn list_orders_for_email(
        &self,
        email: &str,
        page: u64,
        per_page: u64,
    ) -> Result<OrderHistory, ServiceError> {
        self.list_orders(order::Column::Email.eq(email), page, per_page)
            .await
    }

    /// Order history for an authenticated customer, newest first.
    #[instrument(skip(self))]
    pub async fn list_orders_for_customer(
        &self,
        customer_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<OrderHistory, ServiceError> {
        self.list_orders(order::Column::CustomerId.eq(customer_id), page, per_page)
            .await
    }

    async fn list_orders(
        &self,
        filter: sea_orm::sea_query::SimpleExpr,
        page: u64,
        per_page: u64,
    ) -> Result<OrderHistory, ServiceError> {
        let db = &*self.db_pool;
        let page = page.max(1);

        let paginator = Order::find()
            .filter(filter)
            .order_by_desc(order::Column::CreatedAt)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count orders");
            ServiceError::DatabaseError(e)
        })?;
        let orders = paginator.fetch_page(page - 1).await.map_err(|e| {
            error!(error = %e, page, per_page, "Failed to fetch orders page");
            ServiceError::DatabaseError(e)
        })?;

        Ok(OrderHistory {
            orders,
            total,
            page,
            per_page,
        })
    }

    /// Moves an order to a new lifecycle status.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn update_status(
        &self,
        order_id: Uuid,
        new_status: OrderStatus,
    ) -> Result<OrderModel, ServiceError> {
        let db = &*self.db_pool;

        let order = Order::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;
        let old_status = order.status;

        let mut active: order::ActiveModel = order.into();
        active.status = Set(new_status);
        let order = active.update(db).await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to update order status");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order_id, %old_status, %new_status, "Order status updated");
        self.event_sender
            .send_or_log(Event::OrderStatusChanged {
                order_id,
                old_status: old_status.to_string(),
                new_status: new_status.to_string(),
            })
            .await;

        Ok(order)
    }

    /// Records a payment status change.
    ///
    /// When the status lands on `paid`, download grants are created for
    /// every line item whose product is downloadable, inside the same
    /// transaction as the status write. Re-running is safe: existing
    /// grants are left untouched.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn update_payment_status(
        &self,
        order_id: Uuid,
        new_status: PaymentStatus,
        payment_reference: Option<String>,
    ) -> Result<OrderModel, ServiceError> {
        let db = &*self.db_pool;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to start payment status transaction");
            ServiceError::DatabaseError(e)
        })?;

        let order = Order::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;
        let old_status = order.payment_status;

        let mut active: order::ActiveModel = order.into();
        active.payment_status = Set(new_status);
        if let Some(reference) = payment_reference {
            active.payment_reference = Set(Some(reference));
        }
        let order = active.update(&txn).await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to update payment status");
            ServiceError::DatabaseError(e)
        })?;

        let granted = if new_status == PaymentStatus::Paid {
            self.grant_downloads_for_order(&txn, order_id).await?
        } else {
            Vec::new()
        };

        txn.commit().await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to commit payment status transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            order_id = %order_id,
            %old_status,
            %new_status,
            granted = granted.len(),
            "Payment status updated"
        );

        self.event_sender
            .send_or_log(Event::PaymentStatusChanged {
                order_id,
                old_status: old_status.to_string(),
                new_status: new_status.to_string(),
            })
            .await;
        for product_id in granted {
            self.event_sender
                .send_or_log(Event::DownloadGranted {
                    order_id,
                    product_id,
                })
                .await;
        }

        Ok(order)
    }

    /// Recomputes subtotal from the current line items and re-derives the
    /// total; persists only those two fields. Shipping cost is left as it
    /// was charged.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn recalculate_totals(&self, order_id: Uuid) -> Result<OrderModel, ServiceError> {
        let db = &*self.db_pool;

        let order = Order::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let items = OrderItem::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(db)
            .await?;

        let subtotal = subtotal_of(&items);
        let total = subtotal + order.shipping_cost;

        let update = order::ActiveModel {
            id: ActiveValue::Unchanged(order_id),
            subtotal: Set(subtotal),
            total: Set(total),
            ..Default::default()
        };
        let order = update.update(db).await.map_err(|e| {
            error!(error = %e, order_id = %order_id, "Failed to persist recalculated totals");
            ServiceError::DatabaseError(e)
        })?;

        info!(order_id = %order_id, %subtotal, %total, "Order totals recalculated");
        Ok(order)
    }

    /// Creates missing download grants for an order's downloadable items.
    /// Returns the product ids that received a new grant.
    async fn grant_downloads_for_order(
        &self,
        txn: &sea_orm::DatabaseTransaction,
        order_id: Uuid,
    ) -> Result<Vec<i64>, ServiceError> {
        let items = OrderItem::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(txn)
            .await?;

        let mut granted = Vec::new();
        for item in items {
            let Some(product_id) = item.product_id else {
                continue;
            };
            let product = Product::find_by_id(product_id).one(txn).await?;
            let Some(product) = product else {
                continue;
            };
            if !product.is_downloadable {
                continue;
            }

            let existing = PurchasedDownload::find()
                .filter(purchased_download::Column::OrderId.eq(order_id))
                .filter(purchased_download::Column::ProductId.eq(product_id))
                .one(txn)
                .await?;
            if existing.is_some() {
                continue;
            }

            let grant = purchased_download::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(product_id),
                download_count: Set(0),
                max_downloads: Set(self.config.default_max_downloads),
                expires_at: Set(None),
                created_at: Set(Utc::now()),
            };
            grant.insert(txn).await.map_err(|e| {
                error!(error = %e, order_id = %order_id, product_id, "Failed to create download grant");
                ServiceError::DatabaseError(e)
            })?;
            granted.push(product_id);
        }

        Ok(granted)
    }
}

/// Sum of `unit_price × quantity` over the given items, rounded to cents.
fn subtotal_of(items: &[OrderItemModel]) -> Decimal {
    items
        .iter()
        .map(|item| item.line_total())
        .sum::<Decimal>()
        .round_dp(2)
}
