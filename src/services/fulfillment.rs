use crate::{
    config::AppConfig,
    db::DbPool,
    entities::{
        order, product, purchased_download, Order, PaymentStatus, Product, ProductModel,
        PurchasedDownload, PurchasedDownloadModel,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, SqlErr};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Download fulfillment: granting, authorizing, and consuming quota-gated
/// file access for purchased products.
#[derive(Clone)]
pub struct FulfillmentService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    config: Arc<AppConfig>,
}

/// Everything a handler needs to stream one authorized download.
#[derive(Debug)]
pub struct DownloadPayload {
    pub path: PathBuf,
    pub filename: String,
    pub content_type: &'static str,
    pub remaining_downloads: i32,
}

impl FulfillmentService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, config: Arc<AppConfig>) -> Self {
        Self {
            db_pool,
            event_sender,
            config,
        }
    }

    /// Creates a download grant for an (order, product) pair.
    ///
    /// Each pair gets at most one grant; a duplicate attempt fails with
    /// `Conflict` rather than being silently ignored. The unique index on
    /// the pair backs this up under concurrent grants.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn grant_download(
        &self,
        order_id: Uuid,
        product_id: i64,
        max_downloads: Option<i32>,
    ) -> Result<PurchasedDownloadModel, ServiceError> {
        let db = &*self.db_pool;

        Order::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let product = Product::find_by_id(product_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;
        if !product.is_downloadable {
            return Err(ServiceError::InvalidOperation(format!(
                "Product {} is not downloadable",
                product_id
            )));
        }

        let existing = PurchasedDownload::find()
            .filter(purchased_download::Column::OrderId.eq(order_id))
            .filter(purchased_download::Column::ProductId.eq(product_id))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(
                "Download already granted for this order and product".to_string(),
            ));
        }

        let grant = purchased_download::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            product_id: Set(product_id),
            download_count: Set(0),
            max_downloads: Set(max_downloads.unwrap_or(self.config.default_max_downloads)),
            expires_at: Set(None),
            created_at: Set(Utc::now()),
        };

        let grant = match grant.insert(db).await {
            Ok(grant) => grant,
            Err(e) => {
                // Two concurrent grant attempts: one of them hits the
                // unique index instead of the pre-check.
                if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                    return Err(ServiceError::Conflict(
                        "Download already granted for this order and product".to_string(),
                    ));
                }
                error!(error = %e, order_id = %order_id, product_id, "Failed to create download grant");
                return Err(ServiceError::DatabaseError(e));
            }
        };

        info!(order_id = %order_id, product_id, "Download granted");
        self.event_sender
            .send_or_log(Event::DownloadGranted {
                order_id,
                product_id,
            })
            .await;

        Ok(grant)
    }

    /// The single authorization gate for file delivery: finds a grant for
    /// this customer and product whose order is paid and whose quota is
    /// not used up.
    ///
    /// No qualifying purchase at all is an authorization failure; owning
    /// only exhausted grants reports the quota instead.
    #[instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn authorize_download(
        &self,
        customer_id: Uuid,
        product_id: i64,
    ) -> Result<PurchasedDownloadModel, ServiceError> {
        let db = &*self.db_pool;

        let purchases = PurchasedDownload::find()
            .filter(purchased_download::Column::ProductId.eq(product_id))
            .inner_join(Order)
            .filter(order::Column::CustomerId.eq(customer_id))
            .filter(order::Column::PaymentStatus.eq(PaymentStatus::Paid))
            .order_by_asc(purchased_download::Column::CreatedAt)
            .all(db)
            .await?;

        if purchases.is_empty() {
            return Err(ServiceError::Forbidden(
                "You need to purchase this item before downloading.".to_string(),
            ));
        }

        purchases
            .into_iter()
            .find(|purchase| !purchase.is_exhausted())
            .ok_or_else(|| {
                ServiceError::Exhausted(
                    "Download limit reached. Contact support for help.".to_string(),
                )
            })
    }

    /// Spends one unit of download quota.
    ///
    /// The increment is a single conditional UPDATE (`download_count <
    /// max_downloads`), so two racing requests on the last unit cannot
    /// both succeed.
    #[instrument(skip(self), fields(purchase_id = %purchase_id))]
    pub async fn consume_download(
        &self,
        purchase_id: Uuid,
    ) -> Result<PurchasedDownloadModel, ServiceError> {
        use sea_orm::sea_query::Expr;

        let db = &*self.db_pool;

        let result = PurchasedDownload::update_many()
            .col_expr(
                purchased_download::Column::DownloadCount,
                Expr::col(purchased_download::Column::DownloadCount).add(1),
            )
            .filter(purchased_download::Column::Id.eq(purchase_id))
            .filter(
                Expr::col(purchased_download::Column::DownloadCount)
                    .lt(Expr::col(purchased_download::Column::MaxDownloads)),
            )
            .exec(db)
            .await
            .map_err(|e| {
                error!(error = %e, purchase_id = %purchase_id, "Failed to consume download quota");
                ServiceError::DatabaseError(e)
            })?;

        if result.rows_affected == 0 {
            return match PurchasedDownload::find_by_id(purchase_id).one(db).await? {
                None => Err(ServiceError::NotFound(format!(
                    "Download grant {} not found",
                    purchase_id
                ))),
                Some(_) => Err(ServiceError::Exhausted(
                    "Download limit reached. Contact support for help.".to_string(),
                )),
            };
        }

        let purchase = PurchasedDownload::find_by_id(purchase_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Download grant {} not found", purchase_id))
            })?;

        let remaining = purchase.remaining_downloads();
        if remaining == 0 {
            warn!(purchase_id = %purchase_id, "Download quota now exhausted");
        }
        self.event_sender
            .send_or_log(Event::DownloadConsumed {
                order_id: purchase.order_id,
                product_id: purchase.product_id,
                remaining,
            })
            .await;

        Ok(purchase)
    }

    /// Runs the full download flow for one request: product gate,
    /// purchase authorization, file resolution, then quota consumption.
    /// The quota is only spent once the file is known to exist.
    #[instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn prepare_download(
        &self,
        customer_id: Uuid,
        product_id: i64,
    ) -> Result<DownloadPayload, ServiceError> {
        let db = &*self.db_pool;

        let product = Product::find_by_id(product_id)
            .filter(product::Column::IsActive.eq(true))
            .filter(product::Column::IsDownloadable.eq(true))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let purchase = self.authorize_download(customer_id, product_id).await?;

        let (path, filename, content_type) = self.resolve_download_file(&product).await?;

        let purchase = self.consume_download(purchase.id).await?;

        info!(
            product_id,
            purchase_id = %purchase.id,
            remaining = purchase.remaining_downloads(),
            "Download authorized"
        );

        Ok(DownloadPayload {
            path,
            filename,
            content_type,
            remaining_downloads: purchase.remaining_downloads(),
        })
    }

    async fn resolve_download_file(
        &self,
        product: &ProductModel,
    ) -> Result<(PathBuf, String, &'static str), ServiceError> {
        let relative = product
            .download_file
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .ok_or_else(|| {
                ServiceError::NotFound(
                    "No downloadable file attached to this product.".to_string(),
                )
            })?;

        let path = resolve_under_root(Path::new(&self.config.download_root), relative)
            .ok_or_else(|| {
                warn!(product_id = product.id, file = relative, "Rejected download file path");
                ServiceError::NotFound("File not found on server.".to_string())
            })?;

        match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => {}
            _ => {
                return Err(ServiceError::NotFound(
                    "File not found on server.".to_string(),
                ));
            }
        }

        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("download")
            .to_string();
        let content_type = guess_content_type(&filename);

        Ok((path, filename, content_type))
    }
}

/// Joins `relative` under `root`, refusing absolute paths and any parent
/// traversal so product rows cannot point outside the download directory.
fn resolve_under_root(root: &Path, relative: &str) -> Option<PathBuf> {
    let relative = Path::new(relative);
    if relative.is_absolute() {
        return None;
    }
    if relative
        .components()
        .any(|component| matches!(component, Component::ParentDir))
    {
        return None;
    }
    Some(root.join(relative))
}

fn guess_content_type(filename: &str) -> &'static str {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        "epub" => "application/epub+zip",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}
