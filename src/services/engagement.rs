use crate::{
    config::AppConfig,
    db::DbPool,
    entities::{
        contact_message, product, product_inquiry, ContactMessageModel, ContactPriority,
        ContactStatus, ContactType, Product, ProductInquiryModel, ProductType,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    notifications::{NotificationBuilder, NotificationSink},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use validator::Validate;

/// Demo requests and contact form intake. Both write a row, notify the
/// admin inbox, and emit an event; neither ever blocks on delivery.
#[derive(Clone)]
pub struct EngagementService {
    db_pool: Arc<DbPool>,
    notifier: Arc<dyn NotificationSink>,
    event_sender: Arc<EventSender>,
    config: Arc<AppConfig>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct DemoRequestInput {
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ContactInput {
    #[validate(length(min = 1, max = 150, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub contact_type: Option<ContactType>,
    #[serde(default)]
    pub priority: Option<ContactPriority>,
    #[validate(length(min = 1, max = 255, message = "Subject is required"))]
    pub subject: String,
    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,
}

impl EngagementService {
    pub fn new(
        db_pool: Arc<DbPool>,
        notifier: Arc<dyn NotificationSink>,
        event_sender: Arc<EventSender>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            db_pool,
            notifier,
            event_sender,
            config,
        }
    }

    /// Records a demo request against a digital product.
    ///
    /// Demos only exist for active digital products; anything else looks
    /// like a dead link to the caller.
    #[instrument(skip(self, input), fields(slug = %slug))]
    pub async fn request_demo(
        &self,
        slug: &str,
        input: DemoRequestInput,
    ) -> Result<ProductInquiryModel, ServiceError> {
        input.validate()?;

        let db = &*self.db_pool;

        let product = Product::find()
            .filter(product::Column::Slug.eq(slug))
            .filter(product::Column::IsActive.eq(true))
            .filter(product::Column::ProductType.eq(ProductType::Digital))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", slug)))?;

        let inquiry = product_inquiry::ActiveModel {
            product_id: Set(Some(product.id)),
            name: Set(input.name.trim().to_string()),
            email: Set(input.email.trim().to_string()),
            company: Set(clean(input.company)),
            phone: Set(clean(input.phone)),
            message: Set(input.message),
            ..Default::default()
        };
        let inquiry = inquiry.insert(db).await.map_err(|e| {
            error!(error = %e, slug = %slug, "Failed to save demo request");
            ServiceError::DatabaseError(e)
        })?;

        info!(inquiry_id = inquiry.id, product_id = product.id, "Demo request received");

        self.notifier
            .best_effort_send(NotificationBuilder::demo_request(
                &self.config.admin_email,
                &product.title,
                &inquiry.name,
            ))
            .await;
        self.event_sender
            .send_or_log(Event::DemoRequested {
                inquiry_id: inquiry.id,
                product_id: Some(product.id),
            })
            .await;

        Ok(inquiry)
    }

    /// Stores a contact form submission with the caller's address for
    /// abuse triage.
    #[instrument(skip(self, input))]
    pub async fn submit_contact(
        &self,
        input: ContactInput,
        ip_address: Option<String>,
    ) -> Result<ContactMessageModel, ServiceError> {
        input.validate()?;

        let db = &*self.db_pool;

        let message = contact_message::ActiveModel {
            name: Set(input.name.trim().to_string()),
            email: Set(input.email.trim().to_string()),
            phone: Set(clean(input.phone)),
            company: Set(clean(input.company)),
            contact_type: Set(input.contact_type.unwrap_or(ContactType::General)),
            priority: Set(input.priority.unwrap_or(ContactPriority::Medium)),
            subject: Set(input.subject.trim().to_string()),
            message: Set(input.message),
            status: Set(ContactStatus::New),
            ip_address: Set(clean(ip_address)),
            ..Default::default()
        };
        let message = message.insert(db).await.map_err(|e| {
            error!(error = %e, "Failed to save contact message");
            ServiceError::DatabaseError(e)
        })?;

        info!(message_id = message.id, contact_type = ?message.contact_type, "Contact message received");

        self.notifier
            .best_effort_send(NotificationBuilder::contact_message(
                &self.config.admin_email,
                &message.subject,
                &message.name,
            ))
            .await;
        self.event_sender
            .send_or_log(Event::ContactMessageReceived(message.id))
            .await;

        Ok(message)
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
