use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, ConnectionTrait, Set};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Catalogue product entity.
///
/// `product_type` drives the purchase journey: digital products carry
/// pricing plans and a demo CTA, merch always ships, artwork is sold
/// either as a physical piece or as a downloadable file.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[validate(length(
        min = 1,
        max = 200,
        message = "Product title must be between 1 and 200 characters"
    ))]
    pub title: String,

    /// URL-safe identifier, unique across the catalogue.
    #[sea_orm(unique)]
    #[validate(length(min = 1, max = 200, message = "Slug must be between 1 and 200 characters"))]
    pub slug: String,

    pub category_id: Option<i64>,

    pub product_type: ProductType,

    #[validate(length(max = 255, message = "Tagline cannot exceed 255 characters"))]
    pub tagline: Option<String>,

    pub description: Option<String>,

    /// Feature bullet points for digital products, stored as a JSON list.
    #[sea_orm(column_type = "Json", nullable)]
    pub features: Option<Json>,

    #[sea_orm(column_type = "Json", nullable)]
    pub use_cases: Option<Json>,

    // Artwork-specific fields
    pub artist_note: Option<String>,
    pub dimensions: Option<String>,
    pub medium: Option<String>,

    pub image_url: Option<String>,

    /// File delivered to the buyer after purchase of a downloadable product.
    pub download_file: Option<String>,

    /// Unit price for merch and artwork. Digital products price through
    /// pricing plans and leave this unset.
    #[sea_orm(column_type = "Decimal(Some((10, 2)))", nullable)]
    pub price: Option<Decimal>,

    pub is_physical: bool,
    pub is_downloadable: bool,

    /// Show a "Request Demo" CTA instead of direct purchase.
    pub requires_demo: bool,

    pub is_active: bool,
    pub is_featured: bool,
    pub display_order: i32,
    #[sea_orm(nullable)]
    pub published_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
    #[sea_orm(has_many = "super::pricing_plan::Entity")]
    PricingPlans,
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
    #[sea_orm(has_many = "super::purchased_download::Entity")]
    PurchasedDownloads,
    #[sea_orm(has_many = "super::product_inquiry::Entity")]
    Inquiries,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::pricing_plan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PricingPlans.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl Related<super::purchased_download::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchasedDownloads.def()
    }
}

impl Related<super::product_inquiry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Inquiries.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();

        if insert {
            if let ActiveValue::NotSet = active_model.created_at {
                active_model.created_at = Set(now);
            }
        }
        active_model.updated_at = Set(now);

        Ok(active_model)
    }
}

impl Model {
    /// True for merch (always) and physical artwork.
    pub fn needs_shipping(&self) -> bool {
        self.product_type == ProductType::Merch
            || (self.product_type == ProductType::Artwork && self.is_physical)
    }

    /// All three product lines can be carted.
    pub fn can_add_to_cart(&self) -> bool {
        matches!(
            self.product_type,
            ProductType::Digital | ProductType::Merch | ProductType::Artwork
        )
    }

    /// True when a paid buyer can be granted file access.
    pub fn is_deliverable_download(&self) -> bool {
        self.is_downloadable && self.download_file.is_some()
    }
}

/// Product line enumeration
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProductType {
    #[sea_orm(string_value = "digital")]
    Digital,
    #[sea_orm(string_value = "merch")]
    Merch,
    #[sea_orm(string_value = "artwork")]
    Artwork,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use test_case::test_case;

    fn base_product(product_type: ProductType) -> Model {
        Model {
            id: 1,
            title: "Test Product".to_string(),
            slug: "test-product".to_string(),
            category_id: None,
            product_type,
            tagline: None,
            description: None,
            features: None,
            use_cases: None,
            artist_note: None,
            dimensions: None,
            medium: None,
            image_url: None,
            download_file: None,
            price: Some(dec!(100.00)),
            is_physical: false,
            is_downloadable: false,
            requires_demo: false,
            is_active: true,
            is_featured: false,
            display_order: 0,
            published_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test_case(ProductType::Merch, false => true; "merch ships")]
    #[test_case(ProductType::Merch, true => true; "physical merch ships")]
    #[test_case(ProductType::Artwork, true => true; "physical artwork ships")]
    #[test_case(ProductType::Artwork, false => false; "downloadable artwork does not ship")]
    #[test_case(ProductType::Digital, false => false; "digital does not ship")]
    #[test_case(ProductType::Digital, true => false; "digital ignores the physical flag")]
    fn needs_shipping_by_type(product_type: ProductType, is_physical: bool) -> bool {
        let mut product = base_product(product_type);
        product.is_physical = is_physical;
        product.needs_shipping()
    }

    #[test]
    fn product_type_round_trips_through_strings() {
        use std::str::FromStr;
        assert_eq!(ProductType::Artwork.to_string(), "artwork");
        assert_eq!(
            ProductType::from_str("merch").ok(),
            Some(ProductType::Merch)
        );
    }
}
