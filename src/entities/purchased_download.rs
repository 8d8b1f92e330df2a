use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Download grant entity. Created once per (order, product) pair when an
/// order containing a downloadable product is marked paid. Each delivery
/// increments `download_count` up to `max_downloads`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchased_downloads")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: i64,
    pub download_count: i32,
    pub max_downloads: i32,
    #[sea_orm(nullable)]
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_exhausted(&self) -> bool {
        self.download_count >= self.max_downloads
    }

    pub fn remaining_downloads(&self) -> i32 {
        (self.max_downloads - self.download_count).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant(download_count: i32, max_downloads: i32) -> Model {
        Model {
            id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            product_id: 1,
            download_count,
            max_downloads,
            expires_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn grant_exhausts_at_limit() {
        assert!(!grant(4, 5).is_exhausted());
        assert!(grant(5, 5).is_exhausted());
        assert!(grant(6, 5).is_exhausted());
    }

    #[test]
    fn remaining_downloads_never_negative() {
        assert_eq!(grant(2, 5).remaining_downloads(), 3);
        assert_eq!(grant(7, 5).remaining_downloads(), 0);
    }
}
