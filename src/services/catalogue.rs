use crate::{
    entities::{
        category, pricing_plan, product, Category, CategoryModel, PricingPlan, PricingPlanModel,
        Product, ProductModel, ProductType,
    },
    errors::ServiceError,
};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;

use crate::db::DbPool;

const DEFAULT_PAGE_SIZE: u64 = 12;
const MAX_PAGE_SIZE: u64 = 100;

/// Read-model queries over the product catalogue.
///
/// The catalogue is maintained elsewhere (admin tooling); this service only
/// answers the storefront questions: what is listed, what does it cost, and
/// which pricing plans apply.
#[derive(Clone)]
pub struct CatalogueService {
    db_pool: Arc<DbPool>,
}

/// Filters for the product listing endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductListQuery {
    pub product_type: Option<ProductType>,
    pub category: Option<String>,
    pub featured: Option<bool>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl ProductListQuery {
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }
}

/// One row of the product listing, flattened for the storefront.
#[derive(Debug, Clone, Serialize)]
pub struct ProductSummary {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub tagline: Option<String>,
    pub product_type: ProductType,
    pub price: Option<Decimal>,
    /// Cheapest active pricing plan, only populated for digital products.
    pub min_price: Option<Decimal>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub is_featured: bool,
}

#[derive(Debug, Serialize)]
pub struct ProductListing {
    pub products: Vec<ProductSummary>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Product detail plus the facts the detail page branches on.
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    pub product: ProductModel,
    pub category: Option<CategoryModel>,
    /// Active plans, only populated for digital products.
    pub pricing_plans: Vec<PricingPlanModel>,
}

impl CatalogueService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Lists active products with optional type/category/featured filters.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        query: ProductListQuery,
    ) -> Result<ProductListing, ServiceError> {
        let db = &*self.db_pool;
        let page = query.page();
        let per_page = query.per_page();

        let mut select = Product::find().filter(product::Column::IsActive.eq(true));

        if let Some(ref product_type) = query.product_type {
            select = select.filter(product::Column::ProductType.eq(product_type.clone()));
        }
        if let Some(featured) = query.featured {
            select = select.filter(product::Column::IsFeatured.eq(featured));
        }
        if let Some(ref category_slug) = query.category {
            let category = Category::find()
                .filter(category::Column::Slug.eq(category_slug.as_str()))
                .one(db)
                .await?;
            match category {
                Some(category) => {
                    select = select.filter(product::Column::CategoryId.eq(category.id));
                }
                None => {
                    return Ok(ProductListing {
                        products: Vec::new(),
                        total: 0,
                        page,
                        per_page,
                    })
                }
            }
        }

        let paginator = select
            .order_by_asc(product::Column::DisplayOrder)
            .order_by_asc(product::Column::Title)
            .paginate(db, per_page);

        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page - 1).await?;

        let category_names = self.category_names_for(&products).await?;
        let min_prices = self.min_plan_prices_for(&products).await?;

        let products = products
            .into_iter()
            .map(|p| {
                let category = p.category_id.and_then(|id| category_names.get(&id).cloned());
                let min_price = min_prices.get(&p.id).copied();
                ProductSummary {
                    id: p.id,
                    title: p.title,
                    slug: p.slug,
                    tagline: p.tagline,
                    product_type: p.product_type,
                    price: p.price,
                    min_price,
                    image_url: p.image_url,
                    category,
                    is_featured: p.is_featured,
                }
            })
            .collect();

        Ok(ProductListing {
            products,
            total,
            page,
            per_page,
        })
    }

    /// Fetches an active product by slug, with its category and (for digital
    /// products) the active pricing plans ordered for display.
    #[instrument(skip(self))]
    pub async fn get_product_by_slug(&self, slug: &str) -> Result<ProductDetail, ServiceError> {
        let db = &*self.db_pool;

        let product = Product::find()
            .filter(product::Column::Slug.eq(slug))
            .filter(product::Column::IsActive.eq(true))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", slug)))?;

        let category = match product.category_id {
            Some(category_id) => Category::find_by_id(category_id).one(db).await?,
            None => None,
        };

        let pricing_plans = if product.product_type == ProductType::Digital {
            PricingPlan::find()
                .filter(pricing_plan::Column::ProductId.eq(product.id))
                .filter(pricing_plan::Column::IsActive.eq(true))
                .order_by_asc(pricing_plan::Column::DisplayOrder)
                .order_by_asc(pricing_plan::Column::Price)
                .all(db)
                .await?
        } else {
            Vec::new()
        };

        Ok(ProductDetail {
            product,
            category,
            pricing_plans,
        })
    }

    /// Lists active categories in display order.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<CategoryModel>, ServiceError> {
        Category::find()
            .filter(category::Column::IsActive.eq(true))
            .order_by_asc(category::Column::DisplayOrder)
            .order_by_asc(category::Column::Name)
            .all(&*self.db_pool)
            .await
            .map_err(Into::into)
    }

    async fn category_names_for(
        &self,
        products: &[ProductModel],
    ) -> Result<HashMap<i64, String>, ServiceError> {
        let ids: Vec<i64> = products.iter().filter_map(|p| p.category_id).collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let categories = Category::find()
            .filter(category::Column::Id.is_in(ids))
            .all(&*self.db_pool)
            .await?;

        Ok(categories.into_iter().map(|c| (c.id, c.name)).collect())
    }

    /// Cheapest active plan per digital product on the page, one query.
    async fn min_plan_prices_for(
        &self,
        products: &[ProductModel],
    ) -> Result<HashMap<i64, Decimal>, ServiceError> {
        let digital_ids: Vec<i64> = products
            .iter()
            .filter(|p| p.product_type == ProductType::Digital)
            .map(|p| p.id)
            .collect();
        if digital_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let plans = PricingPlan::find()
            .filter(pricing_plan::Column::ProductId.is_in(digital_ids))
            .filter(pricing_plan::Column::IsActive.eq(true))
            .all(&*self.db_pool)
            .await?;

        let mut min_prices: HashMap<i64, Decimal> = HashMap::new();
        for plan in plans {
            min_prices
                .entry(plan.product_id)
                .and_modify(|current| {
                    if plan.price < *current {
                        *current = plan.price;
                    }
                })
                .or_insert(plan.price);
        }
        Ok(min_prices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_defaults() {
        let query = ProductListQuery::default();
        assert_eq!(query.page(), 1);
        assert_eq!(query.per_page(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn list_query_clamps_page_size() {
        let query = ProductListQuery {
            per_page: Some(10_000),
            ..Default::default()
        };
        assert_eq!(query.per_page(), MAX_PAGE_SIZE);

        let query = ProductListQuery {
            per_page: Some(0),
            page: Some(0),
            ..Default::default()
        };
        assert_eq!(query.per_page(), 1);
        assert_eq!(query.page(), 1);
    }

    #[test]
    fn list_query_parses_type_filter() {
        let query: ProductListQuery =
            serde_json::from_str(r#"{"product_type": "digital", "featured": true}"#).unwrap();
        assert_eq!(query.product_type, Some(ProductType::Digital));
        assert_eq!(query.featured, Some(true));
    }
}
