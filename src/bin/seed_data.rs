//! Seed data script - populates the database with a demo catalogue
//!
//! Run with: cargo run --bin seed-data
//!
//! This creates:
//! - 3 categories (digital systems, merchandise, artwork)
//! - 2 digital products with pricing plans
//! - 2 merch products
//! - 2 artwork pieces (one physical, one downloadable)

use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, Set};
use serde_json::json;
use std::time::Duration;
use tracing::info;

use marketplace_api::entities::{
    category,
    pricing_plan::{self, BillingType},
    product::{self, ProductType},
};
use marketplace_api::migrator::Migrator;
use sea_orm_migration::MigratorTrait;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    info!("=== Marketplace API Seed Data ===");

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://marketplace.db?mode=rwc".to_string());

    let mut options = ConnectOptions::new(database_url.clone());
    options
        .max_connections(5)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10));

    info!("Connecting to database: {}", database_url);
    let db = Database::connect(options).await?;
    Migrator::up(&db, None).await?;
    info!("Connected!");

    info!("Creating categories...");
    let categories = create_categories(&db).await?;
    info!("  Created {} categories", categories.len());

    info!("Creating digital products...");
    let digital_count = create_digital_products(&db, categories[0].id).await?;
    info!("  Created {} digital products with plans", digital_count);

    info!("Creating merch...");
    let merch_count = create_merch(&db, categories[1].id).await?;
    info!("  Created {} merch products", merch_count);

    info!("Creating artwork...");
    let artwork_count = create_artwork(&db, categories[2].id).await?;
    info!("  Created {} artwork pieces", artwork_count);

    info!("=== Seed Data Complete ===");
    info!("");
    info!("Try these API calls:");
    info!("  curl http://localhost:8080/api/v1/products");
    info!("  curl http://localhost:8080/api/v1/categories");
    info!("  curl -X POST http://localhost:8080/api/v1/cart/items/1");
    info!("");
    info!("Or explore interactively at: http://localhost:8080/swagger-ui");

    Ok(())
}

async fn create_categories(
    db: &sea_orm::DatabaseConnection,
) -> anyhow::Result<Vec<category::Model>> {
    let categories_data = vec![
        (
            "Digital Systems",
            "digital-systems",
            "Business software built for Kenyan SMEs",
        ),
        ("Merchandise", "merchandise", "DravTech branded merch"),
        ("Artwork", "artwork", "Original prints and digital art"),
    ];

    let mut created = Vec::new();
    for (order, (name, slug, description)) in categories_data.into_iter().enumerate() {
        let saved = category::ActiveModel {
            name: Set(name.to_string()),
            slug: Set(slug.to_string()),
            description: Set(Some(description.to_string())),
            display_order: Set(order as i32),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await?;
        created.push(saved);
    }

    Ok(created)
}

async fn create_digital_products(
    db: &sea_orm::DatabaseConnection,
    category_id: i64,
) -> anyhow::Result<usize> {
    // (title, slug, tagline, requires_demo, featured, download_file, plans)
    let digital_data = vec![
        (
            "DravPOS",
            "dravpos",
            "Point-of-sale and till management for retail shops",
            true,
            true,
            None,
            vec![
                ("Starter", dec!(1500.00), BillingType::Monthly, false),
                ("Business", dec!(3500.00), BillingType::Monthly, true),
                ("Lifetime", dec!(45000.00), BillingType::OneTime, false),
            ],
        ),
        (
            "DravBooks",
            "dravbooks",
            "Simple bookkeeping with M-Pesa statement import",
            false,
            false,
            Some("systems/dravbooks-installer.zip"),
            vec![
                ("Solo", dec!(800.00), BillingType::Monthly, false),
                ("One-off licence", dec!(12000.00), BillingType::OneTime, true),
            ],
        ),
    ];

    let mut count = 0;
    for (order, (title, slug, tagline, requires_demo, featured, download_file, plans)) in
        digital_data.into_iter().enumerate()
    {
        let saved = product::ActiveModel {
            title: Set(title.to_string()),
            slug: Set(slug.to_string()),
            category_id: Set(Some(category_id)),
            product_type: Set(ProductType::Digital),
            tagline: Set(Some(tagline.to_string())),
            features: Set(Some(json!([
                "Offline-first",
                "M-Pesa integration",
                "Daily reports"
            ]))),
            download_file: Set(download_file.map(str::to_string)),
            is_physical: Set(false),
            is_downloadable: Set(download_file.is_some()),
            requires_demo: Set(requires_demo),
            is_active: Set(true),
            is_featured: Set(featured),
            display_order: Set(order as i32),
            ..Default::default()
        }
        .insert(db)
        .await?;

        for (plan_order, (name, price, billing_type, popular)) in plans.into_iter().enumerate() {
            pricing_plan::ActiveModel {
                product_id: Set(saved.id),
                name: Set(name.to_string()),
                price: Set(price),
                billing_type: Set(billing_type),
                is_popular: Set(popular),
                is_active: Set(true),
                display_order: Set(plan_order as i32),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }

        count += 1;
    }

    Ok(count)
}

async fn create_merch(db: &sea_orm::DatabaseConnection, category_id: i64) -> anyhow::Result<usize> {
    let merch_data = vec![
        (
            "DravTech Hoodie",
            "dravtech-hoodie",
            dec!(2500.00),
            "Heavyweight cotton hoodie with embroidered logo",
        ),
        (
            "Sticker Pack",
            "sticker-pack",
            dec!(300.00),
            "Ten die-cut vinyl stickers",
        ),
    ];

    let mut count = 0;
    for (order, (title, slug, price, tagline)) in merch_data.into_iter().enumerate() {
        product::ActiveModel {
            title: Set(title.to_string()),
            slug: Set(slug.to_string()),
            category_id: Set(Some(category_id)),
            product_type: Set(ProductType::Merch),
            tagline: Set(Some(tagline.to_string())),
            price: Set(Some(price)),
            is_physical: Set(true),
            is_downloadable: Set(false),
            requires_demo: Set(false),
            is_active: Set(true),
            is_featured: Set(false),
            display_order: Set(order as i32),
            ..Default::default()
        }
        .insert(db)
        .await?;
        count += 1;
    }

    Ok(count)
}

async fn create_artwork(
    db: &sea_orm::DatabaseConnection,
    category_id: i64,
) -> anyhow::Result<usize> {
    // (title, slug, price, physical, download_file, medium, dimensions)
    let artwork_data = vec![
        (
            "Nairobi Skyline Print",
            "nairobi-skyline-print",
            dec!(4500.00),
            true,
            None,
            "Giclee print on cotton rag",
            "42cm x 59cm",
        ),
        (
            "Savanna Dusk (Digital)",
            "savanna-dusk-digital",
            dec!(1200.00),
            false,
            Some("artwork/savanna-dusk.zip"),
            "Digital illustration",
            "6000px x 4000px",
        ),
    ];

    let mut count = 0;
    for (order, (title, slug, price, physical, download_file, medium, dimensions)) in
        artwork_data.into_iter().enumerate()
    {
        product::ActiveModel {
            title: Set(title.to_string()),
            slug: Set(slug.to_string()),
            category_id: Set(Some(category_id)),
            product_type: Set(ProductType::Artwork),
            artist_note: Set(Some("Part of the East African cities series".to_string())),
            medium: Set(Some(medium.to_string())),
            dimensions: Set(Some(dimensions.to_string())),
            price: Set(Some(price)),
            download_file: Set(download_file.map(str::to_string)),
            is_physical: Set(physical),
            is_downloadable: Set(download_file.is_some()),
            requires_demo: Set(false),
            is_active: Set(true),
            is_featured: Set(order == 0),
            display_order: Set(order as i32),
            ..Default::default()
        }
        .insert(db)
        .await?;
        count += 1;
    }

    Ok(count)
}
