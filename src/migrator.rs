use anyhow::Result;
use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::prelude::*;
use std::time::Duration;
use tracing::{error, info};

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_categories_table::Migration),
            Box::new(m20240101_000002_create_products_table::Migration),
            Box::new(m20240101_000003_create_pricing_plans_table::Migration),
            Box::new(m20240101_000004_create_shipping_addresses_table::Migration),
            Box::new(m20240101_000005_create_orders_table::Migration),
            Box::new(m20240101_000006_create_order_items_table::Migration),
            Box::new(m20240101_000007_create_purchased_downloads_table::Migration),
            Box::new(m20240101_000008_create_product_inquiries_table::Migration),
            Box::new(m20240101_000009_create_contact_messages_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_categories_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_categories_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Categories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Categories::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Categories::Name)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Categories::Slug)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Categories::Description).string().null())
                        .col(
                            ColumnDef::new(Categories::DisplayOrder)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Categories::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Categories::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Categories {
        Table,
        Id,
        Name,
        Slug,
        Description,
        DisplayOrder,
        IsActive,
    }
}

mod m20240101_000002_create_products_table {
    use super::m20240101_000001_create_categories_table::Categories;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_products_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Create products table aligned with entities::product Model
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Products::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Products::Title).string().not_null())
                        .col(
                            ColumnDef::new(Products::Slug)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Products::CategoryId).big_integer().null())
                        .col(ColumnDef::new(Products::ProductType).string().not_null())
                        .col(ColumnDef::new(Products::Tagline).string().null())
                        .col(ColumnDef::new(Products::Description).string().null())
                        .col(ColumnDef::new(Products::Features).json().null())
                        .col(ColumnDef::new(Products::UseCases).json().null())
                        .col(ColumnDef::new(Products::ArtistNote).string().null())
                        .col(ColumnDef::new(Products::Dimensions).string().null())
                        .col(ColumnDef::new(Products::Medium).string().null())
                        .col(ColumnDef::new(Products::ImageUrl).string().null())
                        .col(ColumnDef::new(Products::DownloadFile).string().null())
                        .col(ColumnDef::new(Products::Price).decimal_len(10, 2).null())
                        .col(
                            ColumnDef::new(Products::IsPhysical)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Products::IsDownloadable)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Products::RequiresDemo)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Products::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Products::IsFeatured)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Products::DisplayOrder)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::PublishedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_products_category_id")
                                .from(Products::Table, Products::CategoryId)
                                .to(Categories::Table, Categories::Id)
                                .on_delete(ForeignKeyAction::SetNull)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            // Useful indexes
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_product_type")
                        .table(Products::Table)
                        .col(Products::ProductType)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_category_id")
                        .table(Products::Table)
                        .col(Products::CategoryId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Products {
        Table,
        Id,
        Title,
        Slug,
        CategoryId,
        ProductType,
        Tagline,
        Description,
        Features,
        UseCases,
        ArtistNote,
        Dimensions,
        Medium,
        ImageUrl,
        DownloadFile,
        Price,
        IsPhysical,
        IsDownloadable,
        RequiresDemo,
        IsActive,
        IsFeatured,
        DisplayOrder,
        PublishedAt,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000003_create_pricing_plans_table {
    use super::m20240101_000002_create_products_table::Products;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_pricing_plans_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PricingPlans::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PricingPlans::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PricingPlans::ProductId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PricingPlans::Name).string().not_null())
                        .col(
                            ColumnDef::new(PricingPlans::Price)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PricingPlans::BillingType)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PricingPlans::Features).json().null())
                        .col(
                            ColumnDef::new(PricingPlans::IsPopular)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(PricingPlans::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(PricingPlans::DisplayOrder)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_pricing_plans_product_id")
                                .from(PricingPlans::Table, PricingPlans::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_pricing_plans_product_id")
                        .table(PricingPlans::Table)
                        .col(PricingPlans::ProductId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PricingPlans::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum PricingPlans {
        Table,
        Id,
        ProductId,
        Name,
        Price,
        BillingType,
        Features,
        IsPopular,
        IsActive,
        DisplayOrder,
    }
}

mod m20240101_000004_create_shipping_addresses_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_shipping_addresses_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ShippingAddresses::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ShippingAddresses::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ShippingAddresses::FullName)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ShippingAddresses::Phone).string().not_null())
                        .col(ColumnDef::new(ShippingAddresses::Email).string().not_null())
                        .col(
                            ColumnDef::new(ShippingAddresses::Address1)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ShippingAddresses::Address2).string().null())
                        .col(ColumnDef::new(ShippingAddresses::City).string().not_null())
                        .col(ColumnDef::new(ShippingAddresses::County).string().null())
                        .col(
                            ColumnDef::new(ShippingAddresses::PostalCode)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ShippingAddresses::Country)
                                .string()
                                .not_null()
                                .default("Kenya"),
                        )
                        .col(
                            ColumnDef::new(ShippingAddresses::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ShippingAddresses::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum ShippingAddresses {
        Table,
        Id,
        FullName,
        Phone,
        Email,
        Address1,
        Address2,
        City,
        County,
        PostalCode,
        Country,
        CreatedAt,
    }
}

mod m20240101_000005_create_orders_table {
    use super::m20240101_000004_create_shipping_addresses_table::ShippingAddresses;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_orders_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Create orders table aligned with entities::order Model
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Orders::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Orders::CustomerId).uuid().null())
                        .col(
                            ColumnDef::new(Orders::Status)
                                .string()
                                .not_null()
                                .default("pending"),
                        )
                        .col(
                            ColumnDef::new(Orders::PaymentStatus)
                                .string()
                                .not_null()
                                .default("pending"),
                        )
                        .col(ColumnDef::new(Orders::PaymentReference).string().null())
                        .col(
                            ColumnDef::new(Orders::Subtotal)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::ShippingCost)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::Total)
                                .decimal_len(12, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::HasPhysicalItems)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Orders::ShippingAddressId).uuid().null())
                        .col(
                            ColumnDef::new(Orders::Email)
                                .string()
                                .not_null()
                                .default(""),
                        )
                        .col(
                            ColumnDef::new(Orders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_shipping_address_id")
                                .from(Orders::Table, Orders::ShippingAddressId)
                                .to(ShippingAddresses::Table, ShippingAddresses::Id)
                                .on_delete(ForeignKeyAction::SetNull)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            // Useful indexes
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_customer_id")
                        .table(Orders::Table)
                        .col(Orders::CustomerId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_email")
                        .table(Orders::Table)
                        .col(Orders::Email)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_status")
                        .table(Orders::Table)
                        .col(Orders::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_created_at")
                        .table(Orders::Table)
                        .col(Orders::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Orders {
        Table,
        Id,
        CustomerId,
        Status,
        PaymentStatus,
        PaymentReference,
        Subtotal,
        ShippingCost,
        Total,
        HasPhysicalItems,
        ShippingAddressId,
        Email,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000006_create_order_items_table {
    use super::m20240101_000002_create_products_table::Products;
    use super::m20240101_000005_create_orders_table::Orders;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_order_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Snapshot columns survive product deletion, product_id nulls out
            manager
                .create_table(
                    Table::create()
                        .table(OrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderItems::OrderId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::ProductId).big_integer().null())
                        .col(
                            ColumnDef::new(OrderItems::ProductTitle)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderItems::ProductType).string().not_null())
                        .col(
                            ColumnDef::new(OrderItems::UnitPrice)
                                .decimal_len(10, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderItems::Quantity)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(OrderItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_order_id")
                                .from(OrderItems::Table, OrderItems::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_product_id")
                                .from(OrderItems::Table, OrderItems::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::SetNull)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_items_order_id")
                        .table(OrderItems::Table)
                        .col(OrderItems::OrderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum OrderItems {
        Table,
        Id,
        OrderId,
        ProductId,
        ProductTitle,
        ProductType,
        UnitPrice,
        Quantity,
        CreatedAt,
    }
}

mod m20240101_000007_create_purchased_downloads_table {
    use super::m20240101_000002_create_products_table::Products;
    use super::m20240101_000005_create_orders_table::Orders;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000007_create_purchased_downloads_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PurchasedDownloads::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchasedDownloads::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchasedDownloads::OrderId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchasedDownloads::ProductId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchasedDownloads::DownloadCount)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(PurchasedDownloads::MaxDownloads)
                                .integer()
                                .not_null()
                                .default(5),
                        )
                        .col(
                            ColumnDef::new(PurchasedDownloads::ExpiresAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PurchasedDownloads::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchased_downloads_order_id")
                                .from(PurchasedDownloads::Table, PurchasedDownloads::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchased_downloads_product_id")
                                .from(PurchasedDownloads::Table, PurchasedDownloads::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            // One grant per product per order
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_purchased_downloads_order_product")
                        .table(PurchasedDownloads::Table)
                        .col(PurchasedDownloads::OrderId)
                        .col(PurchasedDownloads::ProductId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PurchasedDownloads::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum PurchasedDownloads {
        Table,
        Id,
        OrderId,
        ProductId,
        DownloadCount,
        MaxDownloads,
        ExpiresAt,
        CreatedAt,
    }
}

mod m20240101_000008_create_product_inquiries_table {
    use super::m20240101_000002_create_products_table::Products;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000008_create_product_inquiries_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ProductInquiries::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductInquiries::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductInquiries::ProductId)
                                .big_integer()
                                .null(),
                        )
                        .col(ColumnDef::new(ProductInquiries::Name).string().not_null())
                        .col(ColumnDef::new(ProductInquiries::Email).string().not_null())
                        .col(ColumnDef::new(ProductInquiries::Company).string().null())
                        .col(ColumnDef::new(ProductInquiries::Phone).string().null())
                        .col(
                            ColumnDef::new(ProductInquiries::Message)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductInquiries::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductInquiries::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_product_inquiries_product_id")
                                .from(ProductInquiries::Table, ProductInquiries::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::SetNull)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProductInquiries::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ProductInquiries {
        Table,
        Id,
        ProductId,
        Name,
        Email,
        Company,
        Phone,
        Message,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000009_create_contact_messages_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000009_create_contact_messages_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ContactMessages::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ContactMessages::Id)
                                .big_integer()
                                .primary_key()
                                .auto_increment()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ContactMessages::Name).string().not_null())
                        .col(ColumnDef::new(ContactMessages::Email).string().not_null())
                        .col(ColumnDef::new(ContactMessages::Phone).string().null())
                        .col(ColumnDef::new(ContactMessages::Company).string().null())
                        .col(
                            ColumnDef::new(ContactMessages::ContactType)
                                .string()
                                .not_null()
                                .default("general"),
                        )
                        .col(
                            ColumnDef::new(ContactMessages::Priority)
                                .string()
                                .not_null()
                                .default("medium"),
                        )
                        .col(
                            ColumnDef::new(ContactMessages::Subject)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ContactMessages::Message)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ContactMessages::Status)
                                .string()
                                .not_null()
                                .default("new"),
                        )
                        .col(ColumnDef::new(ContactMessages::IpAddress).string().null())
                        .col(
                            ColumnDef::new(ContactMessages::SubmittedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ContactMessages::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ContactMessages::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ContactMessages {
        Table,
        Id,
        Name,
        Email,
        Phone,
        Company,
        ContactType,
        Priority,
        Subject,
        Message,
        Status,
        IpAddress,
        SubmittedAt,
        UpdatedAt,
    }
}

// Database migration CLI runner
pub async fn run_migration(db_url: &str) -> Result<()> {
    info!("Setting up database connection for migrations");

    let mut opt = ConnectOptions::new(db_url);
    opt.max_connections(10)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true);

    let db = Database::connect(opt).await?;

    info!("Running database migrations");

    let result = Migrator::up(&db, None).await;

    match result {
        Ok(_) => {
            info!("Migrations completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Migration failed: {}", e);
            Err(e.into())
        }
    }
}
