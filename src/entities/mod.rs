pub mod category;
pub mod contact_message;
pub mod order;
pub mod order_item;
pub mod pricing_plan;
pub mod product;
pub mod product_inquiry;
pub mod purchased_download;
pub mod shipping_address;

// Re-export entities
pub use category::{Entity as Category, Model as CategoryModel};
pub use contact_message::{
    ContactPriority, ContactStatus, ContactType, Entity as ContactMessage,
    Model as ContactMessageModel,
};
pub use order::{Entity as Order, Model as OrderModel, OrderStatus, PaymentStatus};
pub use order_item::{Entity as OrderItem, Model as OrderItemModel};
pub use pricing_plan::{BillingType, Entity as PricingPlan, Model as PricingPlanModel};
pub use product::{Entity as Product, Model as ProductModel, ProductType};
pub use product_inquiry::{Entity as ProductInquiry, Model as ProductInquiryModel};
pub use purchased_download::{Entity as PurchasedDownload, Model as PurchasedDownloadModel};
pub use shipping_address::{Entity as ShippingAddress, Model as ShippingAddressModel};
