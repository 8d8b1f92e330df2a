// Commerce core services
pub mod cart;
pub mod catalogue;
pub mod checkout;
pub mod orders;

// Fulfillment and engagement
pub mod engagement;
pub mod fulfillment;

pub use cart::CartService;
pub use catalogue::CatalogueService;
pub use checkout::CheckoutService;
pub use engagement::EngagementService;
pub use fulfillment::FulfillmentService;
pub use orders::OrderService;
