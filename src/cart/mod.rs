// Session cart: entries keyed by product id, persisted as JSON in a
// pluggable store keyed by session id.

pub mod entry;
pub mod store;

pub use entry::{CartEntry, SessionCart};
pub use store::{CartStore, InMemoryCartStore, RedisCartStore};
