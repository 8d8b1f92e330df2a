use async_trait::async_trait;
use redis::{AsyncCommands, Client};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::instrument;

use crate::cart::SessionCart;
use crate::errors::ServiceError;

/// Persistence backend for session carts.
///
/// `load` always returns a cart: a missing session, an expired one, or
/// a corrupted payload all come back as an empty cart. Backend failures
/// surface as errors.
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn load(&self, session_id: &str) -> Result<SessionCart, ServiceError>;
    async fn save(&self, session_id: &str, cart: &SessionCart) -> Result<(), ServiceError>;
    async fn clear(&self, session_id: &str) -> Result<(), ServiceError>;
}

#[derive(Debug, Clone)]
struct StoredCart {
    json: String,
    expires_at: Option<Instant>,
}

impl StoredCart {
    fn new(json: String, ttl: Option<Duration>) -> Self {
        Self {
            json,
            expires_at: ttl.map(|d| Instant::now() + d),
        }
    }

    fn is_expired(&self) -> bool {
        if let Some(expires_at) = self.expires_at {
            Instant::now() > expires_at
        } else {
            false
        }
    }
}

/// In-memory cart store used in development and tests.
#[derive(Debug, Clone)]
pub struct InMemoryCartStore {
    store: Arc<RwLock<HashMap<String, StoredCart>>>,
    ttl: Option<Duration>,
}

impl InMemoryCartStore {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            store: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }
}

impl Default for InMemoryCartStore {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn load(&self, session_id: &str) -> Result<SessionCart, ServiceError> {
        let store = self.store.read().unwrap();
        match store.get(session_id) {
            Some(stored) if stored.is_expired() => {
                drop(store);
                let mut store = self.store.write().unwrap();
                store.remove(session_id);
                Ok(SessionCart::new())
            }
            Some(stored) => Ok(SessionCart::from_stored_json(&stored.json)),
            None => Ok(SessionCart::new()),
        }
    }

    async fn save(&self, session_id: &str, cart: &SessionCart) -> Result<(), ServiceError> {
        let json = cart
            .to_json()
            .map_err(|e| ServiceError::SerializationError(e.to_string()))?;
        let mut store = self.store.write().unwrap();
        store.insert(session_id.to_string(), StoredCart::new(json, self.ttl));
        Ok(())
    }

    async fn clear(&self, session_id: &str) -> Result<(), ServiceError> {
        let mut store = self.store.write().unwrap();
        store.remove(session_id);
        Ok(())
    }
}

/// Redis-backed cart store. The TTL refreshes on every save, so a cart
/// only expires after the session goes idle.
#[derive(Clone)]
pub struct RedisCartStore {
    client: Arc<Client>,
    ttl_secs: u64,
}

impl RedisCartStore {
    pub fn new(client: Arc<Client>, ttl_secs: u64) -> Self {
        Self { client, ttl_secs }
    }

    fn cart_key(session_id: &str) -> String {
        format!("cart:session:{}", session_id)
    }
}

#[async_trait]
impl CartStore for RedisCartStore {
    #[instrument(skip(self))]
    async fn load(&self, session_id: &str) -> Result<SessionCart, ServiceError> {
        let mut conn = self
            .client
            .get_async_connection()
            .await
            .map_err(|e| ServiceError::CacheError(e.to_string()))?;

        let raw: Option<String> = conn
            .get(Self::cart_key(session_id))
            .await
            .map_err(|e| ServiceError::CacheError(e.to_string()))?;

        Ok(raw
            .map(|json| SessionCart::from_stored_json(&json))
            .unwrap_or_default())
    }

    #[instrument(skip(self, cart))]
    async fn save(&self, session_id: &str, cart: &SessionCart) -> Result<(), ServiceError> {
        let json = cart
            .to_json()
            .map_err(|e| ServiceError::SerializationError(e.to_string()))?;

        let mut conn = self
            .client
            .get_async_connection()
            .await
            .map_err(|e| ServiceError::CacheError(e.to_string()))?;

        let _: () = conn
            .set_ex(Self::cart_key(session_id), json, self.ttl_secs as usize)
            .await
            .map_err(|e| ServiceError::CacheError(e.to_string()))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear(&self, session_id: &str) -> Result<(), ServiceError> {
        let mut conn = self
            .client
            .get_async_connection()
            .await
            .map_err(|e| ServiceError::CacheError(e.to_string()))?;

        let _: i64 = conn
            .del(Self::cart_key(session_id))
            .await
            .map_err(|e| ServiceError::CacheError(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::CartEntry;
    use crate::entities::ProductType;
    use rust_decimal_macros::dec;

    fn sample_entry() -> CartEntry {
        CartEntry {
            id: 1,
            name: "Canvas Print".to_string(),
            price: dec!(45.00),
            quantity: 2,
            image: String::new(),
            product_type: ProductType::Artwork,
            needs_shipping: true,
            is_downloadable: false,
            slug: "canvas-print".to_string(),
        }
    }

    #[tokio::test]
    async fn missing_session_loads_empty_cart() {
        let store = InMemoryCartStore::default();
        let cart = store.load("nobody").await.unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let store = InMemoryCartStore::default();
        let mut cart = SessionCart::new();
        cart.add(sample_entry());

        store.save("session-a", &cart).await.unwrap();
        let loaded = store.load("session-a").await.unwrap();

        assert_eq!(loaded, cart);
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = InMemoryCartStore::default();
        let mut cart = SessionCart::new();
        cart.add(sample_entry());

        store.save("session-a", &cart).await.unwrap();
        let other = store.load("session-b").await.unwrap();

        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn clear_removes_the_cart() {
        let store = InMemoryCartStore::default();
        let mut cart = SessionCart::new();
        cart.add(sample_entry());

        store.save("session-a", &cart).await.unwrap();
        store.clear("session-a").await.unwrap();

        assert!(store.load("session-a").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn expired_cart_loads_empty() {
        let store = InMemoryCartStore::new(Some(Duration::from_millis(10)));
        let mut cart = SessionCart::new();
        cart.add(sample_entry());

        store.save("session-a", &cart).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(store.load("session-a").await.unwrap().is_empty());
    }
}
