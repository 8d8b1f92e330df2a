use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::entities::{product, ProductType};

/// One cart line. Everything except `quantity` is a snapshot of the
/// product at the time it was added, so later catalogue edits do not
/// change what the buyer sees until checkout re-resolves the product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub image: String,
    pub product_type: ProductType,
    pub needs_shipping: bool,
    pub is_downloadable: bool,
    #[serde(default)]
    pub slug: String,
}

impl CartEntry {
    /// Snapshot a product into a cart line with quantity 1. Unpriced
    /// products are carted at zero.
    pub fn from_product(product: &product::Model) -> Self {
        Self {
            id: product.id,
            name: product.title.clone(),
            price: product.price.unwrap_or(Decimal::ZERO),
            quantity: 1,
            image: product.image_url.clone().unwrap_or_default(),
            product_type: product.product_type,
            needs_shipping: product.needs_shipping(),
            is_downloadable: product.is_downloadable,
            slug: product.slug.clone(),
        }
    }

    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// A session's cart, keyed by product id.
///
/// The stored form is a JSON object keyed by the product id as a string.
/// Parsing is lenient: keys that are not positive integers and values
/// that do not decode as entries are dropped, so a corrupted session
/// never poisons later requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionCart {
    entries: BTreeMap<i64, CartEntry>,
}

impl SessionCart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the stored JSON form, discarding anything malformed.
    pub fn from_stored_json(raw: &str) -> Self {
        let value: serde_json::Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                warn!("Discarding unparseable cart payload: {}", e);
                return Self::new();
            }
        };

        let object = match value {
            serde_json::Value::Object(map) => map,
            other => {
                warn!("Discarding non-object cart payload: {}", other);
                return Self::new();
            }
        };

        let mut entries = BTreeMap::new();
        for (key, raw_entry) in object {
            let product_id = match key.parse::<i64>() {
                Ok(id) if id > 0 => id,
                _ => {
                    warn!("Dropping cart entry with invalid key {:?}", key);
                    continue;
                }
            };
            match serde_json::from_value::<CartEntry>(raw_entry) {
                Ok(entry) => {
                    entries.insert(product_id, entry);
                }
                Err(e) => {
                    warn!("Dropping malformed cart entry for product {}: {}", product_id, e);
                }
            }
        }

        Self { entries }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.entries)
    }

    /// Add a snapshot entry. An existing line for the same product gets
    /// its quantity bumped instead; the original snapshot is kept.
    /// Returns the resulting quantity of the line.
    pub fn add(&mut self, entry: CartEntry) -> u32 {
        let product_id = entry.id;
        match self.entries.get_mut(&product_id) {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(entry.quantity);
                existing.quantity
            }
            None => {
                let quantity = entry.quantity;
                self.entries.insert(product_id, entry);
                quantity
            }
        }
    }

    /// Remove a line, returning it if it was present.
    pub fn remove(&mut self, product_id: i64) -> Option<CartEntry> {
        self.entries.remove(&product_id)
    }

    /// Replace the quantity of an existing line.
    pub fn set_quantity(&mut self, product_id: i64, quantity: u32) -> Option<&CartEntry> {
        let entry = self.entries.get_mut(&product_id)?;
        entry.quantity = quantity;
        Some(&*entry)
    }

    pub fn get(&self, product_id: i64) -> Option<&CartEntry> {
        self.entries.get(&product_id)
    }

    pub fn entries(&self) -> impl Iterator<Item = &CartEntry> {
        self.entries.values()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct product lines.
    pub fn line_count(&self) -> usize {
        self.entries.len()
    }

    /// Total units across all lines. This is the badge count shown next
    /// to the cart icon.
    pub fn item_count(&self) -> u32 {
        self.entries.values().map(|e| e.quantity).sum()
    }

    /// Sum of line totals, rounded to two decimal places.
    pub fn total(&self) -> Decimal {
        self.entries
            .values()
            .map(CartEntry::line_total)
            .sum::<Decimal>()
            .round_dp(2)
    }

    pub fn has_physical_items(&self) -> bool {
        self.entries.values().any(|e| e.needs_shipping)
    }

    pub fn has_downloadable_items(&self) -> bool {
        self.entries.values().any(|e| e.is_downloadable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn entry(id: i64, price: Decimal, quantity: u32, needs_shipping: bool) -> CartEntry {
        CartEntry {
            id,
            name: format!("Product {}", id),
            price,
            quantity,
            image: String::new(),
            product_type: if needs_shipping {
                ProductType::Merch
            } else {
                ProductType::Artwork
            },
            needs_shipping,
            is_downloadable: !needs_shipping,
            slug: format!("product-{}", id),
        }
    }

    #[test]
    fn add_inserts_then_increments() {
        let mut cart = SessionCart::new();
        assert_eq!(cart.add(entry(1, dec!(50.00), 1, true)), 1);
        assert_eq!(cart.add(entry(1, dec!(50.00), 1, true)), 2);
        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn add_keeps_original_price_snapshot() {
        let mut cart = SessionCart::new();
        cart.add(entry(1, dec!(50.00), 1, true));
        // Same product added again after a price change
        cart.add(entry(1, dec!(99.00), 1, true));

        let line = cart.get(1).unwrap();
        assert_eq!(line.price, dec!(50.00));
        assert_eq!(line.quantity, 2);
    }

    #[test]
    fn totals_sum_line_totals() {
        let mut cart = SessionCart::new();
        cart.add(entry(1, dec!(50.00), 1, true));
        cart.add(entry(2, dec!(20.00), 1, false));
        cart.set_quantity(2, 1);

        assert_eq!(cart.total(), dec!(70.00));
        assert!(cart.has_physical_items());
    }

    #[test]
    fn total_of_empty_cart_is_zero() {
        assert_eq!(SessionCart::new().total(), Decimal::ZERO);
    }

    #[test]
    fn remove_returns_the_line() {
        let mut cart = SessionCart::new();
        cart.add(entry(7, dec!(10.00), 3, false));

        let removed = cart.remove(7).unwrap();
        assert_eq!(removed.name, "Product 7");
        assert!(cart.remove(7).is_none());
        assert!(cart.is_empty());
    }

    #[test]
    fn stored_json_round_trips_with_string_keys() {
        let mut cart = SessionCart::new();
        cart.add(entry(3, dec!(25.50), 2, true));

        let json = cart.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value.get("3").is_some());

        let reloaded = SessionCart::from_stored_json(&json);
        assert_eq!(reloaded, cart);
    }

    #[test]
    fn parse_drops_non_integer_keys() {
        let raw = json!({
            "2": {
                "id": 2, "name": "Poster", "price": "20.00", "quantity": 1,
                "image": "", "product_type": "merch", "needs_shipping": true,
                "is_downloadable": false, "slug": "poster"
            },
            "abc": {"id": 9, "name": "Junk", "price": "1.00", "quantity": 1,
                    "product_type": "merch", "needs_shipping": true, "is_downloadable": false},
            "0": {"id": 0, "name": "Zero", "price": "1.00", "quantity": 1,
                  "product_type": "merch", "needs_shipping": true, "is_downloadable": false},
            "-4": {"id": -4, "name": "Negative", "price": "1.00", "quantity": 1,
                   "product_type": "merch", "needs_shipping": true, "is_downloadable": false}
        })
        .to_string();

        let cart = SessionCart::from_stored_json(&raw);
        assert_eq!(cart.line_count(), 1);
        assert!(cart.get(2).is_some());
    }

    #[test]
    fn parse_drops_malformed_values() {
        let raw = json!({
            "2": {
                "id": 2, "name": "Poster", "price": "20.00", "quantity": 1,
                "image": "", "product_type": "merch", "needs_shipping": true,
                "is_downloadable": false, "slug": "poster"
            },
            "5": "not an object",
            "6": {"id": 6, "name": "No price", "quantity": 1,
                  "product_type": "merch", "needs_shipping": true, "is_downloadable": false},
            "7": {"id": 7, "name": "Bad price", "price": "not-a-number", "quantity": 1,
                  "product_type": "merch", "needs_shipping": true, "is_downloadable": false}
        })
        .to_string();

        let cart = SessionCart::from_stored_json(&raw);
        assert_eq!(cart.line_count(), 1);
        assert!(cart.get(2).is_some());
    }

    #[test]
    fn parse_survives_garbage_payloads() {
        assert!(SessionCart::from_stored_json("not json at all").is_empty());
        assert!(SessionCart::from_stored_json("[1, 2, 3]").is_empty());
        assert!(SessionCart::from_stored_json("null").is_empty());
        assert!(SessionCart::from_stored_json("{}").is_empty());
    }

    #[test]
    fn price_serializes_as_string() {
        let mut cart = SessionCart::new();
        cart.add(entry(1, dec!(300.00), 1, true));

        let json = cart.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["1"]["price"], json!("300.00"));
    }

    #[test]
    fn numeric_price_still_accepted_on_read() {
        let raw = json!({
            "2": {
                "id": 2, "name": "Poster", "price": 20.5, "quantity": 2,
                "product_type": "merch", "needs_shipping": true, "is_downloadable": false
            }
        })
        .to_string();

        let cart = SessionCart::from_stored_json(&raw);
        assert_eq!(cart.get(2).unwrap().line_total(), dec!(41.00));
    }
}
